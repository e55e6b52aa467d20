// src/fs/mock.rs

use super::{FileMeta, FileSystem};
use std::collections::HashMap;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File { content: Vec<u8>, mode: u32 },
    Dir,
    /// Stats fine but every open fails with the given kind.
    Unreadable { len: u64, kind: io::ErrorKind },
    /// Stats as `len` bytes but reads back `content`: the file changed size
    /// between the stat and the read.
    Resized { content: Vec<u8>, len: u64 },
    /// Opens fine, yields `prefix`, then fails with the given kind.
    FailsMidRead {
        prefix: Vec<u8>,
        len: u64,
        kind: io::ErrorKind,
    },
}

/// In-memory filesystem for archive tests. Paths are used verbatim; there is
/// no normalisation and no implicit parent directories.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    entries: Arc<Mutex<HashMap<PathBuf, MockEntry>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        self.add_file_with_mode(path, content, 0o644);
    }

    pub fn add_file_with_mode(
        &self,
        path: impl AsRef<Path>,
        content: impl Into<Vec<u8>>,
        mode: u32,
    ) {
        self.insert(
            path,
            MockEntry::File {
                content: content.into(),
                mode,
            },
        );
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        self.insert(path, MockEntry::Dir);
    }

    pub fn add_unreadable(&self, path: impl AsRef<Path>, len: u64, kind: io::ErrorKind) {
        self.insert(path, MockEntry::Unreadable { len, kind });
    }

    pub fn add_resized(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>, len: u64) {
        self.insert(
            path,
            MockEntry::Resized {
                content: content.into(),
                len,
            },
        );
    }

    pub fn add_failing_read(
        &self,
        path: impl AsRef<Path>,
        prefix: impl Into<Vec<u8>>,
        len: u64,
        kind: io::ErrorKind,
    ) {
        self.insert(
            path,
            MockEntry::FailsMidRead {
                prefix: prefix.into(),
                len,
                kind,
            },
        );
    }

    pub fn remove(&self, path: impl AsRef<Path>) {
        let mut entries = self.entries.lock().unwrap();
        entries.remove(path.as_ref());
    }

    fn insert(&self, path: impl AsRef<Path>, entry: MockEntry) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(path.as_ref().to_path_buf(), entry);
    }

    fn not_found(path: &Path) -> io::Error {
        io::Error::new(io::ErrorKind::NotFound, format!("no such file: {:?}", path))
    }
}

impl FileSystem for MockFileSystem {
    fn metadata(&self, path: &Path) -> io::Result<FileMeta> {
        let entries = self.entries.lock().unwrap();
        match entries.get(path) {
            Some(MockEntry::File { content, mode }) => Ok(FileMeta {
                mode: *mode,
                len: content.len() as u64,
                mtime: 0,
                is_file: true,
            }),
            Some(MockEntry::Dir) => Ok(FileMeta {
                mode: 0o755,
                len: 0,
                mtime: 0,
                is_file: false,
            }),
            Some(
                MockEntry::Unreadable { len, .. }
                | MockEntry::Resized { len, .. }
                | MockEntry::FailsMidRead { len, .. },
            ) => Ok(FileMeta {
                mode: 0o644,
                len: *len,
                mtime: 0,
                is_file: true,
            }),
            None => Err(Self::not_found(path)),
        }
    }

    fn open_read(&self, path: &Path) -> io::Result<Box<dyn Read + Send>> {
        let entries = self.entries.lock().unwrap();
        match entries.get(path) {
            Some(MockEntry::File { content, .. }) => Ok(Box::new(Cursor::new(content.clone()))),
            Some(MockEntry::Dir) => Err(io::Error::other(format!(
                "is a directory: {:?}",
                path
            ))),
            Some(MockEntry::Unreadable { kind, .. }) => {
                Err(io::Error::new(*kind, format!("cannot open {:?}", path)))
            }
            Some(MockEntry::Resized { content, .. }) => Ok(Box::new(Cursor::new(content.clone()))),
            Some(MockEntry::FailsMidRead { prefix, kind, .. }) => Ok(Box::new(
                Cursor::new(prefix.clone()).chain(FailingReader(*kind)),
            )),
            None => Err(Self::not_found(path)),
        }
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        // In mock, we just return the path as is, assuming absolute paths are used in tests
        Ok(path.to_path_buf())
    }
}

/// Reader whose every read fails.
#[derive(Debug)]
struct FailingReader(io::ErrorKind);

impl Read for FailingReader {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(self.0, "simulated read failure"))
    }
}
