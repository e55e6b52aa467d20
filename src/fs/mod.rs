// src/fs/mod.rs

//! Read-side filesystem access used when packing affected files.

use std::fmt::Debug;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

pub mod mock;

/// The subset of a live `stat` the archive needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMeta {
    /// Permission bits only (`0o7777` mask).
    pub mode: u32,
    pub len: u64,
    /// Seconds since the Unix epoch.
    pub mtime: u64,
    pub is_file: bool,
}

/// Abstract filesystem interface.
///
/// Errors are plain `io::Error`s so callers can tell a vanished file
/// (`NotFound`) apart from a real failure.
pub trait FileSystem: Send + Sync + Debug {
    /// `stat` following symlinks.
    fn metadata(&self, path: &Path) -> io::Result<FileMeta>;
    fn open_read(&self, path: &Path) -> io::Result<Box<dyn Read + Send>>;
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn metadata(&self, path: &Path) -> io::Result<FileMeta> {
        let meta = fs::metadata(path)?;
        let mtime = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs())
            .unwrap_or(0);

        Ok(FileMeta {
            mode: permission_bits(&meta),
            len: meta.len(),
            mtime,
            is_file: meta.is_file(),
        })
    }

    fn open_read(&self, path: &Path) -> io::Result<Box<dyn Read + Send>> {
        let file = fs::File::open(path)?;
        Ok(Box::new(file))
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        fs::canonicalize(path)
    }
}

#[cfg(unix)]
fn permission_bits(meta: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn permission_bits(meta: &fs::Metadata) -> u32 {
    if meta.permissions().readonly() {
        0o444
    } else {
        0o644
    }
}
