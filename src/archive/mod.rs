// src/archive/mod.rs

//! Packing affected files into a gzip-compressed tarball.
//!
//! Each entry is named by its path relative to the observation root and
//! carries the file's permission bits, size and mtime from a live `stat`
//! taken while the archive is written. Files that no longer exist are
//! skipped: they were created and removed again inside the window.

pub mod path_utils;

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;
use tracing::{debug, info, warn};

use crate::errors::{ChangetarError, Result};
use crate::fs::{FileSystem, RealFileSystem};
use crate::observe::AffectedPathSet;

pub use path_utils::relative_name;

type TarGzBuilder = tar::Builder<GzEncoder<File>>;

/// What ended up in a written archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSummary {
    /// Where the archive was written.
    pub path: PathBuf,
    /// Entry names, in archive order.
    pub entries: Vec<String>,
    /// Affected paths that were gone (or no longer regular files).
    pub skipped: Vec<PathBuf>,
}

/// Write every still-existing path of `paths` into a tar.gz at `destination`,
/// overwriting it.
pub fn build_archive(
    paths: &AffectedPathSet,
    root: &Path,
    destination: &Path,
) -> Result<ArchiveSummary> {
    build_archive_with(
        &RealFileSystem,
        paths.iter(),
        root,
        destination,
        Compression::default(),
    )
}

/// Like [`build_archive`], reading sources through `fs`.
///
/// Entries are written in sorted path order. On any error the tar trailer
/// and gzip footer are still written before the error is returned, so the
/// destination is closed and holds the entries appended so far.
pub fn build_archive_with<I, P>(
    fs: &dyn FileSystem,
    paths: I,
    root: &Path,
    destination: &Path,
    compression: Compression,
) -> Result<ArchiveSummary>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut sorted: Vec<PathBuf> = paths
        .into_iter()
        .map(|p| p.as_ref().to_path_buf())
        .collect();
    sorted.sort();
    sorted.dedup();

    let file = File::create(destination).map_err(|source| archive_io(destination, source))?;
    let mut builder = tar::Builder::new(GzEncoder::new(file, compression));

    let mut summary = ArchiveSummary {
        path: destination.to_path_buf(),
        entries: Vec::new(),
        skipped: Vec::new(),
    };

    let appended = sorted
        .iter()
        .try_for_each(|path| append_path(fs, &mut builder, root, path, &mut summary));
    let closed = close(builder);

    match (appended, closed) {
        (Ok(()), Ok(())) => {
            info!(
                archive = ?destination,
                entries = summary.entries.len(),
                skipped = summary.skipped.len(),
                "archive written"
            );
            Ok(summary)
        }
        (Ok(()), Err(source)) => Err(archive_io(destination, source)),
        (Err(err), closed) => {
            if let Err(close_err) = closed {
                warn!(archive = ?destination, error = %close_err, "failed to close archive after error");
            }
            Err(err)
        }
    }
}

fn append_path(
    fs: &dyn FileSystem,
    builder: &mut TarGzBuilder,
    root: &Path,
    path: &Path,
    summary: &mut ArchiveSummary,
) -> Result<()> {
    let name = relative_name(fs, root, path).ok_or_else(|| ChangetarError::PathOutsideRoot {
        path: path.to_path_buf(),
        root: root.to_path_buf(),
    })?;

    let meta = match fs.metadata(path) {
        Ok(meta) => meta,
        Err(err) if is_vanished(&err) => {
            debug!(path = ?path, "affected file no longer exists; skipping");
            summary.skipped.push(path.to_path_buf());
            return Ok(());
        }
        Err(source) => return Err(source_io(path, source)),
    };

    if !meta.is_file {
        debug!(path = ?path, "affected path is not a regular file; skipping");
        summary.skipped.push(path.to_path_buf());
        return Ok(());
    }

    let reader = match fs.open_read(path) {
        Ok(reader) => reader,
        Err(err) if is_vanished(&err) => {
            debug!(path = ?path, "affected file vanished before it could be read; skipping");
            summary.skipped.push(path.to_path_buf());
            return Ok(());
        }
        Err(source) => return Err(source_io(path, source)),
    };

    let mut header = tar::Header::new_gnu();
    header.set_entry_type(tar::EntryType::Regular);
    header.set_mode(meta.mode);
    header.set_size(meta.len);
    header.set_mtime(meta.mtime);

    let mut data = StatSizedReader::new(reader, meta.len);
    if let Err(err) = builder.append_data(&mut header, &name, &mut data) {
        return Err(match data.source_error.take() {
            Some(source) => source_io(path, source),
            None => archive_io(&summary.path, err),
        });
    }
    if data.padded > 0 {
        warn!(path = ?path, missing = data.padded, "file shrank while being archived; entry zero-padded");
    }

    debug!(entry = %name, size = meta.len, mode = %format_args!("{:o}", meta.mode), "archived file");
    summary.entries.push(name);
    Ok(())
}

/// Streams exactly `len` bytes of a source file into a tar entry.
///
/// The header size comes from the `stat`, so a file that grew since is cut
/// off and one that shrank is padded with zeros. Read errors are kept so
/// they can be reported against the source rather than the archive.
struct StatSizedReader<R> {
    inner: R,
    remaining: u64,
    exhausted: bool,
    padded: u64,
    source_error: Option<io::Error>,
}

impl<R: Read> StatSizedReader<R> {
    fn new(inner: R, len: u64) -> Self {
        Self {
            inner,
            remaining: len,
            exhausted: false,
            padded: 0,
            source_error: None,
        }
    }
}

impl<R: Read> Read for StatSizedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let want = buf
            .len()
            .min(usize::try_from(self.remaining).unwrap_or(usize::MAX));
        if want == 0 {
            return Ok(0);
        }
        let buf = &mut buf[..want];

        if !self.exhausted {
            match self.inner.read(buf) {
                Ok(0) => self.exhausted = true,
                Ok(n) => {
                    self.remaining -= n as u64;
                    return Ok(n);
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => return Err(err),
                Err(err) => {
                    let kind = err.kind();
                    self.source_error = Some(err);
                    return Err(io::Error::new(kind, "reading source file failed"));
                }
            }
        }

        buf.fill(0);
        self.padded += want as u64;
        self.remaining -= want as u64;
        Ok(want)
    }
}

/// Write the tar trailer, the gzip footer, and flush to disk.
fn close(builder: TarGzBuilder) -> io::Result<()> {
    let encoder = builder.into_inner()?;
    let file = encoder.finish()?;
    file.sync_all()
}

fn is_vanished(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}

fn archive_io(path: &Path, source: io::Error) -> ChangetarError {
    ChangetarError::ArchiveIo {
        path: path.to_path_buf(),
        source,
    }
}

fn source_io(path: &Path, source: io::Error) -> ChangetarError {
    ChangetarError::SourceIo {
        path: path.to_path_buf(),
        source,
    }
}

/// A fresh path for an archive when the caller did not pick one.
///
/// The file is created empty and left on disk so nothing else claims the
/// name before the archive overwrites it.
pub fn gen_tempfile_path() -> Result<PathBuf> {
    let file = tempfile::Builder::new()
        .prefix("filechanges")
        .suffix(".tgz")
        .tempfile()?;
    file.into_temp_path()
        .keep()
        .map_err(|e| ChangetarError::IoError(e.error))
}
