use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use flate2::read::GzDecoder;

/// One file as stored in a tar.gz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivedFile {
    pub mode: u32,
    pub size: u64,
    pub content: Vec<u8>,
}

/// Read every entry of a tar.gz into memory, keyed by entry name.
pub fn read_archive(path: impl AsRef<Path>) -> Result<BTreeMap<String, ArchivedFile>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("opening archive {:?}", path))?;
    let mut archive = tar::Archive::new(GzDecoder::new(file));

    let mut files = BTreeMap::new();
    for entry in archive.entries()? {
        let mut entry = entry?;
        let name = entry.path()?.to_string_lossy().into_owned();
        let mode = entry.header().mode()?;
        let size = entry.header().size()?;
        let mut content = Vec::new();
        entry.read_to_end(&mut content)?;
        files.insert(name, ArchivedFile { mode, size, content });
    }
    Ok(files)
}
