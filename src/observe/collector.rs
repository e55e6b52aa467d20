// src/observe/collector.rs

//! Pure bookkeeping for one observation window.
//!
//! The collector never touches the filesystem. The watch task feeds it
//! batches of [`ChangeEvent`]s and asks it which freshly created directories
//! still need a content scan; everything else is decided here.
//!
//! Backends do not always say whether a renamed or removed path was a
//! directory, and by the time the batch arrives it cannot be stat-ed any
//! more. The collector therefore remembers every directory under the root it
//! has heard of (seeded by the watch task when the watch is armed) and
//! treats events on those paths as directory events.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::observe::event::ChangeEvent;
use crate::observe::patterns::ExcludeSet;

/// Unique absolute file paths touched during an observation, in sorted order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AffectedPathSet {
    root: PathBuf,
    paths: BTreeSet<PathBuf>,
}

impl AffectedPathSet {
    /// Canonical root the paths were observed under.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.paths.contains(path.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter().map(PathBuf::as_path)
    }

    pub fn into_paths(self) -> BTreeSet<PathBuf> {
        self.paths
    }
}

impl<'a> IntoIterator for &'a AffectedPathSet {
    type Item = &'a PathBuf;
    type IntoIter = std::collections::btree_set::Iter<'a, PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.iter()
    }
}

/// What the watch task should do after a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    Continue,
    SentinelSeen,
}

#[derive(Debug)]
pub struct EventCollector {
    root: PathBuf,
    sentinel: PathBuf,
    exclude: ExcludeSet,
    paths: BTreeSet<PathBuf>,
    pending_scans: Vec<PathBuf>,
    known_dirs: BTreeSet<PathBuf>,
    sentinel_seen: bool,
}

impl EventCollector {
    /// `root` must already be canonical; `sentinel_name` is joined onto it.
    pub fn new(root: impl Into<PathBuf>, sentinel_name: &str, exclude: ExcludeSet) -> Self {
        let root = root.into();
        let sentinel = root.join(sentinel_name);
        Self {
            root,
            sentinel,
            exclude,
            paths: BTreeSet::new(),
            pending_scans: Vec::new(),
            known_dirs: BTreeSet::new(),
            sentinel_seen: false,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn sentinel_path(&self) -> &Path {
        &self.sentinel
    }

    pub fn sentinel_seen(&self) -> bool {
        self.sentinel_seen
    }

    /// Consume one delivered batch.
    ///
    /// Events after the sentinel in the same batch are still recorded; the
    /// outcome only tells the caller to stop waiting for more batches.
    pub fn consume_batch(&mut self, batch: &[ChangeEvent]) -> BatchOutcome {
        for event in batch {
            if event.flags.is_dir {
                self.track_dir(event);
                continue;
            }

            if self.known_dirs.contains(&event.path) {
                if !event.flags.created {
                    continue;
                }
                // A file now sits where a directory used to be.
                self.forget_dir(&event.path);
            }

            if event.path == self.sentinel {
                self.sentinel_seen = true;
                continue;
            }

            self.record_file(&event.path);
        }

        if self.sentinel_seen {
            BatchOutcome::SentinelSeen
        } else {
            BatchOutcome::Continue
        }
    }

    /// Note a directory under the root, so later rename or removal events on
    /// it are not mistaken for files.
    pub fn remember_dir(&mut self, path: &Path) {
        if path.starts_with(&self.root) && path != self.root {
            self.known_dirs.insert(path.to_path_buf());
        }
    }

    pub fn is_known_dir(&self, path: &Path) -> bool {
        self.known_dirs.contains(path)
    }

    /// Removed directories stay remembered: a rename is reported once on its
    /// own and once more paired with the new path.
    fn track_dir(&mut self, event: &ChangeEvent) {
        if event.flags.created && !event.flags.removed && event.path.starts_with(&self.root) {
            self.remember_dir(&event.path);
            self.pending_scans.push(event.path.clone());
        }
    }

    /// Drop `path` and everything below it.
    fn forget_dir(&mut self, path: &Path) {
        self.known_dirs.retain(|dir| !dir.starts_with(path));
    }

    /// Directories reported as created since the last call.
    pub fn take_pending_scans(&mut self) -> Vec<PathBuf> {
        std::mem::take(&mut self.pending_scans)
    }

    /// Record a file path if it is under the root, is not the sentinel and
    /// is not excluded. Returns whether the path is now in the set.
    pub fn record_file(&mut self, path: &Path) -> bool {
        if path == self.sentinel {
            return false;
        }

        let rel = match path.strip_prefix(&self.root) {
            Ok(rel) if !rel.as_os_str().is_empty() => rel,
            _ => {
                trace!(path = ?path, "ignoring path outside observation root");
                return false;
            }
        };

        if self.exclude.is_excluded(rel) {
            trace!(path = ?path, "ignoring excluded path");
            return false;
        }

        self.paths.insert(path.to_path_buf());
        true
    }

    pub fn into_paths(self) -> AffectedPathSet {
        AffectedPathSet {
            root: self.root,
            paths: self.paths,
        }
    }
}
