// src/observe/flush.rs

//! Pre-watch flush hook.
//!
//! Some watch backends miss events on a directory that was created moments
//! before the watch starts. Flushing first makes that less likely; it is a
//! workaround, not a guarantee.

use std::fmt::Debug;
use std::fs::{self, File, Metadata};
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tracing::{debug, warn};

use crate::types::FlushStrategy;

/// Hook run before the watch is armed on a recently changed root.
pub trait PreWatchFlush: Send + Sync + Debug {
    fn flush(&self, root: &Path) -> io::Result<()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopFlush;

impl PreWatchFlush for NoopFlush {
    fn flush(&self, _root: &Path) -> io::Result<()> {
        Ok(())
    }
}

/// `fsync` the root directory itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsyncRootFlush;

impl PreWatchFlush for FsyncRootFlush {
    fn flush(&self, root: &Path) -> io::Result<()> {
        File::open(root)?.sync_all()
    }
}

pub fn flush_hook_for(strategy: FlushStrategy) -> Arc<dyn PreWatchFlush> {
    match strategy {
        FlushStrategy::Disabled => Arc::new(NoopFlush),
        FlushStrategy::FsyncRoot => Arc::new(FsyncRootFlush),
    }
}

/// Run `hook` if `root` changed less than `threshold` ago.
///
/// Returns whether the hook ran. Hook failures are logged and swallowed.
pub fn flush_if_recent(root: &Path, threshold: Duration, hook: &dyn PreWatchFlush) -> bool {
    let changed_at = match fs::metadata(root).and_then(|m| change_time(&m)) {
        Ok(t) => t,
        Err(err) => {
            debug!(root = ?root, error = %err, "cannot read root change time; skipping flush");
            return false;
        }
    };

    let age = SystemTime::now()
        .duration_since(changed_at)
        .unwrap_or(Duration::ZERO);
    if age >= threshold {
        return false;
    }

    debug!(root = ?root, ?age, "root changed recently; flushing before watch");
    if let Err(err) = hook.flush(root) {
        warn!(root = ?root, error = %err, "pre-watch flush failed");
    }
    true
}

#[cfg(unix)]
fn change_time(meta: &Metadata) -> io::Result<SystemTime> {
    use std::os::unix::fs::MetadataExt;

    let secs = u64::try_from(meta.ctime()).unwrap_or(0);
    let nanos = u32::try_from(meta.ctime_nsec()).unwrap_or(0);
    Ok(SystemTime::UNIX_EPOCH + Duration::new(secs, nanos))
}

#[cfg(not(unix))]
fn change_time(meta: &Metadata) -> io::Result<SystemTime> {
    meta.modified()
}
