// src/observe/observer.rs

use std::fs::{self, OpenOptions};
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::ObserveSection;
use crate::config::model::DEFAULT_SENTINEL;
use crate::errors::{ChangetarError, Result};
use crate::observe::collector::{AffectedPathSet, EventCollector};
use crate::observe::flush::{NoopFlush, PreWatchFlush, flush_hook_for, flush_if_recent};
use crate::observe::patterns::ExcludeSet;
use crate::observe::state::{ObservationPhase, PhaseTracker};
use crate::observe::watcher::spawn_watch_task;

/// Tunables for one observation.
#[derive(Debug, Clone)]
pub struct ObserveOptions {
    /// Event batching window of the watch task.
    pub latency: Duration,
    /// `None` waits forever for the watch to become active.
    pub ready_timeout: Option<Duration>,
    /// `None` waits forever for the sentinel event.
    pub drain_timeout: Option<Duration>,
    /// Roots changed more recently than this get the pre-watch flush.
    pub recent_root_threshold: Duration,
    pub sentinel_name: String,
    /// Root-relative globs that are never recorded.
    pub exclude: Vec<String>,
}

impl Default for ObserveOptions {
    fn default() -> Self {
        Self {
            latency: Duration::from_millis(10),
            ready_timeout: Some(Duration::from_secs(5)),
            drain_timeout: Some(Duration::from_secs(10)),
            recent_root_threshold: Duration::from_secs(5),
            sentinel_name: DEFAULT_SENTINEL.to_string(),
            exclude: Vec::new(),
        }
    }
}

impl From<&ObserveSection> for ObserveOptions {
    fn from(section: &ObserveSection) -> Self {
        Self {
            latency: section.latency(),
            ready_timeout: section.ready_timeout(),
            drain_timeout: section.drain_timeout(),
            recent_root_threshold: section.recent_root_threshold(),
            sentinel_name: section.sentinel.clone(),
            exclude: section.exclude.clone(),
        }
    }
}

/// Runs a unit of work while recording every file it touches under a root.
#[derive(Debug, Clone)]
pub struct Observer {
    options: ObserveOptions,
    flush: Arc<dyn PreWatchFlush>,
}

impl Default for Observer {
    fn default() -> Self {
        Self::new(ObserveOptions::default())
    }
}

impl Observer {
    pub fn new(options: ObserveOptions) -> Self {
        Self {
            options,
            flush: Arc::new(NoopFlush),
        }
    }

    /// Build an observer from a validated `[observe]` section, including its
    /// flush strategy.
    pub fn from_section(section: &ObserveSection) -> Self {
        Self::new(ObserveOptions::from(section)).with_flush(flush_hook_for(section.flush))
    }

    pub fn with_flush(mut self, flush: Arc<dyn PreWatchFlush>) -> Self {
        self.flush = flush;
        self
    }

    pub fn options(&self) -> &ObserveOptions {
        &self.options
    }

    /// Run `work` with a recursive watch on `root` and return the files that
    /// received change notifications.
    ///
    /// The watch is active before `work` starts. Once `work` finishes, a
    /// sentinel file is touched under `root` and this call waits until its
    /// event comes through, so every earlier event has been consumed. The
    /// sentinel is removed before returning, on success and on failure.
    ///
    /// If `work` fails, the watch is still drained and the failure is
    /// returned as [`ChangetarError::WorkFailed`]; the partial set is dropped.
    /// If `work` panics or the returned future is dropped, the watch is torn
    /// down without draining.
    pub async fn observe<W, Fut>(&self, root: impl AsRef<Path>, work: W) -> Result<AffectedPathSet>
    where
        W: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<()>>,
    {
        let root = resolve_root(root.as_ref())?;
        let exclude = ExcludeSet::new(&self.options.exclude)?;

        flush_if_recent(&root, self.options.recent_root_threshold, self.flush.as_ref());

        let collector = EventCollector::new(root.clone(), &self.options.sentinel_name, exclude);
        let sentinel = collector.sentinel_path().to_path_buf();
        let phase = PhaseTracker::new();
        // Aborted on drop, so the watch never outlives this call.
        let mut watch_task =
            WatchTask(spawn_watch_task(collector, self.options.latency, phase.clone()));

        self.await_ready(&phase, &mut watch_task).await?;

        debug!(root = ?root, "running observed work");
        let work_result = work().await;
        if let Err(err) = &work_result {
            warn!(root = ?root, error = %err, "observed work failed; draining watch");
        }

        let drained = match SentinelGuard::touch(&sentinel) {
            Ok(guard) => {
                phase.advance(ObservationPhase::Draining);
                let drained = self.await_drain(&mut watch_task).await;
                drop(guard);
                drained
            }
            Err(err) => Err(ChangetarError::IoError(err)),
        };
        drop(watch_task);

        match (work_result, drained) {
            (Err(work_err), drained) => {
                if let Err(drain_err) = drained {
                    warn!(error = %drain_err, "watch did not drain cleanly after failed work");
                }
                Err(ChangetarError::WorkFailed(work_err))
            }
            (Ok(()), Err(drain_err)) => Err(drain_err),
            (Ok(()), Ok(paths)) => {
                info!(root = ?root, affected = paths.len(), "observation complete");
                Ok(paths)
            }
        }
    }

    async fn await_ready(&self, phase: &PhaseTracker, watch_task: &mut WatchTask) -> Result<()> {
        tokio::select! {
            biased;
            res = phase.wait_watching(self.options.ready_timeout) => res,
            joined = &mut watch_task.0 => match joined {
                Ok(Err(err)) => Err(err),
                Ok(Ok(_)) => Err(ChangetarError::Other(anyhow!(
                    "watch task finished before the watch was armed"
                ))),
                Err(join_err) => Err(ChangetarError::Other(join_err.into())),
            },
        }
    }

    async fn await_drain(&self, watch_task: &mut WatchTask) -> Result<AffectedPathSet> {
        let joined = match self.options.drain_timeout {
            Some(limit) => timeout(limit, &mut watch_task.0)
                .await
                .map_err(|_| ChangetarError::DrainTimeout(limit))?,
            None => (&mut watch_task.0).await,
        };

        joined.map_err(|join_err| ChangetarError::Other(join_err.into()))?
    }
}

/// Handle of the watch task; aborts the task when dropped.
#[derive(Debug)]
struct WatchTask(JoinHandle<Result<AffectedPathSet>>);

impl Drop for WatchTask {
    fn drop(&mut self) {
        if !self.0.is_finished() {
            debug!("aborting watch task");
            self.0.abort();
        }
    }
}

fn resolve_root(root: &Path) -> Result<PathBuf> {
    let not_found = |source| ChangetarError::RootNotFound {
        path: root.to_path_buf(),
        source,
    };

    let canonical = fs::canonicalize(root).map_err(not_found)?;
    let meta = fs::metadata(&canonical).map_err(not_found)?;
    if !meta.is_dir() {
        return Err(not_found(io::Error::new(
            io::ErrorKind::NotADirectory,
            "not a directory",
        )));
    }
    Ok(canonical)
}

/// The sentinel file; removed again when dropped.
#[derive(Debug)]
struct SentinelGuard {
    path: PathBuf,
}

impl SentinelGuard {
    fn touch(path: &Path) -> io::Result<Self> {
        OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(path)?;
        debug!(sentinel = ?path, "sentinel touched");
        Ok(Self {
            path: path.to_path_buf(),
        })
    }
}

impl Drop for SentinelGuard {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => warn!(sentinel = ?self.path, error = %err, "failed to remove sentinel"),
        }
    }
}
