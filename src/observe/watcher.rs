// src/observe/watcher.rs

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::anyhow;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, info, trace, warn};

use crate::errors::{ChangetarError, Result};
use crate::observe::collector::{AffectedPathSet, BatchOutcome, EventCollector};
use crate::observe::event::ChangeEvent;
use crate::observe::state::{ObservationPhase, PhaseTracker};

/// Spawn the task that owns the filesystem watch for one observation.
///
/// The task arms a recursive watch on the collector's root, advances `phase`
/// to `Watching`, then feeds batches of events into the collector until the
/// sentinel shows up. It resolves to the collected set, or to the error that
/// prevented the watch from starting.
pub fn spawn_watch_task(
    collector: EventCollector,
    latency: Duration,
    phase: PhaseTracker,
) -> JoinHandle<Result<AffectedPathSet>> {
    tokio::spawn(run_watch(collector, latency, phase))
}

async fn run_watch(
    mut collector: EventCollector,
    latency: Duration,
    phase: PhaseTracker,
) -> Result<AffectedPathSet> {
    let root = collector.root().to_path_buf();

    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<notify::Result<Event>>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| {
            // A closed receiver means the observation already finished.
            let _ = event_tx.send(res);
        },
        Config::default(),
    )?;
    watcher.watch(&root, RecursiveMode::Recursive)?;
    seed_known_dirs(&mut collector, &root);

    phase.advance(ObservationPhase::Watching);
    info!(root = ?root, latency_ms = latency.as_millis() as u64, "watch armed");

    while let Some(batch) = next_batch(&mut event_rx, latency).await {
        let events: Vec<ChangeEvent> = batch
            .into_iter()
            .filter_map(|res| match res {
                Ok(event) => {
                    trace!(?event, "received notify event");
                    if event.need_rescan() {
                        warn!(root = ?root, "watch backend dropped events; capture may be incomplete");
                    }
                    Some(event)
                }
                Err(err) => {
                    warn!(error = %err, "file watch error");
                    None
                }
            })
            .flat_map(ChangeEvent::from_notify)
            .collect();

        debug!(events = events.len(), "processing event batch");
        let outcome = collector.consume_batch(&events);

        for dir in collector.take_pending_scans() {
            scan_new_dir(&mut collector, &dir);
        }

        if outcome == BatchOutcome::SentinelSeen {
            drop(watcher);
            phase.advance(ObservationPhase::Stopped);
            let paths = collector.into_paths();
            info!(root = ?root, affected = paths.len(), "sentinel observed; watch stopped");
            return Ok(paths);
        }
    }

    Err(ChangetarError::Other(anyhow!(
        "watch event stream for {:?} closed before the sentinel was observed",
        root
    )))
}

/// Wait for the next event, then keep collecting for `latency` so bursts are
/// handled together. `None` once the channel is closed and empty.
async fn next_batch<T>(rx: &mut mpsc::UnboundedReceiver<T>, latency: Duration) -> Option<Vec<T>> {
    let first = rx.recv().await?;
    let mut batch = vec![first];

    let deadline = Instant::now() + latency;
    while let Ok(Some(next)) = timeout_at(deadline, rx.recv()).await {
        batch.push(next);
    }

    Some(batch)
}

/// Remember every directory that already exists under the root.
fn seed_known_dirs(collector: &mut EventCollector, root: &Path) {
    walk_tree(root, |path, is_dir| {
        if is_dir {
            collector.remember_dir(&path);
        }
    });
}

/// Record every file below a directory that appeared during the window.
///
/// Files written into a brand new directory can land before the backend has
/// a watch on it, so their own events may never arrive.
fn scan_new_dir(collector: &mut EventCollector, dir: &Path) {
    walk_tree(dir, |path, is_dir| {
        if is_dir {
            collector.remember_dir(&path);
        } else if collector.record_file(&path) {
            trace!(path = ?path, "recorded file from new directory");
        }
    });
}

/// Visit every entry below `dir` without following symlinks.
fn walk_tree(dir: &Path, mut visit: impl FnMut(PathBuf, bool)) {
    let mut stack = vec![dir.to_path_buf()];

    while let Some(current) = stack.pop() {
        let entries = match fs::read_dir(&current) {
            Ok(entries) => entries,
            Err(err) => {
                debug!(dir = ?current, error = %err, "skipping unreadable directory");
                continue;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            match entry.file_type() {
                Ok(ft) if ft.is_dir() => {
                    stack.push(path.clone());
                    visit(path, true);
                }
                Ok(_) => visit(path, false),
                Err(err) => debug!(path = ?path, error = %err, "cannot read file type"),
            }
        }
    }
}
