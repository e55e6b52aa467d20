// src/observe/state.rs

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::timeout;
use tracing::debug;

use crate::errors::{ChangetarError, Result};

/// Lifecycle of a single observation.
///
/// `NotStarted -> Watching` once the watch is armed, `Watching -> Draining`
/// once the sentinel has been touched, `Draining -> Stopped` once the
/// sentinel event has been consumed and the watch loop has exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ObservationPhase {
    NotStarted,
    Watching,
    Draining,
    Stopped,
}

/// Phase shared between the caller task and the watch task.
///
/// Clones observe the same phase. Transitions only move forward; asking for
/// an earlier or equal phase is a no-op.
#[derive(Debug, Clone)]
pub struct PhaseTracker {
    tx: Arc<watch::Sender<ObservationPhase>>,
}

impl Default for PhaseTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseTracker {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ObservationPhase::NotStarted);
        Self { tx: Arc::new(tx) }
    }

    pub fn current(&self) -> ObservationPhase {
        *self.tx.borrow()
    }

    /// Move to `next` if it is later than the current phase. Returns whether
    /// the phase changed.
    pub fn advance(&self, next: ObservationPhase) -> bool {
        let changed = self.tx.send_if_modified(|phase| {
            if next > *phase {
                *phase = next;
                true
            } else {
                false
            }
        });
        if changed {
            debug!(phase = ?next, "observation phase advanced");
        }
        changed
    }

    /// Wait until the phase is at least `target`.
    pub async fn wait_for(&self, target: ObservationPhase) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so the channel cannot close here.
        let _ = rx.wait_for(|phase| *phase >= target).await;
    }

    /// Wait until the watch is armed, for at most `limit` (`None` waits
    /// forever).
    pub async fn wait_watching(&self, limit: Option<Duration>) -> Result<()> {
        match limit {
            Some(limit) => timeout(limit, self.wait_for(ObservationPhase::Watching))
                .await
                .map_err(|_| ChangetarError::WatchNotReady(limit)),
            None => {
                self.wait_for(ObservationPhase::Watching).await;
                Ok(())
            }
        }
    }
}
