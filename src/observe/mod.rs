// src/observe/mod.rs

//! Observing which files a unit of work touches.
//!
//! This module is responsible for:
//! - Arming a recursive filesystem watch (`notify`) on a dedicated task.
//! - Running the caller's work only once the watch is live.
//! - Draining the event stream with a sentinel file so nothing written by
//!   the work is missed.
//! - Collecting the touched file paths into an [`AffectedPathSet`].
//!
//! It does **not** know about archives; see [`crate::archive`] for that.

pub mod collector;
pub mod event;
pub mod flush;
pub mod observer;
pub mod patterns;
pub mod state;
pub mod watcher;

pub use collector::{AffectedPathSet, BatchOutcome, EventCollector};
pub use event::{ChangeEvent, EventFlags};
pub use flush::{FsyncRootFlush, NoopFlush, PreWatchFlush, flush_hook_for, flush_if_recent};
pub use observer::{ObserveOptions, Observer};
pub use patterns::ExcludeSet;
pub use state::{ObservationPhase, PhaseTracker};
