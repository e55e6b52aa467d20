// src/observe/event.rs

//! Backend-neutral change notifications.

use std::fs;
use std::path::{Path, PathBuf};

use notify::event::{AccessKind, AccessMode, CreateKind, ModifyKind, RemoveKind, RenameMode};
use notify::{Event, EventKind};

/// Per-event flags the collector cares about.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventFlags {
    /// The event concerns a directory rather than a file.
    pub is_dir: bool,
    /// The path came into existence (created, or renamed into place).
    pub created: bool,
    /// The path went away (removed, or renamed out of place).
    pub removed: bool,
}

/// One change notification for one absolute path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub path: PathBuf,
    pub flags: EventFlags,
}

impl ChangeEvent {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            flags: EventFlags::default(),
        }
    }

    pub fn dir(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            flags: EventFlags {
                is_dir: true,
                ..EventFlags::default()
            },
        }
    }

    pub fn created_dir(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            flags: EventFlags {
                is_dir: true,
                created: true,
                ..EventFlags::default()
            },
        }
    }

    /// A path that went away, with no hint about what it was.
    pub fn removed(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            flags: EventFlags {
                removed: true,
                ..EventFlags::default()
            },
        }
    }

    /// Split a `notify` event into one `ChangeEvent` per path.
    ///
    /// Read-only access notifications produce nothing. Whether a path is a
    /// directory comes from the event kind when the backend reports it, and
    /// from a live `lstat` otherwise, so a symlink is never a directory. A
    /// path that is already gone reads as a file here; the collector knows
    /// better for directories it has seen.
    pub fn from_notify(event: Event) -> Vec<ChangeEvent> {
        if !is_mutation(&event.kind) {
            return Vec::new();
        }

        let kind_is_dir = matches!(
            event.kind,
            EventKind::Create(CreateKind::Folder) | EventKind::Remove(RemoveKind::Folder)
        );

        event
            .paths
            .into_iter()
            .enumerate()
            .map(|(idx, path)| {
                let (created, removed) = lifecycle(&event.kind, idx);
                let is_dir = kind_is_dir || is_real_dir(&path);
                ChangeEvent {
                    path,
                    flags: EventFlags {
                        is_dir,
                        created,
                        removed,
                    },
                }
            })
            .collect()
    }
}

/// `(created, removed)` for the `idx`-th path of an event. A paired rename
/// lists the old path first and the new one second.
fn lifecycle(kind: &EventKind, idx: usize) -> (bool, bool) {
    match kind {
        EventKind::Create(_) => (true, false),
        EventKind::Remove(_) => (false, true),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => (true, false),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => (false, true),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => (idx > 0, idx == 0),
        _ => (false, false),
    }
}

fn is_real_dir(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok_and(|meta| meta.is_dir())
}

fn is_mutation(kind: &EventKind) -> bool {
    match kind {
        EventKind::Access(AccessKind::Close(AccessMode::Write)) => true,
        EventKind::Access(_) => false,
        _ => true,
    }
}
