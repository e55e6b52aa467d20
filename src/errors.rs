// src/errors.rs

//! Crate-wide error type and result alias.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChangetarError {
    #[error("observation root {path:?} is not an accessible directory: {source}")]
    RootNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("work failed: {0:#}")]
    WorkFailed(anyhow::Error),

    #[error("failed writing archive {path:?}: {source}")]
    ArchiveIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed reading {path:?} for archiving: {source}")]
    SourceIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("path {path:?} is not under observation root {root:?}")]
    PathOutsideRoot { path: PathBuf, root: PathBuf },

    #[error("file watch did not become ready within {0:?}")]
    WatchNotReady(Duration),

    #[error("sentinel event was not observed within {0:?}")]
    DrainTimeout(Duration),

    #[error("file watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, ChangetarError>;
