// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

use crate::types::FlushStrategy;

/// Name of the marker file touched under the root once the work is done.
pub const DEFAULT_SENTINEL: &str = ".__observe_files_break_now__";

/// Configuration exactly as deserialized from TOML, before validation.
///
/// ```toml
/// [observe]
/// latency_ms = 10
/// ready_timeout_ms = 5000
/// drain_timeout_ms = 10000
/// recent_root_secs = 5
/// sentinel = ".__observe_files_break_now__"
/// flush = "none"
/// exclude = ["**/*.swp"]
///
/// [archive]
/// compression_level = 6
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub observe: ObserveSection,

    #[serde(default)]
    pub archive: ArchiveSection,
}

/// Validated configuration. Only constructible through
/// `ConfigFile::try_from(RawConfigFile)` or `ConfigFile::default()`.
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    pub observe: ObserveSection,
    pub archive: ArchiveSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(observe: ObserveSection, archive: ArchiveSection) -> Self {
        Self { observe, archive }
    }
}

/// `[observe]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObserveSection {
    /// How long a batch of events is collected before it is processed.
    #[serde(default = "default_latency_ms")]
    pub latency_ms: u64,

    /// Upper bound on waiting for the watch to become active. `0` waits forever.
    #[serde(default = "default_ready_timeout_ms")]
    pub ready_timeout_ms: u64,

    /// Upper bound on waiting for the sentinel event. `0` waits forever.
    #[serde(default = "default_drain_timeout_ms")]
    pub drain_timeout_ms: u64,

    /// Roots whose change time is younger than this get the pre-watch flush.
    #[serde(default = "default_recent_root_secs")]
    pub recent_root_secs: u64,

    /// File name of the sentinel created directly under the root.
    #[serde(default = "default_sentinel")]
    pub sentinel: String,

    #[serde(default)]
    pub flush: FlushStrategy,

    /// Glob patterns, relative to the root, for paths never recorded.
    #[serde(default)]
    pub exclude: Vec<String>,
}

fn default_latency_ms() -> u64 {
    10
}

fn default_ready_timeout_ms() -> u64 {
    5_000
}

fn default_drain_timeout_ms() -> u64 {
    10_000
}

fn default_recent_root_secs() -> u64 {
    5
}

fn default_sentinel() -> String {
    DEFAULT_SENTINEL.to_string()
}

impl Default for ObserveSection {
    fn default() -> Self {
        Self {
            latency_ms: default_latency_ms(),
            ready_timeout_ms: default_ready_timeout_ms(),
            drain_timeout_ms: default_drain_timeout_ms(),
            recent_root_secs: default_recent_root_secs(),
            sentinel: default_sentinel(),
            flush: FlushStrategy::default(),
            exclude: Vec::new(),
        }
    }
}

impl ObserveSection {
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }

    pub fn ready_timeout(&self) -> Option<Duration> {
        non_zero_millis(self.ready_timeout_ms)
    }

    pub fn drain_timeout(&self) -> Option<Duration> {
        non_zero_millis(self.drain_timeout_ms)
    }

    pub fn recent_root_threshold(&self) -> Duration {
        Duration::from_secs(self.recent_root_secs)
    }
}

fn non_zero_millis(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

/// `[archive]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArchiveSection {
    /// gzip level, 0 (store) to 9 (best).
    #[serde(default = "default_compression_level")]
    pub compression_level: u32,
}

fn default_compression_level() -> u32 {
    6
}

impl Default for ArchiveSection {
    fn default() -> Self {
        Self {
            compression_level: default_compression_level(),
        }
    }
}
