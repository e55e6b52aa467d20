#![allow(dead_code)]

use changetar::config::{ConfigFile, RawConfigFile};
use changetar::observe::{ObserveOptions, Observer};
use changetar::types::FlushStrategy;

/// Builder for `RawConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn latency_ms(mut self, ms: u64) -> Self {
        self.config.observe.latency_ms = ms;
        self
    }

    pub fn drain_timeout_ms(mut self, ms: u64) -> Self {
        self.config.observe.drain_timeout_ms = ms;
        self
    }

    pub fn sentinel(mut self, name: &str) -> Self {
        self.config.observe.sentinel = name.to_string();
        self
    }

    pub fn flush(mut self, flush: FlushStrategy) -> Self {
        self.config.observe.flush = flush;
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        self.config.observe.exclude.push(pattern.to_string());
        self
    }

    pub fn compression_level(mut self, level: u32) -> Self {
        self.config.archive.compression_level = level;
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }

    /// Observer configured from the built `[observe]` section.
    pub fn observer(self) -> Observer {
        Observer::from_section(&self.build().observe)
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Observer with default options; the default timeouts keep a broken watch
/// from hanging a test.
pub fn default_observer() -> Observer {
    Observer::new(ObserveOptions::default())
}
