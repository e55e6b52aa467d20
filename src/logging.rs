// src/logging.rs

//! Logging setup for `changetar`.
//!
//! The filter is picked in this order:
//! 1. `--log-level` (applies to every target)
//! 2. `CHANGETAR_LOG`, either a bare level (`debug`) or full `EnvFilter`
//!    directives (`changetar=debug,notify=warn`)
//! 3. `info`
//!
//! Logs go to stderr; stdout carries only the archive path (and the entry
//! list with `--list`) so it can be piped.

use anyhow::{Result, anyhow};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::cli::LogLevel;

const LOG_ENV: &str = "CHANGETAR_LOG";

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = match cli_level {
        Some(level) => EnvFilter::default().add_directive(level_filter(level).into()),
        None => EnvFilter::try_from_env(LOG_ENV)
            .unwrap_or_else(|_| EnvFilter::default().add_directive(LevelFilter::INFO.into())),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!("failed to install log subscriber: {err}"))
}

fn level_filter(level: LogLevel) -> LevelFilter {
    match level {
        LogLevel::Error => LevelFilter::ERROR,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Trace => LevelFilter::TRACE,
    }
}
