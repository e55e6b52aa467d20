// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::types::FlushStrategy;

/// Command-line arguments for `changetar`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "changetar",
    version,
    about = "Run a command and capture every file it changes under a directory as a tar.gz.",
    long_about = None
)]
pub struct CliArgs {
    /// Directory to observe. The command also runs from here.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub root: PathBuf,

    /// Where to write the archive.
    ///
    /// If omitted, a fresh `filechanges*.tgz` in the temp directory is used.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Path to a config file (TOML).
    ///
    /// Default: `Changetar.toml` in the root, if present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Event batching window in milliseconds.
    #[arg(long, value_name = "MS")]
    pub latency_ms: Option<u64>,

    /// Give up if the watch is not active after this long (0 = never).
    #[arg(long, value_name = "MS")]
    pub ready_timeout_ms: Option<u64>,

    /// Give up if the watch has not drained after this long (0 = never).
    #[arg(long, value_name = "MS")]
    pub drain_timeout_ms: Option<u64>,

    /// Flush to apply before watching a freshly created root.
    #[arg(long, value_enum, value_name = "STRATEGY")]
    pub flush: Option<FlushStrategy>,

    /// Root-relative glob of paths to leave out. Repeatable; added to the
    /// config file's list.
    #[arg(long = "exclude", value_name = "GLOB")]
    pub exclude: Vec<String>,

    /// Also print the name of every archived file.
    #[arg(long)]
    pub list: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `CHANGETAR_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Print the effective settings without running anything.
    #[arg(long)]
    pub dry_run: bool,

    /// The command to run, after `--`.
    #[arg(last = true, value_name = "COMMAND", required_unless_present = "dry_run")]
    pub command: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
