// src/lib.rs

pub mod archive;
pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod observe;
pub mod types;

use std::future::Future;
use std::path::{Path, PathBuf};

use anyhow::Result;
use flate2::Compression;
use tracing::{debug, info};

use crate::archive::{ArchiveSummary, build_archive_with, gen_tempfile_path};
use crate::cli::CliArgs;
use crate::config::{ConfigFile, RawConfigFile, resolve_config};
use crate::errors::ChangetarError;
use crate::exec::CommandWork;
use crate::fs::RealFileSystem;
use crate::observe::Observer;

/// Run `work` under `observer` and pack every file it touched below `root`
/// into a tar.gz at `to` (or a fresh temp path).
pub async fn tar_changes<W, Fut>(
    observer: &Observer,
    root: impl AsRef<Path>,
    to: Option<PathBuf>,
    work: W,
) -> errors::Result<ArchiveSummary>
where
    W: FnOnce() -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
{
    tar_changes_with(observer, root, to, Compression::default(), work).await
}

/// [`tar_changes`] with an explicit gzip level.
pub async fn tar_changes_with<W, Fut>(
    observer: &Observer,
    root: impl AsRef<Path>,
    to: Option<PathBuf>,
    compression: Compression,
    work: W,
) -> errors::Result<ArchiveSummary>
where
    W: FnOnce() -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
{
    let paths = observer.observe(root, work).await?;

    let destination = match to {
        Some(path) => path,
        None => gen_tempfile_path()?,
    };
    debug!(archive = ?destination, affected = paths.len(), "building archive");

    tokio::task::spawn_blocking(move || {
        build_archive_with(
            &RealFileSystem,
            paths.iter(),
            paths.root(),
            &destination,
            compression,
        )
    })
    .await
    .map_err(|join_err| ChangetarError::Other(join_err.into()))?
}

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and CLI overrides
/// - the observer
/// - the command run as the unit of work
/// - archive output
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = effective_config(&args)?;

    if args.dry_run {
        print_dry_run(&args, &cfg);
        return Ok(());
    }

    let observer = Observer::from_section(&cfg.observe);
    let work = CommandWork::from_argv(&args.command, &args.root)?;
    let compression = Compression::new(cfg.archive.compression_level);

    info!(root = ?args.root, cmd = %work.display(), "capturing changes");

    let summary = tar_changes_with(
        &observer,
        &args.root,
        args.output.clone(),
        compression,
        || work.run(),
    )
    .await?;

    if args.list {
        for entry in summary.entries.iter() {
            println!("{entry}");
        }
    }
    println!("{}", summary.path.display());

    Ok(())
}

/// Config file (explicit, from the root, or defaults) with CLI flags applied
/// on top, validated once more as a whole.
pub fn effective_config(args: &CliArgs) -> errors::Result<ConfigFile> {
    let base = resolve_config(args.config.as_deref(), &args.root)?;

    let mut raw = RawConfigFile {
        observe: base.observe,
        archive: base.archive,
    };
    if let Some(ms) = args.latency_ms {
        raw.observe.latency_ms = ms;
    }
    if let Some(ms) = args.ready_timeout_ms {
        raw.observe.ready_timeout_ms = ms;
    }
    if let Some(ms) = args.drain_timeout_ms {
        raw.observe.drain_timeout_ms = ms;
    }
    if let Some(flush) = args.flush {
        raw.observe.flush = flush;
    }
    raw.observe.exclude.extend(args.exclude.iter().cloned());

    ConfigFile::try_from(raw)
}

/// Simple dry-run output: the settings an observation would use.
fn print_dry_run(args: &CliArgs, cfg: &ConfigFile) {
    let observe = &cfg.observe;
    println!("changetar dry-run");
    println!("  root = {}", args.root.display());
    match args.output {
        Some(ref path) => println!("  output = {}", path.display()),
        None => println!("  output = <temp file>"),
    }
    if !args.command.is_empty() {
        println!("  command = {:?}", args.command);
    }
    println!();

    println!("observe:");
    println!("  latency_ms = {}", observe.latency_ms);
    println!("  ready_timeout_ms = {}", observe.ready_timeout_ms);
    println!("  drain_timeout_ms = {}", observe.drain_timeout_ms);
    println!("  recent_root_secs = {}", observe.recent_root_secs);
    println!("  sentinel = {}", observe.sentinel);
    println!("  flush = {:?}", observe.flush);
    if !observe.exclude.is_empty() {
        println!("  exclude = {:?}", observe.exclude);
    }
    println!("archive:");
    println!("  compression_level = {}", cfg.archive.compression_level);

    debug!("dry-run complete (nothing observed)");
}
