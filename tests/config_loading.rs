// tests/config_loading.rs

use std::error::Error;
use std::fs;
use std::io::Write;
use std::time::Duration;

use clap::Parser;
use tempfile::{NamedTempFile, tempdir};

use changetar::cli::CliArgs;
use changetar::config::model::DEFAULT_SENTINEL;
use changetar::config::{ConfigFile, default_config_path, load_and_validate, resolve_config};
use changetar::effective_config;
use changetar::errors::ChangetarError;
use changetar::observe::ObserveOptions;
use changetar::types::FlushStrategy;
use changetar_test_utils::builders::ConfigFileBuilder;

type TestResult = Result<(), Box<dyn Error>>;

fn config_file(contents: &str) -> Result<NamedTempFile, Box<dyn Error>> {
    let mut file = NamedTempFile::new()?;
    write!(file, "{}", contents)?;
    Ok(file)
}

#[test]
fn defaults_apply_without_a_config_file() -> TestResult {
    let dir = tempdir()?;
    let cfg = resolve_config(None, dir.path())?;

    assert_eq!(cfg.observe.latency_ms, 10);
    assert_eq!(cfg.observe.ready_timeout_ms, 5_000);
    assert_eq!(cfg.observe.drain_timeout_ms, 10_000);
    assert_eq!(cfg.observe.recent_root_secs, 5);
    assert_eq!(cfg.observe.sentinel, DEFAULT_SENTINEL);
    assert_eq!(cfg.observe.flush, FlushStrategy::Disabled);
    assert!(cfg.observe.exclude.is_empty());
    assert_eq!(cfg.archive.compression_level, 6);

    Ok(())
}

#[test]
fn full_config_is_parsed() -> TestResult {
    let file = config_file(
        r#"
[observe]
latency_ms = 25
ready_timeout_ms = 0
drain_timeout_ms = 2500
recent_root_secs = 1
sentinel = ".drain-me"
flush = "fsync-root"
exclude = ["target/**", "**/*.swp"]

[archive]
compression_level = 9
"#,
    )?;

    let cfg = load_and_validate(file.path())?;
    let options = ObserveOptions::from(&cfg.observe);

    assert_eq!(options.latency, Duration::from_millis(25));
    assert_eq!(options.ready_timeout, None);
    assert_eq!(options.drain_timeout, Some(Duration::from_millis(2500)));
    assert_eq!(options.recent_root_threshold, Duration::from_secs(1));
    assert_eq!(options.sentinel_name, ".drain-me");
    assert_eq!(options.exclude, vec!["target/**", "**/*.swp"]);
    assert_eq!(cfg.observe.flush, FlushStrategy::FsyncRoot);
    assert_eq!(cfg.archive.compression_level, 9);

    Ok(())
}

#[test]
fn config_in_root_is_picked_up() -> TestResult {
    let dir = tempdir()?;
    fs::write(
        default_config_path(dir.path()),
        "[observe]\nlatency_ms = 42\n",
    )?;

    let cfg = resolve_config(None, dir.path())?;
    assert_eq!(cfg.observe.latency_ms, 42);

    Ok(())
}

#[test]
fn sentinel_with_a_separator_is_rejected() -> TestResult {
    let file = config_file("[observe]\nsentinel = \"nested/marker\"\n")?;

    match load_and_validate(file.path()) {
        Err(ChangetarError::ConfigError(msg)) => {
            assert!(msg.contains("sentinel"));
            assert!(msg.contains("nested/marker"));
        }
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }

    Ok(())
}

#[test]
fn dot_dot_sentinel_is_rejected() {
    let result = validate(ConfigFileBuilder::new().sentinel(".."));
    assert!(matches!(result, Err(ChangetarError::ConfigError(_))));
}

fn validate(builder: ConfigFileBuilder) -> Result<ConfigFile, ChangetarError> {
    ConfigFile::try_from(builder.raw())
}

#[test]
fn zero_latency_is_rejected() {
    let result = validate(ConfigFileBuilder::new().latency_ms(0));
    match result {
        Err(ChangetarError::ConfigError(msg)) => assert!(msg.contains("latency_ms")),
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn compression_level_above_nine_is_rejected() {
    let result = validate(ConfigFileBuilder::new().compression_level(10));
    assert!(matches!(result, Err(ChangetarError::ConfigError(_))));
}

#[test]
fn invalid_exclude_glob_is_rejected() {
    let result = validate(ConfigFileBuilder::new().exclude("src/[oops"));
    match result {
        Err(ChangetarError::ConfigError(msg)) => assert!(msg.contains("src/[oops")),
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn unknown_keys_are_a_toml_error() -> TestResult {
    let file = config_file("[observe]\nlatency = 10\n")?;

    assert!(matches!(
        load_and_validate(file.path()),
        Err(ChangetarError::TomlError(_))
    ));

    Ok(())
}

#[test]
fn flush_strategy_parses_from_str() {
    assert_eq!("none".parse::<FlushStrategy>(), Ok(FlushStrategy::Disabled));
    assert_eq!("FSYNC-ROOT".parse::<FlushStrategy>(), Ok(FlushStrategy::FsyncRoot));
    assert!("sometimes".parse::<FlushStrategy>().is_err());
}

#[test]
fn cli_flags_override_the_config_file() -> TestResult {
    let dir = tempdir()?;
    fs::write(
        default_config_path(dir.path()),
        "[observe]\nlatency_ms = 42\nexclude = [\"*.log\"]\n",
    )?;
    let root = dir.path().to_string_lossy().into_owned();

    let args = CliArgs::try_parse_from([
        "changetar",
        "--root",
        root.as_str(),
        "--latency-ms",
        "7",
        "--drain-timeout-ms",
        "0",
        "--flush",
        "fsync-root",
        "--exclude",
        "tmp/**",
        "--",
        "touch",
        "x",
    ])?;
    assert_eq!(args.command, vec!["touch", "x"]);

    let cfg = effective_config(&args)?;
    assert_eq!(cfg.observe.latency_ms, 7);
    assert_eq!(cfg.observe.drain_timeout(), None);
    assert_eq!(cfg.observe.flush, FlushStrategy::FsyncRoot);
    assert_eq!(cfg.observe.exclude, vec!["*.log", "tmp/**"]);

    Ok(())
}

#[test]
fn cli_requires_a_command_unless_dry_run() {
    assert!(CliArgs::try_parse_from(["changetar"]).is_err());
    assert!(CliArgs::try_parse_from(["changetar", "--dry-run"]).is_ok());
}

#[test]
fn invalid_cli_override_is_validated() -> TestResult {
    let dir = tempdir()?;
    let root = dir.path().to_string_lossy().into_owned();
    let args = CliArgs::try_parse_from([
        "changetar",
        "--root",
        root.as_str(),
        "--latency-ms",
        "0",
        "--",
        "true",
    ])?;

    assert!(matches!(
        effective_config(&args),
        Err(ChangetarError::ConfigError(_))
    ));

    Ok(())
}
