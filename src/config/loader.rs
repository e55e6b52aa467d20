// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** validate values.
/// Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and run validation.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Name of the config file picked up from the observation root when no
/// explicit `--config` is given.
pub fn default_config_path(root: &Path) -> PathBuf {
    root.join("Changetar.toml")
}

/// Resolve the effective configuration:
///
/// - an explicit path must exist and is loaded,
/// - otherwise `Changetar.toml` under `root` is loaded if present,
/// - otherwise built-in defaults apply.
pub fn resolve_config(explicit: Option<&Path>, root: &Path) -> Result<ConfigFile> {
    if let Some(path) = explicit {
        debug!(path = ?path, "loading explicit config");
        return load_and_validate(path);
    }

    let candidate = default_config_path(root);
    if candidate.is_file() {
        debug!(path = ?candidate, "loading config from observation root");
        return load_and_validate(candidate);
    }

    debug!("no config file found; using defaults");
    Ok(ConfigFile::default())
}
