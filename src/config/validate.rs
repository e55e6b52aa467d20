// src/config/validate.rs

use std::path::{Component, Path};

use globset::Glob;

use crate::config::model::{ArchiveSection, ConfigFile, ObserveSection, RawConfigFile};
use crate::errors::{ChangetarError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = ChangetarError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_observe(&raw.observe)?;
        validate_archive(&raw.archive)?;
        Ok(ConfigFile::new_unchecked(raw.observe, raw.archive))
    }
}

fn validate_observe(section: &ObserveSection) -> Result<()> {
    if section.latency_ms == 0 {
        return Err(ChangetarError::ConfigError(
            "[observe].latency_ms must be >= 1 (got 0)".to_string(),
        ));
    }

    validate_sentinel_name(&section.sentinel)?;

    for pattern in section.exclude.iter() {
        Glob::new(pattern).map_err(|e| {
            ChangetarError::ConfigError(format!(
                "[observe].exclude has invalid glob '{}': {}",
                pattern, e
            ))
        })?;
    }

    Ok(())
}

/// The sentinel lives directly under the root, so it must be one plain file
/// name: no separators, no `.`/`..`, not empty.
pub fn validate_sentinel_name(name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(ChangetarError::ConfigError(format!(
            "[observe].sentinel must be a single file name (got '{}')",
            name
        ))),
    }
}

fn validate_archive(section: &ArchiveSection) -> Result<()> {
    if section.compression_level > 9 {
        return Err(ChangetarError::ConfigError(format!(
            "[archive].compression_level must be between 0 and 9 (got {})",
            section.compression_level
        )));
    }
    Ok(())
}
