use std::str::FromStr;

use clap::ValueEnum;
use serde::Deserialize;

/// What to do before arming the watch on a root that was changed very
/// recently.
///
/// - `Disabled` (`"none"`): nothing (default).
/// - `FsyncRoot` (`"fsync-root"`): `fsync` the root directory so its entry is on disk before
///   the watch starts. Some backends miss events on freshly created
///   directories otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum FlushStrategy {
    #[default]
    #[serde(rename = "none")]
    #[value(name = "none")]
    Disabled,
    FsyncRoot,
}

impl FromStr for FlushStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(FlushStrategy::Disabled),
            "fsync-root" | "fsync_root" => Ok(FlushStrategy::FsyncRoot),
            other => Err(format!(
                "invalid flush strategy: {other} (expected \"none\" or \"fsync-root\")"
            )),
        }
    }
}
