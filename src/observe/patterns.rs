// src/observe/patterns.rs

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

/// Compiled `exclude` globs, evaluated against root-relative paths such as
/// `"target/debug/foo"`.
#[derive(Clone, Default)]
pub struct ExcludeSet {
    set: Option<GlobSet>,
}

impl fmt::Debug for ExcludeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExcludeSet")
            .field("patterns", &self.set.as_ref().map_or(0, GlobSet::len))
            .finish()
    }
}

impl ExcludeSet {
    pub fn new(patterns: &[String]) -> Result<Self> {
        if patterns.is_empty() {
            return Ok(Self { set: None });
        }
        let set = build_globset(patterns).context("building exclude globset")?;
        Ok(Self { set: Some(set) })
    }

    pub fn is_excluded(&self, rel_path: &Path) -> bool {
        self.set.as_ref().is_some_and(|set| set.is_match(rel_path))
    }
}

/// Build a GlobSet from simple string patterns.
fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}
