// src/archive/path_utils.rs

//! Utility functions for naming archive entries.

use std::path::Path;

use crate::fs::FileSystem;

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// - First we try a direct `strip_prefix(root)`.
/// - If that fails (e.g. due to symlinks or different absolute prefixes),
///   we canonicalize both paths and try again.
/// - Only if both attempts fail do we give up.
///
/// Returns `None` if the path is not a descendant of `root`.
pub fn relative_name(fs: &dyn FileSystem, root: &Path, path: &Path) -> Option<String> {
    if let Some(name) = strip_to_name(root, path) {
        return Some(name);
    }

    // macOS in particular reports the same directory under different
    // absolute prefixes (/var vs /private/var).
    if let (Ok(root_canon), Ok(path_canon)) = (fs.canonicalize(root), fs.canonicalize(path)) {
        return strip_to_name(&root_canon, &path_canon);
    }

    None
}

fn strip_to_name(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    if rel.as_os_str().is_empty() {
        return None;
    }
    Some(rel.to_string_lossy().replace('\\', "/"))
}
