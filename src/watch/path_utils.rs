// src/watch/path_utils.rs

//! Utility functions for path handling in the watcher.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::transform::glob::static_base;

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// - First we try a direct `strip_prefix(root)`.
/// - If that fails (e.g. symlinks or different absolute prefixes), both
///   paths are canonicalized and we try again.
///
/// Returns `None` if the path cannot be related to `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(rel.to_string_lossy().replace('\\', "/"));
    }

    // macOS reports /private/var/... for /var/... and similar.
    if let (Ok(root_canon), Ok(path_canon)) = (root.canonicalize(), path.canonicalize()) {
        if let Ok(rel) = path_canon.strip_prefix(&root_canon) {
            return Some(rel.to_string_lossy().replace('\\', "/"));
        }
    }

    None
}

/// Directory to watch for `pattern`: its static base, or the closest
/// existing ancestor of it inside `root` when the base does not exist yet.
pub fn watch_root_for(root: &Path, pattern: &str) -> PathBuf {
    let mut dir = root.join(static_base(pattern));
    while !dir.is_dir() && dir != root {
        match dir.parent() {
            Some(parent) => dir = parent.to_path_buf(),
            None => break,
        }
    }
    dir
}

/// Reduce a set of directories to the minimal set of recursive watch roots.
///
/// If both `/a` and `/a/b` are present only `/a` is kept.
pub fn collapse_watch_roots(paths: impl IntoIterator<Item = PathBuf>) -> Vec<PathBuf> {
    let sorted: BTreeSet<PathBuf> = paths.into_iter().collect();

    let mut kept: Vec<PathBuf> = Vec::new();
    for path in sorted {
        if kept.last().is_some_and(|last| path.starts_with(last)) {
            continue;
        }
        kept.push(path);
    }
    kept
}
