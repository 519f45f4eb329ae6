// src/transform/glob.rs

//! Glob expansion against a project root.
//!
//! Patterns are relative to the root, use `/` separators, and `*` does not
//! cross directory boundaries (`**` does). Each match also carries its path
//! below the pattern's static base, so `src/app/fonts/**/*.*` maps
//! `src/app/fonts/a/b.woff` to `a/b.woff`.

use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};
use walkdir::WalkDir;

use crate::transform::{TransformError, TransformResult};

/// One file or directory matched by a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobMatch {
    /// Absolute (root-joined) path.
    pub path: PathBuf,
    /// Path below the pattern's static base.
    pub relative: PathBuf,
}

/// Compile a pattern with directory-aware `*`.
pub fn compile(pattern: &str) -> TransformResult<GlobMatcher> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map(|g| g.compile_matcher())
        .map_err(|source| TransformError::Glob {
            pattern: pattern.to_string(),
            source,
        })
}

fn has_wildcard(component: &str) -> bool {
    component.contains(['*', '?', '[', '{'])
}

/// Leading directory of `pattern` that contains no wildcard.
///
/// For a literal file path this is its parent directory.
pub fn static_base(pattern: &str) -> &str {
    let components: Vec<&str> = pattern.split('/').collect();
    let split_idx = components
        .iter()
        .position(|c| has_wildcard(c))
        .unwrap_or(components.len().saturating_sub(1));

    if split_idx == 0 {
        return "";
    }
    // Byte length of the first `split_idx` components plus separators.
    let len: usize = components[..split_idx].iter().map(|c| c.len()).sum::<usize>() + split_idx - 1;
    &pattern[..len]
}

/// Path of `path` relative to `root` with `/` separators.
pub fn slash_relative(root: &Path, path: &Path) -> Option<String> {
    path.strip_prefix(root)
        .ok()
        .map(|rel| rel.to_string_lossy().replace('\\', "/"))
}

/// Expand `pattern` to the files it matches under `root`, sorted by path.
///
/// A missing static base is not an error; it simply matches nothing.
pub fn expand(root: &Path, pattern: &str) -> TransformResult<Vec<GlobMatch>> {
    expand_inner(root, pattern, false)
}

/// Like [`expand`], but directories can match too. A matched directory is
/// reported once and not descended into.
pub fn expand_entries(root: &Path, pattern: &str) -> TransformResult<Vec<GlobMatch>> {
    expand_inner(root, pattern, true)
}

fn expand_inner(root: &Path, pattern: &str, include_dirs: bool) -> TransformResult<Vec<GlobMatch>> {
    let matcher = compile(pattern)?;
    let base_str = static_base(pattern);
    let base = if base_str.is_empty() {
        root.to_path_buf()
    } else {
        root.join(base_str)
    };

    if !base.is_dir() {
        return Ok(Vec::new());
    }

    let mut matches = Vec::new();
    let mut walker = WalkDir::new(&base).min_depth(1).sort_by_file_name().into_iter();

    while let Some(entry) = walker.next() {
        let entry = entry.map_err(|source| TransformError::Walk {
            path: base.clone(),
            source,
        })?;
        let is_dir = entry.file_type().is_dir();
        if is_dir && !include_dirs {
            continue;
        }

        let Some(rel_to_root) = slash_relative(root, entry.path()) else {
            continue;
        };
        if !matcher.is_match(&rel_to_root) {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(&base)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| entry.path().to_path_buf());
        matches.push(GlobMatch {
            path: entry.path().to_path_buf(),
            relative,
        });

        if is_dir {
            walker.skip_current_dir();
        }
    }

    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_base_stops_at_first_wildcard() {
        assert_eq!(static_base("src/app/fonts/**/*.*"), "src/app/fonts");
        assert_eq!(static_base("src/dist/*"), "src/dist");
        assert_eq!(static_base("*.html"), "");
    }

    #[test]
    fn static_base_of_literal_file_is_parent() {
        assert_eq!(static_base("src/app/js/app.js"), "src/app/js");
        assert_eq!(static_base("app.js"), "");
    }

    #[test]
    fn star_does_not_cross_directories() {
        let m = compile("src/dist/*.html").unwrap();
        assert!(m.is_match("src/dist/index.html"));
        assert!(!m.is_match("src/dist/sub/index.html"));

        let deep = compile("src/app/styles/**/*.scss").unwrap();
        assert!(deep.is_match("src/app/styles/main.scss"));
        assert!(deep.is_match("src/app/styles/partials/_a.scss"));
    }
}
