// src/transform/clean.rs

//! Removes generated files and directories before a full build.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::PathConfig;
use crate::transform::glob::expand_entries;
use crate::transform::{
    TransformFuture, TransformOutput, TransformResult, TransformUnit, io_err,
    spawn_blocking_transform,
};

/// Deletes every match of a list of globs; directories are removed
/// recursively. Reports nothing as written.
#[derive(Debug, Clone)]
pub struct CleanUnit {
    root: PathBuf,
    patterns: Vec<String>,
}

impl CleanUnit {
    pub fn new(root: impl Into<PathBuf>, patterns: Vec<String>) -> Self {
        Self {
            root: root.into(),
            patterns,
        }
    }

    pub fn from_paths(root: &Path, paths: &PathConfig) -> Self {
        Self::new(root, paths.clean.clone())
    }

    fn run(&self) -> TransformResult<TransformOutput> {
        let mut removed = 0usize;
        for pattern in &self.patterns {
            for entry in expand_entries(&self.root, pattern)? {
                let path = &entry.path;
                if path.is_dir() {
                    std::fs::remove_dir_all(path).map_err(io_err(path))?;
                } else if path.exists() {
                    std::fs::remove_file(path).map_err(io_err(path))?;
                }
                debug!(path = ?path, "removed");
                removed += 1;
            }
        }
        debug!(removed, "clean finished");
        Ok(TransformOutput::default())
    }
}

impl TransformUnit for CleanUnit {
    fn name(&self) -> &str {
        "clean"
    }

    fn invoke(&self) -> TransformFuture<'_> {
        let unit = self.clone();
        spawn_blocking_transform(move || unit.run())
    }
}
