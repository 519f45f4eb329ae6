// src/watch/patterns.rs

use std::fmt;
use std::sync::Arc;

use globset::GlobMatcher;

use crate::errors::{AssetdagError, Result};
use crate::transform::TransformUnit;
use crate::transform::glob::compile;

/// A glob bound to the action re-run when a matching file changes.
///
/// Patterns are relative to the project root; the watcher passes relative
/// paths such as `"src/app/styles/main.scss"` into [`WatchBinding::matches`].
#[derive(Clone)]
pub struct WatchBinding {
    pattern: String,
    matcher: GlobMatcher,
    action: Arc<dyn TransformUnit>,
}

impl fmt::Debug for WatchBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchBinding")
            .field("pattern", &self.pattern)
            .field("action", &self.action.name())
            .finish()
    }
}

impl WatchBinding {
    pub fn new(pattern: impl Into<String>, action: Arc<dyn TransformUnit>) -> Result<Self> {
        let pattern = pattern.into();
        let matcher = compile(&pattern)
            .map_err(|e| AssetdagError::ConfigError(format!("watch binding: {e}")))?;
        Ok(Self {
            pattern,
            matcher,
            action,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn action(&self) -> &Arc<dyn TransformUnit> {
        &self.action
    }

    pub(crate) fn matcher(&self) -> &GlobMatcher {
        &self.matcher
    }

    pub fn matches(&self, rel_path: &str) -> bool {
        self.matcher.is_match(rel_path)
    }
}
