// src/types.rs

//! Small shared types used across the watch and server layers.

use std::fmt;

/// What connected browsers should do after a watch re-run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReloadKind {
    /// Reload the whole page.
    Full,
    /// Re-fetch stylesheets in place.
    Css,
}

impl ReloadKind {
    /// Wire message understood by the injected client script.
    pub fn as_message(self) -> &'static str {
        match self {
            ReloadKind::Full => "reload",
            ReloadKind::Css => "css",
        }
    }
}

impl fmt::Display for ReloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_message())
    }
}
