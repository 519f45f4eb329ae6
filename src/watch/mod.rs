// src/watch/mod.rs

//! File watching: glob bindings, debounced dispatch and the notify bridge.

use std::path::PathBuf;

use crate::types::ReloadKind;

pub mod cascade;
pub mod dispatcher;
pub mod path_utils;
pub mod patterns;
pub mod watcher;

pub use cascade::CascadeUnit;
pub use dispatcher::{DispatchHandle, WatchDispatcher, WatchRunReport};
pub use patterns::WatchBinding;
pub use watcher::{WatcherHandle, spawn_watcher};

/// Receives the outputs of every successful watch re-run.
pub trait ReloadSink: Send + Sync {
    /// Signal clients if `outputs` warrant it and return what was sent.
    fn outputs_changed(&self, outputs: &[PathBuf]) -> Option<ReloadKind>;
}
