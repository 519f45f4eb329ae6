// src/watch/watcher.rs

use std::path::PathBuf;

use notify::event::ModifyKind;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::watch::dispatcher::DispatchHandle;

/// Handle for the filesystem watcher.
///
/// Dropping this handle stops file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
    roots: Vec<PathBuf>,
}

impl WatcherHandle {
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle")
            .field("roots", &self.roots)
            .finish()
    }
}

/// Content and existence changes; access and metadata-only events are not.
fn is_relevant(kind: &EventKind) -> bool {
    match kind {
        EventKind::Create(_) | EventKind::Remove(_) => true,
        EventKind::Modify(ModifyKind::Metadata(_)) => false,
        EventKind::Modify(_) => true,
        _ => false,
    }
}

/// Watch each of `roots` recursively and forward changed paths to `handle`.
pub fn spawn_watcher(roots: Vec<PathBuf>, handle: DispatchHandle) -> Result<WatcherHandle> {
    let (event_tx, mut event_rx) = tokio::sync::mpsc::unbounded_channel::<Event>();

    // Called synchronously on notify's thread.
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if event_tx.send(event).is_err() {
                    debug!("watch loop gone; dropping notify event");
                }
            }
            Err(err) => warn!("file watch error: {err}"),
        },
        Config::default(),
    )?;

    for root in &roots {
        watcher.watch(root, RecursiveMode::Recursive)?;
        info!("watching {}", root.display());
    }

    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            if !is_relevant(&event.kind) {
                continue;
            }
            for path in &event.paths {
                handle.dispatch_path(path);
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle {
        _inner: watcher,
        roots,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, MetadataKind};

    #[test]
    fn only_content_changes_are_relevant() {
        assert!(is_relevant(&EventKind::Create(CreateKind::File)));
        assert!(is_relevant(&EventKind::Modify(ModifyKind::Data(
            DataChange::Content
        ))));
        assert!(!is_relevant(&EventKind::Modify(ModifyKind::Metadata(
            MetadataKind::WriteTime
        ))));
        assert!(!is_relevant(&EventKind::Access(AccessKind::Read)));
    }
}
