// src/server/reload.rs

use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::config::ServerConfig;
use crate::errors::{AssetdagError, Result};
use crate::types::ReloadKind;
use crate::watch::ReloadSink;
use crate::watch::path_utils::relative_str;

const RELOAD_CHANNEL_CAPACITY: usize = 16;

/// Fans reload signals out to every connected browser.
#[derive(Debug)]
pub struct ReloadHub {
    tx: broadcast::Sender<ReloadKind>,
    files: GlobSet,
    root: PathBuf,
    /// `server.base_dir` relative to `root`.
    served: PathBuf,
    inject_changes: bool,
    prefix: String,
}

impl ReloadHub {
    /// `root` is the project root that `server.base_dir` and the
    /// `server.files` globs are relative to.
    pub fn new(root: impl Into<PathBuf>, server: &ServerConfig) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &server.files {
            let glob = GlobBuilder::new(pattern)
                .literal_separator(true)
                .build()
                .map_err(|e| {
                    AssetdagError::ConfigError(format!("invalid server.files glob '{pattern}': {e}"))
                })?;
            builder.add(glob);
        }
        let files = builder
            .build()
            .map_err(|e| AssetdagError::ConfigError(format!("server.files: {e}")))?;

        let (tx, _) = broadcast::channel(RELOAD_CHANNEL_CAPACITY);
        Ok(Self {
            tx,
            files,
            root: root.into(),
            served: PathBuf::from(server.base_dir.trim_end_matches('/')),
            inject_changes: server.inject_changes,
            prefix: server.log_prefix.clone(),
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReloadKind> {
        self.tx.subscribe()
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Number of currently connected clients.
    pub fn client_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Push `kind` to every client. Returns how many received it.
    pub fn broadcast(&self, kind: ReloadKind) -> usize {
        let sent = self.tx.send(kind).unwrap_or(0);
        info!(server = %self.prefix, %kind, clients = sent, "reload broadcast");
        sent
    }

    /// Anything under the served tree counts; `server.files` adds paths
    /// outside it.
    fn watched(&self, path: &Path) -> bool {
        let rel = relative_str(&self.root, path)
            .unwrap_or_else(|| path.to_string_lossy().replace('\\', "/"));
        Path::new(&rel).starts_with(&self.served) || self.files.is_match(rel.as_str())
    }

    /// Decide what clients should do about `outputs`, if anything.
    pub fn classify(&self, outputs: &[PathBuf]) -> Option<ReloadKind> {
        let watched: Vec<&PathBuf> = outputs.iter().filter(|p| self.watched(p)).collect();
        if watched.is_empty() {
            debug!(server = %self.prefix, outputs = outputs.len(), "no served file changed");
            return None;
        }

        let css_only = watched.iter().all(|p| is_stylesheet(p));
        if css_only && self.inject_changes {
            Some(ReloadKind::Css)
        } else {
            Some(ReloadKind::Full)
        }
    }
}

/// `.css` files and their precompressed `.css.gz` siblings.
fn is_stylesheet(path: &Path) -> bool {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("css") => true,
        Some("gz") => path
            .file_stem()
            .is_some_and(|stem| Path::new(stem).extension().is_some_and(|ext| ext == "css")),
        _ => false,
    }
}

impl ReloadSink for ReloadHub {
    fn outputs_changed(&self, outputs: &[PathBuf]) -> Option<ReloadKind> {
        let kind = self.classify(outputs)?;
        self.broadcast(kind);
        Some(kind)
    }
}
