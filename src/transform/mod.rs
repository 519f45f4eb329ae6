// src/transform/mod.rs

//! Asset transformation units.
//!
//! Every unit implements [`TransformUnit`]: it owns its source globs and
//! destination, and `invoke` reads the matched inputs, writes outputs and
//! reports the written paths. The task graph and the watch dispatcher only
//! consume success/failure plus that list of paths.
//!
//! File work is synchronous and runs on Tokio's blocking pool through
//! [`spawn_blocking_transform`].

use std::fmt;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use thiserror::Error;

pub mod clean;
pub mod fonts;
pub mod glob;
pub mod gzip;
pub mod images;
pub mod markup;
pub mod scripts;
pub mod sprite;
pub mod styles;

pub use clean::CleanUnit;
pub use fonts::FontCopyUnit;
pub use images::ImageCompressUnit;
pub use markup::MarkupCompileUnit;
pub use scripts::ScriptBundleUnit;
pub use sprite::SvgSpriteUnit;
pub use styles::StylesheetCompileUnit;

/// Files written by a successful invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformOutput {
    pub written: Vec<PathBuf>,
}

impl TransformOutput {
    pub fn push(&mut self, path: impl Into<PathBuf>) {
        self.written.push(path.into());
    }

    pub fn extend(&mut self, other: TransformOutput) {
        self.written.extend(other.written);
    }
}

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid glob pattern '{pattern}': {source}")]
    Glob {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("cannot walk {path:?}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("image {path:?}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("stylesheet {path:?}: {message}")]
    Stylesheet { path: PathBuf, message: String },

    #[error("template '{name}': {source}")]
    Template {
        name: String,
        #[source]
        source: minijinja::Error,
    },

    #[error("sprite source {path:?}: {message}")]
    Sprite { path: PathBuf, message: String },

    #[error("minifier '{command}': {message}")]
    Minify { command: String, message: String },

    #[error("no input files matched {0}")]
    NoInput(String),

    #[error("task '{task}' failed: {message}")]
    Upstream { task: String, message: String },

    #[error("transform worker stopped: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type TransformResult<T> = std::result::Result<T, TransformError>;

pub type TransformFuture<'a> =
    Pin<Box<dyn Future<Output = TransformResult<TransformOutput>> + Send + 'a>>;

/// A single asset transformation with a uniform async contract.
pub trait TransformUnit: Send + Sync + fmt::Debug {
    /// Short label used in logs, e.g. `"stylesheet-compile"`.
    fn name(&self) -> &str;

    /// Read the unit's inputs and write its outputs.
    fn invoke(&self) -> TransformFuture<'_>;
}

/// Run synchronous transform work on the blocking pool.
pub fn spawn_blocking_transform<F>(work: F) -> TransformFuture<'static>
where
    F: FnOnce() -> TransformResult<TransformOutput> + Send + 'static,
{
    Box::pin(async move { tokio::task::spawn_blocking(work).await? })
}

pub(crate) fn io_err(path: &Path) -> impl FnOnce(io::Error) -> TransformError {
    let path = path.to_path_buf();
    move |source| TransformError::Io { path, source }
}

/// Write `bytes` to `path`, creating parent directories.
pub(crate) fn write_file(path: &Path, bytes: &[u8]) -> TransformResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err(parent))?;
    }
    std::fs::write(path, bytes).map_err(io_err(path))
}

/// Copy `src` to `dst`, creating parent directories.
pub(crate) fn copy_file(src: &Path, dst: &Path) -> TransformResult<()> {
    if let Some(parent) = dst.parent() {
        std::fs::create_dir_all(parent).map_err(io_err(parent))?;
    }
    std::fs::copy(src, dst).map_err(io_err(src))?;
    Ok(())
}
