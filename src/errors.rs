// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

use crate::engine::TaskName;

#[derive(Error, Debug)]
pub enum AssetdagError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Cycle detected in task graph: {0}")]
    DagCycle(String),

    /// A build run stopped because one of its actions failed.
    #[error("task '{task}' failed: {message}")]
    TaskFailed { task: TaskName, message: String },

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("File watch error: {0}")]
    WatchError(#[from] notify::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AssetdagError {
    /// True for errors raised while building or validating configuration,
    /// i.e. before any action could have run.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            AssetdagError::ConfigError(_) | AssetdagError::DagCycle(_) | AssetdagError::TomlError(_)
        )
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, AssetdagError>;
