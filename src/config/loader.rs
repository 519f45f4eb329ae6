// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::info;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file from a given path without semantic validation.
///
/// Use [`load_and_validate`] for the checked variant.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading config file at {:?}", path))?;

    let config: RawConfigFile = toml::from_str(&contents)?;
    Ok(config)
}

/// Parse configuration from a TOML string and validate it.
pub fn parse_and_validate(contents: &str) -> Result<ConfigFile> {
    let raw: RawConfigFile = toml::from_str(contents)?;
    ConfigFile::try_from(raw)
}

/// Load a configuration file from path and validate it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw = load_from_path(&path)?;
    ConfigFile::try_from(raw)
}

/// Load the config at `path`, falling back to built-in defaults when the
/// file is absent and `path` is the default location.
pub fn load_or_default(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    if !path.exists() && path == default_config_path() {
        info!(path = ?path, "no config file found; using built-in defaults");
        return ConfigFile::try_from(RawConfigFile::default());
    }
    load_and_validate(path)
}

/// Default config file location, relative to the working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Assetdag.toml")
}

/// Project root for a config path.
///
/// - A config path with a non-empty parent (e.g. "site/Assetdag.toml") uses
///   that directory.
/// - A bare filename falls back to the current working directory.
pub fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}
