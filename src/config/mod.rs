// src/config/mod.rs

//! Configuration loading and validation.
//!
//! - [`model`] holds the serde types for `Assetdag.toml`.
//! - [`loader`] reads TOML from disk and resolves the project root.
//! - [`validate`] performs semantic checks.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{config_root_dir, load_and_validate, load_or_default, parse_and_validate};
pub use model::{
    ConfigFile, DistPaths, ImageSection, OutputSection, PathConfig, RawConfigFile, ServerConfig,
    WatchSection,
};
