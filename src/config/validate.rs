// src/config/validate.rs

use globset::GlobBuilder;

use crate::config::model::ConfigFile;
use crate::errors::{AssetdagError, Result};

/// Run semantic validation against a loaded configuration.
///
/// This checks:
/// - `[server]` host is non-empty and port is non-zero
/// - `[watch].debounce_ms >= 1`
/// - `[images].jpeg_quality` is within 1..=100
/// - every glob in `[paths]` and `[server].files` compiles
/// - `[paths].scripts` is not empty
/// - `[output].js_minifier` is set when `minify_js` is on
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    validate_server(cfg)?;
    validate_watch(cfg)?;
    validate_images(cfg)?;
    validate_output(cfg)?;
    validate_globs(cfg)?;
    Ok(())
}

/// Server checks alone, for values overridden after loading.
pub fn validate_server(cfg: &ConfigFile) -> Result<()> {
    if cfg.server.host.trim().is_empty() {
        return Err(AssetdagError::ConfigError(
            "[server].host must not be empty".into(),
        ));
    }
    if cfg.server.port == 0 {
        return Err(AssetdagError::ConfigError(
            "[server].port must be >= 1 (got 0)".into(),
        ));
    }
    Ok(())
}

fn validate_watch(cfg: &ConfigFile) -> Result<()> {
    if cfg.watch.debounce_ms == 0 {
        return Err(AssetdagError::ConfigError(
            "[watch].debounce_ms must be >= 1 (got 0)".into(),
        ));
    }
    Ok(())
}

fn validate_images(cfg: &ConfigFile) -> Result<()> {
    let q = cfg.images.jpeg_quality;
    if !(1..=100).contains(&q) {
        return Err(AssetdagError::ConfigError(format!(
            "[images].jpeg_quality must be within 1..=100 (got {q})"
        )));
    }
    Ok(())
}

fn validate_output(cfg: &ConfigFile) -> Result<()> {
    if cfg.output.minify_js && cfg.output.js_minifier.trim().is_empty() {
        return Err(AssetdagError::ConfigError(
            "[output].js_minifier must not be empty when minify_js is on".into(),
        ));
    }
    Ok(())
}

fn validate_globs(cfg: &ConfigFile) -> Result<()> {
    let p = &cfg.paths;
    if p.scripts.is_empty() {
        return Err(AssetdagError::ConfigError(
            "[paths].scripts must list at least one glob".into(),
        ));
    }

    let named = [
        ("paths.fonts", &p.fonts),
        ("paths.initial_img", &p.initial_img),
        ("paths.compressed_img_bkg", &p.compressed_img_bkg),
        ("paths.minified_svg", &p.minified_svg),
        ("paths.templates", &p.templates),
        ("paths.styles", &p.styles),
        ("paths.watch_styles", &p.watch_styles),
        ("paths.script_entry", &p.script_entry),
    ];
    for (key, pattern) in named {
        check_glob(key, pattern)?;
    }
    for pattern in &p.scripts {
        check_glob("paths.scripts", pattern)?;
    }
    for pattern in &p.clean {
        check_glob("paths.clean", pattern)?;
    }
    for pattern in &cfg.server.files {
        check_glob("server.files", pattern)?;
    }
    Ok(())
}

fn check_glob(key: &str, pattern: &str) -> Result<()> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map(|_| ())
        .map_err(|e| AssetdagError::ConfigError(format!("invalid glob in {key}: {e}")))
}
