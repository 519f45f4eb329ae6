// src/config/model.rs

//! Strongly typed view of `Assetdag.toml`.
//!
//! Every section and key is optional; the defaults describe the standard
//! layout (`src/app` sources, `src/dist` output) relative to the project
//! root, which is the directory holding the config file.

use serde::Deserialize;

/// Raw configuration as deserialized from TOML, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawConfigFile {
    pub paths: PathConfig,
    pub server: ServerConfig,
    pub watch: WatchSection,
    pub images: ImageSection,
    pub output: OutputSection,
}

/// Validated configuration, produced through `TryFrom<RawConfigFile>`.
///
/// `Default` yields the standard layout, which always validates.
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    pub paths: PathConfig,
    pub server: ServerConfig,
    pub watch: WatchSection,
    pub images: ImageSection,
    pub output: OutputSection,
}

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::AssetdagError;

    fn try_from(raw: RawConfigFile) -> Result<Self, Self::Error> {
        let cfg = ConfigFile {
            paths: raw.paths,
            server: raw.server,
            watch: raw.watch,
            images: raw.images,
            output: raw.output,
        };
        crate::config::validate::validate_config(&cfg)?;
        Ok(cfg)
    }
}

/// Logical asset roles mapped to locations, for both the source and the
/// output tree. Globs use `/` separators and `*` never crosses a directory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathConfig {
    pub fonts: String,
    pub initial_img: String,
    /// Directory receiving compressed images, mirroring `initial_img`.
    pub compressed_img: String,
    pub compressed_img_bkg: String,
    /// Sprite sources: compressed icons.
    pub minified_svg: String,
    pub sprite_svg: String,
    /// Generated stylesheet partial describing the sprite.
    pub sprite_stylesheet: String,
    /// Sprite URL as seen from the compiled stylesheets.
    pub sprite_url: String,
    pub templates: String,
    pub styles: String,
    /// Recursive stylesheet glob used for watching (includes partials).
    pub watch_styles: String,
    /// Script sources in concatenation order.
    pub scripts: Vec<String>,
    /// Script file watched for re-bundling.
    pub script_entry: String,
    /// Globs removed by `emptyFolders`.
    pub clean: Vec<String>,
    pub dist: DistPaths,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            fonts: "src/app/fonts/**/*.*".into(),
            initial_img: "src/app/img/initial/**/*.*".into(),
            compressed_img: "src/app/img/compressed".into(),
            compressed_img_bkg: "src/app/img/compressed/bkg/**/*.*".into(),
            minified_svg: "src/app/img/compressed/ico/**/*.svg".into(),
            sprite_svg: "src/app/styles/partials/sprite/svg-sprite.svg".into(),
            sprite_stylesheet: "src/app/styles/partials/_svg-sprite.scss".into(),
            sprite_url: "sprite/svg-sprite.svg".into(),
            templates: "src/app/templates/*.html".into(),
            styles: "src/app/styles/*.scss".into(),
            watch_styles: "src/app/styles/**/*.scss".into(),
            scripts: vec![
                "src/app/js/jslibs/*.js".into(),
                "src/app/js/app.js".into(),
            ],
            script_entry: "src/app/js/app.js".into(),
            clean: vec![
                "src/app/img/compressed/*".into(),
                "src/app/styles/partials/sprite/*".into(),
                "src/app/styles/partials/_svg-sprite.scss".into(),
                "src/dist/*".into(),
            ],
            dist: DistPaths::default(),
        }
    }
}

/// Output tree locations.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DistPaths {
    pub root: String,
    pub fonts: String,
    pub bkg_img: String,
    pub svg_sprite: String,
    pub html: String,
    pub css: String,
    pub js: String,
    /// File name of the concatenated script bundle inside `js`.
    pub script_bundle: String,
}

impl Default for DistPaths {
    fn default() -> Self {
        Self {
            root: "src/dist".into(),
            fonts: "src/dist/fonts".into(),
            bkg_img: "src/dist/css/bkg".into(),
            svg_sprite: "src/dist/css/sprite".into(),
            html: "src/dist".into(),
            css: "src/dist/css".into(),
            js: "src/dist/js".into(),
            script_bundle: "app.js".into(),
        }
    }
}

/// `[server]`: dev server and live reload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Directory served over HTTP.
    pub base_dir: String,
    /// Output globs whose change triggers a browser reload.
    pub files: Vec<String>,
    pub tunnel: bool,
    pub host: String,
    pub port: u16,
    pub log_prefix: String,
    pub open: bool,
    /// Push stylesheet changes without a full page reload.
    pub inject_changes: bool,
    /// Compress responses on the fly.
    pub compress: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_dir: "src/dist".into(),
            files: vec![
                "src/dist/*.html".into(),
                "src/dist/css/*.css".into(),
                "src/dist/css/sprite/*.svg".into(),
                "src/dist/js/*.js".into(),
            ],
            tunnel: false,
            host: "localhost".into(),
            port: 3000,
            log_prefix: "assetdag".into(),
            open: true,
            inject_changes: true,
            compress: true,
        }
    }
}

/// `[watch]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatchSection {
    pub debounce_ms: u64,
    /// Re-run the bound task's dependents after a change, not only the task.
    pub rerun_dependents: bool,
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            debounce_ms: 250,
            rerun_dependents: false,
        }
    }
}

/// `[images]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImageSection {
    pub jpeg_quality: u8,
    /// Skip sources whose compressed copy is newer than the source.
    pub skip_unchanged: bool,
}

impl Default for ImageSection {
    fn default() -> Self {
        Self {
            jpeg_quality: 80,
            skip_unchanged: true,
        }
    }
}

/// `[output]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputSection {
    /// Write a gzip `.gz` sibling next to compiled markup, styles and scripts.
    pub gzip: bool,
    /// Minify the script bundle through `js_minifier`.
    pub minify_js: bool,
    /// esbuild-compatible minifier command; skipped with a warning when it
    /// is not installed.
    pub js_minifier: String,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            gzip: true,
            minify_js: true,
            js_minifier: "esbuild".into(),
        }
    }
}
