// src/pipeline/mod.rs

//! The standard front-end asset pipeline: task declarations and the watch
//! bindings that re-run them.

use std::path::Path;
use std::sync::Arc;

use crate::config::ConfigFile;
use crate::dag::{Scheduler, TaskAction, TaskGraph};
use crate::errors::{AssetdagError, Result};
use crate::server::client_script_tag;
use crate::transform::{
    CleanUnit, FontCopyUnit, ImageCompressUnit, MarkupCompileUnit, ScriptBundleUnit,
    StylesheetCompileUnit, SvgSpriteUnit, TransformUnit,
};
use crate::watch::{CascadeUnit, WatchDispatcher};

pub const EMPTY_FOLDERS: &str = "emptyFolders";
pub const COPY_FONTS: &str = "copyFonts";
pub const MINIFY_IMG: &str = "minifyImg";
pub const CREATE_SPRITE_SVG: &str = "createSpriteSvg";
pub const COMPILE_JADE: &str = "compileJade";
pub const COMPILE_STYLUS: &str = "compileStylus";
pub const COMPILE_JS: &str = "compileJS";
pub const BUILD: &str = "build";
pub const WEBSERVER: &str = "webserver";
pub const WATCH: &str = "watch";

/// Declare the standard task graph for `cfg`, with paths resolved against
/// `root`. With `live_reload` the markup unit injects the client script.
pub fn standard_graph(cfg: &ConfigFile, root: &Path, live_reload: bool) -> Result<TaskGraph> {
    let paths = &cfg.paths;
    let gzip = cfg.output.gzip;

    let mut markup = MarkupCompileUnit::from_paths(root, paths, gzip);
    if live_reload {
        markup = markup.with_client_script(client_script_tag());
    }
    let mut scripts = ScriptBundleUnit::from_paths(root, paths, gzip);
    if cfg.output.minify_js {
        scripts = scripts.with_minifier(cfg.output.js_minifier.clone());
    }

    TaskGraph::builder()
        .task(
            EMPTY_FOLDERS,
            Vec::<String>::new(),
            TaskAction::transform(CleanUnit::from_paths(root, paths)),
        )
        .task(
            COPY_FONTS,
            [EMPTY_FOLDERS],
            TaskAction::transform(FontCopyUnit::from_paths(root, paths)),
        )
        .task(
            MINIFY_IMG,
            [EMPTY_FOLDERS],
            TaskAction::transform(ImageCompressUnit::from_paths(root, paths, &cfg.images)),
        )
        .task(
            CREATE_SPRITE_SVG,
            [MINIFY_IMG],
            TaskAction::transform(SvgSpriteUnit::from_paths(root, paths)),
        )
        .task(COMPILE_JADE, [EMPTY_FOLDERS], TaskAction::transform(markup))
        .task(
            COMPILE_STYLUS,
            [CREATE_SPRITE_SVG],
            TaskAction::transform(StylesheetCompileUnit::from_paths(root, paths, gzip)),
        )
        .task(
            COMPILE_JS,
            [EMPTY_FOLDERS],
            TaskAction::transform(scripts),
        )
        .task(
            BUILD,
            [
                EMPTY_FOLDERS,
                COPY_FONTS,
                MINIFY_IMG,
                CREATE_SPRITE_SVG,
                COMPILE_JADE,
                COMPILE_STYLUS,
                COMPILE_JS,
            ],
            TaskAction::Aggregate,
        )
        .task(WEBSERVER, [BUILD], TaskAction::Aggregate)
        .task(WATCH, [WEBSERVER], TaskAction::Aggregate)
        .build()
}

/// Watched glob and the task it re-runs.
pub fn watch_targets(cfg: &ConfigFile) -> Vec<(String, &'static str)> {
    let paths = &cfg.paths;
    vec![
        (paths.fonts.clone(), COPY_FONTS),
        (paths.initial_img.clone(), MINIFY_IMG),
        (paths.minified_svg.clone(), CREATE_SPRITE_SVG),
        (paths.templates.clone(), COMPILE_JADE),
        (paths.watch_styles.clone(), COMPILE_STYLUS),
        (paths.script_entry.clone(), COMPILE_JS),
    ]
}

/// Register every watch target on `dispatcher`.
///
/// By default a change re-runs only the bound task's unit, and generated
/// files reach the next binding through the watcher. With
/// `watch.rerun_dependents` it re-runs the task and its dependents; the
/// dispatcher then runs bindings one at a time and ignores the cascade's own
/// writes, so downstream bindings do not build the same outputs again.
pub fn register_watch_bindings(
    dispatcher: &mut WatchDispatcher,
    cfg: &ConfigFile,
    scheduler: &Arc<Scheduler>,
) -> Result<()> {
    dispatcher.set_exclusive(cfg.watch.rerun_dependents);
    for (pattern, task) in watch_targets(cfg) {
        let action: Arc<dyn TransformUnit> = if cfg.watch.rerun_dependents {
            Arc::new(CascadeUnit::new(Arc::clone(scheduler), task))
        } else {
            match scheduler.graph().action_of(task) {
                Some(TaskAction::Transform(unit)) => Arc::clone(unit),
                _ => {
                    return Err(AssetdagError::ConfigError(format!(
                        "watch target '{task}' has no transform"
                    )));
                }
            }
        };
        dispatcher.register(&pattern, action)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_graph_orders_sprite_before_styles() {
        let cfg = ConfigFile::default();
        let graph = standard_graph(&cfg, Path::new("/project"), false).unwrap();

        assert_eq!(graph.len(), 10);
        let order = graph.topological_order();
        let pos = |name: &str| order.iter().position(|n| n == name).unwrap();
        assert_eq!(pos(EMPTY_FOLDERS), 0);
        assert!(pos(MINIFY_IMG) < pos(CREATE_SPRITE_SVG));
        assert!(pos(CREATE_SPRITE_SVG) < pos(COMPILE_STYLUS));
        assert!(pos(COMPILE_STYLUS) < pos(BUILD));
        assert!(pos(BUILD) < pos(WEBSERVER));
        assert!(pos(WEBSERVER) < pos(WATCH));
    }

    #[test]
    fn watch_reaches_webserver_and_build() {
        let cfg = ConfigFile::default();
        let graph = standard_graph(&cfg, Path::new("/project"), false).unwrap();
        assert!(graph.reaches(WATCH, WEBSERVER));
        assert!(graph.reaches(WATCH, BUILD));
        assert!(!graph.reaches(BUILD, WEBSERVER));
    }

    #[test]
    fn every_watch_target_has_a_transform() {
        let cfg = ConfigFile::default();
        let graph = standard_graph(&cfg, Path::new("/project"), false).unwrap();
        for (_, task) in watch_targets(&cfg) {
            assert!(matches!(graph.action_of(task), Some(TaskAction::Transform(_))));
        }
    }
}
