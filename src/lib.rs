// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod pipeline;
pub mod server;
pub mod transform;
pub mod types;
pub mod watch;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::validate::validate_server;
use crate::config::{ConfigFile, config_root_dir, load_or_default};
use crate::dag::{Scheduler, TaskGraph};
use crate::errors::{AssetdagError, Result};
use crate::pipeline::{WATCH, WEBSERVER, register_watch_bindings, standard_graph};
use crate::server::{DevServer, ReloadHub, open_browser};
use crate::watch::WatchDispatcher;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and CLI overrides
/// - the task graph and one build run for the requested task
/// - the dev server and file watcher when the task reaches them
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let mut cfg = load_or_default(&config_path)?;
    if let Some(port) = args.port {
        cfg.server.port = port;
    }
    if args.no_open {
        cfg.server.open = false;
    }
    validate_server(&cfg)?;

    let root = config_root_dir(&config_path);
    let root = root.canonicalize().unwrap_or(root);
    debug!(root = %root.display(), "project root");

    // Declared once without live reload to learn what the task reaches.
    let graph = standard_graph(&cfg, &root, false)?;
    if !graph.contains(&args.task) {
        return Err(AssetdagError::TaskNotFound(args.task.clone()));
    }
    let serve = graph.reaches(&args.task, WEBSERVER);
    let watch = graph.reaches(&args.task, WATCH);
    let graph = if serve {
        standard_graph(&cfg, &root, true)?
    } else {
        graph
    };

    if args.dry_run {
        print_dry_run(&graph, &args.task, &cfg);
        return Ok(());
    }

    let scheduler = Arc::new(Scheduler::new(graph));
    let report = engine::run_target(&scheduler, &args.task).await?;
    info!(
        target = %report.target,
        completed = report.completed.len(),
        written = report.outputs.len(),
        "build run finished"
    );

    if !serve {
        return Ok(());
    }

    let hub = Arc::new(ReloadHub::new(&root, &cfg.server)?);
    let server = DevServer::new(&root, &cfg.server, Arc::clone(&hub))
        .start()
        .await?;

    if cfg.server.open {
        if let Err(e) = open_browser(server.url()) {
            warn!(server = %hub.prefix(), "could not open a browser: {e}");
        }
    }

    // Kept alive until shutdown; dropping stops the watcher.
    let _watching = if watch {
        let mut dispatcher =
            WatchDispatcher::new(root.clone(), Duration::from_millis(cfg.watch.debounce_ms))
                .with_reload_sink(hub.clone());
        register_watch_bindings(&mut dispatcher, &cfg, &scheduler)?;
        Some(dispatcher.start()?)
    } else {
        None
    };

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    server.shutdown();
    Ok(())
}

/// Print the task graph and what `target` would run.
fn print_dry_run(graph: &TaskGraph, target: &str, cfg: &ConfigFile) {
    println!("assetdag dry-run");
    println!("  target = {target}");
    println!("  watch.debounce_ms = {}", cfg.watch.debounce_ms);
    println!("  watch.rerun_dependents = {}", cfg.watch.rerun_dependents);
    println!("  output.gzip = {}", cfg.output.gzip);
    println!();

    let runs = graph.prerequisite_closure(target);
    println!("tasks ({}):", graph.len());
    for name in graph.topological_order() {
        let marker = if runs.contains(&name) { "*" } else { " " };
        println!("{marker} {name}");
        if let Some(decl) = graph.decl(&name) {
            if !decl.prerequisites.is_empty() {
                println!("      after: {:?}", decl.prerequisites);
            }
            println!("      action: {:?}", decl.action);
        }
    }

    debug!("dry-run complete (no execution)");
}
