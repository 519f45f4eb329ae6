// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `assetdag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "assetdag",
    version,
    about = "Build front-end assets through a task graph, serve them and live-reload on change.",
    long_about = None
)]
pub struct CliArgs {
    /// Task to run: emptyFolders, copyFonts, minifyImg, createSpriteSvg,
    /// compileJade, compileStylus, compileJS, build, webserver or watch.
    #[arg(value_name = "TASK", default_value = "build")]
    pub task: String,

    /// Path to the config file (TOML).
    ///
    /// Default: `Assetdag.toml` in the current working directory. A missing
    /// default file means built-in defaults are used.
    #[arg(long, value_name = "PATH", default_value = "Assetdag.toml")]
    pub config: String,

    /// Override `[server].port`.
    #[arg(long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Do not open a browser when the dev server starts.
    #[arg(long)]
    pub no_open: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ASSETDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Load config, build and validate the task graph, print it, run nothing.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
