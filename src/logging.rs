// src/logging.rs

//! Log output for the build, the watcher and the dev server.
//!
//! Our own events are shown at the chosen level; dependencies (notify,
//! axum, tower-http, hyper) stay at `warn` unless asked for. The level comes
//! from `--log-level`, then `ASSETDAG_LOG`, then `info`. `ASSETDAG_LOG` may
//! also hold full filter directives such as `assetdag=debug,tower_http=debug`.
//!
//! Logs go to stderr; `--dry-run` output is the only thing printed on stdout.

use anyhow::{Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

pub const LOG_ENV: &str = "ASSETDAG_LOG";

/// Install the global subscriber. Call once, before anything logs.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env = std::env::var(LOG_ENV).ok();
    let directives = filter_directives(cli_level, env.as_deref());
    let filter = EnvFilter::try_new(&directives)
        .map_err(|e| anyhow!("invalid {LOG_ENV} filter '{directives}': {e}"))?;

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("logging already initialised: {e}"))
}

/// Filter directives for the given CLI level and `ASSETDAG_LOG` value.
pub(crate) fn filter_directives(cli_level: Option<LogLevel>, env: Option<&str>) -> String {
    let level = match (cli_level, env.map(str::trim)) {
        (Some(lvl), _) => level_name(lvl),
        (None, Some(raw)) if !raw.is_empty() => match parse_level_str(raw) {
            Some(name) => name,
            None => return raw.to_string(),
        },
        _ => "info",
    };
    format!("warn,assetdag={level}")
}

fn level_name(lvl: LogLevel) -> &'static str {
    match lvl {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}

fn parse_level_str(s: &str) -> Option<&'static str> {
    match s.to_lowercase().as_str() {
        "error" => Some("error"),
        "warn" | "warning" => Some("warn"),
        "info" => Some("info"),
        "debug" => Some("debug"),
        "trace" => Some("trace"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_flag_wins_over_env() {
        assert_eq!(
            filter_directives(Some(LogLevel::Debug), Some("trace")),
            "warn,assetdag=debug"
        );
    }

    #[test]
    fn env_level_names_scope_to_this_crate() {
        assert_eq!(filter_directives(None, Some(" WARNING ")), "warn,assetdag=warn");
        assert_eq!(filter_directives(None, Some("")), "warn,assetdag=info");
        assert_eq!(filter_directives(None, None), "warn,assetdag=info");
    }

    #[test]
    fn env_directives_pass_through() {
        let raw = "assetdag=debug,tower_http=debug";
        assert_eq!(filter_directives(None, Some(raw)), raw);
        assert!(EnvFilter::try_new(raw).is_ok());
    }
}
