// src/logging.rs

//! Logging setup for `sitevisor` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the filter:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `SITEVISOR_LOG` environment variable, either a bare level ("debug") or
//!    full directives ("sitevisor::engine=trace,info")
//! 3. default to `info`
//!
//! Logs go to STDERR; stdout carries the JSON status stream.

use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

pub const LOG_ENV_VAR: &str = "SITEVISOR_LOG";

/// Initialise the global logging subscriber. Call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = match cli_level {
        Some(lvl) => EnvFilter::new(level_from_log_level(lvl).as_str()),
        None => std::env::var(LOG_ENV_VAR)
            .ok()
            .and_then(|s| filter_from_env_value(&s))
            .unwrap_or_else(|| EnvFilter::new("info")),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))?;

    Ok(())
}

fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}

/// Accept `warning` as an alias, otherwise hand the value to `EnvFilter`.
fn filter_from_env_value(s: &str) -> Option<EnvFilter> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    let normalized = if trimmed.eq_ignore_ascii_case("warning") {
        "warn".to_string()
    } else {
        trimmed.to_lowercase()
    };
    EnvFilter::try_new(normalized).ok()
}
