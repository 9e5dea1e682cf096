// src/cli.rs

//! CLI argument parsing using `clap`.

use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::config::loader::CONFIG_NAME;
use crate::config::model::{DEFAULT_MAX_RESTARTS, SupervisorConfig};
use crate::exec::WorkerLauncher;

/// Command-line arguments for `sitevisor`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "sitevisor",
    version,
    about = "Supervise one isolated worker process per configured site.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the sites file (JSON). Created with a default site if missing.
    #[arg(long, value_name = "PATH", default_value = CONFIG_NAME)]
    pub config: String,

    /// Worker program to launch for each site. The site's JSON is passed as
    /// the last argument; the protocol runs over stdin/stdout.
    #[arg(long, value_name = "PROGRAM", required_unless_present = "dry_run")]
    pub worker: Option<String>,

    /// Extra argument placed before the site JSON (repeatable).
    #[arg(long = "worker-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub worker_args: Vec<String>,

    /// Automatic restarts allowed after unexpected exits.
    #[arg(long, value_name = "N", default_value_t = DEFAULT_MAX_RESTARTS)]
    pub max_restarts: u32,

    /// Fixed delay before each automatic restart (e.g. "3s", "500ms").
    #[arg(long, value_name = "DURATION", default_value = "3s", value_parser = parse_duration)]
    pub restart_delay: Duration,

    /// Do not read control commands from stdin.
    #[arg(long)]
    pub no_console: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SITEVISOR_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Load + validate the sites file, print it, and exit.
    #[arg(long)]
    pub dry_run: bool,
}

impl CliArgs {
    pub fn supervisor_config(&self) -> SupervisorConfig {
        SupervisorConfig {
            max_restarts: self.max_restarts,
            restart_delay: self.restart_delay,
            ..SupervisorConfig::default()
        }
    }

    pub fn launcher(&self) -> Option<WorkerLauncher> {
        self.worker.as_ref().map(|program| WorkerLauncher {
            program: program.clone(),
            args: self.worker_args.clone(),
        })
    }
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

/// Parse a simple duration string like `"3s"`, `"250ms"`, `"1m"`, `"2h"`.
/// A bare number is taken as milliseconds.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .unwrap_or(s.len());

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;

    match unit_part.trim().to_lowercase().as_str() {
        "" | "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => Ok(Duration::from_secs(value * 60)),
        "h" => Ok(Duration::from_secs(value * 60 * 60)),
        unit => Err(format!(
            "unsupported duration unit '{}'; expected ms, s, m, or h",
            unit
        )),
    }
}
