// src/lib.rs

pub mod cli;
pub mod config;
pub mod console;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod protocol;
pub mod status;
pub mod types;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{FileSiteRegistry, SiteList, SiteRegistry};
use crate::engine::{CoreSupervisor, RestartPolicy, Runtime, SupervisorEvent, SupervisorHandle};
use crate::exec::RealWorkerBackend;
use crate::status::{spawn_status_printer, StatusBroadcaster};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - the sites file (created with a default site if missing)
/// - the status broadcaster and its stdout printer
/// - the real worker backend
/// - the stdin control console
/// - Ctrl-C handling
/// - autostart of flagged sites, then the control loop
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let registry = Arc::new(FileSiteRegistry::open_real(&config_path)?);
    let sites = registry.sites()?;

    if args.dry_run {
        print_dry_run(&config_path, &sites);
        return Ok(());
    }

    let launcher = args
        .launcher()
        .ok_or_else(|| anyhow!("--worker is required unless --dry-run is given"))?;
    let settings = args.supervisor_config();

    let (tx, rx) = mpsc::channel::<SupervisorEvent>(settings.event_capacity);
    let handle = SupervisorHandle::new(tx.clone());

    let status = StatusBroadcaster::new(settings.status_capacity);
    let printer = spawn_status_printer(status.subscribe(), tokio::io::stdout());

    let backend = RealWorkerBackend::new(launcher, tx.clone());

    // Ctrl-C → graceful shutdown.
    {
        let handle = handle.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = handle.shutdown().await;
        });
    }

    if !args.no_console {
        crate::console::spawn_console(tokio::io::stdin(), handle.clone());
    }

    let autostart = sites.autostart_ids();
    info!(?autostart, "sites to start at boot");

    let core = CoreSupervisor::new(registry, RestartPolicy::from(&settings));
    let runtime = Runtime::new(core, tx, rx, backend, status).with_autostart(autostart);
    runtime.run().await?;

    // The broadcaster was owned by the runtime; the printer drains and ends.
    let _ = printer.await;
    Ok(())
}

/// Dry-run output: the sites the supervisor would manage.
fn print_dry_run(path: &std::path::Path, sites: &SiteList) {
    println!("sitevisor dry-run");
    println!("  config = {}", path.display());
    println!();

    println!("sites ({}):", sites.len());
    for site in sites.iter() {
        println!("  - {}", site.id);
        println!("      name: {}", site.name);
        println!("      url: {}", site.url);
        if site.autostart {
            println!("      autostart: true");
        }
    }

    debug!("dry-run complete (no workers started)");
}
