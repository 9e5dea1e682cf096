// src/exec/backend.rs

//! Pluggable worker backend abstraction.
//!
//! The runtime talks to a `WorkerBackend` instead of owning processes itself.
//! This makes it easy to swap in a fake backend in tests while keeping the
//! production implementation here.
//!
//! - `RealWorkerBackend` owns one [`WorkerProcess`] per live site and pumps
//!   its events and exit notification back into the runtime channel, tagged
//!   with the site id and generation.
//! - Tests can provide their own `WorkerBackend` that records calls and
//!   emits `SupervisorEvent`s directly.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::time::Instant;

use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::config::SiteConfig;
use crate::engine::{Generation, SiteId, SupervisorEvent};
use crate::errors::{Result, SitevisorError};
use crate::protocol::{Command, Event};

use super::process::{WorkerExit, WorkerLauncher, WorkerProcess};

pub type BackendFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// Trait abstracting how workers are spawned and driven.
///
/// Every method is called from the runtime's single control loop.
pub trait WorkerBackend: Send {
    /// Start a worker for `site`. An error means no process exists.
    fn spawn_worker(&mut self, site: SiteConfig, generation: Generation) -> BackendFuture<'_>;

    /// Fire-and-forget a protocol command at a live worker.
    fn send_command(
        &mut self,
        id: &str,
        generation: Generation,
        command: Command,
    ) -> BackendFuture<'_>;

    /// Terminate a worker. Its exit must still be reported.
    fn kill_worker(&mut self, id: &str, generation: Generation) -> BackendFuture<'_>;

    /// Forget an exited worker.
    fn release(&mut self, id: &str, generation: Generation);

    /// Kill everything still owned. Called once when the runtime stops.
    fn shutdown(&mut self) -> BackendFuture<'_>;
}

struct ActiveWorker {
    generation: Generation,
    process: WorkerProcess,
}

/// Real backend used in production.
pub struct RealWorkerBackend {
    launcher: WorkerLauncher,
    runtime_tx: mpsc::Sender<SupervisorEvent>,
    workers: HashMap<SiteId, ActiveWorker>,
}

impl RealWorkerBackend {
    pub fn new(launcher: WorkerLauncher, runtime_tx: mpsc::Sender<SupervisorEvent>) -> Self {
        Self {
            launcher,
            runtime_tx,
            workers: HashMap::new(),
        }
    }

    fn current(&mut self, id: &str, generation: Generation) -> Result<&mut WorkerProcess> {
        match self.workers.get_mut(id) {
            Some(active) if active.generation == generation => Ok(&mut active.process),
            _ => Err(SitevisorError::SiteNotFound(format!(
                "{id} (generation {generation})"
            ))),
        }
    }
}

impl WorkerBackend for RealWorkerBackend {
    fn spawn_worker(&mut self, site: SiteConfig, generation: Generation) -> BackendFuture<'_> {
        Box::pin(async move {
            let mut process = WorkerProcess::spawn(&site, &self.launcher)?;

            let events = process.take_events();
            let exit = process.take_exit();
            if let (Some(events), Some(exit)) = (events, exit) {
                tokio::spawn(forward_worker(
                    site.id.clone(),
                    generation,
                    events,
                    exit,
                    self.runtime_tx.clone(),
                ));
            }

            self.workers
                .insert(site.id.clone(), ActiveWorker { generation, process });
            Ok(())
        })
    }

    fn send_command(
        &mut self,
        id: &str,
        generation: Generation,
        command: Command,
    ) -> BackendFuture<'_> {
        let result = self
            .current(id, generation)
            .and_then(|process| process.send(command));
        Box::pin(async move { result })
    }

    fn kill_worker(&mut self, id: &str, generation: Generation) -> BackendFuture<'_> {
        let result = self.current(id, generation).map(|process| process.kill());
        Box::pin(async move { result })
    }

    fn release(&mut self, id: &str, generation: Generation) {
        if matches!(self.workers.get(id), Some(active) if active.generation == generation) {
            self.workers.remove(id);
        }
    }

    fn shutdown(&mut self) -> BackendFuture<'_> {
        Box::pin(async move {
            for (id, mut active) in self.workers.drain() {
                debug!(site = %id, generation = active.generation, "killing worker on shutdown");
                active.process.kill();
            }
            Ok(())
        })
    }
}

/// Pump one worker's events into the runtime, then its exit.
///
/// Events already decoded when the exit arrives are delivered first, so the
/// runtime sees them before the worker disappears.
async fn forward_worker(
    id: SiteId,
    generation: Generation,
    mut events: mpsc::Receiver<Event>,
    mut exit: oneshot::Receiver<WorkerExit>,
    runtime_tx: mpsc::Sender<SupervisorEvent>,
) {
    let code = loop {
        tokio::select! {
            biased;
            event = events.recv() => match event {
                Some(event) => {
                    let sent = runtime_tx
                        .send(SupervisorEvent::Worker {
                            id: id.clone(),
                            generation,
                            event,
                            at: Instant::now(),
                        })
                        .await;
                    if sent.is_err() {
                        return;
                    }
                }
                // Stdout closed; only the exit is left.
                None => break (&mut exit).await.ok().and_then(|e| e.code),
            },
            result = &mut exit => {
                while let Ok(event) = events.try_recv() {
                    let _ = runtime_tx
                        .send(SupervisorEvent::Worker {
                            id: id.clone(),
                            generation,
                            event,
                            at: Instant::now(),
                        })
                        .await;
                }
                break result.ok().and_then(|e| e.code);
            }
        }
    };

    let _ = runtime_tx
        .send(SupervisorEvent::WorkerExited {
            id,
            generation,
            code,
        })
        .await;
}
