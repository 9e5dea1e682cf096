// src/engine/runtime.rs

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::{CoreCommand, Generation, SiteId, SupervisorEvent};
use crate::errors::Result;
use crate::exec::WorkerBackend;
use crate::status::StatusBroadcaster;
use crate::types::Action;

use super::core::CoreSupervisor;

/// Drives the core supervisor in response to [`SupervisorEvent`]s and
/// delegates process work to a [`WorkerBackend`].
///
/// This is the single writer of all supervisor state: control requests,
/// worker events, exits and timer expiries are handled strictly one at a
/// time, in arrival order.
pub struct Runtime<B: WorkerBackend> {
    core: CoreSupervisor,
    event_tx: mpsc::Sender<SupervisorEvent>,
    event_rx: mpsc::Receiver<SupervisorEvent>,
    backend: B,
    status: StatusBroadcaster,
    /// Queued autostarts and events produced while executing commands
    /// (spawn failures); handled before the next channel read.
    follow_ups: VecDeque<SupervisorEvent>,
}

impl<B: WorkerBackend> fmt::Debug for Runtime<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .field("follow_ups", &self.follow_ups.len())
            .finish_non_exhaustive()
    }
}

impl<B: WorkerBackend> Runtime<B> {
    /// `event_tx` must feed `event_rx`; restart timers post back through it.
    pub fn new(
        core: CoreSupervisor,
        event_tx: mpsc::Sender<SupervisorEvent>,
        event_rx: mpsc::Receiver<SupervisorEvent>,
        backend: B,
        status: StatusBroadcaster,
    ) -> Self {
        Self {
            core,
            event_tx,
            event_rx,
            backend,
            status,
            follow_ups: VecDeque::new(),
        }
    }

    /// Queue a `start` for each id, handled before the first channel read.
    ///
    /// Boot requests never go through the bounded channel, so a long
    /// autostart list cannot fill it before the loop is draining.
    pub fn with_autostart<I>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = SiteId>,
    {
        self.follow_ups
            .extend(ids.into_iter().map(|id| SupervisorEvent::Control {
                id,
                action: Action::Start,
            }));
        self
    }

    /// Main event loop.
    ///
    /// - Consumes `SupervisorEvent`s.
    /// - Feeds them into the core.
    /// - Executes the commands returned by the core.
    /// - On shutdown, kills whatever the backend still owns.
    pub async fn run(mut self) -> Result<()> {
        info!("sitevisor runtime started");

        loop {
            let event = match self.follow_ups.pop_front() {
                Some(e) => e,
                None => match self.event_rx.recv().await {
                    Some(e) => e,
                    None => {
                        info!("runtime event channel closed; exiting");
                        break;
                    }
                },
            };

            debug!(?event, "runtime received event");

            let step = self.core.step(event);

            for command in step.commands {
                self.execute_command(command).await;
            }

            if !step.keep_running {
                info!("core requested exit; stopping runtime");
                break;
            }
        }

        self.backend.shutdown().await?;
        info!("runtime exiting");
        Ok(())
    }

    /// Execute a single command from the core.
    ///
    /// Backend failures are scoped to one site: they are logged (and, for
    /// spawns, fed back into the core) but never end the loop.
    async fn execute_command(&mut self, command: CoreCommand) {
        match command {
            CoreCommand::Spawn { site, generation } => {
                let id = site.id.clone();
                if let Err(e) = self.backend.spawn_worker(site, generation).await {
                    self.follow_ups.push_back(SupervisorEvent::SpawnFailed {
                        id,
                        generation,
                        reason: e.to_string(),
                    });
                }
            }
            CoreCommand::Send {
                id,
                generation,
                command,
            } => {
                if let Err(e) = self.backend.send_command(&id, generation, command).await {
                    debug!(site = %id, generation, command = %command, error = %e, "command dropped");
                }
            }
            CoreCommand::Kill { id, generation } => {
                if let Err(e) = self.backend.kill_worker(&id, generation).await {
                    warn!(site = %id, generation, error = %e, "failed to kill worker");
                }
            }
            CoreCommand::Release { id, generation } => {
                self.backend.release(&id, generation);
            }
            CoreCommand::ScheduleRestart { id, token, delay } => {
                self.schedule_restart(id, token, delay);
            }
            CoreCommand::Broadcast(snapshot) => {
                debug!(
                    site = %snapshot.id,
                    status = %snapshot.status,
                    is_muted = snapshot.is_muted,
                    is_visible = snapshot.is_visible,
                    "broadcasting snapshot"
                );
                self.status.publish(snapshot);
            }
        }
    }

    /// One timer per crashed site; the core decides on expiry whether the
    /// restart still applies.
    fn schedule_restart(&self, id: SiteId, token: Generation, delay: Duration) {
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if tx
                .send(SupervisorEvent::RestartDue {
                    id: id.clone(),
                    token,
                })
                .await
                .is_err()
            {
                debug!(site = %id, "runtime gone before restart timer fired");
            }
        });
    }
}
