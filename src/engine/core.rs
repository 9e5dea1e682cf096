// src/engine/core.rs

//! Pure core supervisor state machine.
//!
//! [`CoreSupervisor`] consumes [`SupervisorEvent`]s and produces:
//! - an updated site → [`WorkerState`] map
//! - a list of [`CoreCommand`]s describing what the IO shell should do next
//!
//! The async shell (`engine::runtime::Runtime`) is responsible for:
//! - reading events from the channel
//! - spawning, messaging and killing processes through a `WorkerBackend`
//! - arming restart timers and publishing snapshots
//!
//! The core has no channels, no Tokio types and performs no process IO, so
//! it can be unit tested by feeding events directly.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::config::{SiteConfig, SiteRegistry};
use crate::engine::policy::{ExitDecision, RestartPolicy};
use crate::engine::state::{Carry, WorkerState};
use crate::engine::transition::{forward_action, transition};
use crate::engine::{CoreCommand, CoreStep, Generation, SiteId, SupervisorEvent};
use crate::protocol::Event;
use crate::types::{Action, WorkerStatus};

/// A respawn waiting for its timer.
#[derive(Debug, Clone)]
struct PendingRestart {
    token: Generation,
    site: SiteConfig,
    carry: Carry,
}

#[derive(Debug)]
pub struct CoreSupervisor {
    registry: Arc<dyn SiteRegistry>,
    policy: RestartPolicy,
    workers: HashMap<SiteId, WorkerState>,
    pending_restarts: HashMap<SiteId, PendingRestart>,
    next_generation: Generation,
}

impl CoreSupervisor {
    pub fn new(registry: Arc<dyn SiteRegistry>, policy: RestartPolicy) -> Self {
        Self {
            registry,
            policy,
            workers: HashMap::new(),
            pending_restarts: HashMap::new(),
            next_generation: 1,
        }
    }

    /// Live state for `id`, if a process exists or is being spawned.
    pub fn worker(&self, id: &str) -> Option<&WorkerState> {
        self.workers.get(id)
    }

    pub fn live_ids(&self) -> Vec<SiteId> {
        let mut ids: Vec<_> = self.workers.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn has_pending_restart(&self, id: &str) -> bool {
        self.pending_restarts.contains_key(id)
    }

    /// Handle a single event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: SupervisorEvent) -> CoreStep {
        match event {
            SupervisorEvent::Control { id, action } => {
                CoreStep::continue_with(self.handle_control(id, action))
            }
            SupervisorEvent::Worker {
                id,
                generation,
                event,
                at,
            } => CoreStep::continue_with(self.handle_worker_event(&id, generation, event, at)),
            SupervisorEvent::WorkerExited {
                id,
                generation,
                code,
            } => CoreStep::continue_with(self.handle_exit(id, generation, code)),
            SupervisorEvent::SpawnFailed {
                id,
                generation,
                reason,
            } => CoreStep::continue_with(self.handle_spawn_failed(id, generation, &reason)),
            SupervisorEvent::RestartDue { id, token } => {
                CoreStep::continue_with(self.handle_restart_due(id, token))
            }
            SupervisorEvent::ShutdownRequested => self.handle_shutdown(),
        }
    }

    fn handle_control(&mut self, id: SiteId, action: Action) -> Vec<CoreCommand> {
        debug!(site = %id, action = %action, "control request");
        match action {
            Action::Start => self.start(id),
            Action::Stop => self.stop(&id),
            other => match self.workers.get_mut(&id) {
                Some(state) => forward_action(state, other),
                None => {
                    debug!(site = %id, action = %other, "no live worker; ignoring");
                    Vec::new()
                }
            },
        }
    }

    /// Spawn a worker unless one is already live. A manual start also
    /// supersedes any respawn still waiting on its timer.
    fn start(&mut self, id: SiteId) -> Vec<CoreCommand> {
        if self.workers.contains_key(&id) {
            debug!(site = %id, "worker already live; start is a no-op");
            return Vec::new();
        }

        let site = match self.registry.resolve(&id) {
            Ok(Some(site)) => site,
            Ok(None) => {
                warn!(site = %id, "start requested for unknown site; ignoring");
                return Vec::new();
            }
            Err(e) => {
                warn!(site = %id, error = %e, "could not read site registry; ignoring start");
                return Vec::new();
            }
        };

        if self.pending_restarts.remove(&id).is_some() {
            info!(site = %id, "manual start supersedes pending restart");
        }

        self.spawn(site, Carry::default())
    }

    fn stop(&mut self, id: &str) -> Vec<CoreCommand> {
        let Some(state) = self.workers.get_mut(id) else {
            debug!(site = %id, "no live worker; stop is a no-op");
            return Vec::new();
        };

        state.user_stopped = true;
        info!(site = %id, generation = state.generation, "stopping worker");
        vec![CoreCommand::Kill {
            id: state.id.clone(),
            generation: state.generation,
        }]
    }

    fn spawn(&mut self, site: SiteConfig, carry: Carry) -> Vec<CoreCommand> {
        let generation = self.next_generation;
        self.next_generation += 1;

        let state = WorkerState::starting(site.clone(), generation, carry);
        let snapshot = state.snapshot();
        info!(
            site = %state.id,
            generation,
            restart_count = state.restart_count,
            "spawning worker"
        );
        self.workers.insert(state.id.clone(), state);

        vec![
            CoreCommand::Spawn { site, generation },
            CoreCommand::Broadcast(snapshot),
        ]
    }

    fn handle_worker_event(
        &mut self,
        id: &str,
        generation: Generation,
        event: Event,
        at: Instant,
    ) -> Vec<CoreCommand> {
        let Some(state) = self.take_current(id, generation) else {
            debug!(site = %id, generation, event = %event, "event from stale worker; ignoring");
            return Vec::new();
        };

        let (next, commands) = transition(state, event, at);
        self.workers.insert(next.id.clone(), next);
        commands
    }

    fn handle_exit(
        &mut self,
        id: SiteId,
        generation: Generation,
        code: Option<i32>,
    ) -> Vec<CoreCommand> {
        let Some(state) = self.take_current(&id, generation) else {
            debug!(site = %id, generation, "exit of stale worker; ignoring");
            return Vec::new();
        };

        info!(site = %id, generation, exit_code = ?code, "worker exited");

        let mut commands = vec![CoreCommand::Release {
            id: id.clone(),
            generation,
        }];

        match self.policy.decide(state.user_stopped, state.restart_count) {
            ExitDecision::Stopped => {
                commands.push(CoreCommand::Broadcast(
                    state.snapshot_with(WorkerStatus::Stopped),
                ));
            }
            ExitDecision::Restart {
                restart_count,
                delay,
            } => {
                warn!(
                    site = %id,
                    restart_count,
                    max_restarts = self.policy.max_restarts,
                    delay_ms = delay.as_millis() as u64,
                    "worker crashed; scheduling restart"
                );
                let mut carry = state.carry();
                carry.restart_count = restart_count;
                commands.push(CoreCommand::Broadcast(
                    state.snapshot_with(WorkerStatus::Crashed),
                ));
                self.pending_restarts.insert(
                    id.clone(),
                    PendingRestart {
                        token: generation,
                        site: state.site,
                        carry,
                    },
                );
                commands.push(CoreCommand::ScheduleRestart {
                    id,
                    token: generation,
                    delay,
                });
            }
            ExitDecision::Exhausted => {
                warn!(
                    site = %id,
                    restart_count = state.restart_count,
                    "worker crashed; restart budget exhausted, waiting for manual start"
                );
                commands.push(CoreCommand::Broadcast(
                    state.snapshot_with(WorkerStatus::Crashed),
                ));
            }
        }

        commands
    }

    /// The process never came up. The site is dropped from the map without
    /// touching the restart budget.
    fn handle_spawn_failed(
        &mut self,
        id: SiteId,
        generation: Generation,
        reason: &str,
    ) -> Vec<CoreCommand> {
        let Some(state) = self.take_current(&id, generation) else {
            return Vec::new();
        };

        error!(site = %id, generation, reason, "failed to spawn worker");

        vec![
            CoreCommand::Release { id, generation },
            CoreCommand::Broadcast(state.snapshot_with(WorkerStatus::Crashed)),
        ]
    }

    fn handle_restart_due(&mut self, id: SiteId, token: Generation) -> Vec<CoreCommand> {
        if self.workers.contains_key(&id) {
            debug!(site = %id, "worker already live; dropping scheduled restart");
            return Vec::new();
        }

        if !matches!(self.pending_restarts.get(&id), Some(p) if p.token == token) {
            debug!(site = %id, token, "restart timer superseded; ignoring");
            return Vec::new();
        }

        match self.pending_restarts.remove(&id) {
            Some(pending) => self.spawn(pending.site, pending.carry),
            None => Vec::new(),
        }
    }

    fn handle_shutdown(&mut self) -> CoreStep {
        info!(live = self.workers.len(), "shutdown requested; stopping all workers");
        self.pending_restarts.clear();

        // The loop ends before any exit is reported, so the final STOPPED
        // record goes out with the kill.
        let mut commands = Vec::new();
        for state in self.workers.values_mut() {
            state.user_stopped = true;
            commands.push(CoreCommand::Kill {
                id: state.id.clone(),
                generation: state.generation,
            });
            commands.push(CoreCommand::Broadcast(
                state.snapshot_with(WorkerStatus::Stopped),
            ));
        }

        CoreStep {
            commands,
            keep_running: false,
        }
    }

    /// Remove and return the state for `id` if it belongs to `generation`.
    fn take_current(&mut self, id: &str, generation: Generation) -> Option<WorkerState> {
        match self.workers.get(id) {
            Some(state) if state.generation == generation => self.workers.remove(id),
            _ => None,
        }
    }
}
