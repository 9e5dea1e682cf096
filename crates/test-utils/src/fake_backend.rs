use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use tokio::sync::mpsc;
use sitevisor::config::SiteConfig;
use sitevisor::engine::{Generation, SupervisorEvent};
use sitevisor::errors::SitevisorError;
use sitevisor::exec::{BackendFuture, WorkerBackend};
use sitevisor::protocol::{Command, Event};

/// One call the runtime made on the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    Spawn { id: String, generation: Generation },
    Send { id: String, generation: Generation, command: Command },
    Kill { id: String, generation: Generation },
    Release { id: String, generation: Generation },
}

#[derive(Debug, Default)]
struct FakeState {
    calls: Vec<BackendCall>,
    live: HashMap<String, Generation>,
    fail_spawn: HashSet<String>,
    keep_alive_on_kill: bool,
}

/// A fake backend that:
/// - records every call
/// - never starts a process
/// - reports a `WorkerExited` for each kill, like a real process would
///
/// Tests drive the worker side through the paired [`FakeWorkers`].
pub struct FakeBackend {
    runtime_tx: mpsc::Sender<SupervisorEvent>,
    state: Arc<Mutex<FakeState>>,
}

impl FakeBackend {
    pub fn new(runtime_tx: mpsc::Sender<SupervisorEvent>) -> (Self, FakeWorkers) {
        let state = Arc::new(Mutex::new(FakeState::default()));
        let workers = FakeWorkers {
            runtime_tx: runtime_tx.clone(),
            state: Arc::clone(&state),
        };
        (Self { runtime_tx, state }, workers)
    }
}

impl WorkerBackend for FakeBackend {
    fn spawn_worker(&mut self, site: SiteConfig, generation: Generation) -> BackendFuture<'_> {
        let mut guard = self.state.lock().unwrap();
        guard.calls.push(BackendCall::Spawn {
            id: site.id.clone(),
            generation,
        });
        let result = if guard.fail_spawn.contains(&site.id) {
            Err(SitevisorError::SpawnFailed {
                site: site.id.clone(),
                reason: "fake spawn failure".to_string(),
            })
        } else {
            guard.live.insert(site.id.clone(), generation);
            Ok(())
        };
        Box::pin(async move { result })
    }

    fn send_command(
        &mut self,
        id: &str,
        generation: Generation,
        command: Command,
    ) -> BackendFuture<'_> {
        self.state.lock().unwrap().calls.push(BackendCall::Send {
            id: id.to_string(),
            generation,
            command,
        });
        Box::pin(async { Ok(()) })
    }

    fn kill_worker(&mut self, id: &str, generation: Generation) -> BackendFuture<'_> {
        let keep_alive = {
            let mut guard = self.state.lock().unwrap();
            guard.calls.push(BackendCall::Kill {
                id: id.to_string(),
                generation,
            });
            guard.keep_alive_on_kill
        };

        if !keep_alive {
            // Report the exit from outside the control loop, as a real
            // process's waiter task would.
            let tx = self.runtime_tx.clone();
            let id = id.to_string();
            tokio::spawn(async move {
                let _ = tx
                    .send(SupervisorEvent::WorkerExited {
                        id,
                        generation,
                        code: None,
                    })
                    .await;
            });
        }
        Box::pin(async { Ok(()) })
    }

    fn release(&mut self, id: &str, generation: Generation) {
        let mut guard = self.state.lock().unwrap();
        guard.calls.push(BackendCall::Release {
            id: id.to_string(),
            generation,
        });
        if guard.live.get(id) == Some(&generation) {
            guard.live.remove(id);
        }
    }

    fn shutdown(&mut self) -> BackendFuture<'_> {
        self.state.lock().unwrap().live.clear();
        Box::pin(async { Ok(()) })
    }
}

/// Test-side view of the fake: inspect calls, play the worker's part.
#[derive(Clone)]
pub struct FakeWorkers {
    runtime_tx: mpsc::Sender<SupervisorEvent>,
    state: Arc<Mutex<FakeState>>,
}

impl FakeWorkers {
    pub fn calls(&self) -> Vec<BackendCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn spawn_count(&self, id: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, BackendCall::Spawn { id: i, .. } if i == id))
            .count()
    }

    /// Commands sent to any generation of `id`, in order.
    pub fn commands_for(&self, id: &str) -> Vec<Command> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                BackendCall::Send { id: i, command, .. } if i == id => Some(command),
                _ => None,
            })
            .collect()
    }

    pub fn kill_count(&self, id: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, BackendCall::Kill { id: i, .. } if i == id))
            .count()
    }

    /// Generation of the live (spawned, not released) worker for `id`.
    pub fn generation_of(&self, id: &str) -> Option<Generation> {
        self.state.lock().unwrap().live.get(id).copied()
    }

    pub fn fail_spawns_for(&self, id: &str) {
        self.state.lock().unwrap().fail_spawn.insert(id.to_string());
    }

    /// Kills are recorded but no exit is reported.
    pub fn keep_alive_on_kill(&self) {
        self.state.lock().unwrap().keep_alive_on_kill = true;
    }

    /// Emit a protocol event from the live worker for `id`.
    pub async fn emit(&self, id: &str, event: Event) {
        let generation = self
            .generation_of(id)
            .unwrap_or_else(|| panic!("no live fake worker for '{id}'"));
        self.emit_from(id, generation, event).await;
    }

    /// Emit a protocol event tagged with an explicit generation.
    pub async fn emit_from(&self, id: &str, generation: Generation, event: Event) {
        self.runtime_tx
            .send(SupervisorEvent::Worker {
                id: id.to_string(),
                generation,
                event,
                at: Instant::now(),
            })
            .await
            .expect("runtime channel closed");
    }

    /// Make the live worker for `id` exit on its own.
    pub async fn exit(&self, id: &str, code: Option<i32>) {
        let generation = self
            .generation_of(id)
            .unwrap_or_else(|| panic!("no live fake worker for '{id}'"));
        self.runtime_tx
            .send(SupervisorEvent::WorkerExited {
                id: id.to_string(),
                generation,
                code,
            })
            .await
            .expect("runtime channel closed");
    }
}
