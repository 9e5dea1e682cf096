// src/engine/mod.rs

//! Supervision engine for sitevisor.
//!
//! This module ties together:
//! - the per-site worker state ([`state`])
//! - the bounded crash/restart policy ([`policy`])
//! - the pure transition functions for control actions and worker events
//!   ([`transition`])
//! - the main control loop that reacts to:
//!   - control requests (`start`, `stop`, `mute`, ...)
//!   - protocol events from workers
//!   - worker exits and spawn failures
//!   - restart timers
//!   - shutdown signals
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`]. Every input goes through one channel and one
//! sequential loop, so the site map needs no lock.

use std::time::{Duration, Instant};

use crate::config::SiteConfig;
use crate::protocol::{Command, Event};
use crate::status::Snapshot;
use crate::types::Action;

/// Canonical site id type used throughout the engine.
pub type SiteId = String;

/// Identifies one spawned process for a site. Strictly increasing per
/// supervisor, so events from a replaced process can be told apart.
pub type Generation = u64;

/// Inputs to the control loop.
#[derive(Debug, Clone)]
pub enum SupervisorEvent {
    /// External command from the UI layer / console.
    Control { id: SiteId, action: Action },
    /// Protocol event decoded from a worker's output.
    Worker {
        id: SiteId,
        generation: Generation,
        event: Event,
        at: Instant,
    },
    /// A worker process exited. The code is informational only.
    WorkerExited {
        id: SiteId,
        generation: Generation,
        code: Option<i32>,
    },
    /// The backend could not create the process at all.
    SpawnFailed {
        id: SiteId,
        generation: Generation,
        reason: String,
    },
    /// A restart timer fired. `token` is the generation that crashed.
    RestartDue { id: SiteId, token: Generation },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

/// Command produced by the pure core, executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq)]
pub enum CoreCommand {
    Spawn {
        site: SiteConfig,
        generation: Generation,
    },
    Send {
        id: SiteId,
        generation: Generation,
        command: Command,
    },
    Kill { id: SiteId, generation: Generation },
    /// Drop the backend's bookkeeping for an exited process.
    Release { id: SiteId, generation: Generation },
    ScheduleRestart {
        id: SiteId,
        token: Generation,
        delay: Duration,
    },
    Broadcast(Snapshot),
}

/// Decision returned by the core after handling a single event.
#[derive(Debug, Clone)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
    /// Whether the outer loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    pub fn continue_with(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }
}

pub mod core;
pub mod handle;
pub mod policy;
pub mod runtime;
pub mod state;
pub mod transition;

pub use core::CoreSupervisor;
pub use handle::SupervisorHandle;
pub use policy::{ExitDecision, RestartPolicy};
pub use runtime::Runtime;
pub use state::{Carry, WorkerState};
pub use transition::transition;
