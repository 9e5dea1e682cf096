// src/engine/state.rs

use std::time::Instant;

use crate::config::SiteConfig;
use crate::engine::{Generation, SiteId};
use crate::status::Snapshot;
use crate::types::WorkerStatus;

/// Fields that survive a crash and respawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Carry {
    pub is_muted: bool,
    pub is_visible: bool,
    pub restart_count: u32,
}

/// Supervisor-side view of one live worker.
///
/// Exists only while a process is live or being spawned; it is removed from
/// the map as soon as the process exits.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerState {
    pub id: SiteId,
    pub site: SiteConfig,
    pub generation: Generation,
    pub status: WorkerStatus,
    pub is_muted: bool,
    pub is_visible: bool,
    pub restart_count: u32,
    pub user_stopped: bool,
    pub last_heartbeat_at: Option<Instant>,
}

impl WorkerState {
    pub fn starting(site: SiteConfig, generation: Generation, carry: Carry) -> Self {
        Self {
            id: site.id.clone(),
            site,
            generation,
            status: WorkerStatus::Starting,
            is_muted: carry.is_muted,
            is_visible: carry.is_visible,
            restart_count: carry.restart_count,
            user_stopped: false,
            last_heartbeat_at: None,
        }
    }

    pub fn carry(&self) -> Carry {
        Carry {
            is_muted: self.is_muted,
            is_visible: self.is_visible,
            restart_count: self.restart_count,
        }
    }

    /// The fields listeners can observe.
    pub fn observable(&self) -> (WorkerStatus, bool, bool) {
        (self.status, self.is_muted, self.is_visible)
    }

    pub fn snapshot(&self) -> Snapshot {
        self.snapshot_with(self.status)
    }

    /// Snapshot reporting a different status, used for the final record of
    /// an exited process.
    pub fn snapshot_with(&self, status: WorkerStatus) -> Snapshot {
        Snapshot {
            id: self.id.clone(),
            status,
            is_muted: self.is_muted,
            is_visible: self.is_visible,
        }
    }
}
