// src/engine/policy.rs

//! Bounded crash/restart policy.
//!
//! A site gets `max_restarts` automatic respawns, each after the same fixed
//! `delay`. Once the budget is spent the site stays down until someone calls
//! `start` explicitly, which resets the count.

use std::time::Duration;

use crate::config::model::{DEFAULT_MAX_RESTARTS, DEFAULT_RESTART_DELAY};
use crate::config::SupervisorConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartPolicy {
    pub max_restarts: u32,
    pub delay: Duration,
}

/// What to do after a worker process exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitDecision {
    /// The exit was requested via `stop`.
    Stopped,
    /// Respawn after `delay`; `restart_count` is the already incremented value.
    Restart { restart_count: u32, delay: Duration },
    /// Unrequested exit with no budget left.
    Exhausted,
}

impl RestartPolicy {
    pub fn new(max_restarts: u32, delay: Duration) -> Self {
        Self {
            max_restarts,
            delay,
        }
    }

    /// Decide on an exit. Only `user_stopped` distinguishes a requested exit;
    /// the exit code plays no part.
    pub fn decide(&self, user_stopped: bool, restart_count: u32) -> ExitDecision {
        if user_stopped {
            return ExitDecision::Stopped;
        }
        if restart_count < self.max_restarts {
            ExitDecision::Restart {
                restart_count: restart_count + 1,
                delay: self.delay,
            }
        } else {
            ExitDecision::Exhausted
        }
    }
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RESTARTS, DEFAULT_RESTART_DELAY)
    }
}

impl From<&SupervisorConfig> for RestartPolicy {
    fn from(cfg: &SupervisorConfig) -> Self {
        Self::new(cfg.max_restarts, cfg.restart_delay)
    }
}
