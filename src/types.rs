// src/types.rs

//! Vocabulary shared by the control surface and the supervisor core.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle status of one site's worker, as seen by listeners.
///
/// Muting and visibility are orthogonal flags on the snapshot, never a
/// status of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerStatus {
    Starting,
    Running,
    Stopped,
    Crashed,
}

impl WorkerStatus {
    /// `true` while a process exists (or is being spawned) for the site.
    pub fn is_live(self) -> bool {
        matches!(self, WorkerStatus::Starting | WorkerStatus::Running)
    }
}

impl fmt::Display for WorkerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WorkerStatus::Starting => "starting",
            WorkerStatus::Running => "running",
            WorkerStatus::Stopped => "stopped",
            WorkerStatus::Crashed => "crashed",
        };
        f.write_str(s)
    }
}

/// External control action, as accepted by `control(id, action)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Start,
    Stop,
    Mute,
    Unmute,
    Show,
    Hide,
    Reload,
}

impl Action {
    pub const ALL: [Action; 7] = [
        Action::Start,
        Action::Stop,
        Action::Mute,
        Action::Unmute,
        Action::Show,
        Action::Hide,
        Action::Reload,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Start => "start",
            Action::Stop => "stop",
            Action::Mute => "mute",
            Action::Unmute => "unmute",
            Action::Show => "show",
            Action::Hide => "hide",
            Action::Reload => "reload",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Action::ALL
            .into_iter()
            .find(|a| a.as_str() == wanted)
            .ok_or_else(|| {
                format!(
                    "invalid action: {wanted} (expected one of start, stop, mute, unmute, show, hide, reload)"
                )
            })
    }
}
