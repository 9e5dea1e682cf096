// src/engine/transition.rs

//! Pure transition logic for a single worker.
//!
//! Nothing here touches channels, processes or the clock: callers pass in the
//! current [`WorkerState`] and get back the next state plus the commands the
//! IO shell must execute.

use std::time::Instant;

use tracing::{debug, trace};

use crate::engine::state::WorkerState;
use crate::engine::CoreCommand;
use crate::protocol::{Command, Event};
use crate::types::{Action, WorkerStatus};

/// Apply one protocol event to a worker's state.
///
/// | event       | effect                                                        |
/// |-------------|---------------------------------------------------------------|
/// | `running`   | status RUNNING; re-send `mute` if muted, `hide` if not visible |
/// | `muted`     | `is_muted = true`                                              |
/// | `unmuted`   | `is_muted = false`                                             |
/// | `shown`     | `is_visible = true`                                            |
/// | `hidden`    | `is_visible = false`                                           |
/// | `heartbeat` | `last_heartbeat_at` only                                       |
///
/// A snapshot broadcast is appended iff status, muting or visibility changed.
pub fn transition(
    mut state: WorkerState,
    event: Event,
    at: Instant,
) -> (WorkerState, Vec<CoreCommand>) {
    let before = state.observable();
    let mut commands = Vec::new();

    match event {
        Event::Running => {
            state.status = WorkerStatus::Running;
            // A new session knows nothing of the user's last choices.
            if state.is_muted {
                commands.push(send(&state, Command::Mute));
            }
            if !state.is_visible {
                commands.push(send(&state, Command::Hide));
            }
        }
        Event::Muted => state.is_muted = true,
        Event::Unmuted => state.is_muted = false,
        Event::Shown => state.is_visible = true,
        Event::Hidden => state.is_visible = false,
        Event::Heartbeat => {
            trace!(site = %state.id, generation = state.generation, "heartbeat");
            state.last_heartbeat_at = Some(at);
        }
    }

    if state.observable() != before {
        commands.push(CoreCommand::Broadcast(state.snapshot()));
    }

    (state, commands)
}

/// Protocol command an action forwards to the worker, if any.
///
/// `start` and `stop` are lifecycle actions handled by the supervisor itself.
pub fn command_for(action: Action) -> Option<Command> {
    match action {
        Action::Mute => Some(Command::Mute),
        Action::Unmute => Some(Command::Unmute),
        Action::Show => Some(Command::Show),
        Action::Hide => Some(Command::Hide),
        Action::Reload => Some(Command::Reload),
        Action::Start | Action::Stop => None,
    }
}

/// Handle a forwarded action (`mute`, `unmute`, `show`, `hide`, `reload`)
/// against a live worker.
///
/// Suppressed while the worker is STARTING so a half-loaded session is never
/// raced. `reload` flips the status to STARTING straight away so listeners
/// see the site as busy until the next `running` event.
pub fn forward_action(state: &mut WorkerState, action: Action) -> Vec<CoreCommand> {
    let Some(command) = command_for(action) else {
        return Vec::new();
    };

    if state.status == WorkerStatus::Starting {
        debug!(
            site = %state.id,
            action = %action,
            "worker is starting; dropping command"
        );
        return Vec::new();
    }

    let mut commands = Vec::new();
    if command == Command::Reload {
        state.status = WorkerStatus::Starting;
        commands.push(CoreCommand::Broadcast(state.snapshot()));
    }
    commands.push(send(state, command));
    commands
}

fn send(state: &WorkerState, command: Command) -> CoreCommand {
    CoreCommand::Send {
        id: state.id.clone(),
        generation: state.generation,
        command,
    }
}
