// src/protocol/message.rs

use std::fmt;

use serde::{Deserialize, Serialize};

/// Direction of a wire message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Supervisor → worker.
    Command,
    /// Worker → supervisor.
    Event,
}

/// The single message shape used on every transport.
///
/// Identity is by `name` only; there are no sequence numbers and no
/// acknowledgements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    pub kind: MessageKind,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl WireMessage {
    pub fn command(command: Command) -> Self {
        Self {
            kind: MessageKind::Command,
            name: command.as_str().to_string(),
            payload: None,
        }
    }

    pub fn event(event: Event) -> Self {
        Self {
            kind: MessageKind::Event,
            name: event.as_str().to_string(),
            payload: None,
        }
    }
}

/// Commands the supervisor sends to a worker. Fire-and-forget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Mute,
    Unmute,
    Show,
    Hide,
    Reload,
}

impl Command {
    pub const ALL: [Command; 5] = [
        Command::Mute,
        Command::Unmute,
        Command::Show,
        Command::Hide,
        Command::Reload,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Command::Mute => "mute",
            Command::Unmute => "unmute",
            Command::Show => "show",
            Command::Hide => "hide",
            Command::Reload => "reload",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Command::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events a worker emits when its internal state changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    /// Page finished loading (first load or after a reload).
    Running,
    Muted,
    Unmuted,
    Shown,
    Hidden,
    /// Periodic liveness signal; advisory only.
    Heartbeat,
}

impl Event {
    pub const ALL: [Event; 6] = [
        Event::Running,
        Event::Muted,
        Event::Unmuted,
        Event::Shown,
        Event::Hidden,
        Event::Heartbeat,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Event::Running => "running",
            Event::Muted => "muted",
            Event::Unmuted => "unmuted",
            Event::Shown => "shown",
            Event::Hidden => "hidden",
            Event::Heartbeat => "heartbeat",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Event::ALL.into_iter().find(|e| e.as_str() == name)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
