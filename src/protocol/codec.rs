// src/protocol/codec.rs

//! Newline-delimited JSON framing for [`WireMessage`].
//!
//! Decoding never fails loudly: blank lines, malformed JSON, messages of the
//! wrong kind and unknown names all decode to `None`.

use tracing::debug;

use super::message::{Command, Event, MessageKind, WireMessage};

/// Encode one message as a single line, including the trailing `\n`.
pub fn encode_line(message: &WireMessage) -> String {
    // Serializing a struct of strings and a JSON value cannot fail.
    let mut line = serde_json::to_string(message).unwrap_or_default();
    line.push('\n');
    line
}

/// Decode one line into a message; `None` for blank or malformed input.
pub fn decode_line(line: &str) -> Option<WireMessage> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<WireMessage>(trimmed) {
        Ok(msg) => Some(msg),
        Err(e) => {
            debug!(line = %trimmed, error = %e, "ignoring malformed protocol line");
            None
        }
    }
}

pub fn encode_command(command: Command) -> String {
    encode_line(&WireMessage::command(command))
}

pub fn encode_event(event: Event) -> String {
    encode_line(&WireMessage::event(event))
}

/// Supervisor side: decode a worker's stdout line.
pub fn decode_event(line: &str) -> Option<Event> {
    let msg = decode_line(line)?;
    if msg.kind != MessageKind::Event {
        debug!(name = %msg.name, "ignoring non-event message from worker");
        return None;
    }
    let event = Event::from_name(&msg.name);
    if event.is_none() {
        debug!(name = %msg.name, "ignoring unrecognized worker event");
    }
    event
}

/// Worker side: decode a supervisor's stdin line.
pub fn decode_command(line: &str) -> Option<Command> {
    let msg = decode_line(line)?;
    if msg.kind != MessageKind::Command {
        return None;
    }
    Command::from_name(&msg.name)
}
