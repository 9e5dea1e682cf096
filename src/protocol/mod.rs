// src/protocol/mod.rs

//! Supervisor ↔ worker wire protocol.
//!
//! - [`message`] defines the canonical `{kind, name, payload?}` message and
//!   the typed command/event vocabularies.
//! - [`codec`] frames messages as newline-delimited JSON.

pub mod codec;
pub mod message;

pub use codec::{decode_command, decode_event, decode_line, encode_command, encode_event, encode_line};
pub use message::{Command, Event, MessageKind, WireMessage};
