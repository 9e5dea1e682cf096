// src/console.rs

//! Line-oriented control console.
//!
//! Reads `<action> <site-id>` lines (e.g. `mute youtube`) and forwards them
//! to the supervisor. `quit` (or `exit`) requests shutdown. Bad lines are
//! reported and skipped; the console never stops the supervisor on its own
//! except at `quit`.

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::engine::SupervisorHandle;
use crate::types::Action;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleInput {
    Control { id: String, action: Action },
    Quit,
    Empty,
}

pub fn parse_console_line(line: &str) -> Result<ConsoleInput, String> {
    let mut words = line.split_whitespace();
    let Some(first) = words.next() else {
        return Ok(ConsoleInput::Empty);
    };
    if first.starts_with('#') {
        return Ok(ConsoleInput::Empty);
    }
    if matches!(first.to_lowercase().as_str(), "quit" | "exit") {
        return Ok(ConsoleInput::Quit);
    }

    let action: Action = first.parse()?;
    let id = words
        .next()
        .ok_or_else(|| format!("missing site id after '{action}'"))?;
    if let Some(extra) = words.next() {
        return Err(format!("unexpected trailing input '{extra}'"));
    }

    Ok(ConsoleInput::Control {
        id: id.to_string(),
        action,
    })
}

/// Spawn the console reader over any async input (stdin in production).
pub fn spawn_console<R>(input: R, handle: SupervisorHandle) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(input).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            match parse_console_line(&line) {
                Ok(ConsoleInput::Control { id, action }) => handle.control(id, action),
                Ok(ConsoleInput::Quit) => {
                    info!("quit requested from console");
                    let _ = handle.shutdown().await;
                    break;
                }
                Ok(ConsoleInput::Empty) => {}
                Err(e) => warn!(line = %line.trim(), "invalid console command: {e}"),
            }
        }
        debug!("console input closed");
    })
}
