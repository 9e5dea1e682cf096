// src/exec/process.rs

//! One OS process per site.
//!
//! [`WorkerProcess::spawn`] starts the configured worker program with the
//! site's JSON as its last argument and wires up four background tasks:
//!
//! - a stdin writer that encodes queued [`Command`]s, one per line
//! - a stdout reader that decodes [`Event`]s (unknown lines are skipped)
//! - a stderr drain that logs at warn
//! - a waiter that reports the exit code, or kills the child on request
//!
//! Dropping the handle closes stdin (workers quit on EOF) and kills the
//! child.

use std::process::Stdio;

use anyhow::{anyhow, Context};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command as ProcessCommand};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::config::SiteConfig;
use crate::errors::{Result, SitevisorError};
use crate::protocol::{decode_event, encode_command, Command, Event};

const COMMAND_BUFFER: usize = 32;
const EVENT_BUFFER: usize = 64;

/// How to start a worker: program plus leading arguments. The serialized
/// site is appended as the final argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerLauncher {
    pub program: String,
    pub args: Vec<String>,
}

impl WorkerLauncher {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }
}

/// Exit notification. The code is informational: whether an exit counts as
/// a crash is decided by the supervisor, not by this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerExit {
    pub code: Option<i32>,
}

#[derive(Debug)]
pub struct WorkerProcess {
    site_id: String,
    pid: Option<u32>,
    commands: mpsc::Sender<Command>,
    events: Option<mpsc::Receiver<Event>>,
    exit: Option<oneshot::Receiver<WorkerExit>>,
    kill: Option<oneshot::Sender<()>>,
}

impl WorkerProcess {
    /// Start a worker for `site`. Fails only if no process could be created.
    pub fn spawn(site: &SiteConfig, launcher: &WorkerLauncher) -> Result<Self> {
        let payload = serde_json::to_string(site)?;

        let mut cmd = ProcessCommand::new(&launcher.program);
        cmd.args(&launcher.args)
            .arg(payload)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| SitevisorError::SpawnFailed {
            site: site.id.clone(),
            reason: format!("{}: {e}", launcher.program),
        })?;

        let pid = child.id();
        let (stdin, stdout, stderr) = take_pipes(&mut child).map_err(|e| {
            SitevisorError::SpawnFailed {
                site: site.id.clone(),
                reason: e.to_string(),
            }
        })?;

        info!(site = %site.id, pid = ?pid, program = %launcher.program, "worker process started");

        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>(COMMAND_BUFFER);
        let (ev_tx, ev_rx) = mpsc::channel::<Event>(EVENT_BUFFER);
        let (exit_tx, exit_rx) = oneshot::channel::<WorkerExit>();
        let (kill_tx, kill_rx) = oneshot::channel::<()>();

        tokio::spawn(write_commands(site.id.clone(), stdin, cmd_rx));
        tokio::spawn(read_events(site.id.clone(), stdout, ev_tx));
        tokio::spawn(drain_stderr(site.id.clone(), stderr));
        tokio::spawn(wait_for_exit(site.id.clone(), child, kill_rx, exit_tx));

        Ok(Self {
            site_id: site.id.clone(),
            pid,
            commands: cmd_tx,
            events: Some(ev_rx),
            exit: Some(exit_rx),
            kill: Some(kill_tx),
        })
    }

    pub fn site_id(&self) -> &str {
        &self.site_id
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Queue a command for the worker's stdin. Fire-and-forget: an error
    /// only means the process is gone or not reading.
    pub fn send(&self, command: Command) -> Result<()> {
        self.commands.try_send(command).map_err(|e| {
            SitevisorError::ChannelClosed(format!(
                "stdin of worker '{}' ({command}): {e}",
                self.site_id
            ))
        })
    }

    /// Decoded protocol events. Can be taken once.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<Event>> {
        self.events.take()
    }

    /// Exit notification. Can be taken once.
    pub fn take_exit(&mut self) -> Option<oneshot::Receiver<WorkerExit>> {
        self.exit.take()
    }

    /// Terminate the process. The exit notification still fires.
    pub fn kill(&mut self) {
        if let Some(kill) = self.kill.take() {
            if kill.send(()).is_err() {
                debug!(site = %self.site_id, "worker already exited before kill");
            }
        }
    }
}

fn take_pipes(child: &mut Child) -> anyhow::Result<(ChildStdin, ChildStdout, ChildStderr)> {
    let stdin = child.stdin.take().ok_or_else(|| anyhow!("stdin not piped"))?;
    let stdout = child.stdout.take().ok_or_else(|| anyhow!("stdout not piped"))?;
    let stderr = child.stderr.take().ok_or_else(|| anyhow!("stderr not piped"))?;
    Ok((stdin, stdout, stderr))
}

async fn write_commands(site: String, mut stdin: ChildStdin, mut rx: mpsc::Receiver<Command>) {
    while let Some(command) = rx.recv().await {
        let line = encode_command(command);
        let written = async {
            stdin.write_all(line.as_bytes()).await?;
            stdin.flush().await
        }
        .await;
        if let Err(e) = written {
            debug!(site = %site, command = %command, error = %e, "worker stdin closed; dropping commands");
            break;
        }
    }
    debug!(site = %site, "command writer finished");
}

async fn read_events(site: String, stdout: ChildStdout, tx: mpsc::Sender<Event>) {
    let mut lines = BufReader::new(stdout).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let Some(event) = decode_event(&line) else {
                    continue;
                };
                if tx.send(event).await.is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                debug!(site = %site, error = %e, "error reading worker stdout");
                break;
            }
        }
    }
    debug!(site = %site, "event reader finished");
}

async fn drain_stderr(site: String, stderr: ChildStderr) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        warn!(site = %site, "stderr: {}", line);
    }
}

async fn wait_for_exit(
    site: String,
    mut child: Child,
    mut kill_rx: oneshot::Receiver<()>,
    exit_tx: oneshot::Sender<WorkerExit>,
) {
    let status = tokio::select! {
        status = child.wait() => status.context("waiting for worker process"),
        // Either an explicit kill or the handle was dropped.
        _ = &mut kill_rx => {
            if let Err(e) = child.kill().await {
                warn!(site = %site, error = %e, "failed to kill worker process");
            }
            child.wait().await.context("waiting for killed worker process")
        }
    };

    let code = match status {
        Ok(status) => status.code(),
        Err(e) => {
            warn!(site = %site, error = %e, "lost track of worker process");
            None
        }
    };

    debug!(site = %site, exit_code = ?code, "worker process exited");
    let _ = exit_tx.send(WorkerExit { code });
}
