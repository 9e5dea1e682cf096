// src/status.rs

//! Status broadcaster.
//!
//! Thin wrapper over [`tokio::sync::broadcast`]: every observable change to a
//! site produces one complete [`Snapshot`], cloned to all subscribers.
//!
//! - Publishing never blocks and never fails; with no subscribers the
//!   snapshot is dropped.
//! - A receiver only sees snapshots sent after it subscribed.
//! - Slow receivers get `RecvError::Lagged(n)` and skip the oldest items.
//!   Because each snapshot is the full truth for its site, skipping is safe.

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::types::WorkerStatus;

/// Complete status record for one site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: String,
    pub status: WorkerStatus,
    pub is_muted: bool,
    pub is_visible: bool,
}

#[derive(Clone, Debug)]
pub struct StatusBroadcaster {
    tx: broadcast::Sender<Snapshot>,
}

impl StatusBroadcaster {
    /// Minimum capacity is 1 (clamped).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Snapshot>(capacity.max(1));
        Self { tx }
    }

    pub fn publish(&self, snapshot: Snapshot) {
        let _ = self.tx.send(snapshot);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Snapshot> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// Print every snapshot as one JSON line on `out` until the broadcaster is
/// dropped.
pub fn spawn_status_printer<W>(mut rx: broadcast::Receiver<Snapshot>, mut out: W) -> JoinHandle<()>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            let snapshot = match rx.recv().await {
                Ok(s) => s,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "status printer lagged; continuing with latest snapshots");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };

            let mut line = match serde_json::to_string(&snapshot) {
                Ok(line) => line,
                Err(e) => {
                    warn!(site = %snapshot.id, error = %e, "could not encode snapshot");
                    continue;
                }
            };
            line.push('\n');

            if let Err(e) = out.write_all(line.as_bytes()).await {
                debug!(error = %e, "status output closed");
                break;
            }
            let _ = out.flush().await;
        }
    })
}
