// src/engine/handle.rs

//! Command entry point for the UI layer.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::warn;

use crate::engine::SupervisorEvent;
use crate::errors::{Result, SitevisorError};
use crate::types::Action;

/// Cheap, cloneable sender into the supervisor's control loop.
///
/// Nothing is returned to the caller: effects only surface on the status
/// stream.
#[derive(Clone, Debug)]
pub struct SupervisorHandle {
    tx: mpsc::Sender<SupervisorEvent>,
}

impl SupervisorHandle {
    pub fn new(tx: mpsc::Sender<SupervisorEvent>) -> Self {
        Self { tx }
    }

    /// Queue `action` for `id` without waiting.
    ///
    /// If the control loop is saturated or gone the request is dropped with a
    /// warning; commands carry no delivery guarantee.
    pub fn control(&self, id: impl Into<String>, action: Action) {
        let id = id.into();
        match self.tx.try_send(SupervisorEvent::Control {
            id: id.clone(),
            action,
        }) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!(site = %id, action = %action, "control loop busy; dropping request");
            }
            Err(TrySendError::Closed(_)) => {
                warn!(site = %id, action = %action, "control loop stopped; dropping request");
            }
        }
    }

    /// Queue `action` for `id`, waiting for channel capacity.
    pub async fn send_control(&self, id: impl Into<String>, action: Action) -> Result<()> {
        self.send(SupervisorEvent::Control {
            id: id.into(),
            action,
        })
        .await
    }

    /// Ask the control loop to stop every worker and exit.
    pub async fn shutdown(&self) -> Result<()> {
        self.send(SupervisorEvent::ShutdownRequested).await
    }

    async fn send(&self, event: SupervisorEvent) -> Result<()> {
        self.tx
            .send(event)
            .await
            .map_err(|_| SitevisorError::ChannelClosed("supervisor control loop".to_string()))
    }
}
