use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use sitevisor::config::SiteRegistry;
use sitevisor::engine::{
    CoreSupervisor, RestartPolicy, Runtime, SiteId, SupervisorEvent, SupervisorHandle,
};
use sitevisor::status::{Snapshot, StatusBroadcaster};

use crate::fake_backend::{FakeBackend, FakeWorkers};
use crate::with_timeout;

/// A running supervisor wired to a [`FakeBackend`], with a subscription to
/// its status stream taken before the loop starts.
pub struct Harness {
    pub handle: SupervisorHandle,
    pub workers: FakeWorkers,
    pub snapshots: broadcast::Receiver<Snapshot>,
    runtime: JoinHandle<sitevisor::errors::Result<()>>,
}

impl Harness {
    pub fn start(registry: Arc<dyn SiteRegistry>, policy: RestartPolicy) -> Self {
        Self::boot(registry, policy, 64, Vec::new())
    }

    /// Like [`Harness::start`], with an explicit event channel capacity and
    /// the ids the runtime starts on boot.
    pub fn boot(
        registry: Arc<dyn SiteRegistry>,
        policy: RestartPolicy,
        event_capacity: usize,
        autostart: Vec<SiteId>,
    ) -> Self {
        let (tx, rx) = mpsc::channel::<SupervisorEvent>(event_capacity);
        let (backend, workers) = FakeBackend::new(tx.clone());
        let status = StatusBroadcaster::new(64);
        let snapshots = status.subscribe();

        let core = CoreSupervisor::new(registry, policy);
        let runtime = tokio::spawn(
            Runtime::new(core, tx.clone(), rx, backend, status)
                .with_autostart(autostart)
                .run(),
        );

        Self {
            handle: SupervisorHandle::new(tx),
            workers,
            snapshots,
            runtime,
        }
    }

    /// Next snapshot on the status stream (fails the test after 5s).
    pub async fn next_snapshot(&mut self) -> Snapshot {
        with_timeout(self.snapshots.recv())
            .await
            .expect("status stream closed")
    }

    /// A snapshot already waiting on the stream, if any.
    pub fn try_snapshot(&mut self) -> Option<Snapshot> {
        self.snapshots.try_recv().ok()
    }

    /// Request shutdown and wait for the control loop to finish.
    pub async fn shutdown(self) -> sitevisor::errors::Result<()> {
        self.handle.shutdown().await?;
        with_timeout(self.runtime).await.expect("runtime task panicked")
    }
}
