//! Background endpoint health monitor.
//!
//! Remote backends sleep on idle, so the client probes them on a fixed
//! cadence to keep them warm and to track reachability. Each probed endpoint
//! gets its own worker task; workers push [`HealthEvent`]s over a channel and
//! never touch client state directly. Probe failures change status, they
//! never crash the worker.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use crate::error::RemoteError;
use crate::remote::ProbeOutcome;

/// Reachability of one probed endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    /// No probe has completed yet.
    Starting,
    Online,
    /// Reachable, but the endpoint reported a server-side problem.
    Degraded,
    Offline,
}

impl HealthStatus {
    pub fn label(&self) -> &'static str {
        match self {
            HealthStatus::Starting => "starting",
            HealthStatus::Online => "online",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Offline => "offline",
        }
    }
}

/// One probe result, pushed to the owner of the monitor.
#[derive(Debug, Clone)]
pub struct HealthEvent {
    pub endpoint: String,
    pub status: HealthStatus,
    /// Failure or server-error detail, when there is one.
    pub detail: Option<String>,
    pub checked_at: DateTime<Utc>,
}

/// Something the monitor can probe on a cadence.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Stable endpoint name used in events and logs.
    fn endpoint(&self) -> &str;

    async fn probe(&self) -> Result<ProbeOutcome, RemoteError>;
}

/// Status transition for one probe result.
///
/// A reachable endpoint reporting a server-side error only degrades an
/// endpoint already known to be up; from a cold or offline start it counts
/// as reachable.
pub fn next_status(
    previous: HealthStatus,
    outcome: &Result<ProbeOutcome, RemoteError>,
) -> HealthStatus {
    match outcome {
        Ok(ProbeOutcome::Healthy) => HealthStatus::Online,
        Ok(ProbeOutcome::ServerError(_)) => match previous {
            HealthStatus::Online | HealthStatus::Degraded => HealthStatus::Degraded,
            HealthStatus::Starting | HealthStatus::Offline => HealthStatus::Online,
        },
        Err(_) => HealthStatus::Offline,
    }
}

/// Handle over the spawned probe workers.
pub struct HealthMonitor {
    shutdown: watch::Sender<bool>,
    workers: Vec<tokio::task::JoinHandle<()>>,
}

impl HealthMonitor {
    /// Spawn one worker per probe. Each worker probes immediately, then on
    /// its own interval, bounding every probe by `probe_timeout`.
    pub fn spawn(
        probes: Vec<(Arc<dyn HealthProbe>, Duration)>,
        probe_timeout: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<HealthEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let workers = probes
            .into_iter()
            .map(|(probe, interval)| {
                let events = event_tx.clone();
                let shutdown = shutdown_rx.clone();
                tokio::spawn(probe_worker(probe, interval, probe_timeout, events, shutdown))
            })
            .collect();

        (
            Self {
                shutdown: shutdown_tx,
                workers,
            },
            event_rx,
        )
    }

    /// Signal all workers to stop. Idempotent.
    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Stop and wait for the workers, bounded by `wait`. Workers that do not
    /// finish in time are abandoned, never blocked on.
    pub async fn shutdown(self, wait: Duration) {
        self.stop();
        for worker in self.workers {
            if tokio::time::timeout(wait, worker).await.is_err() {
                warn!("health worker did not stop in time");
            }
        }
    }
}

async fn probe_worker(
    probe: Arc<dyn HealthProbe>,
    interval: Duration,
    probe_timeout: Duration,
    events: mpsc::UnboundedSender<HealthEvent>,
    mut shutdown: watch::Receiver<bool>,
) {
    let endpoint = probe.endpoint().to_string();
    let mut status = HealthStatus::Starting;

    loop {
        if *shutdown.borrow() {
            return;
        }

        let outcome = match tokio::time::timeout(probe_timeout, probe.probe()).await {
            Ok(outcome) => outcome,
            Err(_) => Err(RemoteError::Timeout(probe_timeout.as_secs())),
        };

        let next = next_status(status, &outcome);
        if next != status {
            debug!(endpoint = %endpoint, from = status.label(), to = next.label(), "health transition");
        }
        status = next;

        let detail = match &outcome {
            Ok(ProbeOutcome::Healthy) => None,
            Ok(ProbeOutcome::ServerError(msg)) => Some(msg.clone()),
            Err(err) => Some(err.to_string()),
        };
        // Receiver gone means the owner shut down without signalling; exit.
        if events
            .send(HealthEvent {
                endpoint: endpoint.clone(),
                status,
                detail,
                checked_at: Utc::now(),
            })
            .is_err()
        {
            return;
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = shutdown.changed() => {}
        }
    }
}
