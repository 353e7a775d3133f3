//! Shutdown state machine.
//!
//! ```text
//! Running ──trigger──▶ Draining ──▶ Purging ──▶ Closing ──▶ Stopped     (exit 0)
//!                                                   │
//!                                                   └─grace timer─▶ ForcedStop (exit 1)
//! ```
//!
//! - `Draining`: the first trigger is accepted; later triggers are no-ops
//! - `Purging`: the store is sealed and every upload is deleted
//! - `Closing`: the transport stops accepting; in-flight requests may finish
//! - The grace timer starts on entry to `Closing` and is armed exactly once

use std::future::Future;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{oneshot, watch};

use crate::lifecycle::shutdown::{Shutdown, ShutdownReason};
use crate::net::InFlightTracker;
use crate::storage::DirectoryStore;

/// Phase of the shutdown sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownPhase {
    Running,
    Draining,
    Purging,
    Closing,
    Stopped,
    ForcedStop,
}

/// How the process should exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Transport drained within the grace period.
    Clean,
    /// Grace period elapsed with work still in flight.
    Forced,
    /// The upload directory could not be prepared; nothing was served.
    FatalInit,
}

impl ExitStatus {
    /// Process exit code.
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Clean => 0,
            ExitStatus::Forced | ExitStatus::FatalInit => 1,
        }
    }
}

/// Resolves when the controller asks the transport to stop accepting.
pub struct CloseSignal(oneshot::Receiver<()>);

impl CloseSignal {
    /// Wait for the close request. Also resolves if the controller goes away.
    pub async fn recv(self) {
        let _ = self.0.await;
    }
}

/// Owns the shutdown sequence around the store and the transport.
pub struct LifecycleController {
    store: Arc<DirectoryStore>,
    shutdown: Shutdown,
    in_flight: InFlightTracker,
    grace_period: Duration,
    phase: watch::Sender<ShutdownPhase>,
}

impl LifecycleController {
    pub fn new(
        store: Arc<DirectoryStore>,
        shutdown: Shutdown,
        in_flight: InFlightTracker,
        grace_period: Duration,
    ) -> Self {
        let (phase, _) = watch::channel(ShutdownPhase::Running);
        Self {
            store,
            shutdown,
            in_flight,
            grace_period,
            phase,
        }
    }

    /// Observe phase transitions.
    pub fn phases(&self) -> watch::Receiver<ShutdownPhase> {
        self.phase.subscribe()
    }

    /// Run the transport until shutdown, then walk the state machine to a terminal phase.
    ///
    /// `serve` receives a [`CloseSignal`] and must stop accepting connections
    /// once it resolves, returning when every connection has closed.
    pub async fn run<F, Fut>(self, serve: F) -> ExitStatus
    where
        F: FnOnce(CloseSignal) -> Fut,
        Fut: Future<Output = io::Result<()>> + Send + 'static,
    {
        let (close_tx, close_rx) = oneshot::channel();
        let mut transport = tokio::spawn(serve(CloseSignal(close_rx)));
        let mut transport_finished = false;

        let reason = tokio::select! {
            reason = self.shutdown.wait() => reason,
            joined = &mut transport => {
                transport_finished = true;
                let detail = match joined {
                    Ok(Ok(())) => "transport exited unexpectedly".to_string(),
                    Ok(Err(e)) => format!("transport failed: {}", e),
                    Err(e) => format!("transport task failed: {}", e),
                };
                tracing::error!(error = %detail, "Transport stopped before shutdown");
                let reason = ShutdownReason::Fault(detail);
                self.shutdown.trigger(reason.clone());
                reason
            }
        };

        self.enter(ShutdownPhase::Draining);
        tracing::info!(reason = %reason, "Starting graceful shutdown");

        self.enter(ShutdownPhase::Purging);
        self.store.seal();
        match self.store.purge_all().await {
            Ok(report) if report.is_clean() => {
                tracing::info!(removed = report.removed.len(), "Cleanup completed");
            }
            Ok(report) => {
                tracing::warn!(
                    removed = report.removed.len(),
                    failed = report.failed.len(),
                    "Cleanup completed with failures"
                );
            }
            Err(e) => tracing::error!(error = %e, "Cleanup failed"),
        }

        self.enter(ShutdownPhase::Closing);
        let _ = close_tx.send(());
        tracing::info!(
            in_flight = self.in_flight.active_count(),
            grace_period_secs = self.grace_period.as_secs_f64(),
            "Closing listener, draining in-flight requests"
        );

        if transport_finished {
            self.enter(ShutdownPhase::Stopped);
            return ExitStatus::Clean;
        }

        tokio::select! {
            joined = &mut transport => {
                match joined {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => tracing::warn!(error = %e, "Transport reported an error while closing"),
                    Err(e) => tracing::warn!(error = %e, "Transport task failed while closing"),
                }
                self.enter(ShutdownPhase::Stopped);
                tracing::info!("HTTP server closed");
                ExitStatus::Clean
            }
            _ = tokio::time::sleep(self.grace_period) => {
                tracing::error!(
                    in_flight = self.in_flight.active_count(),
                    "Forceful shutdown after timeout"
                );
                transport.abort();
                self.enter(ShutdownPhase::ForcedStop);
                ExitStatus::Forced
            }
        }
    }

    fn enter(&self, phase: ShutdownPhase) {
        tracing::debug!(phase = ?phase, "Shutdown phase");
        self.phase.send_replace(phase);
    }
}
