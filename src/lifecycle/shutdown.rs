//! Shutdown trigger shared by every part of the service.

use std::sync::Arc;

use tokio::sync::watch;

/// Why the service is shutting down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownReason {
    /// An OS termination signal, by name.
    Signal(&'static str),
    /// An unrecovered fault (handler panic, transport failure).
    Fault(String),
}

impl std::fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShutdownReason::Signal(name) => write!(f, "signal {}", name),
            ShutdownReason::Fault(detail) => write!(f, "fault: {}", detail),
        }
    }
}

/// Cloneable handle used to request shutdown.
///
/// Only the first trigger is recorded; later triggers return `false` and do
/// nothing, so the shutdown sequence runs at most once.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<Option<ShutdownReason>>>,
}

impl Shutdown {
    /// Create a new, untriggered handle.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Subscribe to the trigger state.
    pub fn subscribe(&self) -> watch::Receiver<Option<ShutdownReason>> {
        self.tx.subscribe()
    }

    /// Request shutdown. Returns `true` only for the trigger that was accepted.
    pub fn trigger(&self, reason: ShutdownReason) -> bool {
        let mut accepted = false;
        self.tx.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(reason.clone());
            accepted = true;
            true
        });

        if accepted {
            tracing::info!(reason = %reason, "Shutdown triggered");
        } else {
            tracing::info!(reason = %reason, "Shutdown already in progress, ignoring trigger");
        }
        accepted
    }

    /// The accepted trigger, if any.
    pub fn reason(&self) -> Option<ShutdownReason> {
        self.tx.borrow().clone()
    }

    /// Wait until shutdown is triggered.
    pub async fn wait(&self) -> ShutdownReason {
        let mut rx = self.tx.subscribe();
        loop {
            if let Some(reason) = rx.borrow_and_update().clone() {
                return reason;
            }
            // The sender lives in `self`, so the channel cannot close here.
            if rx.changed().await.is_err() {
                return ShutdownReason::Fault("shutdown channel closed".to_string());
            }
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
