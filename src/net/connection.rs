//! In-flight request tracking.
//!
//! Axum drains connections on its own during graceful shutdown; this tracker
//! makes the drain observable (logs, `http_requests_in_flight` gauge).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::observability::metrics;

/// Counts requests currently being handled.
#[derive(Debug, Clone, Default)]
pub struct InFlightTracker {
    active_count: Arc<AtomicU64>,
}

impl InFlightTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new in-flight request. The guard decrements on drop.
    pub fn track(&self) -> InFlightGuard {
        let count = self.active_count.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::set_in_flight(count);
        InFlightGuard {
            active_count: Arc::clone(&self.active_count),
        }
    }

    /// Requests currently in flight.
    pub fn active_count(&self) -> u64 {
        self.active_count.load(Ordering::SeqCst)
    }
}

/// Held for the lifetime of one request.
#[derive(Debug)]
pub struct InFlightGuard {
    active_count: Arc<AtomicU64>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let remaining = self.active_count.fetch_sub(1, Ordering::SeqCst) - 1;
        metrics::set_in_flight(remaining);
        tracing::trace!(remaining, "Request finished");
    }
}
