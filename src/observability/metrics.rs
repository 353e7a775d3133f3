//! Metrics collection and exposition.
//!
//! # Metrics
//! - `uploads_files_total` (counter): files written
//! - `uploads_bytes_total` (counter): bytes written
//! - `uploads_deleted_total` (counter): files removed on request
//! - `uploads_purged_total` / `uploads_purge_failures_total` (counter): purge outcomes
//! - `chat_relay_requests_total` (counter): relay calls by outcome
//! - `http_requests_in_flight` (gauge): requests currently being handled

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_upload(size_bytes: u64) {
    metrics::counter!("uploads_files_total").increment(1);
    metrics::counter!("uploads_bytes_total").increment(size_bytes);
}

pub fn record_deletion() {
    metrics::counter!("uploads_deleted_total").increment(1);
}

pub fn record_purge(removed: usize, failed: usize) {
    metrics::counter!("uploads_purged_total").increment(removed as u64);
    metrics::counter!("uploads_purge_failures_total").increment(failed as u64);
}

pub fn record_chat_relay(outcome: &'static str) {
    metrics::counter!("chat_relay_requests_total", "outcome" => outcome).increment(1);
}

pub fn set_in_flight(count: u64) {
    metrics::gauge!("http_requests_in_flight").set(count as f64);
}
