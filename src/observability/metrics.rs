//! Metrics collection and exposition.
//!
//! # Metrics
//! - `users_backend_state` (gauge): 0=disconnected, 1=connecting, 2=connected, 3=failed
//! - `users_backend_connect_attempts_total` (counter): attempts by backend, outcome
//! - `users_gate_decisions_total` (counter): proceed / degraded / unavailable
//! - `users_http_requests_total` (counter): requests by method, status
//! - `users_http_request_duration_seconds` (histogram): latency distribution
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed (tests, disabled metrics)
//! - Labels stay low-cardinality: backend kind, status code, decision

use std::net::SocketAddr;
use std::time::Instant;
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::connectivity::{BackendKind, ConnectionState};

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_backend_state(kind: BackendKind, state: ConnectionState) {
    metrics::gauge!("users_backend_state", "backend" => kind.as_str()).set(state as u8 as f64);
}

pub fn record_connect_attempt(kind: BackendKind, outcome: &'static str) {
    metrics::counter!(
        "users_backend_connect_attempts_total",
        "backend" => kind.as_str(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_gate_decision(decision: &'static str) {
    metrics::counter!("users_gate_decisions_total", "decision" => decision).increment(1);
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "users_http_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("users_http_request_duration_seconds").record(start.elapsed().as_secs_f64());
}
