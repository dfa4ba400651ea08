//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_invocations_total` (counter): invocations by outcome
//! - `gateway_backend_call_duration_seconds` (histogram): backend latency by result
//!
//! Recording is a no-op until a recorder is installed, so library users and
//! tests pay nothing.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with an HTTP scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record the outcome of one invocation (`success` or an error type).
pub fn record_invocation(outcome: &'static str) {
    metrics::counter!("gateway_invocations_total", "outcome" => outcome).increment(1);
}

/// Record the latency of one backend call.
pub fn record_backend_call(result: &'static str, start: Instant) {
    metrics::histogram!("gateway_backend_call_duration_seconds", "result" => result)
        .record(start.elapsed().as_secs_f64());
}
