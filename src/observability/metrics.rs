//! Metrics collection and exposition.
//!
//! # Metrics
//! - `router_requests_total` (counter): requests by method, status
//! - `router_request_duration_seconds` (histogram): latency by method
//! - `router_resolutions_total` (counter): directory lookups by outcome
//! - `router_upstream_attempts_total` (counter): upstream fetches by status
//! - `router_redirects_followed` (histogram): redirects per routed request
//!
//! Without an installed recorder every call here is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "router_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("router_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_resolution(found: bool) {
    let outcome = if found { "found" } else { "not_found" };
    counter!("router_resolutions_total", "outcome" => outcome).increment(1);
}

pub fn record_upstream_attempt(status: u16) {
    counter!("router_upstream_attempts_total", "status" => status.to_string()).increment(1);
}

pub fn record_redirects(count: u8) {
    histogram!("router_redirects_followed").record(f64::from(count));
}
