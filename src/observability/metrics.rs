//! Metrics collection and exposition.
//!
//! # Metrics
//! - `console_proxy_requests_total` (counter): requests by method, status, rule
//! - `console_proxy_request_duration_seconds` (histogram): latency distribution
//! - `console_proxy_upstream_failures_total` (counter): forwarding failures by origin
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Labels stay low-cardinality: rule prefix, never the full path

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Rule label used for requests no rule matched.
pub const NO_RULE: &str = "none";

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, rule: &str, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
        ("rule", rule.to_string()),
    ];
    metrics::counter!("console_proxy_requests_total", &labels).increment(1);
    metrics::histogram!("console_proxy_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_upstream_failure(origin: &str, kind: &'static str) {
    metrics::counter!(
        "console_proxy_upstream_failures_total",
        "origin" => origin.to_string(),
        "kind" => kind
    )
    .increment(1);
}
