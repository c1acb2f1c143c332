//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define router metrics (requests, latency, cache efficiency, reloads)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `fs_router_requests_total` (counter): total requests by method, status
//! - `fs_router_request_duration_seconds` (histogram): latency by method
//! - `fs_router_cache_lookups_total` (counter): cache lookups by cache, result
//! - `fs_router_reloads_total` (counter): route table rebuilds by result
//! - `fs_router_routes` (gauge): routes in the published table
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   exporter every call is a no-op
//! - Labels are low-cardinality: never the request path

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

use crate::error::StartupError;

/// Install the Prometheus exporter with an HTTP scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), StartupError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| StartupError::Metrics(e.to_string()))?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record a completed request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    ::metrics::counter!(
        "fs_router_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!(
        "fs_router_request_duration_seconds",
        "method" => method.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record a hit or miss on one of the route caches.
pub fn record_cache_lookup(cache: &'static str, hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    ::metrics::counter!(
        "fs_router_cache_lookups_total",
        "cache" => cache,
        "result" => result
    )
    .increment(1);
}

/// Record the outcome of a route table rebuild.
pub fn record_reload(success: bool) {
    let result = if success { "success" } else { "failure" };
    ::metrics::counter!("fs_router_reloads_total", "result" => result).increment(1);
}

/// Record the size of the published route table.
pub fn record_route_count(routes: usize) {
    ::metrics::gauge!("fs_router_routes").set(routes as f64);
}
