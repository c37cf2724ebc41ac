//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status, target, route
//! - `gateway_request_duration_seconds` (histogram): latency distribution
//!
//! # Design Decisions
//! - The route label is the matched route's url pattern, so label values are
//!   bounded by the routing table rather than by client-supplied paths
//! - Requests rejected before routing share the [`UNROUTED`] label

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Route label for requests rejected before resolution.
pub const UNROUTED: &str = "unrouted";

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Label set for a completed request.
pub fn request_labels(method: &str, status: u16, target: &str, route: &str) -> [(&'static str, String); 4] {
    [
        ("method", method.to_string()),
        ("status", status.to_string()),
        ("target", target.to_string()),
        ("route", route.to_string()),
    ]
}

/// Record a completed request. `route` is the matched route's url pattern.
pub fn record_request(method: &str, status: u16, target: &str, route: &str, start: Instant) {
    let labels = request_labels(method, status, target, route);
    metrics::counter!("gateway_requests_total", &labels).increment(1);
    metrics::histogram!("gateway_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use crate::routing::RoutingTable;

    #[test]
    fn test_route_label_is_bounded_by_table() {
        let config = parse_config(include_str!("../../gateway.toml")).unwrap();
        let table = RoutingTable::from_config(&config).unwrap();
        let patterns: Vec<&str> = table.routes().iter().map(|r| r.url.as_str()).collect();

        for path in ["/anything/else", "/wp-login.php", "/1234/diff/5/6", "/user/alice", "/restricted/x"] {
            let route = table.resolve(path).route;
            let labels = request_labels("GET", 200, route.kind(), &route.url);
            assert!(patterns.contains(&labels[3].1.as_str()));
        }
        assert_eq!(
            request_labels("GET", 200, "main", &table.resolve("/wp-login.php").route.url)[3].1,
            request_labels("GET", 200, "main", &table.resolve("/anything/else").route.url)[3].1
        );
    }
}
