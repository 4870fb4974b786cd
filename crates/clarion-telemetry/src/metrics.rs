//! [crates/clarion-telemetry/src/metrics.rs]
//! Installs the Prometheus recorder every daemon exposes its counters
//! and gauges through (error counts by kind, scheduler skip counts,
//! queue depths, and so on — each component registers its own metric
//! names at the call site).

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("failed to install the Prometheus recorder: {0}")]
    Install(String),
}

/// Installs a global Prometheus recorder serving `/metrics` on
/// `listen_addr`. Must be called at most once per process.
pub fn install_prometheus_exporter(listen_addr: SocketAddr) -> Result<(), MetricsError> {
    PrometheusBuilder::new()
        .with_http_listener(listen_addr)
        .install()
        .map_err(|e| MetricsError::Install(e.to_string()))
}
