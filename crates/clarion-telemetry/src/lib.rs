//! [crates/clarion-telemetry/src/lib.rs]
//! Ambient observability shared by every daemon: tracing setup, panic
//! capture, per-kind log-storm suppression, and the Prometheus
//! metrics exporter.

pub mod init;
pub mod metrics;
pub mod suppression;

pub use init::init_tracing;
pub use metrics::{install_prometheus_exporter, MetricsError};
pub use suppression::LogSuppressor;
