//! Shared error taxonomy. Every crate in the workspace maps its own
//! failure modes onto one of these kinds so that callers, metrics, and
//! log sampling can reason about errors uniformly (see the error
//! handling design: at most one log line per kind per source per
//! second, nothing here escalates to process exit).

use std::fmt;

/// Implementation-free error kind shared across the analytics core.
///
/// Each variant corresponds 1:1 to a named error kind in the system
/// design. The variant carries just enough context to build a human
/// message and a metric label; it never carries a stack trace or
/// internal representation detail.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClarionError {
    #[error("transient external failure in {source_system}: {message}")]
    TransientExternal { source_system: String, message: String },

    #[error("invalid sketch shape: expected {expected}, got {actual}")]
    InvalidShape { expected: String, actual: String },

    #[error("template missing for exporter {exporter}, template id {template_id}")]
    TemplateMissing { exporter: String, template_id: u32 },

    #[error("malformed record from {exporter}: {reason}")]
    MalformedRecord { exporter: String, reason: String },

    #[error("identity pending-attribution capacity exceeded (cap={cap})")]
    IdentityPendingCapacityExceeded { cap: usize },

    #[error("clustering run failed: {reason}")]
    ClusteringFailed { reason: String },

    #[error("stability guard exceeded for cluster {cluster_id} (churn={churn:.3})")]
    StabilityExceeded { cluster_id: i64, churn: f64 },

    #[error("invalid configuration: {message}")]
    ConfigurationInvalid { message: String },

    #[error("persistence failed for {operation}: {message}")]
    PersistenceFailed { operation: String, message: String },
}

impl ClarionError {
    /// Stable label used as a metric dimension and for log-storm
    /// suppression keys. Never includes per-call context.
    pub fn kind(&self) -> &'static str {
        match self {
            ClarionError::TransientExternal { .. } => "transient_external",
            ClarionError::InvalidShape { .. } => "invalid_shape",
            ClarionError::TemplateMissing { .. } => "template_missing",
            ClarionError::MalformedRecord { .. } => "malformed_record",
            ClarionError::IdentityPendingCapacityExceeded { .. } => {
                "identity_pending_capacity_exceeded"
            }
            ClarionError::ClusteringFailed { .. } => "clustering_failed",
            ClarionError::StabilityExceeded { .. } => "stability_exceeded",
            ClarionError::ConfigurationInvalid { .. } => "configuration_invalid",
            ClarionError::PersistenceFailed { .. } => "persistence_failed",
        }
    }

    /// Whether this kind is fatal to the whole process. Only invalid
    /// boot-time configuration escalates; everything else is handled
    /// locally by the caller.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ClarionError::ConfigurationInvalid { .. })
    }
}

/// A structured error response shape safe to hand to external callers:
/// a kind label plus a human message, never internal detail.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ErrorResponse {
    pub kind: String,
    pub message: String,
}

impl From<&ClarionError> for ErrorResponse {
    fn from(err: &ClarionError) -> Self {
        ErrorResponse {
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}
