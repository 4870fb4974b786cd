//! Communication-matrix cell: aggregated SGT x SGT flow statistics for
//! a time window, the basis of policy recommendation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::flow::Protocol;
use crate::sgt::SgtValue;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortShare {
    pub port: u16,
    pub protocol: Protocol,
    pub flow_share: f64,
    pub byte_share: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolShare {
    pub protocol: Protocol,
    pub flow_share: f64,
}

/// One cell of the SGT x SGT matrix for the window `[window_start, window_end)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixCell {
    pub src_sgt: SgtValue,
    pub dst_sgt: SgtValue,
    pub flow_count: u64,
    pub byte_count: u64,
    pub top_ports: Vec<PortShare>,
    pub dominant_protocols: Vec<ProtocolShare>,
}

/// Bucket for flows whose src or dst endpoint could not be resolved to
/// a current SGT at rebuild time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnknownSgtBucket {
    pub flow_count: u64,
    pub byte_count: u64,
}

/// Immutable snapshot of the full matrix for one window. Never mutated
/// in place; a rebuild produces a new snapshot with an incremented
/// version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixSnapshot {
    pub version: u64,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub cells: Vec<MatrixCell>,
    pub unknown: UnknownSgtBucket,
    /// True when the matrix was built from sketch top-K/aggregate data
    /// rather than a full flow stream over the window (approximate
    /// mode, per the communication-matrix design).
    pub approximate: bool,
}
