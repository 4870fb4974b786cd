//! Cluster and centroid types produced by the batch clusterer and
//! consumed by the incremental clusterer and the SGT lifecycle.

use serde::{Deserialize, Serialize};

use crate::confidence::Confidence;
use crate::endpoint::EndpointId;

/// Per-batch-run cluster identifier. Not stable across runs; stability
/// lives in the SGT value a cluster is bound to, not in this id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClusterId(pub i64);

/// Noise label emitted by the density clusterer for points that do not
/// belong to any cluster.
pub const NOISE_CLUSTER: ClusterId = ClusterId(-1);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    pub id: ClusterId,
    pub centroid: Vec<f64>,
    pub member_count: usize,
    pub label: String,
    pub confidence: Confidence,
    pub rationale: String,
    pub members: Vec<EndpointId>,
}

/// Per-endpoint output of a batch or incremental clustering pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterAssignment {
    pub endpoint_id: EndpointId,
    pub cluster_id: ClusterId,
    pub probability: f64,
    pub confidence: Confidence,
}

/// Last-known centroid per cluster, persisted for fast incremental
/// assignment between batch runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterCentroid {
    pub cluster_id: ClusterId,
    pub sgt_value: Option<u16>,
    pub centroid: Vec<f64>,
    pub member_count: usize,
    /// 95th-percentile intra-cluster distance from the run that
    /// produced this centroid; used by the incremental clusterer's
    /// confidence formula.
    pub p95_intra_cluster_distance: f64,
    pub superseded: bool,
}

/// An immutable, reference-countable snapshot of every active centroid
/// from one batch run. The incremental clusterer holds a handle to
/// exactly one snapshot for the duration of an assignment so it never
/// mixes centroids across runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CentroidSnapshot {
    pub run_id: uuid::Uuid,
    pub generated_at: chrono::DateTime<chrono::Utc>,
    pub centroids: Vec<ClusterCentroid>,
}

impl CentroidSnapshot {
    pub fn active_centroids(&self) -> impl Iterator<Item = &ClusterCentroid> {
        self.centroids.iter().filter(|c| !c.superseded)
    }
}
