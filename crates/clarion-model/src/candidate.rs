//! Wire shape for a clustering-eligible endpoint, as handed from the
//! flow-ingest process (which owns the sketch store) to the batch and
//! incremental workers (which own the clustering math). Carries the
//! already-projected feature vector rather than the sketch itself so
//! the workers never need to link against the ingest process's
//! in-memory state.

use serde::{Deserialize, Serialize};

use crate::endpoint::EndpointId;

/// Coarse traffic-direction tag derived from a sketch's byte ratio;
/// feeds the cluster labeler's behavioral fallback rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DominantRole {
    Client,
    Server,
    Mixed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EligibleCandidate {
    pub endpoint_id: EndpointId,
    pub features: Vec<f64>,
    pub flow_count: u64,
    pub device_type: Option<String>,
    pub identity_profile: Option<String>,
    pub directory_group: Option<String>,
    pub dominant_role: DominantRole,
    pub dominant_service_class: Option<String>,
}
