//! Security Group Tag registry types: stable tags decoupled from
//! cluster identity, current membership, and the append-only
//! assignment history used for audit and stability metrics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cluster::ClusterId;
use crate::confidence::Confidence;
use crate::endpoint::EndpointId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SgtValue(pub u16);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityGroupTag {
    pub value: SgtValue,
    pub name: String,
    pub category: String,
    pub description: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Who or what produced a membership row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MembershipOrigin {
    Clusterer,
    Manual,
    ExternalSystem,
    Incremental,
}

/// The current mapping of an endpoint to an SGT. Invariant: an
/// endpoint has at most one current membership row at a time; the
/// store enforces this by superseding the previous row before
/// inserting a new one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SgtMembership {
    pub endpoint_id: EndpointId,
    pub sgt: SgtValue,
    pub assigned_at: DateTime<Utc>,
    pub confirmed_at: DateTime<Utc>,
    pub assigned_by: MembershipOrigin,
    pub confidence: Confidence,
    pub source_cluster: Option<ClusterId>,
}

/// Append-only audit trail. Rows are never mutated; a superseded
/// membership becomes a history row with `superseded_at` set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentHistoryRecord {
    pub endpoint_id: EndpointId,
    pub sgt: SgtValue,
    pub assigned_at: DateTime<Utc>,
    pub superseded_at: Option<DateTime<Utc>>,
    pub assigned_by: MembershipOrigin,
}

impl From<&SgtMembership> for AssignmentHistoryRecord {
    fn from(membership: &SgtMembership) -> Self {
        AssignmentHistoryRecord {
            endpoint_id: membership.endpoint_id,
            sgt: membership.sgt,
            assigned_at: membership.assigned_at,
            superseded_at: None,
            assigned_by: membership.assigned_by,
        }
    }
}

/// Emitted when a cluster's churn versus the prior run exceeds the
/// configured stability threshold; automated rebinding of existing
/// members is suppressed until an operator reviews it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StabilityReviewEvent {
    pub cluster_id: ClusterId,
    pub sgt: Option<SgtValue>,
    pub churn_fraction: f64,
    pub raised_at: DateTime<Utc>,
}
