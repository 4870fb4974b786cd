//! [crates/clarion-cluster/src/incremental.rs]
//! Incremental clusterer (C6): assigns a single endpoint's feature
//! vector to the nearest centroid from an immutable snapshot taken at
//! the last batch run. Stateless and safe to run concurrently across
//! endpoints; the caller is responsible for holding one snapshot
//! handle for the duration of a pass so it never mixes centroids from
//! two runs.

use clarion_geometry::euclidean;
use clarion_model::cluster::{CentroidSnapshot, ClusterAssignment, NOISE_CLUSTER};
use clarion_model::confidence::Confidence;
use clarion_model::endpoint::EndpointId;

use crate::errors::ClusterError;

pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.5;

/// Assigns `features` to the nearest centroid in `snapshot`. Returns
/// an assignment to [`clarion_model::cluster::NOISE_CLUSTER`] with
/// zero confidence when the snapshot has no active centroids, or when
/// the best match falls below `confidence_threshold` — the endpoint
/// is left for the next batch run either way.
pub fn assign(
    endpoint_id: EndpointId,
    features: &[f64],
    snapshot: &CentroidSnapshot,
    confidence_threshold: f64,
) -> Result<ClusterAssignment, ClusterError> {
    let mut best: Option<(f64, &clarion_model::cluster::ClusterCentroid)> = None;
    for centroid in snapshot.active_centroids() {
        let distance = euclidean(features, &centroid.centroid)?;
        if best.as_ref().map_or(true, |(best_distance, _)| distance < *best_distance) {
            best = Some((distance, centroid));
        }
    }

    let Some((distance, centroid)) = best else {
        return Ok(ClusterAssignment {
            endpoint_id,
            cluster_id: NOISE_CLUSTER,
            probability: 0.0,
            confidence: Confidence::zero(),
        });
    };

    let d_max = centroid.p95_intra_cluster_distance.max(f64::EPSILON);
    let confidence = Confidence::new((1.0 - distance / d_max).max(0.0));

    if confidence.value() >= confidence_threshold {
        Ok(ClusterAssignment { endpoint_id, cluster_id: centroid.cluster_id, probability: confidence.value(), confidence })
    } else {
        Ok(ClusterAssignment { endpoint_id, cluster_id: NOISE_CLUSTER, probability: 0.0, confidence: Confidence::zero() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use clarion_model::cluster::{ClusterCentroid, ClusterId};
    use uuid::Uuid;

    fn snapshot(centroids: Vec<ClusterCentroid>) -> CentroidSnapshot {
        CentroidSnapshot { run_id: Uuid::new_v4(), generated_at: Utc::now(), centroids }
    }

    fn centroid(id: i64, point: Vec<f64>, p95: f64) -> ClusterCentroid {
        ClusterCentroid { cluster_id: ClusterId(id), sgt_value: None, centroid: point, member_count: 60, p95_intra_cluster_distance: p95, superseded: false }
    }

    #[test]
    fn assigns_to_the_nearest_centroid_above_threshold() {
        let snap = snapshot(vec![centroid(0, vec![0.0, 0.0], 1.0), centroid(1, vec![10.0, 10.0], 1.0)]);
        let assignment = assign(EndpointId::new(), &[0.1, 0.1], &snap, DEFAULT_CONFIDENCE_THRESHOLD).unwrap();
        assert_eq!(assignment.cluster_id, ClusterId(0));
    }

    #[test]
    fn leaves_unassigned_when_too_far_from_every_centroid() {
        let snap = snapshot(vec![centroid(0, vec![0.0, 0.0], 0.1)]);
        let assignment = assign(EndpointId::new(), &[50.0, 50.0], &snap, DEFAULT_CONFIDENCE_THRESHOLD).unwrap();
        assert_eq!(assignment.cluster_id, NOISE_CLUSTER);
    }

    #[test]
    fn empty_snapshot_yields_noise() {
        let snap = snapshot(vec![]);
        let assignment = assign(EndpointId::new(), &[1.0, 1.0], &snap, DEFAULT_CONFIDENCE_THRESHOLD).unwrap();
        assert_eq!(assignment.cluster_id, NOISE_CLUSTER);
    }

    #[test]
    fn ignores_superseded_centroids() {
        let mut stale = centroid(0, vec![0.0, 0.0], 1.0);
        stale.superseded = true;
        let snap = snapshot(vec![stale, centroid(1, vec![10.0, 10.0], 1.0)]);
        let assignment = assign(EndpointId::new(), &[0.1, 0.1], &snap, DEFAULT_CONFIDENCE_THRESHOLD).unwrap();
        assert_eq!(assignment.cluster_id, NOISE_CLUSTER);
    }
}
