//! [crates/clarion-cluster/src/batch.rs]
//! Batch clusterer (C5): projects qualifying endpoints to feature
//! vectors, runs density clustering, labels each cluster, and emits
//! both the cluster set (for SGT binding, C7) and a centroid snapshot
//! (for the incremental clusterer, C6). A run either produces a
//! complete, internally consistent result or fails outright; it never
//! mutates centroid state on a partial failure.

use chrono::Utc;
use uuid::Uuid;

use clarion_geometry::{mean, p95_intra_cluster_distance};
use clarion_model::cluster::{CentroidSnapshot, Cluster, ClusterAssignment, ClusterCentroid, ClusterId, NOISE_CLUSTER};
use clarion_model::confidence::Confidence;
use clarion_model::endpoint::EndpointId;

use crate::density::{cluster as run_density, DensityConfig};
use crate::errors::ClusterError;
use crate::labeling::{label_cluster, LabelingContext};

pub struct BatchRun {
    pub run_id: Uuid,
    pub clusters: Vec<Cluster>,
    pub assignments: Vec<ClusterAssignment>,
    pub centroid_snapshot: CentroidSnapshot,
}

/// One qualifying endpoint's input to a batch run: its feature vector
/// and the context the semantic labeler needs.
pub struct ClusterCandidate {
    pub endpoint_id: EndpointId,
    pub features: Vec<f64>,
    pub labeling: LabelingContext,
}

pub fn run_batch(candidates: &[ClusterCandidate], config: &DensityConfig) -> Result<BatchRun, ClusterError> {
    if candidates.is_empty() {
        return Err(ClusterError::DegenerateInput("no qualifying endpoints".to_string()));
    }

    let feature_vectors: Vec<Vec<f64>> = candidates.iter().map(|c| c.features.clone()).collect();
    let density = run_density(&feature_vectors, config)?;

    let run_id = Uuid::new_v4();
    let generated_at = Utc::now();

    let max_cluster_id = density.labels.iter().filter(|l| **l != NOISE_CLUSTER).map(|l| l.0).max();
    let Some(max_cluster_id) = max_cluster_id else {
        return Ok(BatchRun {
            run_id,
            clusters: Vec::new(),
            assignments: density
                .labels
                .iter()
                .zip(candidates)
                .map(|(label, c)| ClusterAssignment {
                    endpoint_id: c.endpoint_id,
                    cluster_id: *label,
                    probability: 0.0,
                    confidence: Confidence::zero(),
                })
                .collect(),
            centroid_snapshot: CentroidSnapshot { run_id, generated_at, centroids: Vec::new() },
        });
    };

    let mut clusters = Vec::new();
    let mut centroids = Vec::new();
    let mut assignments = Vec::with_capacity(candidates.len());

    for cluster_id in 0..=max_cluster_id {
        let member_indices: Vec<usize> = density
            .labels
            .iter()
            .enumerate()
            .filter(|(_, label)| label.0 == cluster_id)
            .map(|(i, _)| i)
            .collect();
        if member_indices.is_empty() {
            continue;
        }

        let member_features: Vec<Vec<f64>> = member_indices.iter().map(|&i| feature_vectors[i].clone()).collect();
        let centroid_vector = mean(&member_features)?;
        let p95_distance = p95_intra_cluster_distance(&member_features, &centroid_vector)?;

        let labeling_contexts: Vec<LabelingContext> = member_indices.iter().map(|&i| candidates[i].labeling.clone()).collect();
        let semantic = label_cluster(&labeling_contexts);

        let members: Vec<EndpointId> = member_indices.iter().map(|&i| candidates[i].endpoint_id).collect();
        let cluster_confidence = Confidence::weighted_average(
            &member_indices.iter().map(|&i| (Confidence::new(density.probabilities[i]), 1.0)).collect::<Vec<_>>(),
        )
        .combine(Confidence::new(semantic.strength));

        clusters.push(Cluster {
            id: ClusterId(cluster_id),
            centroid: centroid_vector.clone(),
            member_count: members.len(),
            label: semantic.label.clone(),
            confidence: cluster_confidence,
            rationale: semantic.rationale.clone(),
            members: members.clone(),
        });

        centroids.push(ClusterCentroid {
            cluster_id: ClusterId(cluster_id),
            sgt_value: None,
            centroid: centroid_vector,
            member_count: members.len(),
            p95_intra_cluster_distance: p95_distance,
            superseded: false,
        });

        for &i in &member_indices {
            let endpoint_confidence = Confidence::new(density.probabilities[i]).combine(Confidence::new(semantic.strength));
            assignments.push(ClusterAssignment {
                endpoint_id: candidates[i].endpoint_id,
                cluster_id: ClusterId(cluster_id),
                probability: density.probabilities[i],
                confidence: endpoint_confidence,
            });
        }
    }

    for (i, candidate) in candidates.iter().enumerate() {
        if density.labels[i] == NOISE_CLUSTER {
            assignments.push(ClusterAssignment {
                endpoint_id: candidate.endpoint_id,
                cluster_id: NOISE_CLUSTER,
                probability: 0.0,
                confidence: Confidence::zero(),
            });
        }
    }

    Ok(BatchRun { run_id, clusters, assignments, centroid_snapshot: CentroidSnapshot { run_id, generated_at, centroids } })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labeling::TrafficRole;

    fn candidate(endpoint_id: EndpointId, x: f64, y: f64, device_type: Option<&str>) -> ClusterCandidate {
        ClusterCandidate {
            endpoint_id,
            features: vec![x, y],
            labeling: LabelingContext {
                endpoint_id,
                identity_profile: None,
                device_type: device_type.map(String::from),
                directory_group: None,
                dominant_role: TrafficRole::Client,
                dominant_service_class: None,
            },
        }
    }

    #[test]
    fn batch_run_produces_a_labeled_cluster_and_matching_centroid() {
        let candidates: Vec<_> = (0..30)
            .map(|i| candidate(EndpointId::new(), (i % 3) as f64 * 0.01, (i % 3) as f64 * 0.01, Some("printer")))
            .collect();
        let config = DensityConfig { min_cluster_size: 10, min_samples: 3, epsilon_percentile: 0.9 };

        let run = run_batch(&candidates, &config).unwrap();
        assert_eq!(run.clusters.len(), 1);
        assert_eq!(run.clusters[0].label, "printer");
        assert_eq!(run.centroid_snapshot.centroids.len(), 1);
        assert_eq!(run.assignments.len(), candidates.len());
    }

    #[test]
    fn rejects_empty_candidate_set() {
        let result = run_batch(&[], &DensityConfig::default());
        assert!(matches!(result, Err(ClusterError::DegenerateInput(_))));
    }
}
