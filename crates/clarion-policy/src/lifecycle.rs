//! [crates/clarion-policy/src/lifecycle.rs]
//! SGT lifecycle (C7): binds a batch run's clusters to stable SGT
//! values, emits membership updates, and enforces the stability guard
//! and manual-override protection. Incremental assignments (C6) land
//! through the same membership path via [`SgtLifecycle::apply_incremental`].

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use clarion_geometry::churn_ratio;
use clarion_model::cluster::{Cluster, ClusterCentroid, ClusterId};
use clarion_model::confidence::Confidence;
use clarion_model::endpoint::EndpointId;
use clarion_model::sgt::{MembershipOrigin, SecurityGroupTag, SgtMembership, SgtValue};
use clarion_store::SgtRepository;

use crate::errors::PolicyError;

#[derive(Debug, Clone, Copy)]
pub struct SgtLifecycleConfig {
    pub base_value: u16,
    /// Minimum member-overlap fraction with a prior run's cluster for
    /// an existing SGT to be reused without an exact label match.
    pub overlap_threshold: f64,
    /// Churn fraction above which a cluster's rebinding of existing
    /// members is suppressed pending manual review.
    pub churn_threshold: f64,
}

impl Default for SgtLifecycleConfig {
    fn default() -> Self {
        SgtLifecycleConfig { base_value: 2, overlap_threshold: 0.7, churn_threshold: 0.25 }
    }
}

/// External reference system consulted before allocating a new SGT.
/// Optional; brownfield sites without one simply pass `None`.
#[async_trait]
pub trait ReferenceCatalog: Send + Sync {
    async fn equivalent_sgt(&self, label: &str) -> Result<Option<SgtValue>, PolicyError>;
}

#[derive(Debug, Clone, Copy)]
pub struct ClusterBinding {
    pub cluster_id: ClusterId,
    pub sgt: SgtValue,
    pub unstable: bool,
}

pub struct SgtLifecycle<'a> {
    repo: &'a SgtRepository,
    config: SgtLifecycleConfig,
}

impl<'a> SgtLifecycle<'a> {
    pub fn new(repo: &'a SgtRepository, config: SgtLifecycleConfig) -> Self {
        SgtLifecycle { repo, config }
    }

    /// Binds every cluster in a batch run to an SGT and applies the
    /// resulting membership updates. Clusters are processed
    /// independently; a failure partway through does not roll back
    /// earlier bindings since each is already committed at the store
    /// layer by the time this returns.
    pub async fn bind_clusters(
        &self,
        clusters: &[Cluster],
        catalog: Option<&dyn ReferenceCatalog>,
        now: DateTime<Utc>,
    ) -> Result<Vec<ClusterBinding>, PolicyError> {
        let mut bindings = Vec::with_capacity(clusters.len());
        for cluster in clusters {
            bindings.push(self.bind_one(cluster, catalog, now).await?);
        }
        Ok(bindings)
    }

    async fn bind_one(
        &self,
        cluster: &Cluster,
        catalog: Option<&dyn ReferenceCatalog>,
        now: DateTime<Utc>,
    ) -> Result<ClusterBinding, PolicyError> {
        let sgt = self.resolve_sgt(cluster, catalog, now).await?;

        let previous_members = self.repo.members_of(sgt).await?;
        let new_members: HashSet<EndpointId> = cluster.members.iter().copied().collect();
        let churned_out = previous_members.iter().filter(|m| !new_members.contains(m)).count() as u64;
        let unstable = churn_ratio(previous_members.len() as u64, churned_out) > self.config.churn_threshold;

        for &endpoint_id in &cluster.members {
            self.apply_member(endpoint_id, sgt, cluster, unstable, now).await?;
        }

        Ok(ClusterBinding { cluster_id: cluster.id, sgt, unstable })
    }

    /// Equivalence order: external catalog, then exact label match
    /// against an active tag, then ≥ `overlap_threshold` member
    /// overlap with an active tag's current membership, then a fresh
    /// allocation. Label match wins over overlap when both would
    /// trigger, since it is checked first.
    async fn resolve_sgt(&self, cluster: &Cluster, catalog: Option<&dyn ReferenceCatalog>, now: DateTime<Utc>) -> Result<SgtValue, PolicyError> {
        if let Some(catalog) = catalog {
            if let Some(sgt) = catalog.equivalent_sgt(&cluster.label).await? {
                return Ok(sgt);
            }
        }

        let active = self.repo.list_active().await?;
        if let Some(tag) = active.iter().find(|t| t.name == cluster.label) {
            return Ok(tag.value);
        }

        let new_members: HashSet<EndpointId> = cluster.members.iter().copied().collect();
        let mut best: Option<(SgtValue, f64)> = None;
        for tag in &active {
            let prior = self.repo.members_of(tag.value).await?;
            if prior.is_empty() {
                continue;
            }
            let overlap = prior.iter().filter(|m| new_members.contains(m)).count() as f64 / prior.len() as f64;
            if overlap >= self.config.overlap_threshold && best.as_ref().map_or(true, |(_, b)| overlap > *b) {
                best = Some((tag.value, overlap));
            }
        }
        if let Some((value, _)) = best {
            return Ok(value);
        }

        let value = self.repo.next_value(self.config.base_value).await?;
        let tag = SecurityGroupTag {
            value: SgtValue(value),
            name: cluster.label.clone(),
            category: "auto".to_string(),
            description: cluster.rationale.clone(),
            active: true,
            created_at: now,
        };
        self.repo.insert(&tag).await?;
        Ok(SgtValue(value))
    }

    async fn apply_member(
        &self,
        endpoint_id: EndpointId,
        sgt: SgtValue,
        cluster: &Cluster,
        unstable: bool,
        now: DateTime<Utc>,
    ) -> Result<(), PolicyError> {
        let current = self.repo.current_membership(endpoint_id).await?;
        match current {
            Some(existing) if matches!(existing.assigned_by, MembershipOrigin::Manual) => Ok(()),
            Some(existing) if existing.sgt == sgt => {
                self.repo.confirm(endpoint_id, now).await?;
                Ok(())
            }
            Some(_) if unstable => Ok(()),
            _ => {
                let membership = SgtMembership {
                    endpoint_id,
                    sgt,
                    assigned_at: now,
                    confirmed_at: now,
                    assigned_by: MembershipOrigin::Clusterer,
                    confidence: cluster.confidence,
                    source_cluster: Some(cluster.id),
                };
                self.repo.rebind(&membership).await?;
                Ok(())
            }
        }
    }

    /// Applies a single endpoint's incremental assignment (C6) against
    /// a centroid already bound to an SGT by the last batch run.
    pub async fn apply_incremental(
        &self,
        endpoint_id: EndpointId,
        centroid: &ClusterCentroid,
        confidence: Confidence,
        now: DateTime<Utc>,
    ) -> Result<(), PolicyError> {
        let sgt = centroid.sgt_value.map(SgtValue).ok_or(PolicyError::UnboundCentroid)?;

        if let Some(existing) = self.repo.current_membership(endpoint_id).await? {
            if matches!(existing.assigned_by, MembershipOrigin::Manual) {
                return Ok(());
            }
            if existing.sgt == sgt {
                self.repo.confirm(endpoint_id, now).await?;
                return Ok(());
            }
        }

        let membership = SgtMembership {
            endpoint_id,
            sgt,
            assigned_at: now,
            confirmed_at: now,
            assigned_by: MembershipOrigin::Incremental,
            confidence,
            source_cluster: Some(centroid.cluster_id),
        };
        self.repo.rebind(&membership).await?;
        Ok(())
    }

    /// Installs a manual membership. Protected from automated
    /// rebinding until [`SgtLifecycle::clear_manual_override`] is
    /// called for the same endpoint.
    pub async fn set_manual_membership(&self, endpoint_id: EndpointId, sgt: SgtValue, now: DateTime<Utc>) -> Result<(), PolicyError> {
        let membership = SgtMembership {
            endpoint_id,
            sgt,
            assigned_at: now,
            confirmed_at: now,
            assigned_by: MembershipOrigin::Manual,
            confidence: Confidence::new(1.0),
            source_cluster: None,
        };
        self.repo.rebind(&membership).await?;
        Ok(())
    }

    /// Lifts manual protection so the next automated run may rebind
    /// the endpoint. A no-op if the current membership isn't manual.
    pub async fn clear_manual_override(&self, endpoint_id: EndpointId, now: DateTime<Utc>) -> Result<(), PolicyError> {
        if let Some(mut existing) = self.repo.current_membership(endpoint_id).await? {
            if matches!(existing.assigned_by, MembershipOrigin::Manual) {
                existing.assigned_by = MembershipOrigin::Clusterer;
                existing.assigned_at = now;
                self.repo.rebind(&existing).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clarion_model::cluster::ClusterId;
    use clarion_store::StoreClient;

    async fn repo() -> SgtRepository {
        SgtRepository::new(StoreClient::connect(":memory:", None).await.unwrap())
    }

    fn cluster(id: i64, label: &str, members: Vec<EndpointId>) -> Cluster {
        Cluster { id: ClusterId(id), centroid: vec![0.0, 0.0], member_count: members.len(), label: label.to_string(), confidence: Confidence::new(0.9), rationale: "test".to_string(), members }
    }

    #[tokio::test]
    async fn first_binding_allocates_a_new_sgt_above_base() {
        let repo = repo().await;
        let lifecycle = SgtLifecycle::new(&repo, SgtLifecycleConfig::default());
        let members = vec![EndpointId::new(), EndpointId::new()];
        let bindings = lifecycle.bind_clusters(&[cluster(0, "finance-workstation", members.clone())], None, Utc::now()).await.unwrap();

        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].sgt, SgtValue(2));
        for endpoint_id in members {
            let membership = repo.current_membership(endpoint_id).await.unwrap().unwrap();
            assert_eq!(membership.sgt, SgtValue(2));
        }
    }

    #[tokio::test]
    async fn reuses_the_same_sgt_on_exact_label_match() {
        let repo = repo().await;
        let lifecycle = SgtLifecycle::new(&repo, SgtLifecycleConfig::default());
        let now = Utc::now();

        lifecycle.bind_clusters(&[cluster(0, "printers", vec![EndpointId::new()])], None, now).await.unwrap();
        let second = lifecycle.bind_clusters(&[cluster(1, "printers", vec![EndpointId::new()])], None, now).await.unwrap();

        assert_eq!(second[0].sgt, SgtValue(2));
    }

    #[tokio::test]
    async fn reuses_sgt_on_member_overlap_when_label_changes() {
        let repo = repo().await;
        let lifecycle = SgtLifecycle::new(&repo, SgtLifecycleConfig::default());
        let now = Utc::now();
        let members: Vec<_> = (0..10).map(|_| EndpointId::new()).collect();

        lifecycle.bind_clusters(&[cluster(0, "Behavioral-Clients", members.clone())], None, now).await.unwrap();
        let mut renamed = members.clone();
        renamed.truncate(8);
        let second = lifecycle.bind_clusters(&[cluster(1, "finance-workstation", renamed)], None, now + chrono::Duration::hours(24)).await.unwrap();

        assert_eq!(second[0].sgt, SgtValue(2));
    }

    #[tokio::test]
    async fn high_churn_suppresses_rebinding_of_existing_members_but_not_new_admission() {
        let repo = repo().await;
        let lifecycle = SgtLifecycle::new(&repo, SgtLifecycleConfig::default());
        let now = Utc::now();
        let original: Vec<_> = (0..10).map(|_| EndpointId::new()).collect();
        lifecycle.bind_clusters(&[cluster(0, "iot-devices", original.clone())], None, now).await.unwrap();

        // Only 2 of the original 10 remain; churn is 80%, above the default 25% threshold.
        let mut next_members = original[..2].to_vec();
        let fresh = EndpointId::new();
        next_members.push(fresh);
        let second = lifecycle.bind_clusters(&[cluster(0, "iot-devices", next_members)], None, now + chrono::Duration::hours(24)).await.unwrap();

        assert!(second[0].unstable);
        // A churned-out member keeps its old membership untouched.
        let untouched = repo.current_membership(original[5]).await.unwrap().unwrap();
        assert_eq!(untouched.sgt, SgtValue(2));
        // The brand-new endpoint is still admitted.
        let admitted = repo.current_membership(fresh).await.unwrap().unwrap();
        assert_eq!(admitted.sgt, SgtValue(2));
    }

    #[tokio::test]
    async fn manual_membership_is_protected_from_automated_rebinding() {
        let repo = repo().await;
        let lifecycle = SgtLifecycle::new(&repo, SgtLifecycleConfig::default());
        let now = Utc::now();
        let endpoint_id = EndpointId::new();

        lifecycle.bind_clusters(&[cluster(0, "printers", vec![endpoint_id])], None, now).await.unwrap();
        lifecycle.set_manual_membership(endpoint_id, SgtValue(99), now).await.unwrap();

        lifecycle.bind_clusters(&[cluster(1, "printers-v2", vec![endpoint_id])], None, now + chrono::Duration::hours(24)).await.unwrap();
        let membership = repo.current_membership(endpoint_id).await.unwrap().unwrap();
        assert_eq!(membership.sgt, SgtValue(99));

        lifecycle.clear_manual_override(endpoint_id, now + chrono::Duration::hours(48)).await.unwrap();
        lifecycle.bind_clusters(&[cluster(2, "printers-v3", vec![endpoint_id])], None, now + chrono::Duration::hours(48)).await.unwrap();
        let membership = repo.current_membership(endpoint_id).await.unwrap().unwrap();
        assert_ne!(membership.sgt, SgtValue(99));
    }
}
