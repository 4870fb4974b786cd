//! [crates/clarion-store/src/sketch_store.rs]
//! The sketch store (C3): an in-memory map from endpoint to its
//! rolling behavioral sketch. Keyed by `EndpointId`; dashmap gives us
//! per-shard locking so writes to one endpoint never block writes to
//! another, and a snapshot read never observes a sketch mid-update.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use clarion_model::endpoint::EndpointId;
use clarion_model::flow::FlowRecord;
use clarion_sketch::{EndpointSketch, SketchShape};

use crate::errors::StoreError;

/// Outcome of applying an edge-agent partial sketch, mirroring the
/// ingest service's `accepted` / `duplicates` response contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Applied,
    Duplicate,
}

struct Record {
    first_seen: DateTime<Utc>,
    sketch: EndpointSketch,
    /// Highest applied sequence per reporting agent, for idempotent
    /// merge of at-least-once edge-agent deliveries.
    last_applied_sequence: HashMap<Uuid, u64>,
}

pub struct SketchStore {
    shape: SketchShape,
    records: DashMap<EndpointId, Record>,
}

impl SketchStore {
    pub fn new(shape: SketchShape) -> Self {
        SketchStore { shape, records: DashMap::new() }
    }

    pub fn shape(&self) -> SketchShape {
        self.shape
    }

    /// Folds one flow's contribution into `endpoint_id`'s sketch.
    /// `as_source` indicates which side of the flow `endpoint_id` is.
    /// First-seen is set on the endpoint's first flow and never moves
    /// afterward; last-seen tracking is delegated to the sketch
    /// itself, which is already last-update monotonic.
    pub fn record_flow(&self, endpoint_id: EndpointId, flow: &FlowRecord, as_source: bool) {
        let mut entry = self.records.entry(endpoint_id).or_insert_with(|| Record {
            first_seen: flow.flow_start,
            sketch: EndpointSketch::new(self.shape, flow.flow_start),
            last_applied_sequence: HashMap::new(),
        });
        entry.sketch.record_flow(flow, as_source);
    }

    /// Merges a remote partial sketch from an edge agent, gated on a
    /// monotonic per-(agent, endpoint) sequence number. A sequence not
    /// strictly greater than the last one applied is a replay or a
    /// reorder and is dropped without mutating the sketch.
    pub fn merge_partial(
        &self,
        endpoint_id: EndpointId,
        agent_id: Uuid,
        sequence: u64,
        window_start: DateTime<Utc>,
        partial: &EndpointSketch,
    ) -> Result<MergeOutcome, StoreError> {
        let mut entry = self.records.entry(endpoint_id).or_insert_with(|| Record {
            first_seen: window_start,
            sketch: EndpointSketch::new(self.shape, window_start),
            last_applied_sequence: HashMap::new(),
        });

        let last_applied = entry.last_applied_sequence.get(&agent_id).copied().unwrap_or(0);
        if sequence <= last_applied {
            return Ok(MergeOutcome::Duplicate);
        }

        entry.sketch.merge(partial)?;
        entry.last_applied_sequence.insert(agent_id, sequence);
        if window_start < entry.first_seen {
            entry.first_seen = window_start;
        }
        Ok(MergeOutcome::Applied)
    }

    /// Copy-on-read snapshot. Blocks only long enough to clone the
    /// shard slot; never returns a partially-updated sketch.
    pub fn snapshot(&self, endpoint_id: EndpointId) -> Option<EndpointSketch> {
        self.records.get(&endpoint_id).map(|entry| entry.sketch.clone())
    }

    pub fn first_seen(&self, endpoint_id: EndpointId) -> Option<DateTime<Utc>> {
        self.records.get(&endpoint_id).map(|entry| entry.first_seen)
    }

    /// Removes sketches not updated since `older_than`. Returns the
    /// removed endpoint ids so the caller can emit `last_seen` events.
    pub fn expire(&self, older_than: DateTime<Utc>) -> Vec<EndpointId> {
        let stale: Vec<EndpointId> = self
            .records
            .iter()
            .filter(|entry| entry.sketch.last_update < older_than)
            .map(|entry| *entry.key())
            .collect();
        for id in &stale {
            self.records.remove(id);
        }
        stale
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Endpoints with at least `min_flow_count` recorded flows, the
    /// batch clusterer's qualifying population (C5).
    pub fn eligible_endpoints(&self, min_flow_count: u64) -> Vec<EndpointId> {
        self.records
            .iter()
            .filter(|entry| entry.sketch.flow_count >= min_flow_count)
            .map(|entry| *entry.key())
            .collect()
    }

    /// Fraction of known endpoints below `min_flow_count`, the
    /// scheduler's early-trigger signal for an out-of-cycle batch run.
    pub fn unassigned_fraction(&self, min_flow_count: u64) -> f64 {
        if self.records.is_empty() {
            return 0.0;
        }
        let below = self.records.iter().filter(|entry| entry.sketch.flow_count < min_flow_count).count();
        below as f64 / self.records.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clarion_model::flow::Protocol;
    use std::net::{IpAddr, Ipv4Addr};

    fn flow_at(at: DateTime<Utc>) -> FlowRecord {
        FlowRecord::new(
            IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)),
            IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2)),
            55555,
            443,
            Protocol::Tcp,
            1000,
            1,
            at,
            at,
            "exp-1",
        )
    }

    #[test]
    fn record_flow_sets_first_seen_once_and_advances_last_seen() {
        let store = SketchStore::new(SketchShape::new(8, 64, 3));
        let id = EndpointId::new();
        let t0 = Utc::now();

        store.record_flow(id, &flow_at(t0), true);
        store.record_flow(id, &flow_at(t0 + chrono::Duration::seconds(30)), true);

        assert_eq!(store.first_seen(id), Some(t0));
        let snapshot = store.snapshot(id).unwrap();
        assert!(snapshot.last_update >= t0 + chrono::Duration::seconds(30));
        assert_eq!(snapshot.flow_count, 2);
    }

    #[test]
    fn merge_partial_is_idempotent_under_sequence_replay() {
        let shape = SketchShape::new(8, 64, 3);
        let store = SketchStore::new(shape);
        let id = EndpointId::new();
        let agent = Uuid::new_v4();
        let t0 = Utc::now();

        let mut partial = EndpointSketch::new(shape, t0);
        partial.record_flow(&flow_at(t0), true);

        let first = store.merge_partial(id, agent, 1, t0, &partial).unwrap();
        let replay = store.merge_partial(id, agent, 1, t0, &partial).unwrap();

        assert_eq!(first, MergeOutcome::Applied);
        assert_eq!(replay, MergeOutcome::Duplicate);
        assert_eq!(store.snapshot(id).unwrap().flow_count, 1);
    }

    #[test]
    fn merge_partial_rejects_shape_mismatch() {
        let store = SketchStore::new(SketchShape::new(8, 64, 3));
        let id = EndpointId::new();
        let mismatched = EndpointSketch::new(SketchShape::new(10, 128, 4), Utc::now());

        let result = store.merge_partial(id, Uuid::new_v4(), 1, Utc::now(), &mismatched);
        assert!(matches!(result, Err(StoreError::InvalidShape(_))));
    }

    #[test]
    fn expire_removes_stale_sketches_and_reports_their_ids() {
        let store = SketchStore::new(SketchShape::new(8, 64, 3));
        let id = EndpointId::new();
        let t0 = Utc::now();
        store.record_flow(id, &flow_at(t0), true);

        let expired = store.expire(t0 + chrono::Duration::seconds(1));
        assert_eq!(expired, vec![id]);
        assert!(store.snapshot(id).is_none());
    }

    #[test]
    fn eligible_endpoints_filters_by_minimum_flow_count() {
        let store = SketchStore::new(SketchShape::new(8, 64, 3));
        let t0 = Utc::now();
        let busy = EndpointId::new();
        let quiet = EndpointId::new();
        for _ in 0..5 {
            store.record_flow(busy, &flow_at(t0), true);
        }
        store.record_flow(quiet, &flow_at(t0), true);

        let eligible = store.eligible_endpoints(3);
        assert_eq!(eligible, vec![busy]);
        assert!((store.unassigned_fraction(3) - 0.5).abs() < 1e-9);
    }
}
