//! [crates/clarion-sketch/src/sketch.rs]
//! `EndpointSketch`: the central analytic artifact, a compact rolling
//! summary of one endpoint's flow behavior. Mergeable — `merge(A, B)`
//! is associative and commutative within each estimator's error bound
//! and never decreases any counter or cardinality estimate.

use std::collections::HashMap;
use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use clarion_model::flow::FlowRecord;

use crate::cms::{CountMinSketch, TopKTracker};
use crate::errors::SketchError;
use crate::hll::HyperLogLog;

/// Number of destinations retained by byte volume. Unlike the CMS
/// top-K trackers, this one is exact (no estimation error) because it
/// is cheap to keep exactly: at most `TOP_DESTINATIONS_CAPACITY`
/// `(addr, bytes)` pairs.
pub const TOP_DESTINATIONS_CAPACITY: usize = 16;
pub const PORT_TOP_K_CAPACITY: usize = 32;

/// The shape of an endpoint sketch: every dimension that must match
/// exactly for two sketches to be mergeable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SketchShape {
    pub hll_precision: u8,
    pub cms_width: usize,
    pub cms_depth: usize,
}

impl SketchShape {
    pub fn new(hll_precision: u8, cms_width: usize, cms_depth: usize) -> Self {
        SketchShape {
            hll_precision,
            cms_width,
            cms_depth,
        }
    }
}

impl std::fmt::Display for SketchShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "hll_p={} cms={}x{}",
            self.hll_precision, self.cms_width, self.cms_depth
        )
    }
}

/// Exact bounded top-K destinations by byte volume.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopDestinations {
    capacity: usize,
    entries: HashMap<IpAddr, u64>,
}

impl TopDestinations {
    pub fn new(capacity: usize) -> Self {
        TopDestinations {
            capacity: capacity.max(1),
            entries: HashMap::new(),
        }
    }

    pub fn record(&mut self, addr: IpAddr, bytes: u64) {
        *self.entries.entry(addr).or_insert(0) += bytes;
        while self.entries.len() > self.capacity {
            if let Some((&min_addr, _)) = self.entries.iter().min_by_key(|(_, &b)| b) {
                self.entries.remove(&min_addr);
            } else {
                break;
            }
        }
    }

    pub fn merge(&mut self, other: &TopDestinations) {
        for (&addr, &bytes) in other.entries.iter() {
            self.record(addr, bytes);
        }
    }

    pub fn top(&self) -> Vec<(IpAddr, u64)> {
        let mut entries: Vec<(IpAddr, u64)> =
            self.entries.iter().map(|(&a, &b)| (a, b)).collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointSketch {
    pub peer_cardinality: HyperLogLog,
    pub port_cardinality: HyperLogLog,
    pub port_frequency: CountMinSketch,
    pub peer_frequency: CountMinSketch,
    pub port_top_k: TopKTracker<u16>,
    pub top_destinations: TopDestinations,
    pub bytes_in: u64,
    pub bytes_out: u64,
    pub flow_count: u64,
    pub active_hour_buckets: [u64; 24],
    pub update_count: u64,
    pub last_update: DateTime<Utc>,
    pub version: u64,
}

impl EndpointSketch {
    pub fn new(shape: SketchShape, created_at: DateTime<Utc>) -> Self {
        EndpointSketch {
            peer_cardinality: HyperLogLog::new(shape.hll_precision),
            port_cardinality: HyperLogLog::new(shape.hll_precision),
            port_frequency: CountMinSketch::new(shape.cms_width, shape.cms_depth),
            peer_frequency: CountMinSketch::new(shape.cms_width, shape.cms_depth),
            port_top_k: TopKTracker::new(PORT_TOP_K_CAPACITY),
            top_destinations: TopDestinations::new(TOP_DESTINATIONS_CAPACITY),
            bytes_in: 0,
            bytes_out: 0,
            flow_count: 0,
            active_hour_buckets: [0; 24],
            update_count: 0,
            last_update: created_at,
            version: 0,
        }
    }

    pub fn shape(&self) -> SketchShape {
        SketchShape::new(
            self.peer_cardinality.precision(),
            self.port_frequency.width(),
            self.port_frequency.depth(),
        )
    }

    /// Folds one flow's contribution to this endpoint's behavior.
    /// `as_source` tells us whether this endpoint was the flow's
    /// source (outbound, this endpoint paying in bytes_out) or
    /// destination (inbound, bytes_in).
    pub fn record_flow(&mut self, flow: &FlowRecord, as_source: bool) {
        let peer_addr = if as_source { flow.dest_addr } else { flow.source_addr };
        let port_of_interest = flow.dest_port;

        self.peer_cardinality.add(&peer_addr);
        self.port_cardinality.add(&port_of_interest);
        self.port_frequency.add(&port_of_interest, 1);
        self.peer_frequency.add(&peer_addr, 1);

        let port_estimate = self.port_frequency.estimate(&port_of_interest) as u64;
        self.port_top_k.offer(port_of_interest, port_estimate);

        self.top_destinations.record(peer_addr, flow.byte_count);

        if as_source {
            self.bytes_out += flow.byte_count;
        } else {
            self.bytes_in += flow.byte_count;
        }
        self.flow_count += 1;

        use chrono::Timelike;
        let hour = flow.flow_start.hour() as usize;
        self.active_hour_buckets[hour.min(23)] += 1;

        self.update_count += 1;
        self.version += 1;
        if flow.flow_end > self.last_update {
            self.last_update = flow.flow_end;
        }
    }

    /// Merges `other` into `self`. Associative, commutative, and
    /// never decreases any counter within each estimator's error
    /// bound. Requires equal shape.
    pub fn merge(&mut self, other: &EndpointSketch) -> Result<(), SketchError> {
        if self.shape() != other.shape() {
            return Err(SketchError::InvalidShape {
                expected: self.shape().to_string(),
                actual: other.shape().to_string(),
            });
        }
        self.peer_cardinality.merge(&other.peer_cardinality)?;
        self.port_cardinality.merge(&other.port_cardinality)?;
        self.port_frequency.merge(&other.port_frequency)?;
        self.peer_frequency.merge(&other.peer_frequency)?;
        self.port_top_k.merge(&other.port_top_k);
        self.top_destinations.merge(&other.top_destinations);

        self.bytes_in += other.bytes_in;
        self.bytes_out += other.bytes_out;
        self.flow_count += other.flow_count;
        for i in 0..24 {
            self.active_hour_buckets[i] += other.active_hour_buckets[i];
        }
        self.update_count += other.update_count;
        self.version += 1;
        if other.last_update > self.last_update {
            self.last_update = other.last_update;
        }
        Ok(())
    }

    pub fn merged(&self, other: &EndpointSketch) -> Result<EndpointSketch, SketchError> {
        let mut out = self.clone();
        out.merge(other)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clarion_model::flow::Protocol;
    use std::net::Ipv4Addr;

    fn make_flow(src: u8, dst_port: u16, bytes: u64, at: DateTime<Utc>) -> FlowRecord {
        FlowRecord::new(
            IpAddr::V4(Ipv4Addr::new(10, 0, 0, src)),
            IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1)),
            55555,
            dst_port,
            Protocol::Tcp,
            bytes,
            1,
            at,
            at,
            "exp-1",
        )
    }

    #[test]
    fn record_flow_updates_last_update_monotonically() {
        let t0 = Utc::now();
        let mut sketch = EndpointSketch::new(SketchShape::new(8, 64, 3), t0);
        let flow = make_flow(1, 443, 1000, t0 + chrono::Duration::seconds(5));
        sketch.record_flow(&flow, false);
        assert!(sketch.last_update >= flow.flow_end);
        assert_eq!(sketch.bytes_in, 1000);
        assert_eq!(sketch.flow_count, 1);
    }

    #[test]
    fn merge_is_commutative_for_counters() {
        let t0 = Utc::now();
        let shape = SketchShape::new(8, 64, 3);
        let mut a = EndpointSketch::new(shape, t0);
        let mut b = EndpointSketch::new(shape, t0);
        a.record_flow(&make_flow(1, 443, 500, t0), true);
        b.record_flow(&make_flow(2, 80, 300, t0), true);

        let ab = a.merged(&b).unwrap();
        let ba = b.merged(&a).unwrap();
        assert_eq!(ab.bytes_out, ba.bytes_out);
        assert_eq!(ab.flow_count, ba.flow_count);
    }

    #[test]
    fn merge_rejects_mismatched_shape() {
        let t0 = Utc::now();
        let mut a = EndpointSketch::new(SketchShape::new(8, 64, 3), t0);
        let b = EndpointSketch::new(SketchShape::new(10, 64, 3), t0);
        assert!(matches!(a.merge(&b), Err(SketchError::InvalidShape { .. })));
    }
}
