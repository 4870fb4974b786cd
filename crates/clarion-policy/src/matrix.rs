//! [crates/clarion-policy/src/matrix.rs]
//! Communication matrix (C8): aggregates resolved flows into SGT x SGT
//! cells for a time window. SGT resolution happens once per endpoint
//! before aggregation starts (a consistent read), so all flows in a
//! rebuild see the same mapping even if memberships change mid-pass.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use clarion_model::endpoint::EndpointId;
use clarion_model::flow::{FlowRecord, Protocol};
use clarion_model::matrix::{MatrixCell, MatrixSnapshot, PortShare, ProtocolShare, UnknownSgtBucket};
use clarion_model::sgt::SgtValue;

/// A flow record paired with the endpoints it was already resolved
/// against, since [`FlowRecord`] only carries raw addresses.
#[derive(Debug, Clone)]
pub struct FlowObservation {
    pub source_endpoint: EndpointId,
    pub dest_endpoint: EndpointId,
    pub flow: FlowRecord,
}

#[derive(Debug, Clone, Copy)]
pub struct MatrixBuildConfig {
    pub top_k_ports: usize,
}

impl Default for MatrixBuildConfig {
    fn default() -> Self {
        MatrixBuildConfig { top_k_ports: 5 }
    }
}

#[derive(Default)]
struct CellAccumulator {
    flow_count: u64,
    byte_count: u64,
    port_flows: HashMap<(u16, Protocol), u64>,
    port_bytes: HashMap<(u16, Protocol), u64>,
    protocol_flows: HashMap<Protocol, u64>,
}

/// Aggregates `observations` into an immutable matrix snapshot.
/// `sgt_by_endpoint` is a consistent snapshot of current SGT
/// memberships taken once before this call; endpoints absent from it
/// count against the unknown-SGT bucket. `approximate` should be set
/// when `observations` came from sketch top-K peers rather than a
/// full flow stream over the window.
pub fn build_matrix(
    observations: &[FlowObservation],
    sgt_by_endpoint: &HashMap<EndpointId, SgtValue>,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    version: u64,
    approximate: bool,
    config: &MatrixBuildConfig,
) -> MatrixSnapshot {
    let mut cells: HashMap<(SgtValue, SgtValue), CellAccumulator> = HashMap::new();
    let mut unknown = UnknownSgtBucket::default();

    for observation in observations {
        let flow = &observation.flow;
        let (src_sgt, dst_sgt) = match (sgt_by_endpoint.get(&observation.source_endpoint), sgt_by_endpoint.get(&observation.dest_endpoint)) {
            (Some(&src), Some(&dst)) => (src, dst),
            _ => {
                unknown.flow_count += 1;
                unknown.byte_count += flow.byte_count;
                continue;
            }
        };

        let cell = cells.entry((src_sgt, dst_sgt)).or_default();
        cell.flow_count += 1;
        cell.byte_count += flow.byte_count;
        *cell.port_flows.entry((flow.dest_port, flow.protocol)).or_insert(0) += 1;
        *cell.port_bytes.entry((flow.dest_port, flow.protocol)).or_insert(0) += flow.byte_count;
        *cell.protocol_flows.entry(flow.protocol).or_insert(0) += 1;
    }

    let mut matrix_cells: Vec<MatrixCell> = cells
        .into_iter()
        .map(|((src_sgt, dst_sgt), acc)| {
            let mut ports: Vec<((u16, Protocol), u64)> = acc.port_flows.into_iter().collect();
            ports.sort_by(|a, b| b.1.cmp(&a.1));
            let top_ports: Vec<PortShare> = ports
                .into_iter()
                .take(config.top_k_ports)
                .map(|((port, protocol), flows)| PortShare {
                    port,
                    protocol,
                    flow_share: flows as f64 / acc.flow_count as f64,
                    byte_share: acc.port_bytes.get(&(port, protocol)).copied().unwrap_or(0) as f64 / acc.byte_count.max(1) as f64,
                })
                .collect();

            let mut protocols: Vec<(Protocol, u64)> = acc.protocol_flows.into_iter().collect();
            protocols.sort_by(|a, b| b.1.cmp(&a.1));
            let dominant_protocols: Vec<ProtocolShare> = protocols
                .into_iter()
                .map(|(protocol, flows)| ProtocolShare { protocol, flow_share: flows as f64 / acc.flow_count as f64 })
                .collect();

            MatrixCell { src_sgt, dst_sgt, flow_count: acc.flow_count, byte_count: acc.byte_count, top_ports, dominant_protocols }
        })
        .collect();

    matrix_cells.sort_by(|a, b| (a.src_sgt.0, a.dst_sgt.0).cmp(&(b.src_sgt.0, b.dst_sgt.0)));

    MatrixSnapshot { version, window_start, window_end, cells: matrix_cells, unknown, approximate }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    fn addr(n: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, n))
    }

    fn flow(dest_port: u16, protocol: Protocol, bytes: u64) -> FlowRecord {
        FlowRecord::new(addr(1), addr(2), 51000, dest_port, protocol, bytes, 1, Utc::now(), Utc::now(), "exp-1")
    }

    #[test]
    fn aggregates_known_endpoints_into_a_cell_and_ranks_ports() {
        let src = EndpointId::new();
        let dst = EndpointId::new();
        let mut sgt_by_endpoint = HashMap::new();
        sgt_by_endpoint.insert(src, SgtValue(10));
        sgt_by_endpoint.insert(dst, SgtValue(20));

        let observations = vec![
            FlowObservation { source_endpoint: src, dest_endpoint: dst, flow: flow(443, Protocol::Tcp, 1000) },
            FlowObservation { source_endpoint: src, dest_endpoint: dst, flow: flow(443, Protocol::Tcp, 1000) },
            FlowObservation { source_endpoint: src, dest_endpoint: dst, flow: flow(22, Protocol::Tcp, 100) },
        ];

        let snapshot = build_matrix(&observations, &sgt_by_endpoint, Utc::now(), Utc::now(), 1, false, &MatrixBuildConfig::default());
        assert_eq!(snapshot.cells.len(), 1);
        let cell = &snapshot.cells[0];
        assert_eq!(cell.flow_count, 3);
        assert_eq!(cell.top_ports[0].port, 443);
        assert!((cell.top_ports[0].flow_share - (2.0 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn unresolved_endpoints_fall_into_the_unknown_bucket() {
        let src = EndpointId::new();
        let dst = EndpointId::new();
        let sgt_by_endpoint = HashMap::new();

        let observations = vec![FlowObservation { source_endpoint: src, dest_endpoint: dst, flow: flow(443, Protocol::Tcp, 500) }];
        let snapshot = build_matrix(&observations, &sgt_by_endpoint, Utc::now(), Utc::now(), 1, false, &MatrixBuildConfig::default());

        assert!(snapshot.cells.is_empty());
        assert_eq!(snapshot.unknown.flow_count, 1);
        assert_eq!(snapshot.unknown.byte_count, 500);
    }
}
