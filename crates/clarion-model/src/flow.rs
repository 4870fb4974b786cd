//! Flow record: the immutable, short-lived unit produced by the flow
//! decoder (NetFlow v5/v9/IPFIX) and consumed by the sketch store and
//! communication matrix.

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// IANA protocol numbers relevant to segmentation policy; anything
/// else is carried through as `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
    Tcp,
    Udp,
    Icmp,
    Other(u8),
}

impl Default for Protocol {
    /// Sentinel for "not yet observed", used while a decoder is still
    /// accumulating a record's fields.
    fn default() -> Self {
        Protocol::Other(0)
    }
}

impl Protocol {
    pub fn from_ip_protocol_number(n: u8) -> Self {
        match n {
            6 => Protocol::Tcp,
            17 => Protocol::Udp,
            1 => Protocol::Icmp,
            other => Protocol::Other(other),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
            Protocol::Icmp => "icmp",
            Protocol::Other(_) => "other",
        }
    }
}

/// Security Group Tag value carried in wire extensions by brownfield
/// exporters, when present.
pub type WireSgtValue = u16;

/// A single decoded flow record. Invariants enforced at construction:
/// `flow_start <= flow_end`, byte/packet counts non-negative (the
/// field types already forbid negative values).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowRecord {
    pub source_addr: IpAddr,
    pub dest_addr: IpAddr,
    pub source_port: u16,
    pub dest_port: u16,
    pub protocol: Protocol,
    pub byte_count: u64,
    pub packet_count: u64,
    pub flow_start: DateTime<Utc>,
    pub flow_end: DateTime<Utc>,
    pub exporter_id: String,
    pub source_sgt: Option<WireSgtValue>,
    pub dest_sgt: Option<WireSgtValue>,
}

impl FlowRecord {
    /// Constructs a flow record, normalizing an inverted `[start, end]`
    /// pair rather than rejecting it outright: exporters occasionally
    /// emit equal-timestamp micro-flows, never genuinely inverted ones,
    /// but defending here keeps the invariant true of every record
    /// that leaves this module.
    pub fn new(
        source_addr: IpAddr,
        dest_addr: IpAddr,
        source_port: u16,
        dest_port: u16,
        protocol: Protocol,
        byte_count: u64,
        packet_count: u64,
        flow_start: DateTime<Utc>,
        flow_end: DateTime<Utc>,
        exporter_id: impl Into<String>,
    ) -> Self {
        let (flow_start, flow_end) = if flow_start <= flow_end {
            (flow_start, flow_end)
        } else {
            (flow_end, flow_start)
        };
        FlowRecord {
            source_addr,
            dest_addr,
            source_port,
            dest_port,
            protocol,
            byte_count,
            packet_count,
            flow_start,
            flow_end,
            exporter_id: exporter_id.into(),
            source_sgt: None,
            dest_sgt: None,
        }
    }

    pub fn duration(&self) -> chrono::Duration {
        self.flow_end - self.flow_start
    }

    pub fn is_well_formed(&self) -> bool {
        self.flow_start <= self.flow_end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn addr(a: u8, b: u8, c: u8, d: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(a, b, c, d))
    }

    #[test]
    fn normalizes_inverted_timestamps() {
        let start = Utc::now();
        let end = start - chrono::Duration::seconds(5);
        let flow = FlowRecord::new(
            addr(10, 0, 0, 1),
            addr(10, 0, 0, 2),
            1234,
            443,
            Protocol::Tcp,
            100,
            1,
            start,
            end,
            "exp-1",
        );
        assert!(flow.is_well_formed());
        assert!(flow.flow_start <= flow.flow_end);
    }

    #[test]
    fn protocol_from_number_maps_known_values() {
        assert_eq!(Protocol::from_ip_protocol_number(6), Protocol::Tcp);
        assert_eq!(Protocol::from_ip_protocol_number(17), Protocol::Udp);
        assert_eq!(Protocol::from_ip_protocol_number(200), Protocol::Other(200));
    }
}
