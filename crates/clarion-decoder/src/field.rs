//! [crates/clarion-decoder/src/field.rs]
//! IPFIX information-element IDs (NetFlow v9 reuses the same numbering
//! for the fields it defines) and the partial record they accumulate
//! into. Unknown field types are skipped, not rejected: a template can
//! carry fields this decoder has no use for without that becoming a
//! decode failure.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use chrono::{DateTime, Utc};

use clarion_model::flow::Protocol;

pub const IN_BYTES: u16 = 1;
pub const IN_PKTS: u16 = 2;
pub const PROTOCOL: u16 = 4;
pub const L4_SRC_PORT: u16 = 7;
pub const IPV4_SRC_ADDR: u16 = 8;
pub const L4_DST_PORT: u16 = 11;
pub const IPV4_DST_ADDR: u16 = 12;
pub const LAST_SWITCHED: u16 = 21;
pub const FIRST_SWITCHED: u16 = 22;
pub const IPV6_SRC_ADDR: u16 = 27;
pub const IPV6_DST_ADDR: u16 = 28;
pub const FLOW_START_SECONDS: u16 = 150;
pub const FLOW_END_SECONDS: u16 = 151;
pub const FLOW_START_MILLISECONDS: u16 = 152;
pub const FLOW_END_MILLISECONDS: u16 = 153;

/// Accumulates the fields of one data record as its template's fields
/// are read off the wire, in whatever order the exporter chose to
/// list them.
#[derive(Debug, Default)]
pub struct PartialFlow {
    pub source_addr: Option<IpAddr>,
    pub dest_addr: Option<IpAddr>,
    pub source_port: u16,
    pub dest_port: u16,
    pub protocol: Protocol,
    pub byte_count: u64,
    pub packet_count: u64,
    pub first_switched_ms: Option<u64>,
    pub last_switched_ms: Option<u64>,
    pub flow_start_absolute: Option<DateTime<Utc>>,
    pub flow_end_absolute: Option<DateTime<Utc>>,
}

impl PartialFlow {
    pub fn apply(&mut self, field_type: u16, bytes: &[u8]) {
        match field_type {
            IN_BYTES => self.byte_count = read_uint(bytes),
            IN_PKTS => self.packet_count = read_uint(bytes),
            PROTOCOL => {
                if let Some(&b) = bytes.first() {
                    self.protocol = Protocol::from_ip_protocol_number(b);
                }
            }
            L4_SRC_PORT => self.source_port = read_uint(bytes) as u16,
            L4_DST_PORT => self.dest_port = read_uint(bytes) as u16,
            IPV4_SRC_ADDR => self.source_addr = read_ipv4(bytes),
            IPV4_DST_ADDR => self.dest_addr = read_ipv4(bytes),
            IPV6_SRC_ADDR => self.source_addr = read_ipv6(bytes),
            IPV6_DST_ADDR => self.dest_addr = read_ipv6(bytes),
            FIRST_SWITCHED => self.first_switched_ms = Some(read_uint(bytes)),
            LAST_SWITCHED => self.last_switched_ms = Some(read_uint(bytes)),
            FLOW_START_SECONDS => {
                self.flow_start_absolute = seconds_to_datetime(read_uint(bytes));
            }
            FLOW_END_SECONDS => {
                self.flow_end_absolute = seconds_to_datetime(read_uint(bytes));
            }
            FLOW_START_MILLISECONDS => {
                self.flow_start_absolute = millis_to_datetime(read_uint(bytes));
            }
            FLOW_END_MILLISECONDS => {
                self.flow_end_absolute = millis_to_datetime(read_uint(bytes));
            }
            _ => {}
        }
    }
}

fn read_uint(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64)
}

fn read_ipv4(bytes: &[u8]) -> Option<IpAddr> {
    if bytes.len() != 4 {
        return None;
    }
    Some(IpAddr::V4(Ipv4Addr::new(bytes[0], bytes[1], bytes[2], bytes[3])))
}

fn read_ipv6(bytes: &[u8]) -> Option<IpAddr> {
    if bytes.len() != 16 {
        return None;
    }
    let mut octets = [0u8; 16];
    octets.copy_from_slice(bytes);
    Some(IpAddr::V6(Ipv6Addr::from(octets)))
}

fn seconds_to_datetime(seconds: u64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(seconds as i64, 0)
}

fn millis_to_datetime(millis: u64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applies_known_fields() {
        let mut flow = PartialFlow::default();
        flow.apply(IPV4_SRC_ADDR, &[10, 0, 0, 1]);
        flow.apply(L4_DST_PORT, &[1, 187]);
        flow.apply(IN_BYTES, &[0, 0, 0, 100]);
        assert_eq!(flow.source_addr, Some(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1))));
        assert_eq!(flow.dest_port, 443);
        assert_eq!(flow.byte_count, 100);
    }

    #[test]
    fn unknown_field_is_silently_skipped() {
        let mut flow = PartialFlow::default();
        flow.apply(0xFFFF, &[1, 2, 3]);
        assert_eq!(flow.byte_count, 0);
    }
}
