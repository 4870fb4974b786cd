//! [crates/clarion-decoder/src/v5.rs]
//! NetFlow v5 decoding: a fixed 24-byte header followed by `count`
//! fixed 48-byte records. No templates, no enterprise fields -- the
//! simplest of the three formats this crate supports.

use byteorder::{BigEndian, ReadBytesExt};
use chrono::{DateTime, Utc};
use std::io::Cursor;

use clarion_model::flow::{FlowRecord, Protocol};

use crate::errors::DecodeError;

pub const HEADER_LEN: usize = 24;
pub const RECORD_LEN: usize = 48;

fn addr_from_u32(raw: u32) -> std::net::IpAddr {
    std::net::IpAddr::V4(std::net::Ipv4Addr::from(raw))
}

/// `device_uptime_to_absolute(export_time, sys_uptime_ms, offset_ms)`:
/// v5 timestamps are milliseconds since device boot, so they are
/// meaningful only relative to the header's `sys_uptime`/`unix_secs`
/// pair, which anchors boot time to wall-clock time.
fn device_uptime_to_absolute(export_time: DateTime<Utc>, sys_uptime_ms: u32, offset_ms: u32) -> DateTime<Utc> {
    let delta_ms = sys_uptime_ms as i64 - offset_ms as i64;
    export_time - chrono::Duration::milliseconds(delta_ms)
}

pub fn decode_v5_packet(bytes: &[u8], exporter_id: &str) -> Result<Vec<FlowRecord>, DecodeError> {
    if bytes.len() < HEADER_LEN {
        return Err(DecodeError::ShortPacket {
            needed: HEADER_LEN,
            available: bytes.len(),
        });
    }
    let mut cursor = Cursor::new(bytes);
    let version = cursor.read_u16::<BigEndian>().map_err(short_packet)?;
    if version != 5 {
        return Err(DecodeError::BadVersion { found: version });
    }
    let count = cursor.read_u16::<BigEndian>().map_err(short_packet)? as usize;
    let sys_uptime_ms = cursor.read_u32::<BigEndian>().map_err(short_packet)?;
    let unix_secs = cursor.read_u32::<BigEndian>().map_err(short_packet)?;
    let unix_nsecs = cursor.read_u32::<BigEndian>().map_err(short_packet)?;
    let _flow_sequence = cursor.read_u32::<BigEndian>().map_err(short_packet)?;
    let _engine_type = cursor.read_u8().map_err(short_packet)?;
    let _engine_id = cursor.read_u8().map_err(short_packet)?;
    let _sampling_interval = cursor.read_u16::<BigEndian>().map_err(short_packet)?;

    let export_time = DateTime::from_timestamp(unix_secs as i64, unix_nsecs)
        .ok_or_else(|| DecodeError::TimeSkew {
            reason: format!("header unix_secs={unix_secs} out of range"),
        })?;

    let required = HEADER_LEN + count * RECORD_LEN;
    if bytes.len() < required {
        return Err(DecodeError::ShortPacket {
            needed: required,
            available: bytes.len(),
        });
    }

    let mut records = Vec::with_capacity(count);
    for _ in 0..count {
        let src_addr = addr_from_u32(cursor.read_u32::<BigEndian>().map_err(short_packet)?);
        let dst_addr = addr_from_u32(cursor.read_u32::<BigEndian>().map_err(short_packet)?);
        let _next_hop = cursor.read_u32::<BigEndian>().map_err(short_packet)?;
        let _input_iface = cursor.read_u16::<BigEndian>().map_err(short_packet)?;
        let _output_iface = cursor.read_u16::<BigEndian>().map_err(short_packet)?;
        let packets = cursor.read_u32::<BigEndian>().map_err(short_packet)?;
        let octets = cursor.read_u32::<BigEndian>().map_err(short_packet)?;
        let first_ms = cursor.read_u32::<BigEndian>().map_err(short_packet)?;
        let last_ms = cursor.read_u32::<BigEndian>().map_err(short_packet)?;
        let src_port = cursor.read_u16::<BigEndian>().map_err(short_packet)?;
        let dst_port = cursor.read_u16::<BigEndian>().map_err(short_packet)?;
        let _pad1 = cursor.read_u8().map_err(short_packet)?;
        let _tcp_flags = cursor.read_u8().map_err(short_packet)?;
        let protocol_number = cursor.read_u8().map_err(short_packet)?;
        let _tos = cursor.read_u8().map_err(short_packet)?;
        let _src_as = cursor.read_u16::<BigEndian>().map_err(short_packet)?;
        let _dst_as = cursor.read_u16::<BigEndian>().map_err(short_packet)?;
        let _src_mask = cursor.read_u8().map_err(short_packet)?;
        let _dst_mask = cursor.read_u8().map_err(short_packet)?;
        let _pad2 = cursor.read_u16::<BigEndian>().map_err(short_packet)?;

        let flow_start = device_uptime_to_absolute(export_time, sys_uptime_ms, first_ms);
        let flow_end = device_uptime_to_absolute(export_time, sys_uptime_ms, last_ms);

        records.push(FlowRecord::new(
            src_addr,
            dst_addr,
            src_port,
            dst_port,
            Protocol::from_ip_protocol_number(protocol_number),
            octets as u64,
            packets as u64,
            flow_start,
            flow_end,
            exporter_id,
        ));
    }
    Ok(records)
}

fn short_packet(_: std::io::Error) -> DecodeError {
    DecodeError::ShortPacket { needed: 0, available: 0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;

    fn build_single_record_packet() -> Vec<u8> {
        let mut buf = Vec::new();
        buf.write_u16::<BigEndian>(5).unwrap();
        buf.write_u16::<BigEndian>(1).unwrap();
        buf.write_u32::<BigEndian>(10_000).unwrap();
        buf.write_u32::<BigEndian>(1_700_000_000).unwrap();
        buf.write_u32::<BigEndian>(0).unwrap();
        buf.write_u32::<BigEndian>(1).unwrap();
        buf.write_u8(0).unwrap();
        buf.write_u8(0).unwrap();
        buf.write_u16::<BigEndian>(0).unwrap();

        buf.write_u32::<BigEndian>(0x0A000001).unwrap();
        buf.write_u32::<BigEndian>(0xC0A80101).unwrap();
        buf.write_u32::<BigEndian>(0).unwrap();
        buf.write_u16::<BigEndian>(0).unwrap();
        buf.write_u16::<BigEndian>(0).unwrap();
        buf.write_u32::<BigEndian>(10).unwrap();
        buf.write_u32::<BigEndian>(1500).unwrap();
        buf.write_u32::<BigEndian>(5_000).unwrap();
        buf.write_u32::<BigEndian>(9_000).unwrap();
        buf.write_u16::<BigEndian>(55555).unwrap();
        buf.write_u16::<BigEndian>(443).unwrap();
        buf.write_u8(0).unwrap();
        buf.write_u8(0).unwrap();
        buf.write_u8(6).unwrap();
        buf.write_u8(0).unwrap();
        buf.write_u16::<BigEndian>(0).unwrap();
        buf.write_u16::<BigEndian>(0).unwrap();
        buf.write_u8(0).unwrap();
        buf.write_u8(0).unwrap();
        buf.write_u16::<BigEndian>(0).unwrap();
        buf
    }

    #[test]
    fn decodes_single_record() {
        let packet = build_single_record_packet();
        let records = decode_v5_packet(&packet, "exp-1").unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.byte_count, 1500);
        assert_eq!(record.packet_count, 10);
        assert_eq!(record.dest_port, 443);
        assert_eq!(record.protocol, Protocol::Tcp);
        assert!(record.flow_start <= record.flow_end);
    }

    #[test]
    fn rejects_non_v5_version() {
        let mut packet = build_single_record_packet();
        packet[1] = 9;
        assert!(matches!(
            decode_v5_packet(&packet, "exp-1"),
            Err(DecodeError::BadVersion { found: 9 })
        ));
    }

    #[test]
    fn rejects_truncated_packet() {
        let packet = build_single_record_packet();
        let truncated = &packet[..HEADER_LEN + 10];
        assert!(matches!(
            decode_v5_packet(truncated, "exp-1"),
            Err(DecodeError::ShortPacket { .. })
        ));
    }
}
