//! [crates/clarion-decoder/src/ipfix.rs]
//! IPFIX (RFC 7011) decoding. Structurally close to NetFlow v9 -- a
//! header followed by sets, each a template or data -- but with
//! different set-ID constants, an overall message length instead of a
//! record count, and enterprise-specific field numbering.

use byteorder::{BigEndian, ReadBytesExt};
use chrono::{DateTime, Utc};
use std::io::Cursor;

use clarion_model::flow::FlowRecord;

use crate::common::{decode_data_records, parse_template_set};
use crate::errors::DecodeError;
use crate::template::{PendingRecord, TemplateCache};

pub const HEADER_LEN: usize = 16;
const TEMPLATE_SET_ID: u16 = 2;
const OPTIONS_TEMPLATE_SET_ID: u16 = 3;
const MIN_DATA_SET_ID: u16 = 256;

pub struct IpfixDecodeOutcome {
    pub records: Vec<FlowRecord>,
    pub templates_learned: usize,
}

pub fn decode_ipfix_packet(
    bytes: &[u8],
    exporter_id: &str,
    cache: &mut TemplateCache,
    now: DateTime<Utc>,
) -> Result<IpfixDecodeOutcome, DecodeError> {
    if bytes.len() < HEADER_LEN {
        return Err(DecodeError::ShortPacket {
            needed: HEADER_LEN,
            available: bytes.len(),
        });
    }
    let mut cursor = Cursor::new(bytes);
    let version = cursor.read_u16::<BigEndian>().map_err(short_packet)?;
    if version != 10 {
        return Err(DecodeError::BadVersion { found: version });
    }
    let message_length = cursor.read_u16::<BigEndian>().map_err(short_packet)? as usize;
    let export_time_secs = cursor.read_u32::<BigEndian>().map_err(short_packet)?;
    let _sequence = cursor.read_u32::<BigEndian>().map_err(short_packet)?;
    let _domain_id = cursor.read_u32::<BigEndian>().map_err(short_packet)?;

    if bytes.len() < message_length {
        return Err(DecodeError::ShortPacket {
            needed: message_length,
            available: bytes.len(),
        });
    }
    let export_time = DateTime::from_timestamp(export_time_secs as i64, 0).ok_or_else(|| DecodeError::TimeSkew {
        reason: format!("header export_time={export_time_secs} out of range"),
    })?;

    let mut records = Vec::new();
    let mut templates_learned = 0usize;

    while (cursor.position() as usize) + 4 <= message_length {
        let set_id = cursor.read_u16::<BigEndian>().map_err(short_packet)?;
        let set_len = cursor.read_u16::<BigEndian>().map_err(short_packet)? as usize;
        if set_len < 4 {
            return Err(DecodeError::MalformedRecord {
                reason: format!("set {set_id} declares length {set_len} < 4"),
            });
        }
        let body_len = set_len - 4;
        let start = cursor.position() as usize;
        let end = start + body_len;
        if end > message_length || end > bytes.len() {
            return Err(DecodeError::ShortPacket {
                needed: end,
                available: bytes.len(),
            });
        }
        let body = &bytes[start..end];

        match set_id {
            TEMPLATE_SET_ID => {
                let templates = parse_template_set(body, true, now)?;
                templates_learned += templates.len();
                for template in templates {
                    let template_id = template.template_id;
                    cache.learn(exporter_id, template.clone());
                    for pending in cache.drain_pending_for(exporter_id, template_id) {
                        records.extend(decode_data_records(&pending.raw, &template, exporter_id, export_time, None)?);
                    }
                }
            }
            OPTIONS_TEMPLATE_SET_ID => {}
            id if id >= MIN_DATA_SET_ID => match cache.get(exporter_id, id, now) {
                Some(template) => {
                    records.extend(decode_data_records(body, &template, exporter_id, export_time, None)?);
                }
                None => {
                    cache.buffer_pending(
                        exporter_id,
                        PendingRecord {
                            template_id: id,
                            raw: body.to_vec(),
                            received_at: now,
                        },
                    );
                }
            },
            other => {
                return Err(DecodeError::MalformedRecord {
                    reason: format!("unexpected set id {other}"),
                });
            }
        }
        cursor.set_position(end as u64);
    }

    Ok(IpfixDecodeOutcome { records, templates_learned })
}

fn short_packet(_: std::io::Error) -> DecodeError {
    DecodeError::ShortPacket { needed: 0, available: 0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FLOW_END_MILLISECONDS, FLOW_START_MILLISECONDS, IN_BYTES, IPV4_DST_ADDR, IPV4_SRC_ADDR};
    use byteorder::WriteBytesExt;
    use std::time::Duration;

    fn template_set_body() -> Vec<u8> {
        let mut body = Vec::new();
        body.write_u16::<BigEndian>(256).unwrap();
        body.write_u16::<BigEndian>(5).unwrap();
        for (field_type, len) in [
            (IPV4_SRC_ADDR, 4u16),
            (IPV4_DST_ADDR, 4),
            (IN_BYTES, 4),
            (FLOW_START_MILLISECONDS, 8),
            (FLOW_END_MILLISECONDS, 8),
        ] {
            body.write_u16::<BigEndian>(field_type).unwrap();
            body.write_u16::<BigEndian>(len).unwrap();
        }
        body
    }

    fn wrap_set(set_id: u16, body: Vec<u8>) -> Vec<u8> {
        let mut set = Vec::new();
        set.write_u16::<BigEndian>(set_id).unwrap();
        set.write_u16::<BigEndian>((body.len() + 4) as u16).unwrap();
        set.extend(body);
        set
    }

    fn header(message_len: u16) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.write_u16::<BigEndian>(10).unwrap();
        buf.write_u16::<BigEndian>(message_len).unwrap();
        buf.write_u32::<BigEndian>(1_700_000_000).unwrap();
        buf.write_u32::<BigEndian>(1).unwrap();
        buf.write_u32::<BigEndian>(0).unwrap();
        buf
    }

    fn data_set_body() -> Vec<u8> {
        let mut body = Vec::new();
        body.write_u32::<BigEndian>(0x0A000001).unwrap();
        body.write_u32::<BigEndian>(0xC0A80101).unwrap();
        body.write_u32::<BigEndian>(2000).unwrap();
        body.write_u64::<BigEndian>(1_700_000_000_000).unwrap();
        body.write_u64::<BigEndian>(1_700_000_005_000).unwrap();
        body
    }

    #[test]
    fn decodes_template_and_data_with_absolute_timestamps() {
        let template_set = wrap_set(TEMPLATE_SET_ID, template_set_body());
        let data_set = wrap_set(256, data_set_body());
        let total_len = HEADER_LEN + template_set.len() + data_set.len();

        let mut packet = header(total_len as u16);
        packet.extend(template_set);
        packet.extend(data_set);

        let mut cache = TemplateCache::new(Duration::from_secs(1800), 16, 16);
        let outcome = decode_ipfix_packet(&packet, "exp-1", &mut cache, Utc::now()).unwrap();
        assert_eq!(outcome.templates_learned, 1);
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].byte_count, 2000);
        assert!(outcome.records[0].flow_start < outcome.records[0].flow_end);
    }

    #[test]
    fn rejects_non_ipfix_version() {
        let mut packet = header(HEADER_LEN as u16);
        packet[1] = 9;
        assert!(matches!(
            decode_ipfix_packet(&packet, "exp-1", &mut TemplateCache::new(Duration::from_secs(1800), 16, 16), Utc::now()),
            Err(DecodeError::BadVersion { found: 9 })
        ));
    }
}
