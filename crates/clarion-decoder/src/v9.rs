//! [crates/clarion-decoder/src/v9.rs]
//! NetFlow v9 decoding: a fixed header followed by a sequence of
//! FlowSets, each either a template definition or data referencing a
//! previously learned template.

use byteorder::{BigEndian, ReadBytesExt};
use chrono::{DateTime, Utc};
use std::io::Cursor;

use clarion_model::flow::FlowRecord;

use crate::common::{decode_data_records, parse_template_set};
use crate::errors::DecodeError;
use crate::template::{PendingRecord, TemplateCache};

pub const HEADER_LEN: usize = 20;
const TEMPLATE_FLOWSET_ID: u16 = 0;
const OPTIONS_TEMPLATE_FLOWSET_ID: u16 = 1;
const MIN_DATA_FLOWSET_ID: u16 = 256;

pub struct V9DecodeOutcome {
    pub records: Vec<FlowRecord>,
    pub templates_learned: usize,
}

pub fn decode_v9_packet(
    bytes: &[u8],
    exporter_id: &str,
    cache: &mut TemplateCache,
    now: DateTime<Utc>,
) -> Result<V9DecodeOutcome, DecodeError> {
    if bytes.len() < HEADER_LEN {
        return Err(DecodeError::ShortPacket {
            needed: HEADER_LEN,
            available: bytes.len(),
        });
    }
    let mut cursor = Cursor::new(bytes);
    let version = cursor.read_u16::<BigEndian>().map_err(short_packet)?;
    if version != 9 {
        return Err(DecodeError::BadVersion { found: version });
    }
    let _count = cursor.read_u16::<BigEndian>().map_err(short_packet)?;
    let sys_uptime_ms = cursor.read_u32::<BigEndian>().map_err(short_packet)?;
    let unix_secs = cursor.read_u32::<BigEndian>().map_err(short_packet)?;
    let _sequence = cursor.read_u32::<BigEndian>().map_err(short_packet)?;
    let _source_id = cursor.read_u32::<BigEndian>().map_err(short_packet)?;

    let export_time = DateTime::from_timestamp(unix_secs as i64, 0).ok_or_else(|| DecodeError::TimeSkew {
        reason: format!("header unix_secs={unix_secs} out of range"),
    })?;

    let mut records = Vec::new();
    let mut templates_learned = 0usize;

    while (bytes.len() as u64).saturating_sub(cursor.position()) >= 4 {
        let flowset_id = cursor.read_u16::<BigEndian>().map_err(short_packet)?;
        let flowset_len = cursor.read_u16::<BigEndian>().map_err(short_packet)? as usize;
        if flowset_len < 4 {
            return Err(DecodeError::MalformedRecord {
                reason: format!("flowset {flowset_id} declares length {flowset_len} < 4"),
            });
        }
        let body_len = flowset_len - 4;
        let start = cursor.position() as usize;
        let end = start + body_len;
        if end > bytes.len() {
            return Err(DecodeError::ShortPacket {
                needed: end,
                available: bytes.len(),
            });
        }
        let body = &bytes[start..end];

        match flowset_id {
            TEMPLATE_FLOWSET_ID => {
                let templates = parse_template_set(body, false, now)?;
                templates_learned += templates.len();
                for template in templates {
                    let template_id = template.template_id;
                    cache.learn(exporter_id, template.clone());
                    for pending in cache.drain_pending_for(exporter_id, template_id) {
                        records.extend(replay_pending(&pending, &template, exporter_id, export_time, sys_uptime_ms)?);
                    }
                }
            }
            OPTIONS_TEMPLATE_FLOWSET_ID => {
                // Options templates (exporter metadata, sampling info)
                // carry no flow data; skip without parsing their body.
            }
            id if id >= MIN_DATA_FLOWSET_ID => {
                match cache.get(exporter_id, id, now) {
                    Some(template) => {
                        records.extend(decode_data_records(body, &template, exporter_id, export_time, Some(sys_uptime_ms))?);
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
                }
            }
            other => {
                return Err(DecodeError::MalformedRecord {
                    reason: format!("unexpected flowset id {other}"),
                });
            }
        }
        cursor.set_position(end as u64);
    }

    Ok(V9DecodeOutcome { records, templates_learned })
}

fn replay_pending(
    pending: &PendingRecord,
    template: &crate::template::Template,
    exporter_id: &str,
    export_time: DateTime<Utc>,
    sys_uptime_ms: u32,
) -> Result<Vec<FlowRecord>, DecodeError> {
    decode_data_records(&pending.raw, template, exporter_id, export_time, Some(sys_uptime_ms))
}

fn short_packet(_: std::io::Error) -> DecodeError {
    DecodeError::ShortPacket { needed: 0, available: 0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{IN_BYTES, IPV4_DST_ADDR, IPV4_SRC_ADDR};
    use byteorder::WriteBytesExt;
    use std::time::Duration;

    fn header(count: u16) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.write_u16::<BigEndian>(9).unwrap();
        buf.write_u16::<BigEndian>(count).unwrap();
        buf.write_u32::<BigEndian>(10_000).unwrap();
        buf.write_u32::<BigEndian>(1_700_000_000).unwrap();
        buf.write_u32::<BigEndian>(1).unwrap();
        buf.write_u32::<BigEndian>(0).unwrap();
        buf
    }

    fn template_flowset() -> Vec<u8> {
        let mut body = Vec::new();
        body.write_u16::<BigEndian>(256).unwrap();
        body.write_u16::<BigEndian>(3).unwrap();
        body.write_u16::<BigEndian>(IPV4_SRC_ADDR).unwrap();
        body.write_u16::<BigEndian>(4).unwrap();
        body.write_u16::<BigEndian>(IPV4_DST_ADDR).unwrap();
        body.write_u16::<BigEndian>(4).unwrap();
        body.write_u16::<BigEndian>(IN_BYTES).unwrap();
        body.write_u16::<BigEndian>(4).unwrap();

        let mut flowset = Vec::new();
        flowset.write_u16::<BigEndian>(0).unwrap();
        flowset.write_u16::<BigEndian>((body.len() + 4) as u16).unwrap();
        flowset.extend(body);
        flowset
    }

    fn data_flowset() -> Vec<u8> {
        let mut body = Vec::new();
        body.write_u32::<BigEndian>(0x0A000001).unwrap();
        body.write_u32::<BigEndian>(0xC0A80101).unwrap();
        body.write_u32::<BigEndian>(1500).unwrap();

        let mut flowset = Vec::new();
        flowset.write_u16::<BigEndian>(256).unwrap();
        flowset.write_u16::<BigEndian>((body.len() + 4) as u16).unwrap();
        flowset.extend(body);
        flowset
    }

    #[test]
    fn learns_template_then_decodes_data_in_same_packet() {
        let mut packet = header(2);
        packet.extend(template_flowset());
        packet.extend(data_flowset());

        let mut cache = TemplateCache::new(Duration::from_secs(1800), 16, 16);
        let outcome = decode_v9_packet(&packet, "exp-1", &mut cache, Utc::now()).unwrap();
        assert_eq!(outcome.templates_learned, 1);
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].byte_count, 1500);
    }

    #[test]
    fn buffers_data_before_template_then_replays_on_arrival() {
        let mut data_only = header(1);
        data_only.extend(data_flowset());

        let mut cache = TemplateCache::new(Duration::from_secs(1800), 16, 16);
        let first = decode_v9_packet(&data_only, "exp-1", &mut cache, Utc::now()).unwrap();
        assert_eq!(first.records.len(), 0);

        let mut template_only = header(1);
        template_only.extend(template_flowset());
        let second = decode_v9_packet(&template_only, "exp-1", &mut cache, Utc::now()).unwrap();
        assert_eq!(second.records.len(), 1, "buffered record should replay once its template arrives");
    }

    #[test]
    fn rejects_non_v9_version() {
        let mut packet = header(0);
        packet[1] = 5;
        assert!(matches!(
            decode_v9_packet(&packet, "exp-1", &mut TemplateCache::new(Duration::from_secs(1800), 16, 16), Utc::now()),
            Err(DecodeError::BadVersion { found: 5 })
        ));
    }
}
