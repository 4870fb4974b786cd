//! [crates/clarion-decoder/src/common.rs]
//! Template-record and data-record parsing shared by NetFlow v9 and
//! IPFIX: the two formats differ only in header shape and a handful
//! of set-ID constants, not in how templates and data records are
//! laid out on the wire.

use byteorder::{BigEndian, ReadBytesExt};
use chrono::{DateTime, Utc};
use std::io::Cursor;

use clarion_model::flow::FlowRecord;

use crate::errors::DecodeError;
use crate::field::PartialFlow;
use crate::template::{Template, TemplateField};

const ENTERPRISE_BIT: u16 = 0x8000;

/// Variable-length IPFIX fields (the `0xFFFF` length sentinel) are not
/// supported: every field this decoder extracts is fixed-width, and a
/// template that declares a variable-length field on one of them would
/// make record boundaries ambiguous without per-record length octets,
/// which this decoder does not parse.
const VARIABLE_LENGTH: u16 = 0xFFFF;

/// Parses every template record in a template-set body. `enterprise_aware`
/// controls whether the top bit of a field type is read as the
/// IPFIX enterprise-field marker (v9 has no such mechanism).
pub fn parse_template_set(body: &[u8], enterprise_aware: bool, now: DateTime<Utc>) -> Result<Vec<Template>, DecodeError> {
    let mut cursor = Cursor::new(body);
    let mut templates = Vec::new();

    while (body.len() as u64).saturating_sub(cursor.position()) >= 4 {
        let template_id = cursor.read_u16::<BigEndian>().map_err(malformed)?;
        let field_count = cursor.read_u16::<BigEndian>().map_err(malformed)?;
        if template_id < 256 {
            // Padding or an option-scope record we don't parse; stop
            // rather than misinterpret trailing bytes as more templates.
            break;
        }
        let mut fields = Vec::with_capacity(field_count as usize);
        for _ in 0..field_count {
            let mut field_type = cursor.read_u16::<BigEndian>().map_err(malformed)?;
            let length = cursor.read_u16::<BigEndian>().map_err(malformed)?;
            if enterprise_aware && field_type & ENTERPRISE_BIT != 0 {
                field_type &= !ENTERPRISE_BIT;
                let _enterprise_number = cursor.read_u32::<BigEndian>().map_err(malformed)?;
            }
            if length == VARIABLE_LENGTH {
                return Err(DecodeError::MalformedRecord {
                    reason: format!("template {template_id} declares unsupported variable-length field {field_type}"),
                });
            }
            fields.push(TemplateField { field_type, length });
        }
        templates.push(Template {
            template_id,
            fields,
            learned_at: now,
        });
    }
    Ok(templates)
}

/// Decodes every fixed-length record in a data-set body against an
/// already-resolved template.
///
/// `sys_uptime_ms`, when given (NetFlow v9 only), anchors
/// device-uptime-relative FIRST_SWITCHED/LAST_SWITCHED fields to wall
/// clock time the same way v5 does. IPFIX exporters normally supply
/// absolute `flowStartMilliseconds`/`flowEndMilliseconds` instead, so
/// this is `None` there.
pub fn decode_data_records(
    body: &[u8],
    template: &Template,
    exporter_id: &str,
    export_time: DateTime<Utc>,
    sys_uptime_ms: Option<u32>,
) -> Result<Vec<FlowRecord>, DecodeError> {
    let record_len = template.record_length();
    if record_len == 0 {
        return Err(DecodeError::MalformedRecord {
            reason: format!("template {} has zero-length record layout", template.template_id),
        });
    }
    let mut records = Vec::with_capacity(body.len() / record_len);
    let mut offset = 0usize;
    while offset + record_len <= body.len() {
        let mut partial = PartialFlow::default();
        let mut field_offset = offset;
        for field in &template.fields {
            let end = field_offset + field.length as usize;
            partial.apply(field.field_type, &body[field_offset..end]);
            field_offset = end;
        }

        let (flow_start, flow_end) = resolve_timestamps(&partial, export_time, sys_uptime_ms);
        let (Some(source_addr), Some(dest_addr)) = (partial.source_addr, partial.dest_addr) else {
            offset += record_len;
            continue;
        };

        records.push(FlowRecord::new(
            source_addr,
            dest_addr,
            partial.source_port,
            partial.dest_port,
            partial.protocol,
            partial.byte_count,
            partial.packet_count,
            flow_start,
            flow_end,
            exporter_id,
        ));
        offset += record_len;
    }
    Ok(records)
}

fn resolve_timestamps(
    partial: &PartialFlow,
    export_time: DateTime<Utc>,
    sys_uptime_ms: Option<u32>,
) -> (DateTime<Utc>, DateTime<Utc>) {
    if let (Some(start), Some(end)) = (partial.flow_start_absolute, partial.flow_end_absolute) {
        return (start, end);
    }
    if let (Some(uptime), Some(first), Some(last)) = (sys_uptime_ms, partial.first_switched_ms, partial.last_switched_ms) {
        let start = export_time - chrono::Duration::milliseconds(uptime as i64 - first as i64);
        let end = export_time - chrono::Duration::milliseconds(uptime as i64 - last as i64);
        return (start, end);
    }
    // No usable timestamp field in this template: fall back to export
    // time for both ends rather than fabricating a duration.
    (export_time, export_time)
}

fn malformed(_: std::io::Error) -> DecodeError {
    DecodeError::MalformedRecord {
        reason: "truncated template record".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;
    use crate::field::{IPV4_DST_ADDR, IPV4_SRC_ADDR, IN_BYTES};

    fn build_template_set() -> Vec<u8> {
        let mut buf = Vec::new();
        buf.write_u16::<BigEndian>(256).unwrap();
        buf.write_u16::<BigEndian>(3).unwrap();
        buf.write_u16::<BigEndian>(IPV4_SRC_ADDR).unwrap();
        buf.write_u16::<BigEndian>(4).unwrap();
        buf.write_u16::<BigEndian>(IPV4_DST_ADDR).unwrap();
        buf.write_u16::<BigEndian>(4).unwrap();
        buf.write_u16::<BigEndian>(IN_BYTES).unwrap();
        buf.write_u16::<BigEndian>(4).unwrap();
        buf
    }

    #[test]
    fn parses_single_template() {
        let body = build_template_set();
        let templates = parse_template_set(&body, false, Utc::now()).unwrap();
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].template_id, 256);
        assert_eq!(templates[0].record_length(), 12);
    }

    #[test]
    fn decodes_data_record_against_template() {
        let template_body = build_template_set();
        let template = &parse_template_set(&template_body, false, Utc::now()).unwrap()[0];

        let mut data = Vec::new();
        data.write_u32::<BigEndian>(0x0A000001).unwrap();
        data.write_u32::<BigEndian>(0xC0A80101).unwrap();
        data.write_u32::<BigEndian>(1500).unwrap();

        let now = Utc::now();
        let records = decode_data_records(&data, template, "exp-1", now, None).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].byte_count, 1500);
    }

    #[test]
    fn rejects_variable_length_field() {
        let mut buf = Vec::new();
        buf.write_u16::<BigEndian>(256).unwrap();
        buf.write_u16::<BigEndian>(1).unwrap();
        buf.write_u16::<BigEndian>(IPV4_SRC_ADDR).unwrap();
        buf.write_u16::<BigEndian>(VARIABLE_LENGTH).unwrap();
        assert!(matches!(
            parse_template_set(&buf, true, Utc::now()),
            Err(DecodeError::MalformedRecord { .. })
        ));
    }
}
