//! [crates/clarion-decoder/src/decoder.rs]
//! Version-dispatching entry point. Every wire packet starts with a
//! 16-bit version field; this is the only byte this module reads
//! before handing off to the format-specific decoder.

use chrono::{DateTime, Utc};

use clarion_model::flow::FlowRecord;

use crate::errors::DecodeError;
use crate::ipfix::decode_ipfix_packet;
use crate::template::TemplateCache;
use crate::v5::decode_v5_packet;
use crate::v9::decode_v9_packet;

pub struct DecodeOutcome {
    pub records: Vec<FlowRecord>,
    pub templates_learned: usize,
}

/// Holds the template caches every exporter needs for v9/IPFIX;
/// stateless for v5. One `FlowDecoder` is shared across all exporters
/// feeding a single ingest process, since the cache is already keyed
/// per exporter ID.
pub struct FlowDecoder {
    templates: TemplateCache,
}

impl FlowDecoder {
    pub fn new(template_ttl: std::time::Duration, templates_per_exporter: usize, pending_capacity: usize) -> Self {
        FlowDecoder {
            templates: TemplateCache::new(template_ttl, templates_per_exporter, pending_capacity),
        }
    }

    /// Decodes one UDP datagram's worth of flow-export payload.
    /// `exporter_id` should identify the sending device, not just its
    /// source address: `ExporterScopedAddress` downstream needs it to
    /// disambiguate overlapping private address space across sites.
    pub fn decode_packet(&mut self, bytes: &[u8], exporter_id: &str, now: DateTime<Utc>) -> Result<DecodeOutcome, DecodeError> {
        if bytes.len() < 2 {
            return Err(DecodeError::ShortPacket { needed: 2, available: bytes.len() });
        }
        let version = u16::from_be_bytes([bytes[0], bytes[1]]);
        match version {
            5 => Ok(DecodeOutcome {
                records: decode_v5_packet(bytes, exporter_id)?,
                templates_learned: 0,
            }),
            9 => {
                let outcome = decode_v9_packet(bytes, exporter_id, &mut self.templates, now)?;
                Ok(DecodeOutcome {
                    records: outcome.records,
                    templates_learned: outcome.templates_learned,
                })
            }
            10 => {
                let outcome = decode_ipfix_packet(bytes, exporter_id, &mut self.templates, now)?;
                Ok(DecodeOutcome {
                    records: outcome.records,
                    templates_learned: outcome.templates_learned,
                })
            }
            other => Err(DecodeError::BadVersion { found: other }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn rejects_packet_too_short_to_carry_a_version() {
        let mut decoder = FlowDecoder::new(Duration::from_secs(1800), 16, 16);
        assert!(matches!(
            decoder.decode_packet(&[5], "exp-1", Utc::now()),
            Err(DecodeError::ShortPacket { .. })
        ));
    }

    #[test]
    fn rejects_unknown_version() {
        let mut decoder = FlowDecoder::new(Duration::from_secs(1800), 16, 16);
        assert!(matches!(
            decoder.decode_packet(&[0, 7, 0, 0], "exp-1", Utc::now()),
            Err(DecodeError::BadVersion { found: 7 })
        ));
    }
}
