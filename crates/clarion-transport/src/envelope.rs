//! [crates/clarion-transport/src/envelope.rs]
//! The wire unit an edge agent POSTs to the ingest service: one
//! endpoint's sketch for one observation window, tagged with a
//! monotonic per-(agent, endpoint) sequence number so the receiver can
//! detect and ignore duplicate or out-of-order deliveries without
//! coordinating with the agent beyond that counter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use clarion_model::endpoint::EndpointKey;
use clarion_sketch::EndpointSketch;

use crate::errors::TransportError;

/// Hard cap on an encoded envelope's size. An agent batching an
/// unreasonable number of high-cardinality sketches into one POST is
/// a bug or an attack, not a case to special-case support for.
pub const MAX_ENVELOPE_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SketchEnvelope {
    pub agent_id: Uuid,
    pub endpoint_key: EndpointKey,
    /// Monotonic per-(agent_id, endpoint_key) counter. The receiver
    /// accepts an envelope only if its sequence is strictly greater
    /// than the last one it applied for this pair, which makes
    /// at-least-once delivery idempotent without a separate
    /// deduplication store.
    pub sequence: u64,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub sketch: EndpointSketch,
}

/// The ingest service's response to a batch POST: how many envelopes
/// were newly applied versus recognized as already-seen duplicates.
/// Agents use this purely for their own telemetry; delivery itself
/// does not require acknowledgment beyond HTTP 200.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SubmissionOutcome {
    pub accepted: usize,
    pub duplicates: usize,
}

pub fn encode(envelope: &SketchEnvelope) -> Result<Vec<u8>, TransportError> {
    let bytes = bincode::serialize(envelope).map_err(TransportError::Encode)?;
    if bytes.len() > MAX_ENVELOPE_BYTES {
        return Err(TransportError::EnvelopeTooLarge {
            size: bytes.len(),
            max: MAX_ENVELOPE_BYTES,
        });
    }
    Ok(bytes)
}

pub fn decode(bytes: &[u8]) -> Result<SketchEnvelope, TransportError> {
    if bytes.len() > MAX_ENVELOPE_BYTES {
        return Err(TransportError::EnvelopeTooLarge {
            size: bytes.len(),
            max: MAX_ENVELOPE_BYTES,
        });
    }
    bincode::deserialize(bytes).map_err(TransportError::Decode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clarion_sketch::SketchShape;

    #[test]
    fn round_trips_through_encode_decode() {
        let envelope = SketchEnvelope {
            agent_id: Uuid::new_v4(),
            endpoint_key: EndpointKey::Minted(Uuid::new_v4()),
            sequence: 1,
            window_start: Utc::now(),
            window_end: Utc::now(),
            sketch: EndpointSketch::new(SketchShape::new(8, 64, 3), Utc::now()),
        };
        let bytes = encode(&envelope).unwrap();
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.agent_id, envelope.agent_id);
        assert_eq!(decoded.sequence, envelope.sequence);
    }

    #[test]
    fn rejects_oversized_payload() {
        let oversized = vec![0u8; MAX_ENVELOPE_BYTES + 1];
        assert!(matches!(decode(&oversized), Err(TransportError::EnvelopeTooLarge { .. })));
    }
}
