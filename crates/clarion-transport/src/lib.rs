//! [crates/clarion-transport/src/lib.rs]
//! Binary wire envelope for edge-agent sketch submissions. Bincode
//! keeps the on-wire form compact; the size cap and sequence number
//! live here rather than in `clarion-agent` so both the agent and the
//! ingest service share one definition of what a valid envelope is.

pub mod envelope;
pub mod errors;

pub use envelope::{encode, decode, SketchEnvelope, SubmissionOutcome, MAX_ENVELOPE_BYTES};
pub use errors::TransportError;
