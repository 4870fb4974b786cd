//! [crates/clarion-agent/src/lib.rs]
//! Edge-agent side of the partial-sketch protocol: sequence
//! allocation, a local delivery spool, and the HTTP client that posts
//! envelopes to the ingest service.

pub mod client;
pub mod errors;
pub mod queue;
pub mod sequence;

pub use client::AgentClient;
pub use errors::AgentError;
pub use queue::SpoolQueue;
pub use sequence::SequenceAllocator;
