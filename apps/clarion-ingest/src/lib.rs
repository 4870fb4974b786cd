//! [apps/clarion-ingest/src/lib.rs]
//! Flow intake process: owns the sketch store and the endpoint
//! registry, decodes NetFlow v5/v9 and IPFIX over UDP, accepts
//! edge-agent sketch submissions and identity source events over
//! HTTP, and serves the internal candidate-query surface the batch
//! and incremental clustering workers pull from.

pub mod candidates;
pub mod edge_ingest;
pub mod health;
pub mod identity_ingest;
pub mod registry;
pub mod router;
pub mod state;
pub mod udp_listener;

pub use state::AppState;
