//! [crates/clarion-agent/src/errors.rs]

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("network error talking to ingest service: {0}")]
    Network(#[from] reqwest::Error),

    #[error("envelope error: {0}")]
    Transport(#[from] clarion_transport::TransportError),

    #[error("failed to decode submission outcome: {0}")]
    DecodeOutcome(#[source] bincode::Error),

    #[error("ingest service rejected envelope with status {status}: {body}")]
    ServerRejected { status: u16, body: String },

    #[error("partial sketch shape does not match the central configuration")]
    InvalidShape,

    #[error("local spool is full ({capacity} envelopes)")]
    SpoolFull { capacity: usize },
}
