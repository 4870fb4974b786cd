//! [crates/clarion-transport/src/errors.rs]

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("envelope too large: {size} bytes exceeds the {max} byte limit")]
    EnvelopeTooLarge { size: usize, max: usize },
    #[error("failed to encode envelope: {0}")]
    Encode(#[source] bincode::Error),
    #[error("failed to decode envelope: {0}")]
    Decode(#[source] bincode::Error),
}
