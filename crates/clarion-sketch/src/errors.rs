//! [crates/clarion-sketch/src/errors.rs]
//! Error catalogue for the probabilistic estimators. Sketch operations
//! are otherwise total: every other path in this crate always returns
//! a value.

use thiserror::Error;

/// Failure modes for sketch construction and merge.
///
/// `InvalidShape` is the only one that matters operationally: it is
/// fatal to the single merge operation that raised it, never to the
/// sketch itself, and is surfaced as a metric by the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SketchError {
    #[error("shape mismatch: expected {expected}, got {actual}")]
    InvalidShape { expected: String, actual: String },
}
