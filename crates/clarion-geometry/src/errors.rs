//! [crates/clarion-geometry/src/errors.rs]
//! Error catalogue for geometry operations.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("cannot compute centroid of an empty point set")]
    EmptyPointSet,
}
