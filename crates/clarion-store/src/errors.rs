//! [crates/clarion-store/src/errors.rs]

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database connection failed: {0}")]
    Connection(String),

    #[error("query failed: {0}")]
    Query(#[from] libsql::Error),

    #[error("failed to map a stored row: {0}")]
    Mapping(String),

    #[error("endpoint sketch not found")]
    SketchNotFound,

    #[error("partial sketch shape mismatch: {0}")]
    InvalidShape(#[from] clarion_sketch::SketchError),

    #[error("SGT name {0:?} is already in use by an active tag")]
    SgtNameTaken(String),

    #[error("no SGT registered with value {0}")]
    SgtNotFound(u16),
}
