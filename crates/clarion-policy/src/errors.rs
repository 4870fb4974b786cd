//! [crates/clarion-policy/src/errors.rs]

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PolicyError {
    #[error(transparent)]
    Store(#[from] clarion_store::StoreError),

    #[error("centroid has no bound SGT yet; wait for the next batch run")]
    UnboundCentroid,

    #[error("reference catalog lookup failed: {0}")]
    CatalogUnavailable(String),
}
