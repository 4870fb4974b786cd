//! [crates/clarion-cluster/src/errors.rs]

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClusterError {
    #[error("feature vectors have mismatched dimensions: {0}")]
    Geometry(#[from] clarion_geometry::GeometryError),

    #[error("clustering input is degenerate: {0}")]
    DegenerateInput(String),

    #[error("no active centroid snapshot is available for incremental assignment")]
    NoCentroidSnapshot,
}
