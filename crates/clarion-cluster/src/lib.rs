//! [crates/clarion-cluster/src/lib.rs]
//! Batch clustering (C5) and incremental assignment (C6). The batch
//! path projects, clusters, and labels a full sketch population on a
//! schedule; the incremental path assigns single endpoints against the
//! last batch's centroid snapshot between runs.

pub mod batch;
pub mod density;
pub mod errors;
pub mod incremental;
pub mod labeling;

pub use batch::{run_batch, BatchRun, ClusterCandidate};
pub use density::{cluster as density_cluster, DensityConfig, DensityResult};
pub use errors::ClusterError;
pub use incremental::{assign as assign_incremental, DEFAULT_CONFIDENCE_THRESHOLD};
pub use labeling::{label_cluster, LabelingContext, SemanticLabel, TrafficRole};
