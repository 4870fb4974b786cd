//! [crates/clarion-policy/src/lib.rs]
//! SGT lifecycle (C7), communication matrix (C8), and policy
//! recommendation (C9): the layer that turns clustering and flow
//! aggregation into stable tags and vendor-neutral policy rules.

pub mod errors;
pub mod lifecycle;
pub mod matrix;
pub mod recommender;

pub use errors::PolicyError;
pub use lifecycle::{ClusterBinding, ReferenceCatalog, SgtLifecycle, SgtLifecycleConfig};
pub use matrix::{build_matrix, FlowObservation, MatrixBuildConfig};
pub use recommender::{recommend, ExternalPolicyCatalog, InheritedPolicy, RecommenderConfig};
