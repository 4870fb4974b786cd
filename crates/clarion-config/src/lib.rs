//! [crates/clarion-config/src/lib.rs]
//! Typed configuration for every Clarion component. An optional TOML
//! file overrides any subset of keys; everything else falls back to
//! the defaults documented on each field.

pub mod errors;
pub mod settings;

pub use errors::ConfigError;
pub use settings::{
    ClarionConfig, ClusterConfig, DecoderConfig, DefaultAction, IdentityConfig, PolicyConfig,
    SchedulerConfig, SgtConfig, SketchConfig, TransportConfig,
};
