//! [crates/clarion-config/src/settings.rs]
//! Typed configuration tree. Every field has a documented default so a
//! missing TOML file, or a TOML file that only overrides a handful of
//! keys, still produces a valid `ClarionConfig`. Secrets (database
//! URLs, credentials) are not modeled here: those come from the
//! environment via `clarion-secrets`, never from a checked-in file.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SketchConfig {
    /// HyperLogLog precision (4..=18). 12 -> 4096 registers, ~1.6%
    /// error, ~4 KiB per sketch.
    pub hll_precision: u8,
    pub cms_width: usize,
    pub cms_depth: usize,
    /// Endpoints with fewer than this many flows in a window are
    /// excluded from clustering input: too little signal to trust.
    pub min_flows_for_clustering: u64,
}

impl Default for SketchConfig {
    fn default() -> Self {
        SketchConfig {
            hll_precision: 12,
            cms_width: 2048,
            cms_depth: 5,
            min_flows_for_clustering: 50,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// How long an IPFIX/v9 template is trusted after last refresh.
    #[serde(with = "humantime_duration")]
    pub template_ttl: Duration,
    /// Per-exporter cap on buffered data records awaiting a template.
    pub pending_template_buffer_capacity: usize,
    /// Per-exporter cap on distinct cached templates.
    pub template_cache_capacity: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        DecoderConfig {
            template_ttl: Duration::from_secs(30 * 60),
            pending_template_buffer_capacity: 256,
            template_cache_capacity: 4096,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// How long after a session ends its identity mapping is still
    /// honored for late-arriving flows.
    #[serde(with = "humantime_duration")]
    pub grace_window: Duration,
    /// Bounded FIFO of flows pending identity attribution; oldest is
    /// dropped once full rather than growing unbounded.
    pub pending_attribution_capacity: usize,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        IdentityConfig {
            grace_window: Duration::from_secs(60),
            pending_attribution_capacity: 100_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Minimum cluster size for the batch (density) clusterer.
    pub min_size: usize,
    /// Minimum samples in a neighborhood for a point to be a core
    /// point, the density-clustering analog of `min_pts`.
    pub min_samples: usize,
    /// Below this assignment confidence, the incremental clusterer
    /// leaves an endpoint unassigned rather than binding it to the
    /// nearest centroid.
    pub incremental_confidence_min: f64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        ClusterConfig {
            min_size: 50,
            min_samples: 10,
            incremental_confidence_min: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SgtConfig {
    /// First numeric tag handed out by the registry; values below this
    /// are reserved for well-known/system tags.
    pub base_value: u16,
    /// Membership churn above this fraction blocks an automatic
    /// reassignment and requires manual review.
    pub max_churn: f64,
}

impl Default for SgtConfig {
    fn default() -> Self {
        SgtConfig {
            base_value: 2,
            max_churn: 0.25,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DefaultAction {
    Permit,
    Deny,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Terminal rule applied when nothing else matches.
    pub default_action: DefaultAction,
    /// Target fraction of observed traffic the recommended rule set
    /// must explicitly cover before a brownfield "tighten" suggestion
    /// is raised.
    pub coverage_target: f64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        PolicyConfig {
            default_action: DefaultAction::Deny,
            coverage_target: 0.9,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    #[serde(with = "humantime_duration")]
    pub batch_cluster_interval: Duration,
    #[serde(with = "humantime_duration")]
    pub incremental_assign_interval: Duration,
    #[serde(with = "humantime_duration")]
    pub matrix_rebuild_interval: Duration,
    /// Trailing window the matrix aggregates over; independent of how
    /// often the rebuild runs.
    #[serde(with = "humantime_duration")]
    pub matrix_window: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            batch_cluster_interval: Duration::from_secs(24 * 60 * 60),
            incremental_assign_interval: Duration::from_secs(5 * 60),
            matrix_rebuild_interval: Duration::from_secs(15 * 60),
            matrix_window: Duration::from_secs(60 * 60),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub listen_addr: String,
    pub listen_port: u16,
    pub max_envelope_bytes: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig {
            listen_addr: "0.0.0.0".to_string(),
            listen_port: 3000,
            max_envelope_bytes: 10 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClarionConfig {
    pub sketch: SketchConfig,
    pub decoder: DecoderConfig,
    pub identity: IdentityConfig,
    pub cluster: ClusterConfig,
    pub sgt: SgtConfig,
    pub policy: PolicyConfig,
    pub scheduler: SchedulerConfig,
    pub transport: TransportConfig,
}

impl Default for ClarionConfig {
    fn default() -> Self {
        ClarionConfig {
            sketch: SketchConfig::default(),
            decoder: DecoderConfig::default(),
            identity: IdentityConfig::default(),
            cluster: ClusterConfig::default(),
            sgt: SgtConfig::default(),
            policy: PolicyConfig::default(),
            scheduler: SchedulerConfig::default(),
            transport: TransportConfig::default(),
        }
    }
}

impl ClarionConfig {
    /// Loads configuration from an optional TOML file, falling back to
    /// defaults for every key the file doesn't set. `dotenvy::dotenv`
    /// is invoked as a side effect so `.env`-sourced secrets are
    /// available to callers that read them separately.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = match path {
            Some(path) => {
                let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.display().to_string(),
                    source,
                })?;
                toml::from_str(&contents).map_err(|source| ConfigError::Parse {
                    path: path.display().to_string(),
                    source,
                })?
            }
            None => ClarionConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks invariants that serde's field-level defaults can't
    /// express, e.g. a probability must be in `[0, 1]`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        const MIN_HLL_PRECISION: u8 = 4;
        const MAX_HLL_PRECISION: u8 = 18;
        if !(MIN_HLL_PRECISION..=MAX_HLL_PRECISION).contains(&self.sketch.hll_precision) {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "sketch.hll_precision {} out of range [{}, {}]",
                    self.sketch.hll_precision, MIN_HLL_PRECISION, MAX_HLL_PRECISION
                ),
            });
        }
        if !(0.0..=1.0).contains(&self.cluster.incremental_confidence_min) {
            return Err(ConfigError::Invalid {
                reason: "cluster.incremental_confidence_min must be in [0, 1]".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.sgt.max_churn) {
            return Err(ConfigError::Invalid {
                reason: "sgt.max_churn must be in [0, 1]".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.policy.coverage_target) {
            return Err(ConfigError::Invalid {
                reason: "policy.coverage_target must be in [0, 1]".to_string(),
            });
        }
        if self.decoder.pending_template_buffer_capacity == 0 {
            return Err(ConfigError::Invalid {
                reason: "decoder.pending_template_buffer_capacity must be > 0".to_string(),
            });
        }
        Ok(())
    }
}

/// Serde adapter so `Duration` fields read/write as human strings
/// ("30m", "1h") in TOML instead of raw seconds.
mod humantime_duration {
    use std::time::Duration;

    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&humantime::format_duration(*value).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pass_validation() {
        ClarionConfig::default().validate().unwrap();
    }

    #[test]
    fn load_with_no_path_returns_defaults() {
        let config = ClarionConfig::load(None).unwrap();
        assert_eq!(config.sketch.hll_precision, 12);
    }

    #[test]
    fn load_parses_partial_toml_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clarion.toml");
        std::fs::write(&path, "[sketch]\nhll_precision = 14\n").unwrap();
        let config = ClarionConfig::load(Some(&path)).unwrap();
        assert_eq!(config.sketch.hll_precision, 14);
        assert_eq!(config.sketch.cms_width, 2048);
    }

    #[test]
    fn invalid_precision_is_rejected() {
        let mut config = ClarionConfig::default();
        config.sketch.hll_precision = 30;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }
}
