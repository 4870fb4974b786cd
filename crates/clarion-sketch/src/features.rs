//! [crates/clarion-sketch/src/features.rs]
//! Deterministic feature extractor: projects an `EndpointSketch` to a
//! fixed-length, numerically normalized vector suitable for
//! distance-based clustering. Same sketch, same config -> byte
//! identical vector; unknown/empty fields map to `0.0`, never `NaN`.

use serde::{Deserialize, Serialize};

use crate::sketch::EndpointSketch;

pub const FEATURE_DIMENSIONS: usize = 18;

pub const FEATURE_NAMES: [&str; FEATURE_DIMENSIONS] = [
    "log_peer_cardinality",
    "log_port_cardinality",
    "byte_ratio_in_out",
    "port_entropy_normalized",
    "fraction_well_known_ports",
    "fraction_ephemeral_ports",
    "activity_concentration",
    "distinct_service_estimate_normalized",
    "directionality",
    "time_bucket_night",
    "time_bucket_morning",
    "time_bucket_afternoon",
    "time_bucket_evening",
    "log_flow_count",
    "log_total_bytes",
    "avg_flow_size_normalized",
    "peer_byte_concentration",
    "port_freq_concentration",
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FeatureConfig {
    pub well_known_port_ceiling: u16,
    pub ephemeral_port_floor: u16,
    pub byte_ratio_clamp: f64,
    pub avg_flow_size_clamp_bytes: f64,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        FeatureConfig {
            well_known_port_ceiling: 1024,
            ephemeral_port_floor: 49152,
            byte_ratio_clamp: 100.0,
            avg_flow_size_clamp_bytes: 1_000_000.0,
        }
    }
}

/// A feature vector: a fixed-length, normalized projection of a
/// sketch. Wrapping `Vec<f64>` (rather than exposing it bare) keeps
/// the dimensionality and naming in one place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(pub Vec<f64>);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn euclidean_distance(&self, other: &FeatureVector) -> f64 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f64>()
            .sqrt()
    }
}

fn shannon_entropy_normalized(counts: &[u64]) -> f64 {
    let total: u64 = counts.iter().sum();
    if total == 0 || counts.len() <= 1 {
        return 0.0;
    }
    let total_f = total as f64;
    let entropy: f64 = counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / total_f;
            -p * p.log2()
        })
        .sum();
    let max_entropy = (counts.len() as f64).log2();
    if max_entropy <= 0.0 {
        0.0
    } else {
        (entropy / max_entropy).clamp(0.0, 1.0)
    }
}

fn clamp01(v: f64) -> f64 {
    if v.is_finite() {
        v.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Deterministic function `sketch -> feature vector`. Pure: reads only
/// the sketch's already-merged state and the extractor configuration.
pub fn extract(sketch: &EndpointSketch, config: &FeatureConfig) -> FeatureVector {
    let peer_card = sketch.peer_cardinality.cardinality().max(0.0);
    let port_card = sketch.port_cardinality.cardinality().max(0.0);

    let log_peer_cardinality = (1.0 + peer_card).ln();
    let log_port_cardinality = (1.0 + port_card).ln();

    let byte_ratio = if sketch.bytes_out == 0 {
        if sketch.bytes_in == 0 {
            0.0
        } else {
            config.byte_ratio_clamp
        }
    } else {
        sketch.bytes_in as f64 / sketch.bytes_out as f64
    };
    let byte_ratio_in_out = clamp01(byte_ratio.min(config.byte_ratio_clamp) / config.byte_ratio_clamp);

    let top_ports = sketch.port_top_k.top();
    let port_counts: Vec<u64> = top_ports.iter().map(|(_, c)| *c).collect();
    let port_entropy_normalized = shannon_entropy_normalized(&port_counts);

    let total_top_port_flows: u64 = port_counts.iter().sum();
    let (well_known_flows, ephemeral_flows) = top_ports.iter().fold((0u64, 0u64), |(wk, eph), (port, count)| {
        if *port < config.well_known_port_ceiling {
            (wk + count, eph)
        } else if *port >= config.ephemeral_port_floor {
            (wk, eph + count)
        } else {
            (wk, eph)
        }
    });
    let fraction_well_known_ports = if total_top_port_flows == 0 {
        0.0
    } else {
        well_known_flows as f64 / total_top_port_flows as f64
    };
    let fraction_ephemeral_ports = if total_top_port_flows == 0 {
        0.0
    } else {
        ephemeral_flows as f64 / total_top_port_flows as f64
    };

    let total_hourly: u64 = sketch.active_hour_buckets.iter().sum();
    let max_hourly = sketch.active_hour_buckets.iter().copied().max().unwrap_or(0);
    let activity_concentration = if total_hourly == 0 {
        0.0
    } else {
        max_hourly as f64 / total_hourly as f64
    };

    // A rough distinct-service estimate: count of well-known/registered
    // ports (below the ephemeral floor) observed at all, scaled by
    // port cardinality so a wide but shallow fan-out still registers.
    let distinct_service_estimate = top_ports
        .iter()
        .filter(|(port, _)| *port < config.ephemeral_port_floor)
        .count() as f64;
    let distinct_service_estimate_normalized = clamp01(distinct_service_estimate / 32.0);

    let total_bytes = sketch.bytes_in + sketch.bytes_out;
    let directionality = if total_bytes == 0 {
        0.0
    } else {
        (sketch.bytes_out as f64 - sketch.bytes_in as f64) / total_bytes as f64
    };

    let bucket_of = |range: std::ops::Range<usize>| -> f64 {
        let sum: u64 = sketch.active_hour_buckets[range].iter().sum();
        if total_hourly == 0 {
            0.0
        } else {
            sum as f64 / total_hourly as f64
        }
    };
    let time_bucket_night = bucket_of(0..6);
    let time_bucket_morning = bucket_of(6..12);
    let time_bucket_afternoon = bucket_of(12..18);
    let time_bucket_evening = bucket_of(18..24);

    let log_flow_count = (1.0 + sketch.flow_count as f64).ln();
    let log_total_bytes = (1.0 + total_bytes as f64).ln();

    let avg_flow_size = if sketch.flow_count == 0 {
        0.0
    } else {
        total_bytes as f64 / sketch.flow_count as f64
    };
    let avg_flow_size_normalized = clamp01(avg_flow_size / config.avg_flow_size_clamp_bytes);

    let top_destinations = sketch.top_destinations.top();
    let total_dest_bytes: u64 = top_destinations.iter().map(|(_, b)| b).sum();
    let peer_byte_concentration = if total_dest_bytes == 0 {
        0.0
    } else {
        top_destinations[0].1 as f64 / total_dest_bytes as f64
    };

    let port_freq_concentration = if total_top_port_flows == 0 {
        0.0
    } else {
        port_counts.iter().copied().max().unwrap_or(0) as f64 / total_top_port_flows as f64
    };

    FeatureVector(vec![
        log_peer_cardinality,
        log_port_cardinality,
        byte_ratio_in_out,
        port_entropy_normalized,
        fraction_well_known_ports,
        fraction_ephemeral_ports,
        activity_concentration,
        distinct_service_estimate_normalized,
        directionality,
        time_bucket_night,
        time_bucket_morning,
        time_bucket_afternoon,
        time_bucket_evening,
        log_flow_count,
        log_total_bytes,
        avg_flow_size_normalized,
        peer_byte_concentration,
        port_freq_concentration,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sketch::SketchShape;
    use chrono::Utc;

    #[test]
    fn extraction_is_deterministic() {
        let shape = SketchShape::new(8, 64, 3);
        let sketch = EndpointSketch::new(shape, Utc::now());
        let config = FeatureConfig::default();
        let a = extract(&sketch, &config);
        let b = extract(&sketch, &config);
        assert_eq!(a, b);
        assert_eq!(a.0.len(), FEATURE_DIMENSIONS);
    }

    #[test]
    fn empty_sketch_has_no_nan_components() {
        let shape = SketchShape::new(8, 64, 3);
        let sketch = EndpointSketch::new(shape, Utc::now());
        let config = FeatureConfig::default();
        let features = extract(&sketch, &config);
        assert!(features.0.iter().all(|v| v.is_finite()));
    }
}
