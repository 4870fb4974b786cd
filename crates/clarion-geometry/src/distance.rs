//! [crates/clarion-geometry/src/distance.rs]
//! Distance functions over fixed-length feature vectors. All functions
//! here are total for equal-length slices and return `GeometryError`
//! otherwise; there is no implicit padding or truncation.

use crate::errors::GeometryError;

fn check_dims(a: &[f64], b: &[f64]) -> Result<(), GeometryError> {
    if a.len() != b.len() {
        return Err(GeometryError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(())
}

/// Straight-line distance. The default metric for nearest-centroid
/// assignment.
pub fn euclidean(a: &[f64], b: &[f64]) -> Result<f64, GeometryError> {
    check_dims(a, b)?;
    Ok(a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt())
}

/// Sum of absolute per-dimension differences. Less sensitive to a
/// single outlying dimension than Euclidean.
pub fn manhattan(a: &[f64], b: &[f64]) -> Result<f64, GeometryError> {
    check_dims(a, b)?;
    Ok(a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).sum())
}

/// Cosine distance (`1 - cosine similarity`), in `[0, 2]`. Useful when
/// direction matters more than magnitude, e.g. comparing traffic
/// shape independent of total volume. Zero vectors are defined to be
/// maximally dissimilar (distance `1.0`) rather than producing `NaN`.
pub fn cosine(a: &[f64], b: &[f64]) -> Result<f64, GeometryError> {
    check_dims(a, b)?;
    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(1.0);
    }
    let similarity = (dot / (norm_a * norm_b)).clamp(-1.0, 1.0);
    Ok(1.0 - similarity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn euclidean_of_identical_points_is_zero() {
        let a = vec![1.0, 2.0, 3.0];
        assert_eq!(euclidean(&a, &a).unwrap(), 0.0);
    }

    #[test]
    fn euclidean_rejects_mismatched_dimensions() {
        let a = vec![1.0, 2.0];
        let b = vec![1.0, 2.0, 3.0];
        assert!(matches!(
            euclidean(&a, &b),
            Err(GeometryError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn cosine_of_zero_vector_is_defined() {
        let a = vec![0.0, 0.0];
        let b = vec![1.0, 1.0];
        let d = cosine(&a, &b).unwrap();
        assert!(d.is_finite());
    }

    #[test]
    fn manhattan_matches_hand_computed_value() {
        let a = vec![0.0, 0.0];
        let b = vec![3.0, 4.0];
        assert_eq!(manhattan(&a, &b).unwrap(), 7.0);
    }
}
