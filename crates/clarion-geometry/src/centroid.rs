//! [crates/clarion-geometry/src/centroid.rs]
//! Centroid computation over a set of equal-length feature vectors.

use crate::distance::euclidean;
use crate::errors::GeometryError;

/// Arithmetic mean, dimension by dimension. All points must share the
/// same length or the mismatched point's index is reported.
pub fn mean(points: &[Vec<f64>]) -> Result<Vec<f64>, GeometryError> {
    let first = points.first().ok_or(GeometryError::EmptyPointSet)?;
    let dims = first.len();
    let mut sum = vec![0.0; dims];
    for point in points {
        if point.len() != dims {
            return Err(GeometryError::DimensionMismatch {
                expected: dims,
                actual: point.len(),
            });
        }
        for (s, v) in sum.iter_mut().zip(point.iter()) {
            *s += v;
        }
    }
    let n = points.len() as f64;
    for s in sum.iter_mut() {
        *s /= n;
    }
    Ok(sum)
}

/// The 95th percentile of each point's distance to `centroid`. Used to
/// calibrate the incremental clusterer's assignment-confidence curve:
/// a point closer than this distance to its nearest centroid is
/// "typical" for that cluster, one farther away is increasingly novel.
pub fn p95_intra_cluster_distance(
    points: &[Vec<f64>],
    centroid: &[f64],
) -> Result<f64, GeometryError> {
    if points.is_empty() {
        return Err(GeometryError::EmptyPointSet);
    }
    let mut distances: Vec<f64> = points
        .iter()
        .map(|p| euclidean(p, centroid))
        .collect::<Result<_, _>>()?;
    distances.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    Ok(crate::stats::percentile(&distances, 0.95))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_single_point_is_itself() {
        let points = vec![vec![1.0, 2.0, 3.0]];
        assert_eq!(mean(&points).unwrap(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn mean_averages_each_dimension_independently() {
        let points = vec![vec![0.0, 10.0], vec![2.0, 20.0]];
        assert_eq!(mean(&points).unwrap(), vec![1.0, 15.0]);
    }

    #[test]
    fn mean_rejects_empty_input() {
        let points: Vec<Vec<f64>> = vec![];
        assert_eq!(mean(&points), Err(GeometryError::EmptyPointSet));
    }

    #[test]
    fn p95_distance_is_nonnegative_and_bounded_by_max() {
        let points = vec![vec![0.0], vec![1.0], vec![2.0], vec![10.0]];
        let centroid = vec![0.0];
        let p95 = p95_intra_cluster_distance(&points, &centroid).unwrap();
        assert!(p95 >= 0.0 && p95 <= 10.0);
    }
}
