//! [crates/clarion-geometry/src/stats.rs]
//! Small statistical helpers shared by the clustering and confidence
//! calculations. Not a general-purpose stats library: just the
//! handful of functions the pipeline actually needs.

/// Linear-interpolation percentile over an already-sorted ascending
/// slice. `q` is a fraction in `[0, 1]`. Returns `0.0` for empty input
/// rather than panicking, since an empty cluster has no distribution
/// to speak of.
pub fn percentile(sorted_ascending: &[f64], q: f64) -> f64 {
    if sorted_ascending.is_empty() {
        return 0.0;
    }
    if sorted_ascending.len() == 1 {
        return sorted_ascending[0];
    }
    let q = q.clamp(0.0, 1.0);
    let rank = q * (sorted_ascending.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        return sorted_ascending[lower];
    }
    let weight = rank - lower as f64;
    sorted_ascending[lower] * (1.0 - weight) + sorted_ascending[upper] * weight
}

/// Fraction of `new_count` relative to `previous_count` that represents
/// membership churn, i.e. how much a cluster's assigned set changed
/// relative to its prior size. Used by the SGT stability guard: a
/// churn ratio above a configured threshold blocks an automatic
/// reassignment and requires manual review instead.
pub fn churn_ratio(previous_count: u64, changed_count: u64) -> f64 {
    if previous_count == 0 {
        return if changed_count == 0 { 0.0 } else { 1.0 };
    }
    (changed_count as f64 / previous_count as f64).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentile_of_empty_slice_is_zero() {
        assert_eq!(percentile(&[], 0.95), 0.0);
    }

    #[test]
    fn percentile_matches_known_values() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile(&data, 0.0), 1.0);
        assert_eq!(percentile(&data, 1.0), 5.0);
        assert_eq!(percentile(&data, 0.5), 3.0);
    }

    #[test]
    fn churn_ratio_of_empty_prior_with_changes_is_total() {
        assert_eq!(churn_ratio(0, 5), 1.0);
        assert_eq!(churn_ratio(0, 0), 0.0);
    }

    #[test]
    fn churn_ratio_is_capped_at_one() {
        assert_eq!(churn_ratio(10, 50), 1.0);
    }
}
