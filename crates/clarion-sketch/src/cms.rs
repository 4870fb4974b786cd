//! [crates/clarion-sketch/src/cms.rs]
//! Count-Min Sketch frequency estimator, plus a bounded top-K
//! companion used to answer `top_k` queries without storing every key
//! ever seen.
//!
//! Fixed shape: width `w` (default 2048) and depth `d` (default 5).
//! `merge` requires identical shape or fails with `InvalidShape`.

use std::collections::HashMap;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::errors::SketchError;
use crate::hashing::hash64_with_row;

pub const DEFAULT_WIDTH: usize = 2048;
pub const DEFAULT_DEPTH: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountMinSketch {
    width: usize,
    depth: usize,
    counts: Vec<u32>,
}

impl CountMinSketch {
    pub fn new(width: usize, depth: usize) -> Self {
        let width = width.max(1);
        let depth = depth.max(1);
        CountMinSketch {
            width,
            depth,
            counts: vec![0u32; width * depth],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    fn cell(&self, row: usize, col: usize) -> usize {
        row * self.width + col
    }

    /// Adds `count` occurrences of `key`. Total: saturates rather than
    /// overflowing on pathological input.
    pub fn add<K: Hash + ?Sized>(&mut self, key: &K, count: u32) {
        for row in 0..self.depth {
            let col = (hash64_with_row(key, row) as usize) % self.width;
            let idx = self.cell(row, col);
            self.counts[idx] = self.counts[idx].saturating_add(count);
        }
    }

    /// Minimum across rows: the CMS point estimate, always an
    /// overestimate or exact, never an underestimate.
    pub fn estimate<K: Hash + ?Sized>(&self, key: &K) -> u32 {
        (0..self.depth)
            .map(|row| {
                let col = (hash64_with_row(key, row) as usize) % self.width;
                self.counts[self.cell(row, col)]
            })
            .min()
            .unwrap_or(0)
    }

    /// Element-wise add. Requires equal shape.
    pub fn merge(&mut self, other: &CountMinSketch) -> Result<(), SketchError> {
        if self.width != other.width || self.depth != other.depth {
            return Err(SketchError::InvalidShape {
                expected: format!("{}x{}", self.width, self.depth),
                actual: format!("{}x{}", other.width, other.depth),
            });
        }
        for (a, b) in self.counts.iter_mut().zip(other.counts.iter()) {
            *a = a.saturating_add(*b);
        }
        Ok(())
    }

    pub fn merged(&self, other: &CountMinSketch) -> Result<CountMinSketch, SketchError> {
        let mut out = self.clone();
        out.merge(other)?;
        Ok(out)
    }
}

/// Bounded tracker of the highest-count keys seen, backed by
/// provisional counts rather than a full histogram. Used to answer
/// `top_k` without unbounded memory: once the tracker is at capacity,
/// a new key only displaces the current minimum if its CMS-estimated
/// count is larger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopKTracker<K: Eq + Hash + Clone> {
    capacity: usize,
    provisional: HashMap<K, u64>,
}

impl<K: Eq + Hash + Clone> TopKTracker<K> {
    pub fn new(capacity: usize) -> Self {
        TopKTracker {
            capacity: capacity.max(1),
            provisional: HashMap::new(),
        }
    }

    /// Offers a freshly observed key with its current CMS-estimated
    /// count. If the key is already tracked, its provisional count is
    /// refreshed; otherwise it is admitted only if there is free
    /// capacity or it outranks the current minimum.
    pub fn offer(&mut self, key: K, estimated_count: u64) {
        if self.provisional.contains_key(&key) {
            self.provisional.insert(key, estimated_count);
            return;
        }
        if self.provisional.len() < self.capacity {
            self.provisional.insert(key, estimated_count);
            return;
        }
        if let Some((min_key, &min_count)) = self
            .provisional
            .iter()
            .min_by_key(|(_, &count)| count)
            .map(|(k, c)| (k.clone(), c))
        {
            if estimated_count > min_count {
                self.provisional.remove(&min_key);
                self.provisional.insert(key, estimated_count);
            }
        }
    }

    /// Current entries, sorted by descending estimated count.
    pub fn top(&self) -> Vec<(K, u64)> {
        let mut entries: Vec<(K, u64)> =
            self.provisional.iter().map(|(k, v)| (k.clone(), *v)).collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries
    }

    /// Merges another tracker's entries by re-offering each one; an
    /// approximation appropriate for a heuristic companion structure
    /// (unlike HLL/CMS merge, this is not claimed to be exact).
    pub fn merge(&mut self, other: &TopKTracker<K>) {
        for (key, count) in other.provisional.iter() {
            self.offer(key.clone(), *count);
        }
    }

    pub fn len(&self) -> usize {
        self.provisional.len()
    }

    pub fn is_empty(&self) -> bool {
        self.provisional.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_never_underestimates_true_count() {
        let mut cms = CountMinSketch::new(64, 4);
        for _ in 0..50 {
            cms.add("10.0.0.1", 1);
        }
        for _ in 0..10 {
            cms.add("10.0.0.2", 1);
        }
        assert!(cms.estimate("10.0.0.1") >= 50);
        assert!(cms.estimate("10.0.0.2") >= 10);
    }

    #[test]
    fn merge_is_associative_and_commutative() {
        let mut a = CountMinSketch::new(32, 3);
        let mut b = CountMinSketch::new(32, 3);
        let mut c = CountMinSketch::new(32, 3);
        a.add("x", 5);
        b.add("x", 7);
        c.add("x", 2);

        let ab_c = a.merged(&b).unwrap().merged(&c).unwrap();
        let a_bc = a.merged(&b.merged(&c).unwrap()).unwrap();
        assert_eq!(ab_c.estimate("x"), a_bc.estimate("x"));
        assert_eq!(ab_c.estimate("x"), 14);
    }

    #[test]
    fn merge_rejects_mismatched_shape() {
        let mut a = CountMinSketch::new(32, 3);
        let b = CountMinSketch::new(16, 3);
        assert!(matches!(a.merge(&b), Err(SketchError::InvalidShape { .. })));
    }

    #[test]
    fn top_k_retains_highest_count_keys() {
        let mut tracker = TopKTracker::new(2);
        tracker.offer("a", 5);
        tracker.offer("b", 3);
        tracker.offer("c", 10);
        let top = tracker.top();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].0, "c");
    }
}
