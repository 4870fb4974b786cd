//! [crates/clarion-sketch/src/hashing.rs]
//! Fixed, documented 64-bit hash used by every estimator in this
//! crate. The seed is a compile-time constant specifically so that
//! sketches built by independent processes (the central store and
//! remote edge agents) are directly comparable and mergeable: two
//! processes hashing the same peer address must land on the same
//! register/row, or merge would silently corrupt the estimate.

use std::hash::{Hash, Hasher};

use siphasher::sip::SipHasher13;

/// Seed shared by every HLL/CMS instance in the fleet. Do not change
/// without also changing the on-wire/on-disk shape version: existing
/// sketches hashed under the old seed are not comparable to ones
/// hashed under a new seed.
const SKETCH_HASH_SEED: (u64, u64) = (0x5A17_C0DE_CAFE_F00D, 0x0BAD_C0FF_EE15_5EED);

/// Hashes any `Hash` value to a 64-bit digest using the sketch-wide
/// fixed seed.
pub fn hash64<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = SipHasher13::new_with_keys(SKETCH_HASH_SEED.0, SKETCH_HASH_SEED.1);
    value.hash(&mut hasher);
    hasher.finish()
}

/// A second, independent hash family used to decorrelate CMS rows.
/// Without this, all rows would see the same collisions and the
/// min-across-rows estimator would lose its error bound.
pub fn hash64_with_row(value: &(impl Hash + ?Sized), row: usize) -> u64 {
    let mut hasher = SipHasher13::new_with_keys(
        SKETCH_HASH_SEED.0 ^ (row as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15),
        SKETCH_HASH_SEED.1,
    );
    value.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic_across_calls() {
        assert_eq!(hash64("10.0.0.5"), hash64("10.0.0.5"));
    }

    #[test]
    fn rows_decorrelate() {
        let a = hash64_with_row(&443u16, 0);
        let b = hash64_with_row(&443u16, 1);
        assert_ne!(a, b);
    }
}
