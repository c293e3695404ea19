// Copyright 2020-2025 The Spork Authors. Licensed under GPL-3.0.

//! A reproducible hashing entry point for every collection.
//!
//! `std::collections::hash_map::RandomState` seeds per-process, which
//! would make `Map`/`Set`'s cached hash (and the "equal maps built in
//! different orders hash identically" structural property) depend on
//! process start order. This module wraps `DefaultHasher` with a fixed
//! seed instead, trading DoS-resistance (irrelevant for an in-process
//! library with no untrusted network input) for reproducibility.

use std::hash::{BuildHasher, Hash, Hasher};

/// A `BuildHasher` with a fixed seed, used everywhere this library
/// needs a stable 64-bit digest of a hashable value.
#[derive(Clone, Debug, Default)]
pub struct FixedState;

impl BuildHasher for FixedState {
    type Hasher = std::collections::hash_map::DefaultHasher;

    fn build_hasher(&self) -> Self::Hasher {
        // DefaultHasher::new() is itself a fixed, documented seed.
        std::collections::hash_map::DefaultHasher::new()
    }
}

/// The stable 64-bit hash of any `Hash` value, per [`FixedState`].
pub fn hash_of<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = FixedState.build_hasher();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Order-sensitive combinator used by `Vector`/`Cons`:
/// `h = 31*h + hash(x)`.
#[inline]
pub fn combine_ordered(acc: u64, element_hash: u64) -> u64 {
    acc.wrapping_mul(31).wrapping_add(element_hash)
}

/// Order-insensitive combinator used by `Map`: `h = sum(hash(k) xor hash(v))`.
#[inline]
pub fn combine_entry(key_hash: u64, value_hash: u64) -> u64 {
    key_hash ^ value_hash
}

/// Order-sensitive combinator used by `SortedVector`:
/// `h = (h xor hash(x)) * mult`, a classic FNV-style multiplier step.
#[inline]
pub fn combine_sorted(acc: u64, element_hash: u64) -> u64 {
    const MULT: u64 = 0x100_0000_01b3;
    (acc ^ element_hash).wrapping_mul(MULT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_of_is_deterministic_across_calls() {
        assert_eq!(hash_of(&"abcd"), hash_of(&"abcd"));
        assert_eq!(hash_of(&42i64), hash_of(&42i64));
    }

    #[test]
    fn combine_entry_is_order_independent() {
        let a = combine_entry(hash_of(&"k1"), hash_of(&1)) ^ combine_entry(hash_of(&"k2"), hash_of(&2));
        let b = combine_entry(hash_of(&"k2"), hash_of(&2)) ^ combine_entry(hash_of(&"k1"), hash_of(&1));
        assert_eq!(a, b);
    }
}
