// Copyright 2020-2025 The Spork Authors. Licensed under GPL-3.0.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use pds_core::hash::{combine_sorted, hash_of};
use pds_core::{Error, Result};

use crate::iter::Iter;
use crate::node::{self, Link};

/// A persistent sorted sequence backed by a left-leaning red-black
/// tree, ordered by a projected sort key `K` (defaulting to `T` itself
/// when no projection is supplied).
///
/// Elements compare equal under `K`'s `Ord` impl; inserting a value
/// whose key ties with an existing one does not replace it (unlike a
/// hash map), it is placed after the existing occurrences, so
/// `SortedVector` behaves as a multiset with a stable relative order
/// among duplicates.
pub struct SortedVector<T: Clone, K: Ord + Clone = T> {
    count: usize,
    root: Link<T, K>,
    key_fn: Rc<dyn Fn(&T) -> K>,
    reverse: bool,
}

impl<T: Clone, K: Ord + Clone> Clone for SortedVector<T, K> {
    fn clone(&self) -> Self {
        SortedVector {
            count: self.count,
            root: self.root.clone(),
            key_fn: self.key_fn.clone(),
            reverse: self.reverse,
        }
    }
}

impl<T: Clone, K: Ord + Clone> SortedVector<T, K> {
    /// Builds an empty sorted vector ordered by `key_fn`, optionally
    /// reversed.
    pub fn empty_by_key<F>(key_fn: F, reverse: bool) -> Self
    where
        F: Fn(&T) -> K + 'static,
    {
        SortedVector {
            count: 0,
            root: None,
            key_fn: Rc::new(key_fn),
            reverse,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether the sequence has no elements.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Whether iteration yields the configured key order in reverse.
    pub fn is_reversed(&self) -> bool {
        self.reverse
    }

    fn key_of(&self, value: &T) -> K {
        (self.key_fn)(value)
    }

    fn compare(&self, a: &K, b: &K) -> Ordering {
        let ord = a.cmp(b);
        if self.reverse {
            ord.reverse()
        } else {
            ord
        }
    }

    /// Inserts `value`, returning a new sorted vector. `O(log n)`.
    pub fn conj(&self, value: T) -> Self {
        let key = self.key_of(&value);
        let cmp = |a: &K, b: &K| self.compare(a, b);
        let root = node::insert(self.root.clone(), value, key, &cmp);
        SortedVector {
            count: self.count + 1,
            root: Some(root),
            key_fn: self.key_fn.clone(),
            reverse: self.reverse,
        }
    }

    /// Removes one occurrence of `value`, or returns an unchanged clone
    /// if no element equal to `value` is present. `O(log n)`.
    pub fn disj(&self, value: &T) -> Self
    where
        T: PartialEq,
    {
        match self.index_of(value) {
            None => self.clone(),
            Some(rank) => {
                let mut root = self.root.clone().unwrap();
                if !node::is_red(&root.left) && !node::is_red(&root.right) {
                    Rc::make_mut(&mut root).red = true;
                }
                let mut root = node::delete_at_rank(root, rank);
                if let Some(r) = root.as_mut() {
                    Rc::make_mut(r).red = false;
                }
                SortedVector {
                    count: self.count - 1,
                    root,
                    key_fn: self.key_fn.clone(),
                    reverse: self.reverse,
                }
            }
        }
    }

    /// The element at in-order position `index`.
    pub fn nth(&self, index: usize) -> Result<&T> {
        if index >= self.count {
            return Err(Error::IndexOutOfRange { index, len: self.count });
        }
        Ok(node::nth(&self.root, index))
    }

    /// Count of elements whose key orders strictly before `value`'s key.
    pub fn rank(&self, value: &T) -> usize {
        let key = self.key_of(value);
        let cmp = |a: &K, b: &K| self.compare(a, b);
        node::rank(&self.root, &key, &cmp)
    }

    /// The in-order index of `value`, or `None` if it is not present.
    pub fn index_of(&self, value: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        let key = self.key_of(value);
        let cmp = |a: &K, b: &K| self.compare(a, b);
        node::index_of(&self.root, &key, &cmp, &|candidate: &T| candidate == value)
    }

    /// Whether `value` is present.
    pub fn contains(&self, value: &T) -> bool
    where
        T: PartialEq,
    {
        self.index_of(value).is_some()
    }

    /// The first element in iteration order, if any.
    pub fn first(&self) -> Option<&T> {
        let mut cur = self.root.as_ref()?;
        while let Some(l) = &cur.left {
            cur = l;
        }
        Some(&cur.value)
    }

    /// The last element in iteration order, if any.
    pub fn last(&self) -> Option<&T> {
        let mut cur = self.root.as_ref()?;
        while let Some(r) = &cur.right {
            cur = r;
        }
        Some(&cur.value)
    }

    /// Iterates elements in the configured (possibly reversed) key
    /// order, front and back, via explicit left/right-spine stacks.
    pub fn iter(&self) -> Iter<'_, T, K> {
        Iter::new(&self.root, self.count)
    }

    pub(crate) fn root_ref(&self) -> &Link<T, K> {
        &self.root
    }

    pub(crate) fn key_fn_ref(&self) -> &Rc<dyn Fn(&T) -> K> {
        &self.key_fn
    }

    pub(crate) fn from_parts(count: usize, root: Link<T, K>, key_fn: Rc<dyn Fn(&T) -> K>, reverse: bool) -> Self {
        SortedVector { count, root, key_fn, reverse }
    }

    /// A 64-bit hash stable across equal sorted vectors regardless of
    /// tree shape, computed by folding element hashes with
    /// [`combine_sorted`] so that colliding values hash the same
    /// whether they arrived in different orders.
    pub fn hash_value(&self) -> u64
    where
        T: Hash,
    {
        let mut acc = 0u64;
        for v in self.iter() {
            acc = combine_sorted(acc, hash_of(v));
        }
        acc
    }
}

impl<T: Ord + Clone + 'static> SortedVector<T, T> {
    /// An empty sorted vector ordered by `T`'s own `Ord` impl.
    pub fn empty() -> Self {
        SortedVector {
            count: 0,
            root: None,
            key_fn: Rc::new(|v: &T| v.clone()),
            reverse: false,
        }
    }

    /// An empty sorted vector that iterates from largest to smallest.
    pub fn empty_reversed() -> Self {
        SortedVector {
            count: 0,
            root: None,
            key_fn: Rc::new(|v: &T| v.clone()),
            reverse: true,
        }
    }
}

impl<T: Ord + Clone> Default for SortedVector<T, T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: Ord + Clone> FromIterator<T> for SortedVector<T, T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut sv = SortedVector::empty();
        for v in iter {
            sv = sv.conj(v);
        }
        sv
    }
}

impl<'a, T: Clone, K: Ord + Clone> IntoIterator for &'a SortedVector<T, K> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: Clone + PartialEq, K: Ord + Clone> PartialEq for SortedVector<T, K> {
    fn eq(&self, other: &Self) -> bool {
        self.count == other.count && self.iter().eq(other.iter())
    }
}

impl<T: Clone + Eq, K: Ord + Clone> Eq for SortedVector<T, K> {}

impl<T: Clone + Hash, K: Ord + Clone> Hash for SortedVector<T, K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_value());
    }
}

impl<T: Clone + fmt::Debug, K: Ord + Clone> fmt::Debug for SortedVector<T, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

#[cfg(feature = "serde")]
impl<T: Clone + serde::Serialize, K: Ord + Clone> serde::Serialize for SortedVector<T, K> {
    /// Flattens to a plain sequence in iteration order; the key
    /// projection is a closure and is not serialized (see
    /// `key_fn_ref`'s doc comment and DESIGN.md).
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

#[cfg(feature = "serde")]
impl<'de, T: Ord + Clone + serde::Deserialize<'de> + 'static> serde::Deserialize<'de> for SortedVector<T, T> {
    /// Reconstructs via the `conj`-driven factory path, ordered by
    /// `T`'s own `Ord` impl; a custom key-fn cannot round-trip through
    /// serde (closures are not introspectable) and must be reattached
    /// by the caller after deserializing.
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Ok(Vec::<T>::deserialize(deserializer)?.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_has_no_elements() {
        let sv: SortedVector<i32> = SortedVector::empty();
        assert!(sv.is_empty());
        assert_eq!(sv.first(), None);
    }

    #[test]
    fn conj_keeps_sorted_order() {
        let sv: SortedVector<i32> = [3, 1, 4, 1, 5, 9, 2, 6].into_iter().collect();
        let collected: Vec<i32> = sv.iter().copied().collect();
        assert_eq!(collected, vec![1, 1, 2, 3, 4, 5, 6, 9]);
        assert_eq!(sv.len(), 8);
    }

    #[test]
    fn rank_and_index_of_match_spec_scenario() {
        let sv: SortedVector<i32> = [3, 1, 4, 1, 5, 9, 2, 6].into_iter().collect();
        assert_eq!(sv.rank(&4), 4);
        assert_eq!(sv.index_of(&1), Some(0));
        assert_eq!(sv.nth(4).unwrap(), &4);
    }

    #[test]
    fn disj_removes_one_occurrence_of_duplicates() {
        let sv: SortedVector<i32> = [1, 1, 2].into_iter().collect();
        let once = sv.disj(&1);
        assert_eq!(once.len(), 2);
        let collected: Vec<i32> = once.iter().copied().collect();
        assert_eq!(collected, vec![1, 2]);
    }

    #[test]
    fn disj_missing_value_is_a_no_op() {
        let sv: SortedVector<i32> = [1, 2, 3].into_iter().collect();
        let same = sv.disj(&42);
        assert_eq!(same, sv);
    }

    #[test]
    fn reverse_flips_iteration_order() {
        let mut sv: SortedVector<i32, i32> = SortedVector::empty_reversed();
        for v in [3, 1, 4, 1, 5] {
            sv = sv.conj(v);
        }
        let collected: Vec<i32> = sv.iter().copied().collect();
        assert_eq!(collected, vec![5, 4, 3, 1, 1]);
    }

    #[test]
    fn key_fn_orders_by_projection() {
        let sv = SortedVector::empty_by_key(|pair: &(i32, &'static str)| pair.0, false)
            .conj((3, "c"))
            .conj((1, "a"))
            .conj((2, "b"));
        let collected: Vec<&'static str> = sv.iter().map(|p| p.1).collect();
        assert_eq!(collected, vec!["a", "b", "c"]);
    }

    #[test]
    fn hash_matches_for_independently_built_equal_vectors() {
        let a: SortedVector<i32> = [3, 1, 2].into_iter().collect();
        let b: SortedVector<i32> = [1, 2, 3].into_iter().collect();
        assert_eq!(a, b);
        assert_eq!(a.hash_value(), b.hash_value());
    }

    #[test]
    fn large_conj_disj_sequence_stays_sorted() {
        let mut sv: SortedVector<i32> = SortedVector::empty();
        for i in 0..200 {
            sv = sv.conj((i * 37) % 200);
        }
        for i in (0..200).step_by(3) {
            let v = (i * 37) % 200;
            sv = sv.disj(&v);
        }
        let collected: Vec<i32> = sv.iter().copied().collect();
        let mut sorted = collected.clone();
        sorted.sort();
        assert_eq!(collected, sorted);
    }

    proptest! {
        #[test]
        fn iteration_is_always_nondecreasing(xs in prop::collection::vec(any::<i32>(), 0..400)) {
            let sv: SortedVector<i32> = xs.into_iter().collect();
            let collected: Vec<i32> = sv.iter().copied().collect();
            prop_assert!(collected.windows(2).all(|w| w[0] <= w[1]));
        }

        #[test]
        fn nth_matches_sorted_index(xs in prop::collection::vec(any::<i32>(), 1..300)) {
            let sv: SortedVector<i32> = xs.iter().cloned().collect();
            let mut sorted = xs;
            sorted.sort();
            for (i, expected) in sorted.iter().enumerate() {
                prop_assert_eq!(sv.nth(i).unwrap(), expected);
            }
        }

        #[test]
        fn rank_counts_strictly_smaller_elements(xs in prop::collection::vec(any::<i32>(), 0..300), x in any::<i32>()) {
            let sv: SortedVector<i32> = xs.iter().cloned().collect();
            let expected = xs.iter().filter(|&&y| y < x).count();
            prop_assert_eq!(sv.rank(&x), expected);
        }
    }
}
