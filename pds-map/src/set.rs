// Copyright 2020-2025 The Spork Authors. Licensed under GPL-3.0.

use std::cmp::Ordering;
use std::fmt;
use std::hash::Hash;

use pds_core::hash::hash_of;
use pds_core::{Error, Result};

use crate::map::Map;
use crate::transient::MapTransient;

/// An unordered, immutable set of `T`, implemented as a [`Map`] whose
/// values are the unit sentinel.
#[derive(Clone)]
pub struct Set<T> {
    inner: Map<T, ()>,
}

impl<T> Set<T> {
    /// The canonical empty set; see [`Map::empty`]'s doc comment for
    /// why this is a fresh, cheap construction rather than a literal
    /// process-wide singleton.
    pub fn empty() -> Self {
        Set { inner: Map::empty() }
    }

    /// Number of elements; O(1).
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the set holds no elements.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<T: Eq + Hash + Clone> Set<T> {
    /// Whether `value` is a member.
    pub fn contains(&self, value: &T) -> bool {
        self.inner.contains(value)
    }

    /// Returns a new set with `value` added; a no-op (by value) if
    /// already present.
    pub fn add(&self, value: T) -> Self {
        Set { inner: self.inner.assoc(value, ()) }
    }

    /// Returns a new set with `value` removed; a no-op (by value) if
    /// absent (`discard` semantics).
    pub fn remove(&self, value: &T) -> Self {
        Set { inner: self.inner.dissoc(value) }
    }

    /// Like [`Set::remove`], but fails with `Error::KeyNotFound` if
    /// `value` was absent.
    pub fn remove_strict(&self, value: &T) -> Result<Self>
    where
        T: fmt::Debug,
    {
        if !self.contains(value) {
            return Err(Error::KeyNotFound { key: format!("{value:?}") });
        }
        Ok(self.remove(value))
    }

    /// Iterates the set's elements; deterministic for a given set shape
    /// but not ordered.
    pub fn iter(&self) -> crate::iter::Keys<'_, T, ()> {
        self.inner.keys()
    }

    /// Opens a transient view reusing this set's root without cloning it.
    pub fn transient(&self) -> SetTransient<T> {
        SetTransient { inner: self.inner.transient() }
    }

    /// Elements present in either operand; accumulates into a
    /// transient seeded with the larger of the two.
    pub fn union(&self, other: &Self) -> Self {
        let (larger, smaller) = if self.len() >= other.len() { (self, other) } else { (other, self) };
        let mut t = larger.transient();
        for x in smaller.iter() {
            t.add(x.clone()).expect("freshly opened transient is live");
        }
        t.persistent()
    }

    /// Elements present in both operands; iterates the smaller set,
    /// keeping those found in the larger.
    pub fn intersection(&self, other: &Self) -> Self {
        let (larger, smaller) = if self.len() >= other.len() { (self, other) } else { (other, self) };
        let mut t = SetTransient::new();
        for x in smaller.iter() {
            if larger.contains(x) {
                t.add(x.clone()).expect("freshly opened transient is live");
            }
        }
        t.persistent()
    }

    /// Elements of `self` not present in `other`.
    pub fn difference(&self, other: &Self) -> Self {
        let mut t = self.transient();
        for x in other.iter() {
            t.remove(x).expect("freshly opened transient is live");
        }
        t.persistent()
    }

    /// Elements present in exactly one of the two operands.
    pub fn symmetric_difference(&self, other: &Self) -> Self {
        self.difference(other).union(&other.difference(self))
    }

    /// Whether `self` is a (non-proper) subset of `other`: every
    /// element of `self` is in `other`.
    pub fn is_subset(&self, other: &Self) -> bool {
        self.len() <= other.len() && self.iter().all(|x| other.contains(x))
    }

    /// Whether `self` is a proper subset of `other`.
    pub fn is_proper_subset(&self, other: &Self) -> bool {
        self.len() < other.len() && self.is_subset(other)
    }
}

impl<T: Eq + Hash + Clone> PartialEq for Set<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|x| other.contains(x))
    }
}

impl<T: Eq + Hash + Clone> Eq for Set<T> {}

/// Subset ordering: `<`, `<=`, `>`, `>=` are proper/non-proper
/// containment. This is a partial, not total, order — two sets with
/// neither contained in the other compare as `None`, same as
/// `PartialOrd::partial_cmp`'s ordinary contract for incomparable
/// values.
impl<T: Eq + Hash + Clone> PartialOrd for Set<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self == other {
            Some(Ordering::Equal)
        } else if self.is_subset(other) {
            Some(Ordering::Less)
        } else if other.is_subset(self) {
            Some(Ordering::Greater)
        } else {
            None
        }
    }
}

impl<T: Eq + Hash + Clone> Set<T> {
    /// The order-independent cached hash: XOR of element hashes.
    pub fn hash_value(&self) -> u64 {
        self.iter().fold(0u64, |acc, x| acc ^ hash_of(x))
    }
}

impl<T: Eq + Hash + Clone> FromIterator<T> for Set<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Set { inner: iter.into_iter().map(|x| (x, ())).collect() }
    }
}

impl<'a, T: Eq + Hash + Clone> IntoIterator for &'a Set<T> {
    type Item = &'a T;
    type IntoIter = crate::iter::Keys<'a, T, ()>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: Eq + Hash + Clone + fmt::Debug> fmt::Debug for Set<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T: Eq + Hash + Clone> std::ops::BitOr for Set<T> {
    type Output = Set<T>;

    fn bitor(self, rhs: Set<T>) -> Self::Output {
        self.union(&rhs)
    }
}

impl<T: Eq + Hash + Clone> std::ops::BitAnd for Set<T> {
    type Output = Set<T>;

    fn bitand(self, rhs: Set<T>) -> Self::Output {
        self.intersection(&rhs)
    }
}

impl<T: Eq + Hash + Clone> std::ops::Sub for Set<T> {
    type Output = Set<T>;

    fn sub(self, rhs: Set<T>) -> Self::Output {
        self.difference(&rhs)
    }
}

impl<T: Eq + Hash + Clone> std::ops::BitXor for Set<T> {
    type Output = Set<T>;

    fn bitxor(self, rhs: Set<T>) -> Self::Output {
        self.symmetric_difference(&rhs)
    }
}

/// A temporarily mutable view of a [`Set`].
pub struct SetTransient<T> {
    inner: MapTransient<T, ()>,
}

impl<T: Eq + Hash + Clone> SetTransient<T> {
    /// Opens a transient over a freshly empty set.
    pub fn new() -> Self {
        SetTransient { inner: MapTransient::new() }
    }

    /// Number of elements currently held.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the transient currently holds no elements.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Whether `value` is a member.
    pub fn contains(&self, value: &T) -> bool {
        self.inner.contains(value)
    }

    /// Adds `value`; a no-op if already present (`discard` semantics).
    pub fn add(&mut self, value: T) -> Result<()> {
        self.inner.put(value, ())
    }

    /// Removes `value`; a no-op if absent (`discard` semantics).
    pub fn remove(&mut self, value: &T) -> Result<()> {
        self.inner.remove(value)
    }

    /// Like [`SetTransient::remove`], but fails with
    /// `Error::KeyNotFound` if `value` was absent.
    pub fn remove_strict(&mut self, value: &T) -> Result<()>
    where
        T: fmt::Debug,
    {
        if !self.contains(value) {
            return Err(Error::KeyNotFound { key: format!("{value:?}") });
        }
        self.remove(value)
    }

    /// Removes every element, keeping the transient open.
    pub fn clear(&mut self) -> Result<()> {
        self.inner.clear()
    }

    /// Iterates the elements currently held.
    pub fn iter(&self) -> crate::iter::Keys<'_, T, ()> {
        self.inner.keys()
    }

    /// Converts back to a persistent set, invalidating this transient.
    pub fn persistent(&mut self) -> Set<T> {
        Set { inner: self.inner.persistent() }
    }
}

impl<T: Eq + Hash + Clone> Default for SetTransient<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "serde")]
impl<T: Eq + Hash + Clone + serde::Serialize> serde::Serialize for Set<T> {
    /// Flattens to the same sequence shape `serde_json` would pick for
    /// a `HashSet<T>`.
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

#[cfg(feature = "serde")]
impl<'de, T: Eq + Hash + Clone + serde::Deserialize<'de>> serde::Deserialize<'de> for Set<T> {
    /// Reconstructs via the `add`-driven factory path, deduplicating
    /// exactly as `FromIterator` does.
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Ok(Vec::<T>::deserialize(deserializer)?.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn add_contains_remove() {
        let s: Set<i32> = Set::empty().add(1).add(2).add(3);
        assert_eq!(s.len(), 3);
        assert!(s.contains(&2));
        let s2 = s.remove(&2);
        assert!(!s2.contains(&2));
        assert_eq!(s.len(), 3, "original set unchanged");
    }

    #[test]
    fn set_symmetric_difference() {
        let a: Set<i32> = [1, 2, 3, 4].into_iter().collect();
        let b: Set<i32> = [3, 4, 5, 6].into_iter().collect();
        let sym = a.clone() ^ b.clone();
        let expected: Set<i32> = [1, 2, 5, 6].into_iter().collect();
        assert_eq!(sym, expected);
        assert_eq!(sym.len(), 4);
    }

    #[test]
    fn union_intersection_difference() {
        let a: Set<i32> = [1, 2, 3].into_iter().collect();
        let b: Set<i32> = [2, 3, 4].into_iter().collect();
        assert_eq!(a.clone() | b.clone(), [1, 2, 3, 4].into_iter().collect());
        assert_eq!(a.clone() & b.clone(), [2, 3].into_iter().collect());
        assert_eq!(a.clone() - b.clone(), [1].into_iter().collect::<Set<i32>>());
    }

    #[test]
    fn subset_ordering() {
        let a: Set<i32> = [1, 2].into_iter().collect();
        let b: Set<i32> = [1, 2, 3].into_iter().collect();
        let c: Set<i32> = [4, 5].into_iter().collect();
        assert!(a.is_proper_subset(&b));
        assert!(a < b);
        assert!(b > a);
        assert_eq!(a.partial_cmp(&c), None);
    }

    #[test]
    fn hash_is_order_independent() {
        let a: Set<i32> = [1, 2, 3].into_iter().collect();
        let b: Set<i32> = [3, 2, 1].into_iter().collect();
        assert_eq!(a, b);
        assert_eq!(a.hash_value(), b.hash_value());
    }

    #[test]
    fn transient_add_and_remove_strict() {
        let mut t = SetTransient::new();
        t.add(1).unwrap();
        t.add(2).unwrap();
        assert!(t.remove_strict(&3).is_err());
        t.remove_strict(&1).unwrap();
        let s = t.persistent();
        assert_eq!(s.len(), 1);
        assert!(s.contains(&2));
    }

    #[test]
    fn transient_clear_empties_without_closing() {
        let mut t = SetTransient::new();
        t.add(1).unwrap();
        t.add(2).unwrap();
        t.clear().unwrap();
        assert_eq!(t.len(), 0);
        t.add(3).unwrap();
        let s = t.persistent();
        assert_eq!(s.len(), 1);
        assert!(s.contains(&3));
    }

    proptest! {
        #[test]
        fn union_contains_every_element_of_both(a in prop::collection::vec(any::<i32>(), 0..150), b in prop::collection::vec(any::<i32>(), 0..150)) {
            let sa: Set<i32> = a.iter().cloned().collect();
            let sb: Set<i32> = b.iter().cloned().collect();
            let u = sa.union(&sb);
            for x in a.iter().chain(b.iter()) {
                prop_assert!(u.contains(x));
            }
        }

        #[test]
        fn symmetric_difference_is_exclusive_or(a in prop::collection::vec(any::<i32>(), 0..150), b in prop::collection::vec(any::<i32>(), 0..150)) {
            let sa: Set<i32> = a.iter().cloned().collect();
            let sb: Set<i32> = b.iter().cloned().collect();
            let sym = sa.symmetric_difference(&sb);
            for x in sym.iter() {
                prop_assert!(sa.contains(x) != sb.contains(x));
            }
        }
    }
}
