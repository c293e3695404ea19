// Copyright 2020-2025 The Spork Authors. Licensed under GPL-3.0.

use std::cell::Cell;
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use pds_core::hash::{combine_entry, hash_of};
use pds_core::{Error, Result};

use crate::iter::{Iter, Keys, RawIter, Values};
use crate::node::{self, Node};
use crate::transient::MapTransient;

/// An unordered, immutable, structurally-shared mapping from `K` to
/// `V`, keyed by value-equality, backed by a hash-array-mapped trie.
///
/// `equals`/`hash` rely on Rust's `PartialEq`/`Eq`/`Hash` on `K`/`V`;
/// this library forwards rather than reimplements them. A `K` that
/// violates the classic contract (`a == b` implies `hash(a) ==
/// hash(b)`) will break this type's structural invariants — that is
/// the caller's responsibility, not this crate's.
pub struct Map<K, V> {
    pub(crate) count: usize,
    pub(crate) root: Option<Rc<Node<K, V>>>,
    hash: Cell<Option<u64>>,
}

impl<K, V> Clone for Map<K, V> {
    fn clone(&self) -> Self {
        Map { count: self.count, root: self.root.clone(), hash: self.hash.clone() }
    }
}

impl<K, V> Map<K, V> {
    /// The canonical empty map.
    ///
    /// Constructed fresh each call (see `Vector::empty`'s doc comment
    /// and DESIGN.md for why generic collections cannot hold a literal
    /// process-wide singleton); always observably equal to, and
    /// indistinguishable from, every other call's result.
    pub fn empty() -> Self {
        Map { count: 0, root: None, hash: Cell::new(None) }
    }

    /// Number of entries; O(1).
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether the map holds no entries.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub(crate) fn from_parts(count: usize, root: Option<Rc<Node<K, V>>>) -> Self {
        Map { count, root, hash: Cell::new(None) }
    }
}

impl<K: Eq + Hash + Clone, V: Clone> Map<K, V> {
    /// Returns the value associated with `key`, or `None` if absent.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.root.as_ref().and_then(|root| root.get(key, hash_of(key), 0))
    }

    /// Returns the value associated with `key`, falling back to
    /// `default` if absent.
    pub fn get_or<'a>(&'a self, key: &K, default: &'a V) -> &'a V {
        self.get(key).unwrap_or(default)
    }

    /// Subscript-style access: the value associated with `key`, or
    /// `Error::KeyNotFound` if absent.
    pub fn require(&self, key: &K) -> Result<&V>
    where
        K: fmt::Debug,
    {
        self.get(key).ok_or_else(|| Error::KeyNotFound { key: format!("{key:?}") })
    }

    /// Whether `key` is present.
    pub fn contains(&self, key: &K) -> bool {
        self.root.as_ref().is_some_and(|root| root.contains(key, hash_of(key), 0))
    }

    /// Returns a new map with `key` associated to `value`, inserting or
    /// replacing as needed.
    pub fn assoc(&self, key: K, value: V) -> Self {
        let hash = hash_of(&key);
        let root = self.root.clone().unwrap_or_else(Node::empty);
        let (new_root, added) = node::insert(root, key, value, hash, 0);
        Map::from_parts(self.count + added as usize, Some(new_root))
    }

    /// Returns a new map with `key` removed; a no-op (by value, not
    /// identity) if `key` was absent.
    pub fn dissoc(&self, key: &K) -> Self {
        let Some(root) = self.root.clone() else {
            return self.clone();
        };
        let (new_root, removed) = node::remove(root, key, hash_of(key), 0);
        if !removed {
            return self.clone();
        }
        Map::from_parts(self.count - 1, new_root)
    }

    /// Right-biased merge: entries of `other` win on key collisions.
    /// Implemented via a transient.
    pub fn merge<I: IntoIterator<Item = (K, V)>>(&self, other: I) -> Self {
        let mut t = MapTransient::from_persistent(self.clone());
        for (k, v) in other {
            t.put(k, v).expect("freshly opened transient is live");
        }
        t.persistent()
    }

    /// Iterates `(&K, &V)` entries; deterministic for a given map shape
    /// but not ordered by key.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter(RawIter::new(self.root.as_deref(), self.count))
    }

    /// Iterates keys only, without ever materializing a `(K, V)` pair.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys(RawIter::new(self.root.as_deref(), self.count))
    }

    /// Iterates values only, without ever materializing a `(K, V)` pair.
    pub fn values(&self) -> Values<'_, K, V> {
        Values(RawIter::new(self.root.as_deref(), self.count))
    }

    /// Opens a transient view reusing this map's root without cloning it.
    pub fn transient(&self) -> MapTransient<K, V> {
        MapTransient::from_persistent(self.clone())
    }
}

impl<V: Eq + Hash + Clone> Map<V, V> {
    /// Builds a map from a flat, alternating key-value sequence, for
    /// embedders that must accept an untyped arg list at an FFI
    /// boundary rather than a typed pair iterator. Fails with
    /// `Error::Arity` if `flat` has an odd number of elements.
    pub fn from_flat<I: IntoIterator<Item = V>>(flat: I) -> Result<Self> {
        let values: Vec<V> = flat.into_iter().collect();
        if values.len() % 2 != 0 {
            return Err(Error::Arity(format!(
                "expected an even number of flat key-value elements, got {}",
                values.len()
            )));
        }
        let mut t = MapTransient::new();
        let mut it = values.into_iter();
        while let (Some(k), Some(v)) = (it.next(), it.next()) {
            t.put(k, v).expect("freshly opened transient is live");
        }
        Ok(t.persistent())
    }
}

impl<K: Eq + Hash + Clone, V: Clone + Hash> Map<K, V> {
    /// The order-independent cached hash: `h = sum(hash(k) xor hash(v))`
    /// over entries.
    pub fn hash_value(&self) -> u64 {
        if let Some(h) = self.hash.get() {
            return h;
        }
        let mut h = 0u64;
        for (k, v) in self.iter() {
            h = h.wrapping_add(combine_entry(hash_of(k), hash_of(v)));
        }
        self.hash.set(Some(h));
        h
    }
}

impl<K: Eq + Hash + Clone, V: Clone + PartialEq> PartialEq for Map<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.count == other.count && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K: Eq + Hash + Clone, V: Clone + Eq> Eq for Map<K, V> {}

impl<K: Eq + Hash + Clone, V: Clone> std::hash::Hash for Map<K, V>
where
    V: Hash,
{
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_value());
    }
}

impl<K: Eq + Hash + Clone, V: Clone> FromIterator<(K, V)> for Map<K, V> {
    /// Last-write-wins within a run of duplicate keys.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut t = MapTransient::new();
        for (k, v) in iter {
            t.put(k, v).expect("freshly opened transient is live");
        }
        t.persistent()
    }
}

impl<'a, K: Eq + Hash + Clone, V: Clone> IntoIterator for &'a Map<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: Eq + Hash + Clone + fmt::Debug, V: Clone + fmt::Debug> fmt::Debug for Map<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Eq + Hash + Clone, V: Clone> std::ops::BitOr<Map<K, V>> for Map<K, V> {
    type Output = Map<K, V>;

    /// `Map | Map`, the right-biased merge operator alias.
    fn bitor(self, rhs: Map<K, V>) -> Self::Output {
        self.merge(rhs.iter().map(|(k, v)| (k.clone(), v.clone())))
    }
}

impl<K: Eq + Hash + Clone, V: Clone> std::ops::BitOr<Vec<(K, V)>> for Map<K, V> {
    type Output = Map<K, V>;

    /// `Map | iterable-of-pairs`, the right-biased merge operator
    /// alias's host-collection form (the Vector-of-length-2-Vectors
    /// dynamic-host variant has no static-typing analogue in Rust and
    /// is not offered here).
    fn bitor(self, rhs: Vec<(K, V)>) -> Self::Output {
        self.merge(rhs)
    }
}

#[cfg(feature = "serde")]
impl<K: Eq + Hash + Clone + serde::Serialize, V: Clone + serde::Serialize> serde::Serialize for Map<K, V> {
    /// Flattens to the same map shape `serde_json` would pick for a
    /// `HashMap<K, V>`.
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

#[cfg(feature = "serde")]
impl<'de, K: Eq + Hash + Clone + serde::Deserialize<'de>, V: Clone + serde::Deserialize<'de>> serde::Deserialize<'de> for Map<K, V> {
    /// Reconstructs via the same `assoc`-driven transient path as
    /// `FromIterator`, so the result is structurally identical to one
    /// built by hand from the same entries in some order.
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let entries = std::collections::HashMap::<K, V>::deserialize(deserializer)?;
        Ok(entries.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_is_empty() {
        let m: Map<i32, i32> = Map::empty();
        assert_eq!(m.len(), 0);
        assert!(m.is_empty());
    }

    #[test]
    fn assoc_get_dissoc() {
        let m: Map<i32, &str> = Map::empty();
        let m = m.assoc(1, "one").assoc(2, "two");
        assert_eq!(m.get(&1), Some(&"one"));
        assert_eq!(m.len(), 2);
        let m2 = m.dissoc(&1);
        assert_eq!(m2.get(&1), None);
        assert!(!m2.contains(&1));
        assert_eq!(m2.len(), 1);
        assert_eq!(m.len(), 2, "original map unchanged");
    }

    #[test]
    fn assoc_same_key_replaces() {
        let m: Map<i32, i32> = Map::empty().assoc(1, 10).assoc(1, 20);
        assert_eq!(m.len(), 1);
        assert_eq!(m.get(&1), Some(&20));
    }

    #[test]
    fn dissoc_absent_key_is_noop() {
        let m: Map<i32, i32> = Map::empty().assoc(1, 10);
        let m2 = m.dissoc(&2);
        assert_eq!(m2, m);
    }

    #[test]
    fn map_collision_path() {
        // mask(0, 0) == mask(32, 0) == 0: these two keys collide at depth 0.
        let m: Map<u64, &str> = Map::empty().assoc(0, "value1").assoc(32, "value2").assoc(1024, "value3");
        assert_eq!(m.len(), 3);
        assert_eq!(m.get(&0), Some(&"value1"));
        assert_eq!(m.get(&32), Some(&"value2"));
        let m2 = m.dissoc(&0);
        assert_eq!(m2.len(), 2);
        assert_eq!(m2.get(&32), Some(&"value2"));
        assert!(!m2.contains(&0));
    }

    #[test]
    fn merge_is_right_biased() {
        let a: Map<i32, i32> = Map::empty().assoc(1, 1).assoc(2, 2);
        let b: Map<i32, i32> = Map::empty().assoc(2, 20).assoc(3, 30);
        let merged = a.merge(b.iter().map(|(k, v)| (*k, *v)));
        assert_eq!(merged.len(), 3);
        assert_eq!(merged.get(&2), Some(&20));
    }

    #[test]
    fn hash_is_order_independent() {
        let a: Map<i32, i32> = [(1, 1), (2, 2), (3, 3)].into_iter().collect();
        let b: Map<i32, i32> = [(3, 3), (1, 1), (2, 2)].into_iter().collect();
        assert_eq!(a, b);
        assert_eq!(a.hash_value(), b.hash_value());
    }

    #[test]
    fn from_iter_last_write_wins() {
        let m: Map<i32, &str> = [(1, "a"), (1, "b")].into_iter().collect();
        assert_eq!(m.len(), 1);
        assert_eq!(m.get(&1), Some(&"b"));
    }

    #[test]
    fn operator_bitor_merges() {
        let a: Map<i32, i32> = Map::empty().assoc(1, 1);
        let b: Map<i32, i32> = Map::empty().assoc(1, 2).assoc(3, 3);
        let merged = a | b;
        assert_eq!(merged.get(&1), Some(&2));
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn large_map_round_trips() {
        let m: Map<i32, i32> = (0..500).map(|i| (i, i * i)).collect();
        assert_eq!(m.len(), 500);
        for i in 0..500 {
            assert_eq!(m.get(&i), Some(&(i * i)));
        }
    }

    proptest! {
        #[test]
        fn assoc_then_get_returns_value(pairs in prop::collection::vec((any::<i32>(), any::<i32>()), 0..300), k in any::<i32>(), v in any::<i32>()) {
            let m: Map<i32, i32> = pairs.into_iter().collect();
            let updated = m.assoc(k, v);
            prop_assert_eq!(updated.get(&k), Some(&v));
        }

        #[test]
        fn dissoc_removes_key(pairs in prop::collection::vec((any::<i32>(), any::<i32>()), 1..300)) {
            let m: Map<i32, i32> = pairs.clone().into_iter().collect();
            let (k, _) = pairs[0];
            let removed = m.dissoc(&k);
            prop_assert!(!removed.contains(&k));
        }

        #[test]
        fn maps_built_in_different_orders_hash_equal(pairs in prop::collection::vec((any::<i32>(), any::<i32>()), 0..200)) {
            let forward: Map<i32, i32> = pairs.iter().cloned().collect();
            let mut reversed = pairs.clone();
            reversed.reverse();
            let backward: Map<i32, i32> = reversed.into_iter().collect();
            prop_assert_eq!(&forward, &backward);
            prop_assert_eq!(forward.hash_value(), backward.hash_value());
        }
    }
}
