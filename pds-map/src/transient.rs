// Copyright 2020-2025 The Spork Authors. Licensed under GPL-3.0.

use std::hash::Hash;
use std::rc::Rc;

use pds_core::hash::hash_of;
use pds_core::{EditToken, Error, Result};

use crate::iter::{Iter, Keys, RawIter, Values};
use crate::map::Map;
use crate::node::{self, Node};

/// A temporarily mutable view of a [`Map`], opened with [`Map::transient`]
/// or [`MapTransient::new`] and finalized with [`MapTransient::persistent`].
pub struct MapTransient<K, V> {
    count: usize,
    root: Option<Rc<Node<K, V>>>,
    edit: EditToken,
}

impl<K: Eq + Hash + Clone, V: Clone> MapTransient<K, V> {
    /// Opens a transient over a freshly empty map.
    pub fn new() -> Self {
        Self::from_persistent(Map::empty())
    }

    pub(crate) fn from_persistent(m: Map<K, V>) -> Self {
        MapTransient { count: m.count, root: m.root, edit: EditToken::new() }
    }

    fn check_live(&self) -> Result<()> {
        if self.edit.is_live() {
            Ok(())
        } else {
            Err(Error::UseAfterFreeze)
        }
    }

    /// Number of entries currently held.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether the transient currently holds no entries.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns the value associated with `key`, or `None` if absent.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.root.as_ref().and_then(|root| root.get(key, hash_of(key), 0))
    }

    /// Whether `key` is present.
    pub fn contains(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Associates `key` with `value`, inserting or replacing as needed.
    pub fn put(&mut self, key: K, value: V) -> Result<()> {
        self.check_live()?;
        let hash = hash_of(&key);
        let root = self.root.take().unwrap_or_else(Node::empty);
        let (new_root, added) = node::insert(root, key, value, hash, 0);
        self.root = Some(new_root);
        self.count += added as usize;
        Ok(())
    }

    /// Removes `key`; a no-op if it was absent.
    pub fn remove(&mut self, key: &K) -> Result<()> {
        self.check_live()?;
        let Some(root) = self.root.take() else {
            return Ok(());
        };
        let (new_root, removed) = node::remove(root, key, hash_of(key), 0);
        self.root = new_root;
        if removed {
            self.count -= 1;
        }
        Ok(())
    }

    /// Iterates `(&K, &V)` entries currently held.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter(RawIter::new(self.root.as_deref(), self.count))
    }

    /// Iterates keys only, currently held.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys(RawIter::new(self.root.as_deref(), self.count))
    }

    /// Iterates values only, currently held.
    pub fn values(&self) -> Values<'_, K, V> {
        Values(RawIter::new(self.root.as_deref(), self.count))
    }

    /// Removes every entry, keeping the transient open under the same
    /// edit-token lineage.
    pub fn clear(&mut self) -> Result<()> {
        self.check_live()?;
        self.root = None;
        self.count = 0;
        Ok(())
    }

    /// Converts back to a persistent map, invalidating this transient.
    /// Any further mutating call on it fails with `UseAfterFreeze`.
    pub fn persistent(&mut self) -> Map<K, V> {
        self.edit.freeze();
        Map::from_parts(self.count, self.root.take())
    }
}

impl<K: Eq + Hash + Clone, V: Clone> Default for MapTransient<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_scoping() {
        let m: Map<i32, i32> = Map::empty().assoc(1, 10);
        let mut t = m.transient();
        t.put(2, 20).unwrap();
        let m2 = t.persistent();
        assert_eq!(m2.len(), 2);
        assert_eq!(m2.get(&2), Some(&20));
        assert_eq!(m.len(), 1, "original map unchanged");
    }

    #[test]
    fn use_after_freeze_fails() {
        let m: Map<i32, i32> = Map::empty();
        let mut t = m.transient();
        t.put(1, 1).unwrap();
        let _m2 = t.persistent();
        assert!(matches!(t.put(2, 2), Err(Error::UseAfterFreeze)));
        assert!(matches!(t.remove(&1), Err(Error::UseAfterFreeze)));
    }

    #[test]
    fn transient_builds_large_map() {
        let mut t = MapTransient::new();
        for i in 0..1000 {
            t.put(i, i * 2).unwrap();
        }
        let m = t.persistent();
        assert_eq!(m.len(), 1000);
        for i in 0..1000 {
            assert_eq!(m.get(&i), Some(&(i * 2)));
        }
    }
}
