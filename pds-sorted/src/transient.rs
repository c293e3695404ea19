// Copyright 2020-2025 The Spork Authors. Licensed under GPL-3.0.

use std::cmp::Ordering;
use std::rc::Rc;

use pds_core::{EditToken, Error, Result};

use crate::node::{self, Link};
use crate::sorted::SortedVector;

/// A temporarily mutable view of a [`SortedVector`], opened with
/// [`SortedVector::transient`] and finalized with
/// [`SortedVectorTransient::persistent`]. Carries the same key
/// projection and reverse configuration as the vector it was opened
/// from.
///
/// As with `pds-vector`'s and `pds-map`'s transients, there is no
/// separate per-node ownership token: nodes rewritten while the edit
/// token is live are already uniquely owned, so `Rc::make_mut` edits
/// them in place instead of cloning.
pub struct SortedVectorTransient<T: Clone, K: Ord + Clone = T> {
    count: usize,
    root: Link<T, K>,
    key_fn: Rc<dyn Fn(&T) -> K>,
    reverse: bool,
    edit: EditToken,
}

impl<T: Clone, K: Ord + Clone> SortedVectorTransient<T, K> {
    pub(crate) fn from_persistent(sv: SortedVector<T, K>) -> Self {
        SortedVectorTransient {
            count: sv.len(),
            root: sv.root_ref().clone(),
            key_fn: sv.key_fn_ref().clone(),
            reverse: sv.is_reversed(),
            edit: EditToken::new(),
        }
    }

    fn check_live(&self) -> Result<()> {
        if self.edit.is_live() {
            Ok(())
        } else {
            Err(Error::UseAfterFreeze)
        }
    }

    /// Number of elements currently held.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether the transient holds no elements.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    fn compare(&self, a: &K, b: &K) -> Ordering {
        let ord = a.cmp(b);
        if self.reverse {
            ord.reverse()
        } else {
            ord
        }
    }

    /// Inserts `value` in place.
    pub fn conj(&mut self, value: T) -> Result<()> {
        self.check_live()?;
        let key = (self.key_fn)(&value);
        let cmp = |a: &K, b: &K| self.compare(a, b);
        self.root = Some(node::insert(self.root.take(), value, key, &cmp));
        self.count += 1;
        Ok(())
    }

    /// Removes one occurrence of `value`, a no-op if absent.
    pub fn disj(&mut self, value: &T) -> Result<()>
    where
        T: PartialEq,
    {
        self.check_live()?;
        let key = (self.key_fn)(value);
        let cmp = |a: &K, b: &K| self.compare(a, b);
        let found = node::index_of(&self.root, &key, &cmp, &|candidate: &T| candidate == value);
        if let Some(rank) = found {
            let mut root = self.root.take().unwrap();
            if !node::is_red(&root.left) && !node::is_red(&root.right) {
                Rc::make_mut(&mut root).red = true;
            }
            let mut root = node::delete_at_rank(root, rank);
            if let Some(r) = root.as_mut() {
                Rc::make_mut(r).red = false;
            }
            self.root = root;
            self.count -= 1;
        }
        Ok(())
    }

    /// Converts back to a persistent sorted vector, invalidating this
    /// transient. Any further mutating call on it fails with
    /// `UseAfterFreeze`.
    pub fn persistent(&mut self) -> SortedVector<T, K> {
        self.edit.freeze();
        let root = self.root.take();
        SortedVector::from_parts(self.count, root, self.key_fn.clone(), self.reverse)
    }
}

impl<T: Clone, K: Ord + Clone> SortedVector<T, K> {
    /// Opens a transient view reusing this vector's root without cloning it.
    pub fn transient(&self) -> SortedVectorTransient<T, K> {
        SortedVectorTransient::from_persistent(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_round_trip_builds_sorted_vector() {
        let base: SortedVector<i32> = SortedVector::empty();
        let mut t = base.transient();
        for v in [3, 1, 4, 1, 5, 9, 2, 6] {
            t.conj(v).unwrap();
        }
        let sv = t.persistent();
        let collected: Vec<i32> = sv.iter().copied().collect();
        assert_eq!(collected, vec![1, 1, 2, 3, 4, 5, 6, 9]);
    }

    #[test]
    fn transient_disj_removes_one_occurrence() {
        let base: SortedVector<i32> = [1, 1, 2].into_iter().collect();
        let mut t = base.transient();
        t.disj(&1).unwrap();
        let sv = t.persistent();
        assert_eq!(sv.len(), 2);
    }

    #[test]
    fn use_after_freeze_fails() {
        let base: SortedVector<i32> = SortedVector::empty();
        let mut t = base.transient();
        t.conj(1).unwrap();
        let _sv = t.persistent();
        assert!(matches!(t.conj(2), Err(Error::UseAfterFreeze)));
        assert!(matches!(t.disj(&1), Err(Error::UseAfterFreeze)));
    }

    #[test]
    fn original_vector_unaffected_by_transient_mutation() {
        let base: SortedVector<i32> = [1, 2, 3].into_iter().collect();
        let mut t = base.transient();
        t.conj(99).unwrap();
        let grown = t.persistent();
        assert_eq!(base.len(), 3);
        assert_eq!(grown.len(), 4);
    }
}
