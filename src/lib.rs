// Copyright 2020-2025 The Spork Authors. Licensed under GPL-3.0.

//! # pds
//!
//! The persistent data structure library for the Spork runtime: this
//! crate is a thin facade over `pds-vector`, `pds-map`, `pds-sorted`
//! and `pds-list`, re-exporting their types and adding the factory
//! functions and operator-alias plumbing an embedder calls at the
//! language boundary.
//!
//! Each factory with no data argument returns that type's canonical
//! empty singleton (`Vector::empty()` and friends) rather than
//! constructing a fresh empty trie/tree per call.

#![deny(missing_docs)]

pub use pds_core::{Error, Result};
pub use pds_list::Cons;
pub use pds_map::{Map, MapTransient, Set, SetTransient};
pub use pds_sorted::{SortedVector, SortedVectorTransient};
pub use pds_vector::{
    Float64Vector, Float64VectorTransient, HostNumber, Int64Vector, Int64VectorTransient,
    NumericView, Vector, VectorTransient,
};

use std::hash::Hash;

/// Builds a [`Vector`] from an iterable.
pub fn vector<T: Clone, I: IntoIterator<Item = T>>(iterable: I) -> Vector<T> {
    iterable.into_iter().collect()
}

/// Builds a [`Vector`] from a literal list of elements, the varargs
/// form of [`vector`].
#[macro_export]
macro_rules! vector {
    ($($x:expr),* $(,)?) => {
        $crate::vector([$($x),*])
    };
}

/// Builds a [`Float64Vector`] from an iterable of `f64`.
pub fn vector_f64<I: IntoIterator<Item = f64>>(iterable: I) -> Float64Vector {
    iterable.into_iter().collect()
}

/// Builds an [`Int64Vector`] from an iterable of `i64`.
pub fn vector_i64<I: IntoIterator<Item = i64>>(iterable: I) -> Int64Vector {
    iterable.into_iter().collect()
}

/// Builds a [`Map`] from an iterable of key-value pairs.
pub fn map<K: Eq + Hash + Clone, V: Clone, I: IntoIterator<Item = (K, V)>>(pairs: I) -> Map<K, V> {
    pairs.into_iter().collect()
}

/// Builds a [`Set`] from an iterable.
pub fn set<T: Eq + Hash + Clone, I: IntoIterator<Item = T>>(iterable: I) -> Set<T> {
    iterable.into_iter().collect()
}

/// Builds a [`SortedVector`] ordered by `T`'s own `Ord` impl.
pub fn sorted_vector<T: Ord + Clone, I: IntoIterator<Item = T>>(iterable: I) -> SortedVector<T, T> {
    iterable.into_iter().collect()
}

/// Builds a [`SortedVector`] ordered by a projected key, optionally reversed.
pub fn sorted_vector_by_key<T, K, I, F>(iterable: I, key_fn: F, reverse: bool) -> SortedVector<T, K>
where
    T: Clone,
    K: Ord + Clone,
    I: IntoIterator<Item = T>,
    F: Fn(&T) -> K + 'static,
{
    let mut v = SortedVector::empty_by_key(key_fn, reverse);
    for x in iterable {
        v = v.conj(x);
    }
    v
}

/// Builds a [`Cons`] cell whose head is `first` and whose tail is
/// `rest` (defaulting to the empty list).
pub fn cons<T>(first: T, rest: Option<Cons<T>>) -> Cons<T> {
    Cons::cons(first, rest.unwrap_or_else(Cons::nil))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_macro_builds_in_order() {
        let v = vector![1, 2, 3];
        assert_eq!(v.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn map_factory_collects_pairs() {
        let m = map([("a", 1), ("b", 2)]);
        assert_eq!(m.get(&"a"), Some(&1));
        assert_eq!(m.get(&"b"), Some(&2));
    }

    #[test]
    fn map_from_flat_rejects_odd_arity() {
        assert!(Map::<i32, i32>::from_flat([1, 2, 3]).is_err());
        let m = Map::<i32, i32>::from_flat([1, 10, 2, 20]).unwrap();
        assert_eq!(m.get(&1), Some(&10));
        assert_eq!(m.get(&2), Some(&20));
    }

    #[test]
    fn set_factory_dedupes() {
        let s = set([1, 2, 2, 3]);
        assert_eq!(s.len(), 3);
    }

    #[test]
    fn sorted_vector_factory_orders_elements() {
        let sv = sorted_vector([3, 1, 2]);
        assert_eq!(sv.iter().cloned().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn sorted_vector_by_key_projects_and_reverses() {
        let sv = sorted_vector_by_key(["aaa", "b", "cc"], |s: &&str| s.len(), true);
        assert_eq!(sv.iter().copied().collect::<Vec<_>>(), vec!["aaa", "cc", "b"]);
    }

    #[test]
    fn cons_factory_defaults_rest_to_nil() {
        let list = cons(1, None);
        assert_eq!(list.iter().copied().collect::<Vec<_>>(), vec![1]);
        let list2 = cons(0, Some(list));
        assert_eq!(list2.iter().copied().collect::<Vec<_>>(), vec![0, 1]);
    }
}
