// Copyright 2020-2025 The Spork Authors. Licensed under GPL-3.0.

//! Unboxed numeric vectors (`Float64Vector`, `Int64Vector`).
//!
//! These reuse the same 32-way trie machinery as the generic [`Vector`]
//! (leaves already hold `Vec<T>` directly, so there is no separate
//! "valid slot" bitmap to maintain the way a fixed-size 32-slot host
//! array would need — a Rust `Vec`'s length already tracks exactly how
//! many slots are populated). What they add on top is the contiguous
//! buffer view and append-time numeric validation described in the
//! typed-vector contract.

use std::cell::OnceCell;
use std::ops::Deref;
use std::rc::Rc;

use pds_core::{Error, Result};

use crate::transient::VectorTransient;
use crate::vector::Vector;

/// A dynamically-typed numeric value, used only at the boundary where
/// an embedder without static types (e.g. an FFI caller passing a
/// boxed host number) must be validated against a typed vector's
/// element kind. Rust call sites use the typed `append` methods
/// directly and never need this type.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HostNumber {
    /// An integral value.
    Int(i64),
    /// A floating-point value.
    Float(f64),
}

/// A read-only, contiguous view over a typed vector's elements,
/// materialized once on first request and retained for the view's
/// lifetime; mirrors the host buffer-protocol contract (1 dimension,
/// contiguous, read-only, no strides).
#[derive(Clone)]
pub struct NumericView<T>(Rc<[T]>);

impl<T> Deref for NumericView<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.0
    }
}

impl<T: PartialEq> PartialEq for NumericView<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_ref() == other.0.as_ref()
    }
}

macro_rules! typed_vector {
    ($name:ident, $transient_name:ident, $elem:ty, $kind:literal) => {
        #[doc = concat!("An unboxed vector of `", stringify!($elem), "` with the same trie shape as `Vector`.")]
        #[derive(Clone)]
        pub struct $name {
            inner: Vector<$elem>,
            view: OnceCell<NumericView<$elem>>,
        }

        impl $name {
            /// The canonical empty vector of this element kind.
            pub fn empty() -> Self {
                $name { inner: Vector::empty(), view: OnceCell::new() }
            }

            /// Number of elements; O(1).
            pub fn len(&self) -> usize {
                self.inner.len()
            }

            /// Whether the vector holds no elements.
            pub fn is_empty(&self) -> bool {
                self.inner.is_empty()
            }

            /// Reads the element at `index`; negative indices count from the end.
            pub fn get(&self, index: isize) -> Result<$elem> {
                self.inner.get(index).copied()
            }

            /// Returns a new vector with the value at `index` replaced.
            pub fn update(&self, index: isize, value: $elem) -> Result<Self> {
                Ok($name { inner: self.inner.update(index, value)?, view: OnceCell::new() })
            }

            /// Appends `value`, statically typed (infallible).
            pub fn append(&self, value: $elem) -> Self {
                $name { inner: self.inner.append(value), view: OnceCell::new() }
            }

            /// Removes the last element. Fails with `EmptyPop` on an empty vector.
            pub fn pop(&self) -> Result<Self> {
                Ok($name { inner: self.inner.pop()?, view: OnceCell::new() })
            }

            /// Appends every element of `iterable`.
            pub fn concat<I: IntoIterator<Item = $elem>>(&self, iterable: I) -> Self {
                $name { inner: self.inner.concat(iterable), view: OnceCell::new() }
            }

            /// Iterates elements in index order.
            pub fn iter(&self) -> impl Iterator<Item = $elem> + '_ {
                self.inner.iter().copied()
            }

            /// Opens a transient view over this vector.
            pub fn transient(&self) -> $transient_name {
                $transient_name { inner: self.inner.transient() }
            }

            /// The order-sensitive cached hash, `h = 31*h + hash(x)` over elements.
            pub fn hash_value(&self) -> u64 {
                self.inner.hash_value()
            }

            /// Materializes (once) and returns the flat, read-only, contiguous
            /// buffer view; subsequent calls reuse the cached buffer.
            pub fn as_contiguous_view(&self) -> NumericView<$elem> {
                self.view
                    .get_or_init(|| NumericView(self.inner.iter().copied().collect::<Vec<_>>().into()))
                    .clone()
            }

            /// The buffer-view element-kind tag ("d" for f64, "q" for i64).
            pub fn buffer_kind(&self) -> &'static str {
                $kind
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::empty()
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.inner == other.inner
            }
        }

        impl Eq for $name {}

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_list().entries(self.iter()).finish()
            }
        }

        impl FromIterator<$elem> for $name {
            fn from_iter<I: IntoIterator<Item = $elem>>(iter: I) -> Self {
                $name { inner: iter.into_iter().collect(), view: OnceCell::new() }
            }
        }

        #[doc = concat!("A transient view over [`", stringify!($name), "`].")]
        pub struct $transient_name {
            inner: VectorTransient<$elem>,
        }

        impl $transient_name {
            /// Opens a transient over a freshly empty vector.
            pub fn new() -> Self {
                $transient_name { inner: VectorTransient::new() }
            }

            /// Number of elements currently held.
            pub fn len(&self) -> usize {
                self.inner.len()
            }

            /// Whether the transient currently holds no elements.
            pub fn is_empty(&self) -> bool {
                self.inner.is_empty()
            }

            /// Appends `value`, statically typed (infallible except for `UseAfterFreeze`).
            pub fn append(&mut self, value: $elem) -> Result<()> {
                self.inner.append(value)
            }

            /// Replaces the value at `index`; `index == len()` appends.
            pub fn update(&mut self, index: isize, value: $elem) -> Result<()> {
                self.inner.update(index, value)
            }

            /// Removes the last element.
            pub fn pop_last(&mut self) -> Result<()> {
                self.inner.pop_last()
            }

            /// Converts back to a persistent vector, invalidating this transient.
            pub fn persistent(&mut self) -> $name {
                $name { inner: self.inner.persistent(), view: OnceCell::new() }
            }
        }

        impl Default for $transient_name {
            fn default() -> Self {
                Self::new()
            }
        }

        #[cfg(feature = "serde")]
        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                serializer.collect_seq(self.iter())
            }
        }

        #[cfg(feature = "serde")]
        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
                Ok(Vec::<$elem>::deserialize(deserializer)?.into_iter().collect())
            }
        }
    };
}

typed_vector!(Float64Vector, Float64VectorTransient, f64, "d");
typed_vector!(Int64Vector, Int64VectorTransient, i64, "q");

impl Float64Vector {
    /// Appends a dynamically-typed host number, validating it is
    /// representable as `f64` (always true for `HostNumber`'s two
    /// variants; kept for parity with `Int64Vector::append_host`, whose
    /// validation can actually fail).
    pub fn append_host(&self, value: HostNumber) -> Result<Self> {
        match value {
            HostNumber::Float(f) => Ok(self.append(f)),
            HostNumber::Int(i) => Ok(self.append(i as f64)),
        }
    }
}

impl Int64Vector {
    /// Appends a dynamically-typed host number, failing with
    /// `Error::Type` if it is a non-integral float and `Error::Overflow`
    /// if it is a float outside `i64`'s range.
    pub fn append_host(&self, value: HostNumber) -> Result<Self> {
        match value {
            HostNumber::Int(i) => Ok(self.append(i)),
            HostNumber::Float(f) => {
                if f.fract() != 0.0 {
                    Err(Error::Type(format!("{f} is not an integer")))
                } else if f < i64::MIN as f64 || f > i64::MAX as f64 {
                    Err(Error::Overflow(f.to_string()))
                } else {
                    Ok(self.append(f as i64))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float64_zero_copy_view() {
        let v = Float64Vector::empty().append(1.0).append(2.0).append(3.0);
        let view = v.as_contiguous_view();
        assert_eq!(&*view, &[1.0, 2.0, 3.0]);
        let v2 = v.append(4.0);
        // Earlier view is untouched by the later append.
        assert_eq!(&*view, &[1.0, 2.0, 3.0]);
        let view2 = v2.as_contiguous_view();
        assert_eq!(&*view2, &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn empty_view_has_zero_length() {
        let v = Float64Vector::empty();
        assert_eq!(v.as_contiguous_view().len(), 0);
    }

    #[test]
    fn int64_append_host_rejects_non_integers() {
        let v = Int64Vector::empty();
        assert!(v.append_host(HostNumber::Float(1.5)).is_err());
        let v2 = v.append_host(HostNumber::Float(2.0)).unwrap();
        assert_eq!(v2.get(0).unwrap(), 2);
    }

    #[test]
    fn int64_append_host_rejects_overflow() {
        let v = Int64Vector::empty();
        assert!(v.append_host(HostNumber::Float(1e300)).is_err());
    }

    #[test]
    fn transients_build_typed_vectors() {
        let mut t = Int64VectorTransient::new();
        for i in 0..50 {
            t.append(i).unwrap();
        }
        let v = t.persistent();
        assert_eq!(v.len(), 50);
        assert_eq!(v.get(49).unwrap(), 49);
    }
}
