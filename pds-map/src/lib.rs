// Copyright 2020-2025 The Spork Authors. Licensed under GPL-3.0.

//! # pds-map
//!
//! A hash-array-mapped trie (HAMT): [`Map`] and, as a thin wrapper over
//! it, [`Set`]. Both come with a transient counterpart for localized
//! mutation during construction.
//!
//! The trie has three node variants (see `node`): `BitmapIndexed` for
//! sparse levels, `ArrayNode` once a level is dense, and
//! `HashCollision` for keys whose full 64-bit hash coincides. See
//! `pds-vector` for the sibling bit-partitioned trie this crate's node
//! module borrows its path-copy discipline from.

#![deny(missing_docs)]

mod node;

pub mod iter;
pub mod map;
pub mod set;
pub mod transient;

pub use map::Map;
pub use set::{Set, SetTransient};
pub use transient::MapTransient;
