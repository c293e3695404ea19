// Copyright 2020-2025 The Spork Authors. Licensed under GPL-3.0.

//! # pds-sorted
//!
//! The left-leaning red-black tree [`SortedVector`](sorted::SortedVector)
//! and its [`SortedVectorTransient`](transient::SortedVectorTransient).
//!
//! Unlike `pds-map`'s hash-array-mapped trie, a red-black tree has no
//! natural 32-way fan-out to path-copy through; instead each mutating
//! call rewrites the `O(log n)` nodes on the search path and runs the
//! standard rotation/color-flip fix-ups on the way back up, same as any
//! textbook LLRB, just building a new root instead of mutating in
//! place except where `Rc::make_mut` finds a node this call already
//! owns uniquely.

#![deny(missing_docs)]

mod node;

pub mod iter;
pub mod sorted;
pub mod transient;

pub use sorted::SortedVector;
pub use transient::SortedVectorTransient;
