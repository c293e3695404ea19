// Copyright 2020-2025 The Spork Authors. Licensed under GPL-3.0.

//! # pds-vector
//!
//! The 32-way bit-partitioned trie persistent [`Vector`](vector::Vector),
//! its [`VectorTransient`](transient::VectorTransient), and the unboxed
//! numeric variants (`Float64Vector`, `Int64Vector`) built on the same
//! trie shape.
//!
//! See `pds-map` for the sibling hash-array-mapped trie this crate's
//! `node` module shares its path-copy discipline with.

#![deny(missing_docs)]

mod node;

pub mod iter;
pub mod transient;
pub mod typed;
pub mod vector;

pub use transient::VectorTransient;
pub use typed::{Float64Vector, Float64VectorTransient, Int64Vector, Int64VectorTransient, NumericView};
pub use vector::Vector;
