// Copyright 2020-2025 The Spork Authors. Licensed under GPL-3.0.

//! # pds-core
//!
//! Shared primitives for the Spork persistent data structure library:
//! the bit-partitioning arithmetic common to the bit-partitioned trie
//! (`pds-vector`) and the HAMT (`pds-map`), the edit-token mechanism
//! transients use to tell their own nodes apart from shared ones, a
//! reproducible hashing entry point, and the crate-wide error type.
//!
//! This crate has no collections of its own; it exists so that
//! `pds-vector`, `pds-map`, `pds-sorted` and `pds-list` can share one
//! definition of each without a dependency cycle between them.

#![deny(missing_docs)]

pub mod bits;
pub mod edit;
pub mod error;
pub mod hash;

pub use edit::EditToken;
pub use error::{Error, Result};
