// Copyright 2020-2025 The Spork Authors. Licensed under GPL-3.0.

/// Alias for a `Result` with the crate-wide default error type `Error`.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised by the persistent data structure library.
///
/// Every variant names the failing operation's semantic category from
/// the library's error handling design, not a bare type name.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Indexed access outside `[-count, count)`, or `update` outside `[0, count]`.
    #[error("index {index} out of range for collection of length {len}")]
    IndexOutOfRange {
        /// The offending index, in the caller's original (possibly negative) form.
        index: isize,
        /// The collection's length at the time of access.
        len: usize,
    },

    /// Subscript-style access on a map with an absent key.
    #[error("key not found: {key}")]
    KeyNotFound {
        /// A debug rendering of the offending key.
        key: String,
    },

    /// `pop` called on an empty vector or sorted vector.
    #[error("cannot pop from an empty collection")]
    EmptyPop,

    /// A mutating operation was attempted on a transient after `persistent` was called on it.
    #[error("transient used after persistent() was called on it")]
    UseAfterFreeze,

    /// Non-numeric input to a typed-vector append, or a non-mapping / non-pair-iterable `merge` argument.
    #[error("type error: {0}")]
    Type(String),

    /// A map factory was given an odd number of flat arguments, or `merge` received a pair whose length was not 2.
    #[error("arity error: {0}")]
    Arity(String),

    /// An integer handed to `Int64Vector` does not fit in `i64`.
    #[error("integer overflow: {0} does not fit in i64")]
    Overflow(String),
}
