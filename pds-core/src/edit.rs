// Copyright 2020-2025 The Spork Authors. Licensed under GPL-3.0.

use std::cell::Cell;
use std::rc::Rc;

/// A liveness flag minted once per open transient lineage.
///
/// Every transient type (`VectorTransient`, `MapTransient`, ...) holds
/// one and checks [`EditToken::is_live`] at the top of every mutating
/// method, raising `Error::UseAfterFreeze` once [`EditToken::freeze`]
/// has been called by `persistent()`.
///
/// Per-node "is this node mine" tracking is handled separately, by
/// `Rc::make_mut`'s own strong-count uniqueness check: under the
/// write-once/path-copy discipline a node's `Rc` is uniquely held
/// exactly when it was allocated within the currently-open transient's
/// lineage, so `Rc::make_mut` mutates in place precisely when the edit
/// token would have (see each crate's `node` module). This token type
/// exists only to answer "has `persistent()` already been called on
/// this transient", not "do I own this particular node".
#[derive(Clone)]
pub struct EditToken(Rc<Cell<bool>>);

impl EditToken {
    /// Mint a fresh, live edit token.
    pub fn new() -> Self {
        EditToken(Rc::new(Cell::new(true)))
    }

    /// Whether this token is still live (its transient has not been
    /// converted back to persistent form).
    pub fn is_live(&self) -> bool {
        self.0.get()
    }

    /// Invalidate the token. Called exactly once, by `persistent()`.
    pub fn freeze(&self) {
        self.0.set(false);
    }
}

impl Default for EditToken {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for EditToken {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for EditToken {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_token_is_live() {
        let t = EditToken::new();
        assert!(t.is_live());
    }

    #[test]
    fn freeze_invalidates() {
        let t = EditToken::new();
        t.freeze();
        assert!(!t.is_live());
    }

    #[test]
    fn tokens_compare_by_identity() {
        let a = EditToken::new();
        let b = EditToken::new();
        let a2 = a.clone();
        assert_eq!(a, a2);
        assert_ne!(a, b);
    }
}
