// Copyright 2020-2025 The Spork Authors. Licensed under GPL-3.0.

//! The hash-array-mapped trie node, shared by [`crate::map::Map`] and
//! [`crate::transient::MapTransient`].
//!
//! Mirrors `pds_vector::node`'s and `pds_sorted::node`'s discipline:
//! `insert`/`remove` take the node by owned `Rc` and rewrite it via
//! `Rc::make_mut` rather than threading a separate per-node edit
//! token. A node's `Rc` is uniquely held exactly when it was freshly
//! allocated within the currently open transient's lineage (reached by
//! `.take()`-ing the slot that held it); `assoc`/`dissoc` instead pass
//! a `.clone()`'d root, so `make_mut` clones on write and the caller's
//! own root is left untouched.
//!
//! Three variants, a closed sum type dispatched on an `enum` tag rather
//! than a v-table, per the component design's "tagged variants over
//! inheritance" note:
//! - [`Node::BitmapIndexed`]: a 32-bit occupancy bitmap plus a packed
//!   array of `popcount(bitmap)` slots, each either a flat `(k, v)`
//!   entry or a child subtree.
//! - [`Node::Array`]: a dense, fixed 32-slot child array, used once a
//!   `BitmapIndexed` would exceed 16 populated slots.
//! - [`Node::Collision`]: a flat list of entries sharing one 64-bit
//!   hash, exhausted of further bits to partition on.

use std::hash::Hash;
use std::rc::Rc;

use pds_core::bits::{self, BITS, WIDTH};
use pds_core::hash::hash_of;

/// One occupied slot of a [`Node::BitmapIndexed`] node: either a flat
/// key/value entry, or a child subtree to descend into.
#[derive(Clone)]
pub(crate) enum Slot<K, V> {
    Entry(K, V),
    Child(Rc<Node<K, V>>),
}

/// A HAMT trie node. See the module documentation for the three
/// variants' roles.
pub(crate) enum Node<K, V> {
    BitmapIndexed { bitmap: u32, slots: Vec<Slot<K, V>> },
    Array { children: Vec<Option<Rc<Node<K, V>>>>, count: usize },
    Collision { hash: u64, entries: Vec<(K, V)> },
}

impl<K, V> Clone for Node<K, V>
where
    K: Clone,
    V: Clone,
{
    fn clone(&self) -> Self {
        match self {
            Node::BitmapIndexed { bitmap, slots } => Node::BitmapIndexed { bitmap: *bitmap, slots: slots.clone() },
            Node::Array { children, count } => Node::Array { children: children.clone(), count: *count },
            Node::Collision { hash, entries } => Node::Collision { hash: *hash, entries: entries.clone() },
        }
    }
}

/// The threshold (exclusive) above which a `BitmapIndexed` node
/// promotes to an `Array` node: `WIDTH / 2`.
const PROMOTE_ABOVE: usize = WIDTH / 2;

/// The threshold (inclusive) at or below which an `Array` node's
/// live-child count compacts back to `BitmapIndexed`: `WIDTH / 4`.
const DEMOTE_AT_OR_BELOW: usize = WIDTH / 4;

impl<K: Eq + Clone, V: Clone> Node<K, V> {
    pub(crate) fn empty() -> Rc<Self> {
        Rc::new(Node::BitmapIndexed { bitmap: 0, slots: Vec::new() })
    }

    /// Looks up `key` (already hashed to `hash`) starting at trie depth `shift`.
    pub(crate) fn get(&self, key: &K, hash: u64, shift: u32) -> Option<&V> {
        match self {
            Node::BitmapIndexed { bitmap, slots } => {
                let b = bits::bit(hash, shift);
                if bitmap & b == 0 {
                    return None;
                }
                match &slots[bits::index(*bitmap, b)] {
                    Slot::Entry(k, v) => if k == key { Some(v) } else { None },
                    Slot::Child(child) => child.get(key, hash, shift + BITS),
                }
            }
            Node::Array { children, .. } => children[bits::mask(hash, shift)].as_ref().and_then(|c| c.get(key, hash, shift + BITS)),
            Node::Collision { hash: h, entries } => {
                if *h != hash {
                    return None;
                }
                entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
            }
        }
    }

    pub(crate) fn contains(&self, key: &K, hash: u64, shift: u32) -> bool {
        self.get(key, hash, shift).is_some()
    }
}

/// Builds the two-entry subtree for a split or a promoted flat entry's
/// rehoming, descending shift levels until the two keys' hashes
/// diverge (or all 64 hash bits are exhausted, at which point a
/// `Collision` node is used even for distinct hashes that happen to
/// coincide past bit 63 — see DESIGN.md).
fn two_entry_node<K: Eq + Hash + Clone, V: Clone>(k1: K, v1: V, h1: u64, k2: K, v2: V, h2: u64, shift: u32) -> Rc<Node<K, V>> {
    if shift >= 64 || h1 == h2 {
        return Rc::new(Node::Collision { hash: h1, entries: vec![(k1, v1), (k2, v2)] });
    }
    let b1 = bits::bit(h1, shift);
    let b2 = bits::bit(h2, shift);
    if b1 == b2 {
        let child = two_entry_node(k1, v1, h1, k2, v2, h2, shift + BITS);
        Rc::new(Node::BitmapIndexed { bitmap: b1, slots: vec![Slot::Child(child)] })
    } else {
        let (bitmap, slots) = if b1 < b2 {
            (b1 | b2, vec![Slot::Entry(k1, v1), Slot::Entry(k2, v2)])
        } else {
            (b1 | b2, vec![Slot::Entry(k2, v2), Slot::Entry(k1, v1)])
        };
        Rc::new(Node::BitmapIndexed { bitmap, slots })
    }
}

/// Rebuilds a dense 32-slot `Array` node from an overflowing
/// `BitmapIndexed`, re-homing each previous entry as a single-entry
/// `BitmapIndexed` child at its hash position under `shift + BITS`,
/// then placing the new entry alongside it.
fn promote<K: Eq + Hash + Clone, V: Clone>(bitmap: u32, slots: &[Slot<K, V>], key: K, value: V, hash: u64, shift: u32) -> Rc<Node<K, V>> {
    let mut children: Vec<Option<Rc<Node<K, V>>>> = vec![None; WIDTH];
    let mut slot_iter = slots.iter();
    for p in 0..WIDTH {
        if bitmap & (1u32 << p) == 0 {
            continue;
        }
        let slot = slot_iter.next().expect("bitmap popcount matches slots length");
        let child = match slot {
            Slot::Entry(k, v) => {
                let h = hash_of(k);
                Rc::new(Node::BitmapIndexed { bitmap: bits::bit(h, shift + BITS), slots: vec![Slot::Entry(k.clone(), v.clone())] })
            }
            Slot::Child(c) => c.clone(),
        };
        children[p] = Some(child);
    }
    let new_pos = bits::mask(hash, shift);
    children[new_pos] = Some(Rc::new(Node::BitmapIndexed { bitmap: bits::bit(hash, shift + BITS), slots: vec![Slot::Entry(key, value)] }));
    let count = children.iter().filter(|c| c.is_some()).count();
    log::trace!("hamt: promoting BitmapIndexed to ArrayNode ({} children)", count);
    Rc::new(Node::Array { children, count })
}

/// Compacts a sparse `Array` node back into `BitmapIndexed`, keeping
/// its remaining live children as `Slot::Child` entries rather than
/// attempting to flatten them back to `Slot::Entry`.
fn compact<K, V>(children: &[Option<Rc<Node<K, V>>>]) -> Rc<Node<K, V>> {
    let mut bitmap = 0u32;
    let mut slots = Vec::new();
    for (p, child) in children.iter().enumerate() {
        if let Some(c) = child {
            bitmap |= 1 << p;
            slots.push(Slot::Child(c.clone()));
        }
    }
    log::trace!("hamt: compacting ArrayNode to BitmapIndexed ({} children)", slots.len());
    Rc::new(Node::BitmapIndexed { bitmap, slots })
}

/// The outcome of reading a populated `BitmapIndexed` slot before
/// deciding how to rewrite it — computed while the node is still only
/// borrowed, so the borrow is gone by the time `Rc::make_mut` needs a
/// unique reference.
enum Occupant<K, V> {
    SameKey,
    DifferentKey(K, V, u64),
    Child,
}

/// Inserts or replaces `(key, value)` under `node`, returning the new
/// subtree root and whether this added a previously-absent key (used
/// by the outer collection to adjust `count`).
///
/// Takes `node` by value: a caller passing a `.take()`n, uniquely-held
/// `Rc` (as `MapTransient` does) gets true in-place mutation via
/// `Rc::make_mut`; a caller passing a `.clone()`'d `Rc` (as `Map`'s
/// persistent `assoc` does) gets ordinary path-copy, since `make_mut`
/// then finds the strong count above one and clones before writing.
pub(crate) fn insert<K: Eq + Hash + Clone, V: Clone>(mut node: Rc<Node<K, V>>, key: K, value: V, hash: u64, shift: u32) -> (Rc<Node<K, V>>, bool) {
    match &*node {
        Node::BitmapIndexed { bitmap, slots } => {
            let bm = *bitmap;
            let b = bits::bit(hash, shift);
            if bm & b == 0 {
                if slots.len() >= PROMOTE_ABOVE {
                    return (promote(bm, slots, key, value, hash, shift), true);
                }
                let idx = bits::index(bm, b);
                if let Node::BitmapIndexed { bitmap, slots } = Rc::make_mut(&mut node) {
                    *bitmap = bm | b;
                    slots.insert(idx, Slot::Entry(key, value));
                }
                return (node, true);
            }
            let idx = bits::index(bm, b);
            let occupant = match &slots[idx] {
                Slot::Entry(k, _) if *k == key => Occupant::SameKey,
                Slot::Entry(k, v) => Occupant::DifferentKey(k.clone(), v.clone(), hash_of(k)),
                Slot::Child(_) => Occupant::Child,
            };
            match occupant {
                Occupant::SameKey => {
                    if let Node::BitmapIndexed { slots, .. } = Rc::make_mut(&mut node) {
                        slots[idx] = Slot::Entry(key, value);
                    }
                    (node, false)
                }
                Occupant::DifferentKey(ek, ev, eh) => {
                    let child = two_entry_node(ek, ev, eh, key, value, hash, shift + BITS);
                    if let Node::BitmapIndexed { slots, .. } = Rc::make_mut(&mut node) {
                        slots[idx] = Slot::Child(child);
                    }
                    (node, true)
                }
                Occupant::Child => {
                    let child = if let Node::BitmapIndexed { slots, .. } = Rc::make_mut(&mut node) {
                        match slots.remove(idx) {
                            Slot::Child(c) => c,
                            Slot::Entry(..) => unreachable!("slot checked as Child above"),
                        }
                    } else {
                        unreachable!()
                    };
                    let (new_child, added) = insert(child, key, value, hash, shift + BITS);
                    if let Node::BitmapIndexed { slots, .. } = Rc::make_mut(&mut node) {
                        slots.insert(idx, Slot::Child(new_child));
                    }
                    (node, added)
                }
            }
        }
        Node::Array { .. } => {
            let idx = bits::mask(hash, shift);
            let was_absent = matches!(&*node, Node::Array { children, .. } if children[idx].is_none());
            let child = if let Node::Array { children, .. } = Rc::make_mut(&mut node) { children[idx].take() } else { unreachable!() };
            let (new_child, added) = match child {
                None => (insert(Node::empty(), key, value, hash, shift + BITS).0, true),
                Some(c) => insert(c, key, value, hash, shift + BITS),
            };
            if let Node::Array { children, count } = Rc::make_mut(&mut node) {
                children[idx] = Some(new_child);
                if was_absent {
                    *count += 1;
                }
            }
            (node, added)
        }
        Node::Collision { hash: h, .. } => {
            let hv = *h;
            if hv == hash {
                let pos = if let Node::Collision { entries, .. } = &*node { entries.iter().position(|(k, _)| *k == key) } else { unreachable!() };
                let added = pos.is_none();
                if let Node::Collision { entries, .. } = Rc::make_mut(&mut node) {
                    match pos {
                        Some(p) => entries[p] = (key, value),
                        None => entries.push((key, value)),
                    }
                }
                (node, added)
            } else {
                let wrapped = Rc::new(Node::BitmapIndexed { bitmap: bits::bit(hv, shift), slots: vec![Slot::Child(node)] });
                insert(wrapped, key, value, hash, shift)
            }
        }
    }
}

/// Removes `key` from `node`, returning the new subtree root (`None`
/// if this emptied the node entirely, propagated up to the caller) and
/// whether a matching entry was actually removed. See [`insert`] for
/// the ownership discipline that makes in-place mutation possible.
pub(crate) fn remove<K: Eq + Hash + Clone, V: Clone>(mut node: Rc<Node<K, V>>, key: &K, hash: u64, shift: u32) -> (Option<Rc<Node<K, V>>>, bool) {
    match &*node {
        Node::BitmapIndexed { bitmap, slots } => {
            let bm = *bitmap;
            let b = bits::bit(hash, shift);
            if bm & b == 0 {
                return (Some(node), false);
            }
            let idx = bits::index(bm, b);
            match &slots[idx] {
                Slot::Entry(k, _) if k == key => {
                    if slots.len() == 1 {
                        return (None, true);
                    }
                    if let Node::BitmapIndexed { bitmap, slots } = Rc::make_mut(&mut node) {
                        *bitmap &= !b;
                        slots.remove(idx);
                    }
                    (Some(node), true)
                }
                Slot::Entry(..) => (Some(node), false),
                Slot::Child(_) => {
                    let was_singleton = slots.len() == 1;
                    let child = if let Node::BitmapIndexed { slots, .. } = Rc::make_mut(&mut node) {
                        match slots.remove(idx) {
                            Slot::Child(c) => c,
                            Slot::Entry(..) => unreachable!("slot checked as Child above"),
                        }
                    } else {
                        unreachable!()
                    };
                    let (new_child, removed) = remove(child, key, hash, shift + BITS);
                    if !removed {
                        if let Node::BitmapIndexed { slots, .. } = Rc::make_mut(&mut node) {
                            slots.insert(idx, Slot::Child(new_child.expect("remove() on a present child only clears it when it reports removed")));
                        }
                        return (Some(node), false);
                    }
                    match new_child {
                        None if was_singleton => (None, true),
                        None => {
                            if let Node::BitmapIndexed { bitmap, .. } = Rc::make_mut(&mut node) {
                                *bitmap &= !b;
                            }
                            (Some(node), true)
                        }
                        Some(nc) => {
                            if let Node::BitmapIndexed { slots, .. } = Rc::make_mut(&mut node) {
                                slots.insert(idx, Slot::Child(nc));
                            }
                            (Some(node), true)
                        }
                    }
                }
            }
        }
        Node::Array { children, .. } => {
            let idx = bits::mask(hash, shift);
            if children[idx].is_none() {
                return (Some(node), false);
            }
            let child = if let Node::Array { children, .. } = Rc::make_mut(&mut node) { children[idx].take().unwrap() } else { unreachable!() };
            let (new_child, removed) = remove(child, key, hash, shift + BITS);
            if !removed {
                if let Node::Array { children, .. } = Rc::make_mut(&mut node) {
                    children[idx] = new_child;
                }
                return (Some(node), false);
            }
            let new_count = if let Node::Array { children, count } = Rc::make_mut(&mut node) {
                let shrunk = new_child.is_none();
                children[idx] = new_child;
                if shrunk {
                    *count -= 1;
                }
                *count
            } else {
                unreachable!()
            };
            if new_count <= DEMOTE_AT_OR_BELOW {
                let compacted = if let Node::Array { children, .. } = &*node { compact(children) } else { unreachable!() };
                (Some(compacted), true)
            } else {
                (Some(node), true)
            }
        }
        Node::Collision { hash: h, entries } => {
            if *h != hash {
                return (Some(node), false);
            }
            match entries.iter().position(|(k, _)| k == key) {
                None => (Some(node), false),
                Some(pos) => {
                    if entries.len() == 2 {
                        let (rk, rv) = entries[1 - pos].clone();
                        let rh = hash_of(&rk);
                        (Some(Rc::new(Node::BitmapIndexed { bitmap: bits::bit(rh, shift), slots: vec![Slot::Entry(rk, rv)] })), true)
                    } else {
                        if let Node::Collision { entries, .. } = Rc::make_mut(&mut node) {
                            entries.remove(pos);
                        }
                        (Some(node), true)
                    }
                }
            }
        }
    }
}
