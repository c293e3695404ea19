// Copyright 2020-2025 The Spork Authors. Licensed under GPL-3.0.

//! The 32-way bit-partitioned trie node shared by [`crate::vector::Vector`]
//! and [`crate::transient::VectorTransient`].
//!
//! The same node shape serves both the persistent and the transient
//! form. Mutate-in-place for a transient is implemented with
//! `Rc::make_mut`: under the path-copy discipline a node's `Rc` is
//! uniquely held exactly when it was freshly allocated within the
//! currently open transient's lineage, so `make_mut` mutates that node
//! directly and clones any node still shared with a persistent
//! collection. See `pds_core::edit` for why no separate per-node token
//! is needed.

use std::rc::Rc;

use pds_core::bits::{self, BITS, WIDTH};

/// A node of the trie: either an interior branch of child nodes, or a
/// leaf holding up to `WIDTH` values directly.
#[derive(Clone)]
pub(crate) enum Node<T> {
    Branch(Vec<Rc<Node<T>>>),
    Leaf(Vec<T>),
}

impl<T> Node<T> {
    fn children(&self) -> &Vec<Rc<Node<T>>> {
        match self {
            Node::Branch(children) => children,
            Node::Leaf(_) => unreachable!("expected a branch node"),
        }
    }
}

/// The leaf array containing logical index `i`, found by descending
/// from `node` at depth `shift`.
pub(crate) fn leaf_for<T>(node: &Node<T>, shift: u32, i: usize) -> &[T] {
    match node {
        Node::Leaf(values) => values,
        Node::Branch(children) => {
            let idx = bits::mask(i as u64, shift);
            leaf_for(&children[idx], shift - BITS, i)
        }
    }
}

/// Returns a new tree with the value at logical index `i` replaced,
/// path-copying (or, under an owned transient root, mutating in place)
/// along the way.
pub(crate) fn update_leaf<T: Clone>(node: &Rc<Node<T>>, shift: u32, i: usize, value: T) -> Rc<Node<T>> {
    let mut node = node.clone();
    let node_mut = Rc::make_mut(&mut node);
    match shift {
        0 => {
            if let Node::Leaf(values) = node_mut {
                values[bits::mask(i as u64, 0)] = value;
            } else {
                unreachable!("shift 0 must address a leaf");
            }
        }
        _ => {
            let idx = bits::mask(i as u64, shift);
            if let Node::Branch(children) = node_mut {
                let new_child = update_leaf(&children[idx], shift - BITS, i, value);
                children[idx] = new_child;
            } else {
                unreachable!("nonzero shift must address a branch");
            }
        }
    }
    node
}

/// Builds a chain of single-child branches from `shift` down to 0,
/// terminating in `leaf` — used when growing the tree into a fresh
/// subtree that did not exist before.
pub(crate) fn new_path<T>(shift: u32, leaf: Rc<Node<T>>) -> Rc<Node<T>> {
    if shift == 0 {
        leaf
    } else {
        log::trace!("trie: new_path extending to shift {shift}");
        Rc::new(Node::Branch(vec![new_path(shift - BITS, leaf)]))
    }
}

/// Pushes a full `leaf` chunk into the tree, returning the new root.
/// `last_index` is the logical index of the chunk's last element
/// (`count - 1` of the vector after the append that triggered this).
pub(crate) fn push_tail<T: Clone>(root: &Rc<Node<T>>, shift: u32, last_index: usize, leaf: Rc<Node<T>>) -> Rc<Node<T>> {
    log::trace!("trie: push_tail at shift {shift}, last_index {last_index}");
    let mut root = root.clone();
    let idx = bits::mask(last_index as u64, shift);
    let root_mut = Rc::make_mut(&mut root);
    let children = match root_mut {
        Node::Branch(children) => children,
        Node::Leaf(_) => unreachable!("push_tail root must be a branch"),
    };
    let node_to_insert = if shift == BITS {
        leaf
    } else if idx < children.len() {
        push_tail(&children[idx], shift - BITS, last_index, leaf)
    } else {
        new_path(shift - BITS, leaf)
    };
    if idx < children.len() {
        children[idx] = node_to_insert;
    } else {
        children.push(node_to_insert);
    }
    root
}

/// Removes the last leaf chunk from the tree. Returns `None` if doing
/// so would leave the node with no children at all (the caller
/// demotes/clears the root in that case).
pub(crate) fn pop_tail<T: Clone>(node: &Rc<Node<T>>, shift: u32) -> Option<Rc<Node<T>>> {
    let children_len = node.children().len();
    let last_idx = children_len - 1;

    if shift == BITS {
        return if last_idx == 0 {
            None
        } else {
            let mut node = node.clone();
            if let Node::Branch(children) = Rc::make_mut(&mut node) {
                children.truncate(last_idx);
            }
            Some(node)
        };
    }

    let child = node.children()[last_idx].clone();
    match pop_tail(&child, shift - BITS) {
        Some(new_child) => {
            let mut node = node.clone();
            if let Node::Branch(children) = Rc::make_mut(&mut node) {
                children[last_idx] = new_child;
            }
            Some(node)
        }
        None if last_idx == 0 => None,
        None => {
            let mut node = node.clone();
            if let Node::Branch(children) = Rc::make_mut(&mut node) {
                children.truncate(last_idx);
            }
            Some(node)
        }
    }
}

pub(crate) fn leaf_node<T>(values: Vec<T>) -> Rc<Node<T>> {
    Rc::new(Node::Leaf(values))
}

/// The maximum number of elements a tree of the given `shift` can hold.
pub(crate) fn capacity_for_shift(shift: u32) -> usize {
    WIDTH << shift
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_leaf_round_trip() {
        let leaf = leaf_node(vec![1, 2, 3]);
        assert_eq!(leaf_for(&leaf, 0, 1), &[1, 2, 3]);
    }

    #[test]
    fn new_path_builds_chain_to_requested_depth() {
        let leaf = leaf_node(vec![42]);
        let path = new_path(BITS * 2, leaf);
        // Descending BITS*2/BITS = 2 branch levels reaches the leaf.
        assert_eq!(leaf_for(&path, BITS * 2, 0), &[42]);
    }

    #[test]
    fn capacity_doubles_per_level() {
        assert_eq!(capacity_for_shift(0), WIDTH);
        assert_eq!(capacity_for_shift(BITS), WIDTH * WIDTH);
    }
}
