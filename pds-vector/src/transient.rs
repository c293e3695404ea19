// Copyright 2020-2025 The Spork Authors. Licensed under GPL-3.0.

use std::rc::Rc;

use pds_core::bits::{self, BITS, WIDTH};
use pds_core::{EditToken, Error, Result};

use crate::node::{self, Node};
use crate::vector::{self, Vector};

/// A temporarily mutable view of a [`Vector`], opened with
/// [`Vector::transient`] or [`VectorTransient::new`] and finalized with
/// [`VectorTransient::persistent`].
///
/// The tail is a genuinely mutable `Vec` (not the persistent form's
/// `Rc<Vec>`) so repeated `append` calls below the 32-element chunk
/// boundary are plain in-place pushes; trie nodes mutate in place via
/// `Rc::make_mut` exactly when they were allocated within this
/// transient's own lineage (see `pds_vector::node`).
pub struct VectorTransient<T> {
    count: usize,
    shift: u32,
    root: Option<Rc<Node<T>>>,
    tail: Vec<T>,
    edit: EditToken,
}

impl<T: Clone> VectorTransient<T> {
    /// Opens a transient over a freshly empty vector.
    pub fn new() -> Self {
        Self::from_persistent(Vector::empty())
    }

    pub(crate) fn from_persistent(v: Vector<T>) -> Self {
        VectorTransient {
            count: v.count,
            shift: v.shift,
            root: v.root,
            tail: (*v.tail).clone(),
            edit: EditToken::new(),
        }
    }

    fn check_live(&self) -> Result<()> {
        if self.edit.is_live() {
            Ok(())
        } else {
            Err(Error::UseAfterFreeze)
        }
    }

    /// Number of elements currently held.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether the transient currently holds no elements.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    fn tail_offset(&self) -> usize {
        self.count - self.tail.len()
    }

    /// Reads the element at `index`; negative indices count from the end.
    pub fn get(&self, index: isize) -> Result<&T> {
        let resolved = if index < 0 { self.count as isize + index } else { index };
        if resolved < 0 || resolved as usize >= self.count {
            return Err(Error::IndexOutOfRange { index, len: self.count });
        }
        let i = resolved as usize;
        if i >= self.tail_offset() {
            Ok(&self.tail[i - self.tail_offset()])
        } else {
            let root = self.root.as_ref().expect("non-empty tail_offset implies a root");
            Ok(&node::leaf_for(root, self.shift, i)[bits::mask(i as u64, 0)])
        }
    }

    /// Appends `value` at the end.
    pub fn append(&mut self, value: T) -> Result<()> {
        self.check_live()?;
        if self.tail.len() < WIDTH {
            self.tail.push(value);
            self.count += 1;
            return Ok(());
        }
        let leaf = node::leaf_node(std::mem::take(&mut self.tail));
        match &self.root {
            None => self.root = Some(leaf),
            Some(root) => {
                if (self.count >> BITS) > (1usize << self.shift) {
                    log::debug!("trie: growing root from shift {} to {}", self.shift, self.shift + BITS);
                    let grown = Rc::new(Node::Branch(vec![root.clone(), node::new_path(self.shift, leaf)]));
                    self.root = Some(grown);
                    self.shift += BITS;
                } else {
                    self.root = Some(node::push_tail(root, self.shift, self.count - 1, leaf));
                }
            }
        }
        self.tail = vec![value];
        self.count += 1;
        Ok(())
    }

    /// Replaces the value at `index`; `index == len()` appends.
    pub fn update(&mut self, index: isize, value: T) -> Result<()> {
        self.check_live()?;
        let resolved = if index < 0 { self.count as isize + index } else { index };
        if resolved < 0 || resolved as usize > self.count {
            return Err(Error::IndexOutOfRange { index, len: self.count });
        }
        let i = resolved as usize;
        if i == self.count {
            return self.append(value);
        }
        if i >= self.tail_offset() {
            let off = self.tail_offset();
            self.tail[i - off] = value;
        } else {
            let root = self.root.as_ref().expect("non-empty tail_offset implies a root");
            self.root = Some(node::update_leaf(root, self.shift, i, value));
        }
        Ok(())
    }

    /// Removes the last element. Fails with `EmptyPop` when empty.
    pub fn pop_last(&mut self) -> Result<()> {
        self.check_live()?;
        if self.count == 0 {
            return Err(Error::EmptyPop);
        }
        if self.count == 1 {
            self.count = 0;
            self.shift = 0;
            self.root = None;
            self.tail.clear();
            return Ok(());
        }
        if self.tail.len() > 1 {
            self.tail.pop();
            self.count -= 1;
            return Ok(());
        }
        let root = self.root.clone().expect("count > 1 with singleton tail implies a root");
        if self.shift == 0 {
            if let Node::Leaf(values) = &*root {
                self.tail = values.clone();
                self.root = None;
                self.count -= 1;
                return Ok(());
            }
            unreachable!("shift 0 root must be a leaf");
        }
        let new_tail = node::leaf_for(&root, self.shift, self.count - 2).to_vec();
        let popped = node::pop_tail(&root, self.shift);
        let (new_root, new_shift) = match popped {
            None => (None, 0),
            Some(r) => vector::demote(r, self.shift),
        };
        self.root = new_root;
        self.shift = new_shift;
        self.tail = new_tail;
        self.count -= 1;
        Ok(())
    }

    /// Converts back to a persistent vector, invalidating this transient.
    /// Any further mutating call on it fails with `UseAfterFreeze`.
    pub fn persistent(&mut self) -> Vector<T> {
        self.edit.freeze();
        let root = self.root.take();
        let tail = std::mem::take(&mut self.tail);
        Vector::from_parts(self.count, self.shift, root, tail)
    }

    /// Iterates the elements currently held, in index order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        (0..self.count).map(move |i| self.get(i as isize).expect("in-bounds by construction"))
    }
}

impl<T: Clone> Default for VectorTransient<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Vector<T> {
    /// Opens a transient view reusing this vector's root without cloning it.
    pub fn transient(&self) -> VectorTransient<T>
    where
        T: Clone,
    {
        VectorTransient::from_persistent(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_scoping() {
        let v: Vector<i32> = (0..10).collect();
        let mut t = v.transient();
        t.append(99).unwrap();
        let w = t.persistent();
        assert_eq!(w.len(), v.len() + 1);
        assert_eq!(*w.get(v.len() as isize).unwrap(), 99);
        assert_eq!(v.len(), 10, "original vector unchanged");
    }

    #[test]
    fn use_after_freeze_fails() {
        let v: Vector<i32> = Vector::empty();
        let mut t = v.transient();
        t.append(1).unwrap();
        let _w = t.persistent();
        assert!(matches!(t.append(2), Err(Error::UseAfterFreeze)));
        assert!(matches!(t.update(0, 5), Err(Error::UseAfterFreeze)));
        assert!(matches!(t.pop_last(), Err(Error::UseAfterFreeze)));
    }

    #[test]
    fn transient_round_trip_builds_large_vector() {
        let mut t = VectorTransient::new();
        for i in 0..5000 {
            t.append(i).unwrap();
        }
        let v = t.persistent();
        assert_eq!(v.len(), 5000);
        for i in 0..5000 {
            assert_eq!(*v.get(i).unwrap(), i as i32);
        }
    }

    #[test]
    fn transient_update_and_pop() {
        let mut t = VectorTransient::new();
        for i in 0..40 {
            t.append(i).unwrap();
        }
        t.update(0, 999).unwrap();
        assert_eq!(*t.get(0).unwrap(), 999);
        t.pop_last().unwrap();
        assert_eq!(t.len(), 39);
    }
}
