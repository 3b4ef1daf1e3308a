//! Sparse/dense index table with swap-removal.
//!
//! [`DenseTable`] keeps its values packed in one `Vec` so iteration touches
//! only live elements. External indices go through a `sparse` indirection
//! and stay stable; dense positions change whenever an element is removed.

use std::ops::{Index, IndexMut};

use crate::error::ArenaError;

/// Sparse cell: either the dense position of a live value or a free-list link.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SparseEntry {
    Live(u32),
    Free(Option<u32>),
}

/// Packed storage with stable external indices.
///
/// Invariants:
/// - `dense.len() == sparse_ref.len() == number of live entries`.
/// - `sparse[sparse_ref[p]] == Live(p)` for every dense position `p`.
#[derive(Clone, Debug)]
pub struct DenseTable<T> {
    sparse: Vec<SparseEntry>,
    free_head: Option<u32>,
    dense: Vec<T>,
    sparse_ref: Vec<u32>,
}

impl<T> DenseTable<T> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            sparse: Vec::new(),
            free_head: None,
            dense: Vec::new(),
            sparse_ref: Vec::new(),
        }
    }

    /// Insert a value at the end of the dense array and return its index.
    pub fn emplace(&mut self, value: T) -> u32 {
        let position = self.dense.len() as u32;
        let index = match self.free_head {
            Some(index) => {
                self.free_head = match self.sparse[index as usize] {
                    SparseEntry::Free(next) => next,
                    SparseEntry::Live(_) => unreachable!("free list points at live index {index}"),
                };
                self.sparse[index as usize] = SparseEntry::Live(position);
                index
            }
            None => {
                let index =
                    u32::try_from(self.sparse.len()).expect("table exceeds u32::MAX indices");
                self.sparse.push(SparseEntry::Live(position));
                index
            }
        };
        self.dense.push(value);
        self.sparse_ref.push(index);
        index
    }

    /// Remove the value at `index` and return it.
    ///
    /// The last dense element is moved into the vacated position.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range or not live.
    pub fn remove(&mut self, index: u32) -> T {
        match self.try_remove(index) {
            Ok(value) => value,
            Err(err) => panic!("DenseTable::remove: {err}"),
        }
    }

    /// Remove the value at `index`, reporting misuse instead of panicking.
    pub fn try_remove(&mut self, index: u32) -> Result<T, ArenaError> {
        let position = self.position(index)?;
        let value = self.dense.swap_remove(position as usize);
        self.sparse_ref.swap_remove(position as usize);
        if let Some(&moved) = self.sparse_ref.get(position as usize) {
            self.sparse[moved as usize] = SparseEntry::Live(position);
        }
        self.sparse[index as usize] = SparseEntry::Free(self.free_head);
        self.free_head = Some(index);
        Ok(value)
    }

    /// Current dense position of `index`.
    pub fn position(&self, index: u32) -> Result<u32, ArenaError> {
        match self.sparse.get(index as usize) {
            Some(SparseEntry::Live(position)) => Ok(*position),
            Some(SparseEntry::Free(_)) => Err(ArenaError::Vacant { index }),
            None => Err(ArenaError::OutOfRange {
                index,
                len: self.sparse.len(),
            }),
        }
    }

    /// Borrow the value at `index`, if live.
    pub fn get(&self, index: u32) -> Option<&T> {
        let position = self.position(index).ok()?;
        self.dense.get(position as usize)
    }

    /// Mutably borrow the value at `index`, if live.
    pub fn get_mut(&mut self, index: u32) -> Option<&mut T> {
        let position = self.position(index).ok()?;
        self.dense.get_mut(position as usize)
    }

    /// Whether `index` currently holds a value.
    pub fn contains(&self, index: u32) -> bool {
        self.position(index).is_ok()
    }

    /// Number of live values.
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    /// Whether the table holds no live values.
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// The live values in dense order.
    pub fn as_slice(&self) -> &[T] {
        &self.dense
    }

    /// Iterate over live values in dense order.
    ///
    /// The order is stable until the next removal.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.dense.iter()
    }

    /// Iterate mutably over live values in dense order.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.dense.iter_mut()
    }

    /// Iterate over live `(index, value)` pairs in dense order.
    pub fn iter_indexed(&self) -> impl Iterator<Item = (u32, &T)> + '_ {
        self.sparse_ref.iter().copied().zip(self.dense.iter())
    }

    /// Iterate mutably over live `(index, value)` pairs in dense order.
    pub fn iter_indexed_mut(&mut self) -> impl Iterator<Item = (u32, &mut T)> + '_ {
        self.sparse_ref.iter().copied().zip(self.dense.iter_mut())
    }

    /// Remove every live value, yielding `(index, value)` pairs.
    pub fn drain(&mut self) -> impl Iterator<Item = (u32, T)> {
        self.sparse.clear();
        self.free_head = None;
        let indices = std::mem::take(&mut self.sparse_ref);
        let values = std::mem::take(&mut self.dense);
        indices.into_iter().zip(values)
    }
}

impl<T> Default for DenseTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T> IntoIterator for &'a DenseTable<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.dense.iter()
    }
}

impl<T> Index<u32> for DenseTable<T> {
    type Output = T;

    fn index(&self, index: u32) -> &T {
        match self.position(index) {
            Ok(position) => &self.dense[position as usize],
            Err(err) => panic!("DenseTable: {err}"),
        }
    }
}

impl<T> IndexMut<u32> for DenseTable<T> {
    fn index_mut(&mut self, index: u32) -> &mut T {
        match self.position(index) {
            Ok(position) => &mut self.dense[position as usize],
            Err(err) => panic!("DenseTable: {err}"),
        }
    }
}
