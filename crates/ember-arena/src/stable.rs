//! Stable-index object pool.
//!
//! [`StableArena`] stores values in a `Vec` of tagged slots. A removed slot
//! becomes a link in an intrusive free list and is handed out again by the
//! next insertion. Growing the backing `Vec` moves the values in memory but
//! never renumbers them, so an index stays valid until it is removed.

use std::ops::{Index, IndexMut};

use crate::error::ArenaError;

/// A single arena cell: either a live value or a link to the next hole.
#[derive(Clone, Debug)]
enum Slot<T> {
    Occupied(T),
    Free { next: Option<u32> },
}

/// Growable pool that hands out stable `u32` indices.
///
/// `head` (the next never-used slot) is the length of the slot vector;
/// `available` is the head of the free list and `available_capacity` the
/// number of holes threaded through it.
#[derive(Clone, Debug)]
pub struct StableArena<T> {
    slots: Vec<Slot<T>>,
    available: Option<u32>,
    available_capacity: usize,
}

impl<T> StableArena<T> {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            available: None,
            available_capacity: 0,
        }
    }

    /// Create an empty arena with room for `capacity` slots.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            available: None,
            available_capacity: 0,
        }
    }

    /// Insert a value and return its index.
    ///
    /// Holes left by [`remove`](Self::remove) are reused most-recent first.
    pub fn insert(&mut self, value: T) -> u32 {
        if let Some(index) = self.available {
            let slot = &mut self.slots[index as usize];
            let next = match slot {
                Slot::Free { next } => *next,
                Slot::Occupied(_) => unreachable!("free list points at live slot {index}"),
            };
            *slot = Slot::Occupied(value);
            self.available = next;
            self.available_capacity -= 1;
            index
        } else {
            let index = u32::try_from(self.slots.len()).expect("arena exceeds u32::MAX slots");
            self.slots.push(Slot::Occupied(value));
            index
        }
    }

    /// Remove the value at `index` and return it.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range or not live.
    pub fn remove(&mut self, index: u32) -> T {
        match self.try_remove(index) {
            Ok(value) => value,
            Err(err) => panic!("StableArena::remove: {err}"),
        }
    }

    /// Remove the value at `index`, reporting misuse instead of panicking.
    pub fn try_remove(&mut self, index: u32) -> Result<T, ArenaError> {
        let len = self.slots.len();
        let slot = self
            .slots
            .get_mut(index as usize)
            .ok_or(ArenaError::OutOfRange { index, len })?;
        if matches!(slot, Slot::Free { .. }) {
            return Err(ArenaError::Vacant { index });
        }
        let old = std::mem::replace(
            slot,
            Slot::Free {
                next: self.available,
            },
        );
        self.available = Some(index);
        self.available_capacity += 1;
        match old {
            Slot::Occupied(value) => Ok(value),
            Slot::Free { .. } => unreachable!(),
        }
    }

    /// Borrow the value at `index`, if live.
    pub fn get(&self, index: u32) -> Option<&T> {
        match self.slots.get(index as usize)? {
            Slot::Occupied(value) => Some(value),
            Slot::Free { .. } => None,
        }
    }

    /// Mutably borrow the value at `index`, if live.
    pub fn get_mut(&mut self, index: u32) -> Option<&mut T> {
        match self.slots.get_mut(index as usize)? {
            Slot::Occupied(value) => Some(value),
            Slot::Free { .. } => None,
        }
    }

    /// Borrow the value at `index`, reporting why it is unavailable.
    pub fn try_get(&self, index: u32) -> Result<&T, ArenaError> {
        match self.slots.get(index as usize) {
            Some(Slot::Occupied(value)) => Ok(value),
            Some(Slot::Free { .. }) => Err(ArenaError::Vacant { index }),
            None => Err(ArenaError::OutOfRange {
                index,
                len: self.slots.len(),
            }),
        }
    }

    /// Whether `index` currently holds a value.
    pub fn contains(&self, index: u32) -> bool {
        self.get(index).is_some()
    }

    /// Number of live values.
    pub fn len(&self) -> usize {
        self.slots.len() - self.available_capacity
    }

    /// Whether the arena holds no live values.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of holes waiting on the free list.
    pub fn available_count(&self) -> usize {
        self.available_capacity
    }

    /// Next never-used slot index (total slots ever handed out).
    pub fn head(&self) -> usize {
        self.slots.len()
    }

    /// Reserve room for at least `additional` more slots.
    pub fn reserve(&mut self, additional: usize) {
        self.slots.reserve(additional);
    }

    /// Iterate over live `(index, value)` pairs in index order, skipping holes.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &T)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| match slot {
                Slot::Occupied(value) => Some((i as u32, value)),
                Slot::Free { .. } => None,
            })
    }

    /// Iterate mutably over live `(index, value)` pairs in index order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (u32, &mut T)> + '_ {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(i, slot)| match slot {
                Slot::Occupied(value) => Some((i as u32, value)),
                Slot::Free { .. } => None,
            })
    }

    /// Remove every live value, yielding `(index, value)` pairs.
    ///
    /// The arena is empty and all indices are released afterwards.
    pub fn drain(&mut self) -> impl Iterator<Item = (u32, T)> {
        self.available = None;
        self.available_capacity = 0;
        std::mem::take(&mut self.slots)
            .into_iter()
            .enumerate()
            .filter_map(|(i, slot)| match slot {
                Slot::Occupied(value) => Some((i as u32, value)),
                Slot::Free { .. } => None,
            })
    }
}

impl<T> Default for StableArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<u32> for StableArena<T> {
    type Output = T;

    fn index(&self, index: u32) -> &T {
        match self.try_get(index) {
            Ok(value) => value,
            Err(err) => panic!("StableArena: {err}"),
        }
    }
}

impl<T> IndexMut<u32> for StableArena<T> {
    fn index_mut(&mut self, index: u32) -> &mut T {
        let len = self.slots.len();
        match self.slots.get_mut(index as usize) {
            Some(Slot::Occupied(value)) => value,
            Some(Slot::Free { .. }) => panic!("StableArena: {}", ArenaError::Vacant { index }),
            None => panic!("StableArena: {}", ArenaError::OutOfRange { index, len }),
        }
    }
}
