//! Sparse slot tables.
//!
//! A [`SlotTable`] maps small integer indices to optional owned values. It is
//! the backing store for both the entity table (indexed by entity id) and each
//! entity's component row (indexed by component index).
//!
//! Capacity grows in fixed-size chunks rather than exactly to the requested
//! index, so a run of increasing indices triggers few reallocations. Empty
//! slots are part of the capacity: [`SlotTable::size`] reports slots, not
//! values.

use crate::error::{Error, Result};

/// Default number of slots added per growth step.
pub const DEFAULT_CHUNK: usize = 30;

/// Growable, explicitly nullable indexed container.
#[derive(Clone, Debug)]
pub struct SlotTable<T> {
    /// Number of slots added per growth step.
    chunk: usize,
    /// Slot storage; `None` is an empty slot.
    slots: Vec<Option<T>>,
    /// Number of occupied slots.
    occupied: usize,
}

impl<T> Default for SlotTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SlotTable<T> {
    /// Creates a table with one chunk of [`DEFAULT_CHUNK`] empty slots.
    #[must_use]
    pub fn new() -> Self {
        Self::with_chunk(DEFAULT_CHUNK)
    }

    /// Creates a table that grows `chunk` slots at a time.
    ///
    /// The table starts with one chunk of empty slots. A chunk of zero is
    /// treated as one.
    #[must_use]
    pub fn with_chunk(chunk: usize) -> Self {
        let chunk = chunk.max(1);
        let mut table = Self {
            chunk,
            slots: Vec::new(),
            occupied: 0,
        };
        table.grow(chunk);
        table
    }

    /// Returns the growth step of this table.
    #[must_use]
    pub fn chunk(&self) -> usize {
        self.chunk
    }

    /// Returns the capacity (number of slots, empty or not).
    #[must_use]
    pub fn size(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of occupied slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.occupied
    }

    /// Returns true if no slot holds a value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.occupied == 0
    }

    /// Appends `additional` empty slots.
    pub fn grow(&mut self, additional: usize) {
        let from = self.slots.len();
        self.slots.resize_with(from + additional, || None);
        tracing::trace!(from, to = self.slots.len(), "slot table grown");
    }

    /// Grows in whole chunks until `index` is within capacity.
    pub fn reserve(&mut self, index: usize) {
        let size = self.size();
        if index < size {
            return;
        }
        let missing = index + 1 - size;
        self.grow(missing.div_ceil(self.chunk) * self.chunk);
    }

    /// Stores `value` at `index`, growing if needed.
    ///
    /// Returns the value previously stored there, if any.
    pub fn set(&mut self, index: usize, value: T) -> Option<T> {
        self.reserve(index);
        let previous = self.slots[index].replace(value);
        if previous.is_none() {
            self.occupied += 1;
        }
        previous
    }

    /// Empties the slot at `index`, returning its value.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` if `index` is beyond capacity.
    pub fn unset(&mut self, index: usize) -> Result<Option<T>> {
        let size = self.size();
        let slot = self
            .slots
            .get_mut(index)
            .ok_or_else(|| Error::out_of_range(index, size))?;
        let previous = slot.take();
        if previous.is_some() {
            self.occupied -= 1;
        }
        Ok(previous)
    }

    /// Returns true if the slot at `index` holds a value.
    ///
    /// Never fails: indices beyond capacity are simply not set.
    #[must_use]
    pub fn is_set(&self, index: usize) -> bool {
        matches!(self.slots.get(index), Some(Some(_)))
    }

    /// Returns a reference to the value at `index`.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` beyond capacity and `NotFound` for an empty slot.
    pub fn get(&self, index: usize) -> Result<&T> {
        match self.slots.get(index) {
            Some(Some(value)) => Ok(value),
            Some(None) => Err(Error::not_found(index)),
            None => Err(Error::out_of_range(index, self.size())),
        }
    }

    /// Returns a mutable reference to the value at `index`.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` beyond capacity and `NotFound` for an empty slot.
    pub fn get_mut(&mut self, index: usize) -> Result<&mut T> {
        let size = self.size();
        match self.slots.get_mut(index) {
            Some(Some(value)) => Ok(value),
            Some(None) => Err(Error::not_found(index)),
            None => Err(Error::out_of_range(index, size)),
        }
    }

    /// Returns mutable references to several distinct occupied slots at once.
    ///
    /// References come back in the order of `indices`. Returns `None` if any
    /// index is empty, beyond capacity, or repeated.
    pub fn get_disjoint_mut(&mut self, indices: &[usize]) -> Option<Vec<&mut T>> {
        let highest = *indices.iter().max()?;
        let mut found: Vec<Option<&mut T>> = std::iter::repeat_with(|| None)
            .take(indices.len())
            .collect();

        for (index, slot) in self.slots.iter_mut().enumerate().take(highest + 1) {
            let Some(value) = slot.as_mut() else {
                continue;
            };
            let mut wanted_at = indices
                .iter()
                .enumerate()
                .filter(|&(_, &want)| want == index)
                .map(|(position, _)| position);
            if let Some(position) = wanted_at.next() {
                if wanted_at.next().is_some() {
                    return None;
                }
                found[position] = Some(value);
            }
        }

        found.into_iter().collect()
    }

    /// Drops every value and shrinks back to a single chunk.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.occupied = 0;
        self.grow(self.chunk);
    }

    /// Iterates over every slot in index order, empty ones included.
    ///
    /// The sequence is bounded by the capacity at the time of the call.
    pub fn iter(&self) -> impl Iterator<Item = (usize, Option<&T>)> + Clone + '_ {
        self.slots
            .iter()
            .enumerate()
            .map(|(index, slot)| (index, slot.as_ref()))
    }

    /// Iterates mutably over every slot in index order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, Option<&mut T>)> + '_ {
        self.slots
            .iter_mut()
            .enumerate()
            .map(|(index, slot)| (index, slot.as_mut()))
    }

    /// Iterates over occupied slots only.
    pub fn occupied(&self) -> impl Iterator<Item = (usize, &T)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|value| (index, value)))
    }
}
