// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Selection vectors
//!
//! A selection vector lists the slots of a chunk that are logically present.
//! In *unfiltered* mode it is the identity `0..size` and the backing buffer is
//! ignored; in *filtered* mode the first `size` buffer entries are the slots.
//! Consumers must only go through [`SelectionVector::sel_size`] and
//! [`SelectionVector::get`]; positions are not guaranteed to be contiguous or
//! sorted.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SelectionMode {
    Unfiltered,
    Filtered,
}

#[derive(Debug, Clone)]
pub struct SelectionVector {
    positions: Vec<usize>,
    size: usize,
    mode: SelectionMode,
}

impl SelectionVector {
    /// Create an unfiltered, empty selection able to address `capacity` slots
    pub fn new(capacity: usize) -> Self {
        Self {
            positions: vec![0; capacity],
            size: 0,
            mode: SelectionMode::Unfiltered,
        }
    }

    pub fn capacity(&self) -> usize {
        self.positions.len()
    }

    pub fn is_unfiltered(&self) -> bool {
        self.mode == SelectionMode::Unfiltered
    }

    pub fn set_to_unfiltered(&mut self) {
        self.mode = SelectionMode::Unfiltered;
    }

    pub fn set_to_unfiltered_with_size(&mut self, size: usize) {
        debug_assert!(size <= self.capacity());
        self.mode = SelectionMode::Unfiltered;
        self.size = size;
    }

    /// Switch to filtered mode; the buffer is expected to hold the positions
    pub fn set_to_filtered(&mut self) {
        self.mode = SelectionMode::Filtered;
    }

    pub fn set_to_filtered_with_size(&mut self, size: usize) {
        debug_assert!(size <= self.capacity());
        self.mode = SelectionMode::Filtered;
        self.size = size;
    }

    pub fn sel_size(&self) -> usize {
        self.size
    }

    /// Truncate or extend the logical size without reallocating
    pub fn set_sel_size(&mut self, size: usize) {
        debug_assert!(size <= self.capacity());
        self.size = size;
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Slot of the `i`-th selected tuple
    #[inline]
    pub fn get(&self, i: usize) -> usize {
        debug_assert!(i < self.size, "selection index {} >= size {}", i, self.size);
        match self.mode {
            SelectionMode::Unfiltered => i,
            SelectionMode::Filtered => self.positions[i],
        }
    }

    /// Writable position buffer; callers switch to filtered mode afterwards
    pub fn mutable_buffer(&mut self) -> &mut [usize] {
        &mut self.positions
    }

    /// Mark the slots `start..start + size` as selected
    pub fn set_range(&mut self, start: usize, size: usize) {
        debug_assert!(start + size <= self.capacity());
        if start == 0 {
            self.set_to_unfiltered_with_size(size);
            return;
        }
        for (i, slot) in self.positions[..size].iter_mut().enumerate() {
            *slot = start + i;
        }
        self.set_to_filtered_with_size(size);
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.size).map(move |i| self.get(i))
    }

    /// Overwrite this selection with `other` without reallocating
    pub fn copy_from(&mut self, other: &SelectionVector) {
        debug_assert!(other.size <= self.capacity());
        self.size = other.size;
        self.mode = other.mode;
        if other.mode == SelectionMode::Filtered {
            self.positions[..other.size].copy_from_slice(&other.positions[..other.size]);
        }
    }

    /// Keep only the selected positions for which `keep` returns true
    pub fn retain<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(usize) -> bool,
    {
        let mut num_selected = 0;
        for i in 0..self.size {
            let pos = self.get(i);
            if keep(pos) {
                self.positions[num_selected] = pos;
                num_selected += 1;
            }
        }
        self.set_to_filtered_with_size(num_selected);
        num_selected
    }
}
