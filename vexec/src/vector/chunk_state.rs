// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Chunk state shared by every vector of a data chunk
//!
//! States live in the arena of a [`ResultSet`](super::ResultSet) and are
//! addressed by [`StateId`]. Vectors that move together record the same id, so
//! updating the selection of a state updates the view of all of them at once.

use super::selection::SelectionVector;
use super::DEFAULT_VECTOR_CAPACITY;

/// Index of a state inside a result set's state arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateId(pub usize);

/// Flat means the chunk currently represents exactly one logical tuple
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FStateType {
    Flat,
    Unflat,
}

#[derive(Debug, Clone)]
pub struct DataChunkState {
    sel_vector: SelectionVector,
    f_state: FStateType,
}

impl DataChunkState {
    /// Unflat state with an empty selection
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_VECTOR_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            sel_vector: SelectionVector::new(capacity),
            f_state: FStateType::Unflat,
        }
    }

    /// Flat state selecting slot 0, used for literals and scalar results
    pub fn single_value() -> Self {
        let mut state = Self::new();
        state.init_original_and_selected_size(1);
        state.set_to_flat();
        state
    }

    pub fn init_original_and_selected_size(&mut self, size: usize) {
        self.sel_vector.set_to_unfiltered_with_size(size);
    }

    pub fn is_flat(&self) -> bool {
        self.f_state == FStateType::Flat
    }

    pub fn set_to_flat(&mut self) {
        self.f_state = FStateType::Flat;
    }

    pub fn set_to_unflat(&mut self) {
        self.f_state = FStateType::Unflat;
    }

    pub fn sel_vector(&self) -> &SelectionVector {
        &self.sel_vector
    }

    /// Mutable selection; changes are visible to every vector on this state
    pub fn sel_vector_mut(&mut self) -> &mut SelectionVector {
        &mut self.sel_vector
    }

    pub fn sel_size(&self) -> usize {
        self.sel_vector.sel_size()
    }
}

impl Default for DataChunkState {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot/reinstate helper for operators that overwrite a chunk's selection
///
/// A filtering operator saves the child's selection after pulling a batch and
/// restores it before pulling the next one, so the child always sees the
/// selection it produced itself.
#[derive(Debug, Clone)]
pub struct SelVectorOverwriter {
    prev: SelectionVector,
    saved: bool,
}

impl SelVectorOverwriter {
    pub fn new() -> Self {
        Self {
            prev: SelectionVector::new(DEFAULT_VECTOR_CAPACITY),
            saved: false,
        }
    }

    pub fn save(&mut self, state: &DataChunkState) {
        self.prev.copy_from(state.sel_vector());
        self.saved = true;
    }

    pub fn restore(&self, state: &mut DataChunkState) {
        if self.saved {
            state.sel_vector_mut().copy_from(&self.prev);
        }
    }

    /// Selection as produced by the child for the current batch
    pub fn saved_sel_vector(&self) -> Option<&SelectionVector> {
        self.saved.then_some(&self.prev)
    }
}

impl Default for SelVectorOverwriter {
    fn default() -> Self {
        Self::new()
    }
}
