// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Result sets: the per-pipeline set of data chunks plus the chunk-state arena

use super::chunk_state::{DataChunkState, StateId};
use super::value_vector::ValueVector;
use crate::types::LogicalType;

/// Position of a vector inside a result set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DataPos {
    pub chunk_pos: usize,
    pub vector_pos: usize,
}

impl DataPos {
    pub fn new(chunk_pos: usize, vector_pos: usize) -> Self {
        Self {
            chunk_pos,
            vector_pos,
        }
    }
}

/// Layout of one data chunk
#[derive(Debug, Clone, Default)]
pub struct DataChunkDescriptor {
    pub types: Vec<LogicalType>,
    /// Chunk starts flat (one tuple at a time)
    pub single_state: bool,
}

impl DataChunkDescriptor {
    pub fn new(types: Vec<LogicalType>) -> Self {
        Self {
            types,
            single_state: false,
        }
    }

    pub fn flat(types: Vec<LogicalType>) -> Self {
        Self {
            types,
            single_state: true,
        }
    }
}

/// Layout of every chunk of a pipeline's result set
#[derive(Debug, Clone, Default)]
pub struct ResultSetDescriptor {
    pub chunks: Vec<DataChunkDescriptor>,
}

impl ResultSetDescriptor {
    pub fn new(chunks: Vec<DataChunkDescriptor>) -> Self {
        Self { chunks }
    }
}

/// Vectors that share a single chunk state
#[derive(Debug, Clone)]
pub struct DataChunk {
    state: StateId,
    vectors: Vec<ValueVector>,
}

impl DataChunk {
    pub fn state(&self) -> StateId {
        self.state
    }

    pub fn num_vectors(&self) -> usize {
        self.vectors.len()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    chunks: Vec<DataChunk>,
    states: Vec<DataChunkState>,
}

impl ResultSet {
    pub fn new(descriptor: &ResultSetDescriptor) -> Self {
        let mut result_set = Self::default();
        for chunk in &descriptor.chunks {
            let mut state = DataChunkState::new();
            if chunk.single_state {
                state.set_to_flat();
            }
            let state_id = result_set.add_state(state);
            let vectors = chunk
                .types
                .iter()
                .map(|ty| {
                    let mut vector = ValueVector::new(ty.clone());
                    vector.set_state(state_id);
                    vector
                })
                .collect();
            result_set.chunks.push(DataChunk {
                state: state_id,
                vectors,
            });
        }
        result_set
    }

    /// Register a state that is not owned by any chunk (evaluator results)
    pub fn add_state(&mut self, state: DataChunkState) -> StateId {
        self.states.push(state);
        StateId(self.states.len() - 1)
    }

    pub fn num_chunks(&self) -> usize {
        self.chunks.len()
    }

    pub fn chunk(&self, chunk_pos: usize) -> &DataChunk {
        &self.chunks[chunk_pos]
    }

    pub fn chunk_state_id(&self, chunk_pos: usize) -> StateId {
        self.chunks[chunk_pos].state
    }

    pub fn state(&self, id: StateId) -> &DataChunkState {
        &self.states[id.0]
    }

    pub fn state_mut(&mut self, id: StateId) -> &mut DataChunkState {
        &mut self.states[id.0]
    }

    pub fn chunk_state(&self, chunk_pos: usize) -> &DataChunkState {
        self.state(self.chunk_state_id(chunk_pos))
    }

    pub fn chunk_state_mut(&mut self, chunk_pos: usize) -> &mut DataChunkState {
        let id = self.chunk_state_id(chunk_pos);
        self.state_mut(id)
    }

    pub fn vector(&self, pos: DataPos) -> &ValueVector {
        &self.chunks[pos.chunk_pos].vectors[pos.vector_pos]
    }

    pub fn vector_mut(&mut self, pos: DataPos) -> &mut ValueVector {
        &mut self.chunks[pos.chunk_pos].vectors[pos.vector_pos]
    }

    /// State of the chunk holding the vector at `pos`
    pub fn vector_state(&self, pos: DataPos) -> &DataChunkState {
        self.chunk_state(pos.chunk_pos)
    }

    /// Disjoint mutable access to a chunk's vectors and its state
    pub fn chunk_parts_mut(&mut self, chunk_pos: usize) -> (&mut [ValueVector], &mut DataChunkState) {
        let chunk = &mut self.chunks[chunk_pos];
        (&mut chunk.vectors, &mut self.states[chunk.state.0])
    }
}

/// Mutable references to several distinct vectors of one chunk, in the order
/// of `positions`
pub fn pick_vectors_mut<'a>(
    vectors: &'a mut [ValueVector],
    positions: &[usize],
) -> Vec<&'a mut ValueVector> {
    let mut slots: Vec<Option<&'a mut ValueVector>> = vectors.iter_mut().map(Some).collect();
    positions
        .iter()
        .filter_map(|&pos| {
            let picked = slots.get_mut(pos).and_then(Option::take);
            debug_assert!(picked.is_some(), "vector {} picked twice or missing", pos);
            picked
        })
        .collect()
}
