// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Columnar batch model shared by evaluators and operators
//!
//! - [`ValueVector`]: typed column buffer with a null mask
//! - [`SelectionVector`]: which slots of a batch are logically present
//! - [`DataChunkState`]: selection + flat flag shared by a chunk's vectors
//! - [`ResultSet`]: the chunks of one pipeline plus the state arena

pub mod bitmask;
pub mod chunk_state;
pub mod result_set;
pub mod selection;
pub mod value_vector;

pub use bitmask::BitMask;
pub use chunk_state::{DataChunkState, FStateType, SelVectorOverwriter, StateId};
pub use result_set::{
    pick_vectors_mut, DataChunk, DataChunkDescriptor, DataPos, ResultSet, ResultSetDescriptor,
};
pub use selection::SelectionVector;
pub use value_vector::{PrimitiveValue, ValueVector};

/// Number of slots in every vector, selection vector and bitmask
pub const DEFAULT_VECTOR_CAPACITY: usize = 2048;
