// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Reference evaluator: reads a vector produced by an upstream operator

use super::bound_state;
use crate::types::LogicalType;
use crate::vector::{DataPos, ResultSet, StateId, ValueVector};

#[derive(Debug, Clone)]
pub struct ReferenceEvaluator {
    pos: DataPos,
    data_type: LogicalType,
    state: Option<StateId>,
}

impl ReferenceEvaluator {
    pub fn new(pos: DataPos, data_type: LogicalType) -> Self {
        Self {
            pos,
            data_type,
            state: None,
        }
    }

    pub fn data_pos(&self) -> DataPos {
        self.pos
    }

    pub(super) fn init(&mut self, result_set: &ResultSet) {
        debug_assert_eq!(
            result_set.vector(self.pos).data_type(),
            &self.data_type,
            "reference bound to a vector of another type"
        );
        self.state = Some(result_set.chunk_state_id(self.pos.chunk_pos));
    }

    pub(super) fn result_vector<'a>(&self, result_set: &'a ResultSet) -> &'a ValueVector {
        result_set.vector(self.pos)
    }

    pub(super) fn result_state(&self) -> StateId {
        bound_state(self.state)
    }

    pub(super) fn data_type(&self) -> &LogicalType {
        &self.data_type
    }
}
