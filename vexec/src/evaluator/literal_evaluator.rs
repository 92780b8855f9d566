// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Literal evaluator: a constant broadcast through a single-value flat state

use super::bound_state;
use crate::exec::ExecutionResult;
use crate::storage::Value;
use crate::types::LogicalType;
use crate::vector::{DataChunkState, ResultSet, StateId, ValueVector};

#[derive(Debug, Clone)]
pub struct LiteralEvaluator {
    value: Value,
    result: ValueVector,
    state: Option<StateId>,
}

impl LiteralEvaluator {
    pub fn new(value: Value, data_type: LogicalType) -> Self {
        Self {
            value,
            result: ValueVector::with_capacity(data_type, 1),
            state: None,
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Allocates the single-value state and writes the constant once
    pub(super) fn init(&mut self, result_set: &mut ResultSet) -> ExecutionResult<()> {
        let state = result_set.add_state(DataChunkState::single_value());
        self.result.set_state(state);
        self.result.set(0, &self.value)?;
        self.state = Some(state);
        Ok(())
    }

    pub(super) fn result_vector(&self) -> &ValueVector {
        &self.result
    }

    pub(super) fn result_state(&self) -> StateId {
        bound_state(self.state)
    }
}
