// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Node and relationship evaluator: packs id, label, endpoints and properties
//! into one struct value. The value is NULL when the id is NULL.

use super::{active_positions, bound_state, resolve_result_state, ExpressionEvaluator};
use crate::exec::{ExecutionContext, ExecutionResult};
use crate::storage::Value;
use crate::types::LogicalType;
use crate::vector::{ResultSet, SelectionVector, StateId, ValueVector};

#[derive(Debug, Clone)]
pub struct NodeRelEvaluator {
    /// Field names aligned with `children`; the id comes first
    field_names: Vec<String>,
    children: Vec<ExpressionEvaluator>,
    result: ValueVector,
    state: Option<StateId>,
}

impl NodeRelEvaluator {
    pub fn new(
        data_type: LogicalType,
        field_names: Vec<String>,
        children: Vec<ExpressionEvaluator>,
    ) -> Self {
        debug_assert_eq!(field_names.len(), children.len());
        debug_assert!(matches!(data_type, LogicalType::Node | LogicalType::Rel));
        Self {
            field_names,
            children,
            result: ValueVector::new(data_type),
            state: None,
        }
    }

    pub(super) fn init(
        &mut self,
        result_set: &mut ResultSet,
        context: &ExecutionContext,
    ) -> ExecutionResult<()> {
        for child in &mut self.children {
            child.init(result_set, context)?;
        }
        let state = resolve_result_state(&self.children, result_set);
        self.result.set_state(state);
        self.state = Some(state);
        Ok(())
    }

    pub(super) fn evaluate(
        &mut self,
        result_set: &ResultSet,
        restrict: Option<&SelectionVector>,
    ) -> ExecutionResult<()> {
        for child in &mut self.children {
            child.evaluate_selected(result_set, restrict)?;
        }
        let positions = active_positions(result_set, self.result_state(), restrict);
        for pos in positions.iter() {
            let id = &self.children[0];
            if id.result_vector(result_set).is_null(id.input_pos(result_set, pos)) {
                self.result.set_null(pos, true);
                continue;
            }
            let fields = self
                .field_names
                .iter()
                .zip(&self.children)
                .map(|(name, child)| {
                    let value = child
                        .result_vector(result_set)
                        .get(child.input_pos(result_set, pos));
                    (name.clone(), value)
                })
                .collect();
            self.result.set(pos, &Value::Struct(fields))?;
        }
        Ok(())
    }

    pub(super) fn result_vector(&self) -> &ValueVector {
        &self.result
    }

    pub(super) fn result_state(&self) -> StateId {
        bound_state(self.state)
    }
}
