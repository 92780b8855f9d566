// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Function evaluator: runs a scalar function over its evaluated children

use super::{active_positions, bound_state, resolve_result_state, ExpressionEvaluator};
use crate::exec::{ExecutionContext, ExecutionResult};
use crate::functions::{execute_function, ScalarFunction};
use crate::types::LogicalType;
use crate::vector::{ResultSet, SelectionVector, StateId, ValueVector};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct FunctionEvaluator {
    function: Arc<dyn ScalarFunction>,
    children: Vec<ExpressionEvaluator>,
    result: ValueVector,
    state: Option<StateId>,
}

impl FunctionEvaluator {
    pub fn new(
        function: Arc<dyn ScalarFunction>,
        children: Vec<ExpressionEvaluator>,
        return_type: LogicalType,
    ) -> Self {
        Self {
            function,
            children,
            result: ValueVector::new(return_type),
            state: None,
        }
    }

    pub fn function_name(&self) -> &str {
        self.function.name()
    }

    pub fn children(&self) -> &[ExpressionEvaluator] {
        &self.children
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
        let inputs: Vec<_> = self
            .children
            .iter()
            .map(|child| child.as_input(result_set))
            .collect();
        execute_function(self.function.as_ref(), &inputs, positions, &mut self.result)?;
        Ok(())
    }

    pub(super) fn result_vector(&self) -> &ValueVector {
        &self.result
    }

    pub(super) fn result_state(&self) -> StateId {
        bound_state(self.state)
    }
}
