// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! List lambdas: `list_transform`, `list_filter`, `list_any`, `list_all`
//!
//! The lambda body runs in a private result set with a single chunk whose
//! only vector holds the lambda parameter. For each list, its elements are
//! loaded into that vector in batches and the body is evaluated over them.

use super::{active_positions, bound_state, resolve_result_state, ExpressionEvaluator};
use crate::exec::{ExecutionContext, ExecutionError, ExecutionResult};
use crate::expression::LambdaKind;
use crate::storage::Value;
use crate::types::LogicalType;
use crate::vector::{
    DataChunkDescriptor, DataPos, ResultSet, ResultSetDescriptor, SelectionVector, StateId,
    ValueVector, DEFAULT_VECTOR_CAPACITY,
};

/// Slot of the lambda parameter in the lambda's private result set
const PARAM_POS: DataPos = DataPos {
    chunk_pos: 0,
    vector_pos: 0,
};

/// Reads the parameter of the enclosing lambda
#[derive(Debug, Clone)]
pub struct LambdaParamEvaluator {
    name: String,
    data_type: LogicalType,
    state: Option<StateId>,
}

impl LambdaParamEvaluator {
    pub fn new(name: impl Into<String>, data_type: LogicalType) -> Self {
        Self {
            name: name.into(),
            data_type,
            state: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(super) fn init(&mut self, result_set: &ResultSet) {
        self.state = Some(result_set.chunk_state_id(PARAM_POS.chunk_pos));
    }

    pub(super) fn result_vector<'a>(&self, result_set: &'a ResultSet) -> &'a ValueVector {
        result_set.vector(PARAM_POS)
    }

    pub(super) fn result_state(&self) -> StateId {
        bound_state(self.state)
    }

    pub(super) fn data_type(&self) -> &LogicalType {
        &self.data_type
    }
}

#[derive(Debug, Clone)]
pub struct ListLambdaEvaluator {
    kind: LambdaKind,
    list: Box<ExpressionEvaluator>,
    body: Box<ExpressionEvaluator>,
    lambda_result_set: ResultSet,
    result: ValueVector,
    state: Option<StateId>,
}

impl ListLambdaEvaluator {
    pub fn new(
        kind: LambdaKind,
        list: ExpressionEvaluator,
        body: ExpressionEvaluator,
        data_type: LogicalType,
    ) -> ExecutionResult<Self> {
        let element_type = list.data_type().child_type().cloned().ok_or_else(|| {
            ExecutionError::InvalidPlan(format!(
                "{} over a non-list argument of type {}",
                kind.function_name(),
                list.data_type()
            ))
        })?;
        let descriptor =
            ResultSetDescriptor::new(vec![DataChunkDescriptor::new(vec![element_type])]);
        Ok(Self {
            kind,
            list: Box::new(list),
            body: Box::new(body),
            lambda_result_set: ResultSet::new(&descriptor),
            result: ValueVector::new(data_type),
            state: None,
        })
    }

    pub(super) fn init(
        &mut self,
        result_set: &mut ResultSet,
        context: &ExecutionContext,
    ) -> ExecutionResult<()> {
        self.list.init(result_set, context)?;
        self.body.init(&mut self.lambda_result_set, context)?;
        let state = resolve_result_state(std::iter::once(self.list.as_ref()), result_set);
        self.result.set_state(state);
        self.state = Some(state);
        Ok(())
    }

    pub(super) fn evaluate(
        &mut self,
        result_set: &ResultSet,
        restrict: Option<&SelectionVector>,
    ) -> ExecutionResult<()> {
        self.list.evaluate_selected(result_set, restrict)?;
        let positions = active_positions(result_set, self.result_state(), restrict);
        for pos in positions.iter() {
            let list_pos = self.list.input_pos(result_set, pos);
            let list = self.list.result_vector(result_set).get(list_pos);
            let value = match list.as_list() {
                Some(items) => self.apply(items)?,
                None => Value::Null,
            };
            self.result.set(pos, &value)?;
        }
        Ok(())
    }

    fn apply(&mut self, items: &[Value]) -> ExecutionResult<Value> {
        let mut transformed = Vec::new();
        let mut kept = Vec::new();
        for batch in items.chunks(DEFAULT_VECTOR_CAPACITY) {
            {
                let param = self.lambda_result_set.vector_mut(PARAM_POS);
                for (i, item) in batch.iter().enumerate() {
                    param.set(i, item)?;
                }
            }
            self.lambda_result_set
                .chunk_state_mut(PARAM_POS.chunk_pos)
                .init_original_and_selected_size(batch.len());
            self.body.evaluate(&self.lambda_result_set)?;

            let body_result = self.body.result_vector(&self.lambda_result_set);
            for (i, item) in batch.iter().enumerate() {
                let body_pos = self.body.input_pos(&self.lambda_result_set, i);
                match self.kind {
                    LambdaKind::Transform => transformed.push(body_result.get(body_pos)),
                    LambdaKind::Filter => {
                        if body_result.is_true(body_pos) {
                            kept.push(item.clone());
                        }
                    }
                    LambdaKind::Any => {
                        if body_result.is_true(body_pos) {
                            return Ok(Value::Bool(true));
                        }
                    }
                    LambdaKind::All => {
                        if !body_result.is_true(body_pos) {
                            return Ok(Value::Bool(false));
                        }
                    }
                }
            }
        }
        Ok(match self.kind {
            LambdaKind::Transform => Value::List(transformed),
            LambdaKind::Filter => Value::List(kept),
            LambdaKind::Any => Value::Bool(false),
            LambdaKind::All => Value::Bool(true),
        })
    }

    pub(super) fn result_vector(&self) -> &ValueVector {
        &self.result
    }

    pub(super) fn result_state(&self) -> StateId {
        bound_state(self.state)
    }
}
