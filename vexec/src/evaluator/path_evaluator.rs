// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Path evaluator
//!
//! Builds `{_NODES: [...], _RELS: [...]}` from node, relationship and
//! recursive relationship children in declaration order. A recursive
//! relationship contributes its own node and relationship lists. A path
//! without relationships holds only its first node.

use super::{active_positions, bound_state, resolve_result_state, ExpressionEvaluator};
use crate::exec::{ExecutionContext, ExecutionResult};
use crate::storage::value::{NODES_FIELD, RELS_FIELD};
use crate::storage::Value;
use crate::types::LogicalType;
use crate::vector::{ResultSet, SelectionVector, StateId, ValueVector};

#[derive(Debug, Clone)]
pub struct PathEvaluator {
    children: Vec<ExpressionEvaluator>,
    result: ValueVector,
    state: Option<StateId>,
}

fn list_field(value: &Value, field: &str) -> Vec<Value> {
    value
        .struct_field(field)
        .and_then(Value::as_list)
        .map(<[Value]>::to_vec)
        .unwrap_or_default()
}

impl PathEvaluator {
    pub fn new(children: Vec<ExpressionEvaluator>) -> Self {
        Self {
            children,
            result: ValueVector::new(LogicalType::RecursiveRel),
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
            let path = self.build_path(result_set, pos);
            self.result.set(pos, &path)?;
        }
        Ok(())
    }

    fn build_path(&self, result_set: &ResultSet, pos: usize) -> Value {
        let mut nodes = Vec::new();
        let mut rels = Vec::new();
        let mut first_node = None;
        for child in &self.children {
            let value = child
                .result_vector(result_set)
                .get(child.input_pos(result_set, pos));
            match child.data_type() {
                LogicalType::Node => {
                    if first_node.is_none() {
                        first_node = Some(value.clone());
                    }
                    nodes.push(value);
                }
                LogicalType::Rel => rels.push(value),
                LogicalType::RecursiveRel => {
                    let inner_nodes = list_field(&value, NODES_FIELD);
                    if first_node.is_none() {
                        first_node = inner_nodes.first().cloned();
                    }
                    nodes.extend(inner_nodes);
                    rels.extend(list_field(&value, RELS_FIELD));
                }
                other => debug_assert!(false, "{} child in a path", other),
            }
        }
        if rels.is_empty() {
            nodes = first_node.into_iter().collect();
        }
        Value::Struct(vec![
            (NODES_FIELD.to_string(), Value::List(nodes)),
            (RELS_FIELD.to_string(), Value::List(rels)),
        ])
    }

    pub(super) fn result_vector(&self) -> &ValueVector {
        &self.result
    }

    pub(super) fn result_state(&self) -> StateId {
        bound_state(self.state)
    }
}
