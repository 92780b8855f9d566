// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Filter operators
//!
//! Both filters narrow the selection of one chunk in place. Before pulling the
//! next batch they restore the selection the child produced, so the child
//! never observes a selection it did not write. Batches with no qualifying
//! tuple are consumed internally; a filter only returns non-empty batches.

use super::operator::{OperatorMetrics, PhysicalOperator};
use crate::evaluator::{ExpressionEvaluator, ExpressionMapper};
use crate::exec::{ExecutionContext, ExecutionResult};
use crate::expression::Expression;
use crate::types::{InternalId, TableId};
use crate::vector::{
    DataPos, ResultSet, SelVectorOverwriter, SelectionVector, DEFAULT_VECTOR_CAPACITY,
};
use std::collections::HashSet;

/// Keep the tuples of `chunk_pos` for which a boolean expression is true
#[derive(Debug)]
pub struct Filter {
    expression: Expression,
    evaluator: ExpressionEvaluator,
    chunk_pos: usize,
    child: Box<dyn PhysicalOperator>,
    overwriter: SelVectorOverwriter,
    /// Scratch copy of the child selection the evaluator narrows
    working_sel: SelectionVector,
    metrics: OperatorMetrics,
}

impl Filter {
    pub fn new(
        expression: Expression,
        chunk_pos: usize,
        child: Box<dyn PhysicalOperator>,
    ) -> ExecutionResult<Self> {
        let evaluator = ExpressionMapper::map_expression(&expression)?;
        Ok(Self {
            expression,
            evaluator,
            chunk_pos,
            child,
            overwriter: SelVectorOverwriter::new(),
            working_sel: SelectionVector::new(DEFAULT_VECTOR_CAPACITY),
            metrics: OperatorMetrics::default(),
        })
    }

    pub fn expression(&self) -> &Expression {
        &self.expression
    }
}

impl PhysicalOperator for Filter {
    fn name(&self) -> &str {
        "FILTER"
    }

    fn init_global_state(&self, context: &ExecutionContext) -> ExecutionResult<()> {
        self.child.init_global_state(context)
    }

    fn init_local_state(
        &mut self,
        result_set: &mut ResultSet,
        context: &ExecutionContext,
    ) -> ExecutionResult<()> {
        self.child.init_local_state(result_set, context)?;
        self.evaluator.init(result_set, context)
    }

    fn get_next_tuple(
        &mut self,
        result_set: &mut ResultSet,
        context: &ExecutionContext,
    ) -> ExecutionResult<bool> {
        loop {
            self.overwriter
                .restore(result_set.chunk_state_mut(self.chunk_pos));
            if !self.child.get_next_tuple(result_set, context)? {
                log::debug!("{} [{}]", self.name(), self.expression);
                self.metrics.log_finished(self.name(), context.worker_id);
                return Ok(false);
            }
            let state = result_set.chunk_state(self.chunk_pos);
            self.overwriter.save(state);
            self.working_sel.copy_from(state.sel_vector());
            let is_flat = state.is_flat();

            if !self
                .evaluator
                .select(result_set, &mut self.working_sel, !is_flat)?
            {
                continue;
            }
            let state = result_set.chunk_state_mut(self.chunk_pos);
            if !is_flat {
                state.sel_vector_mut().copy_from(&self.working_sel);
            }
            self.metrics.record_batch(state.sel_size());
            return Ok(true);
        }
    }

    fn clone_box(&self) -> Box<dyn PhysicalOperator> {
        Box::new(Self {
            expression: self.expression.clone(),
            evaluator: self.evaluator.clone(),
            chunk_pos: self.chunk_pos,
            child: self.child.clone_box(),
            overwriter: SelVectorOverwriter::new(),
            working_sel: SelectionVector::new(DEFAULT_VECTOR_CAPACITY),
            metrics: OperatorMetrics::default(),
        })
    }

    fn metrics(&self) -> &OperatorMetrics {
        &self.metrics
    }
}

/// Keep the tuples whose node id belongs to one of a set of tables
#[derive(Debug)]
pub struct NodeLabelFilter {
    node_id_pos: DataPos,
    table_ids: HashSet<TableId>,
    child: Box<dyn PhysicalOperator>,
    overwriter: SelVectorOverwriter,
    metrics: OperatorMetrics,
}

impl NodeLabelFilter {
    pub fn new(
        node_id_pos: DataPos,
        table_ids: HashSet<TableId>,
        child: Box<dyn PhysicalOperator>,
    ) -> Self {
        Self {
            node_id_pos,
            table_ids,
            child,
            overwriter: SelVectorOverwriter::new(),
            metrics: OperatorMetrics::default(),
        }
    }
}

impl PhysicalOperator for NodeLabelFilter {
    fn name(&self) -> &str {
        "NODE_LABEL_FILTER"
    }

    fn init_global_state(&self, context: &ExecutionContext) -> ExecutionResult<()> {
        self.child.init_global_state(context)
    }

    fn init_local_state(
        &mut self,
        result_set: &mut ResultSet,
        context: &ExecutionContext,
    ) -> ExecutionResult<()> {
        self.child.init_local_state(result_set, context)
    }

    fn get_next_tuple(
        &mut self,
        result_set: &mut ResultSet,
        context: &ExecutionContext,
    ) -> ExecutionResult<bool> {
        let chunk_pos = self.node_id_pos.chunk_pos;
        loop {
            self.overwriter
                .restore(result_set.chunk_state_mut(chunk_pos));
            if !self.child.get_next_tuple(result_set, context)? {
                self.metrics.log_finished(self.name(), context.worker_id);
                return Ok(false);
            }
            self.overwriter.save(result_set.chunk_state(chunk_pos));

            let table_ids = &self.table_ids;
            let (vectors, state) = result_set.chunk_parts_mut(chunk_pos);
            let ids = &vectors[self.node_id_pos.vector_pos];
            let matches = |pos: usize| {
                !ids.is_null(pos) && table_ids.contains(&ids.get_value::<InternalId>(pos).table_id)
            };
            let num_selected = if state.is_flat() {
                usize::from(matches(state.sel_vector().get(0)))
            } else {
                state.sel_vector_mut().retain(matches)
            };
            if num_selected > 0 {
                self.metrics.record_batch(num_selected);
                return Ok(true);
            }
        }
    }

    fn clone_box(&self) -> Box<dyn PhysicalOperator> {
        Box::new(Self::new(
            self.node_id_pos,
            self.table_ids.clone(),
            self.child.clone_box(),
        ))
    }

    fn metrics(&self) -> &OperatorMetrics {
        &self.metrics
    }
}
