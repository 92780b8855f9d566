// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! CASE evaluator
//!
//! Alternatives are tried in declaration order. Each WHEN is selected over the
//! output positions no earlier alternative has filled, its THEN is evaluated
//! only at the positions it selected, and those positions are marked in the
//! `filled` mask. Evaluation stops once every output position is filled; the
//! ELSE branch fills whatever remains. Every output slot is written exactly
//! once per batch.

use super::{active_positions, bound_state, resolve_result_state, ExpressionEvaluator};
use crate::exec::{ExecutionContext, ExecutionResult};
use crate::types::LogicalType;
use crate::vector::{
    BitMask, ResultSet, SelectionVector, StateId, ValueVector, DEFAULT_VECTOR_CAPACITY,
};

#[derive(Debug, Clone)]
pub struct CaseAlternativeEvaluator {
    pub when: ExpressionEvaluator,
    pub then: ExpressionEvaluator,
    /// Positions the WHEN selected in the current batch
    when_sel: SelectionVector,
}

impl CaseAlternativeEvaluator {
    pub fn new(when: ExpressionEvaluator, then: ExpressionEvaluator) -> Self {
        Self {
            when,
            then,
            when_sel: SelectionVector::new(DEFAULT_VECTOR_CAPACITY),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CaseEvaluator {
    alternatives: Vec<CaseAlternativeEvaluator>,
    else_evaluator: Box<ExpressionEvaluator>,
    result: ValueVector,
    state: Option<StateId>,
    filled: BitMask,
    /// Output positions of the current batch
    out_sel: SelectionVector,
    /// Output positions no alternative has matched yet
    remaining_sel: SelectionVector,
}

/// Copy `source` into the unfilled output slot `pos`
fn fill_entry(
    result: &mut ValueVector,
    filled: &mut BitMask,
    source: &ValueVector,
    source_pos: usize,
    pos: usize,
) {
    debug_assert!(!filled.is_set(pos), "CASE output slot {} written twice", pos);
    result.copy_from_vector(pos, source, source_pos);
    filled.set(pos, true);
}

impl CaseEvaluator {
    pub fn new(
        alternatives: Vec<CaseAlternativeEvaluator>,
        else_evaluator: ExpressionEvaluator,
        data_type: LogicalType,
    ) -> Self {
        Self {
            alternatives,
            else_evaluator: Box::new(else_evaluator),
            result: ValueVector::new(data_type),
            state: None,
            filled: BitMask::new(DEFAULT_VECTOR_CAPACITY),
            out_sel: SelectionVector::new(DEFAULT_VECTOR_CAPACITY),
            remaining_sel: SelectionVector::new(DEFAULT_VECTOR_CAPACITY),
        }
    }

    pub fn num_alternatives(&self) -> usize {
        self.alternatives.len()
    }

    pub(super) fn init(
        &mut self,
        result_set: &mut ResultSet,
        context: &ExecutionContext,
    ) -> ExecutionResult<()> {
        for alternative in &mut self.alternatives {
            alternative.when.init(result_set, context)?;
            alternative.then.init(result_set, context)?;
        }
        self.else_evaluator.init(result_set, context)?;
        let children = self
            .alternatives
            .iter()
            .flat_map(|alt| [&alt.when, &alt.then])
            .chain(std::iter::once(self.else_evaluator.as_ref()));
        let state = resolve_result_state(children, result_set);
        self.result.set_state(state);
        self.state = Some(state);
        Ok(())
    }

    pub(super) fn evaluate(
        &mut self,
        result_set: &ResultSet,
        restrict: Option<&SelectionVector>,
    ) -> ExecutionResult<()> {
        let state = self.result_state();
        let Self {
            alternatives,
            else_evaluator,
            result,
            filled,
            out_sel,
            remaining_sel,
            ..
        } = self;

        out_sel.copy_from(active_positions(result_set, state, restrict));
        let num_out = out_sel.sel_size();
        filled.clear_all();
        let mut num_filled = 0;

        for alternative in alternatives.iter_mut() {
            if num_filled == num_out {
                break;
            }
            alternative.when_sel.copy_from(out_sel);
            alternative.when_sel.retain(|pos| !filled.is_set(pos));
            remaining_sel.copy_from(&alternative.when_sel);
            if !alternative
                .when
                .select(result_set, &mut alternative.when_sel, true)?
            {
                continue;
            }
            let when_is_flat = alternative.when.is_result_flat(result_set);
            // A flat WHEN leaves its selection untouched: all remaining rows match
            alternative
                .then
                .evaluate_selected(result_set, Some(&alternative.when_sel))?;
            let then_vector = alternative.then.result_vector(result_set);
            let then_flat_pos = alternative.then.flat_pos(result_set);
            let matched: &SelectionVector = if when_is_flat {
                &*remaining_sel
            } else {
                &alternative.when_sel
            };
            for pos in matched.iter() {
                fill_entry(result, filled, then_vector, then_flat_pos.unwrap_or(pos), pos);
                num_filled += 1;
            }
        }

        if num_filled < num_out {
            remaining_sel.copy_from(out_sel);
            remaining_sel.retain(|pos| !filled.is_set(pos));
            else_evaluator.evaluate_selected(result_set, Some(&*remaining_sel))?;
            let else_vector = else_evaluator.result_vector(result_set);
            let else_flat_pos = else_evaluator.flat_pos(result_set);
            for pos in remaining_sel.iter() {
                fill_entry(result, filled, else_vector, else_flat_pos.unwrap_or(pos), pos);
            }
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
