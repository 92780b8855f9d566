// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Expression evaluators
//!
//! An [`ExpressionEvaluator`] computes one bound expression over the current
//! batch of a [`ResultSet`]. Its result vector shares a chunk state with its
//! inputs: a reference evaluates in the state of the chunk it reads, a
//! function or CASE evaluates in the state of its first unflat child, and a
//! tree whose inputs are all flat evaluates in a private single-value state.
//!
//! Lifecycle per pipeline copy: [`ExpressionEvaluator::init`] once, then
//! [`ExpressionEvaluator::evaluate`] or [`ExpressionEvaluator::select`] per
//! batch.

mod case_evaluator;
mod expression_mapper;
mod function_evaluator;
mod lambda_evaluator;
mod literal_evaluator;
mod node_rel_evaluator;
mod path_evaluator;
mod reference_evaluator;

pub use case_evaluator::{CaseAlternativeEvaluator, CaseEvaluator};
pub use expression_mapper::ExpressionMapper;
pub use function_evaluator::FunctionEvaluator;
pub use lambda_evaluator::{LambdaParamEvaluator, ListLambdaEvaluator};
pub use literal_evaluator::LiteralEvaluator;
pub use node_rel_evaluator::NodeRelEvaluator;
pub use path_evaluator::PathEvaluator;
pub use reference_evaluator::ReferenceEvaluator;

use crate::exec::{ExecutionContext, ExecutionResult};
use crate::functions::FunctionInput;
use crate::types::LogicalType;
use crate::vector::{DataChunkState, ResultSet, SelectionVector, StateId, ValueVector};

#[derive(Debug, Clone)]
pub enum ExpressionEvaluator {
    Literal(LiteralEvaluator),
    Reference(ReferenceEvaluator),
    Case(CaseEvaluator),
    Function(FunctionEvaluator),
    Path(PathEvaluator),
    NodeRel(NodeRelEvaluator),
    LambdaParam(LambdaParamEvaluator),
    ListLambda(ListLambdaEvaluator),
}

impl ExpressionEvaluator {
    /// Bind the evaluator tree to `result_set` and resolve result states
    pub fn init(
        &mut self,
        result_set: &mut ResultSet,
        context: &ExecutionContext,
    ) -> ExecutionResult<()> {
        match self {
            ExpressionEvaluator::Literal(e) => e.init(result_set),
            ExpressionEvaluator::Reference(e) => {
                e.init(result_set);
                Ok(())
            }
            ExpressionEvaluator::Case(e) => e.init(result_set, context),
            ExpressionEvaluator::Function(e) => e.init(result_set, context),
            ExpressionEvaluator::Path(e) => e.init(result_set, context),
            ExpressionEvaluator::NodeRel(e) => e.init(result_set, context),
            ExpressionEvaluator::LambdaParam(e) => {
                e.init(result_set);
                Ok(())
            }
            ExpressionEvaluator::ListLambda(e) => e.init(result_set, context),
        }
    }

    /// Fill the result vector for every selected position of the result state
    pub fn evaluate(&mut self, result_set: &ResultSet) -> ExecutionResult<()> {
        self.evaluate_selected(result_set, None)
    }

    /// Like [`evaluate`](Self::evaluate), computing an unflat result only at
    /// the positions of `restrict`. Flat results ignore the restriction.
    pub(crate) fn evaluate_selected(
        &mut self,
        result_set: &ResultSet,
        restrict: Option<&SelectionVector>,
    ) -> ExecutionResult<()> {
        match self {
            ExpressionEvaluator::Literal(_)
            | ExpressionEvaluator::Reference(_)
            | ExpressionEvaluator::LambdaParam(_) => Ok(()),
            ExpressionEvaluator::Case(e) => e.evaluate(result_set, restrict),
            ExpressionEvaluator::Function(e) => e.evaluate(result_set, restrict),
            ExpressionEvaluator::Path(e) => e.evaluate(result_set, restrict),
            ExpressionEvaluator::NodeRel(e) => e.evaluate(result_set, restrict),
            ExpressionEvaluator::ListLambda(e) => e.evaluate(result_set, restrict),
        }
    }

    /// Narrow `sel` to the positions whose boolean result is true and non-NULL
    ///
    /// Returns whether at least one position qualifies. A flat result is
    /// decided once for the whole batch and `sel` is left untouched. With
    /// `set_filtered` the selection is switched to filtered mode; without it
    /// the caller must pass a selection that is already filtered.
    pub fn select(
        &mut self,
        result_set: &ResultSet,
        sel: &mut SelectionVector,
        set_filtered: bool,
    ) -> ExecutionResult<bool> {
        self.evaluate_selected(result_set, Some(&*sel))?;
        let result = self.result_vector(result_set);
        if let Some(pos) = self.flat_pos(result_set) {
            return Ok(result.is_true(pos));
        }
        let size = sel.sel_size();
        let mut num_selected = 0;
        for i in 0..size {
            let pos = sel.get(i);
            if result.is_true(pos) {
                sel.mutable_buffer()[num_selected] = pos;
                num_selected += 1;
            }
        }
        if set_filtered {
            sel.set_to_filtered_with_size(num_selected);
        } else {
            debug_assert!(
                !sel.is_unfiltered() || num_selected == size,
                "compacting an unfiltered selection without switching it to filtered"
            );
            sel.set_sel_size(num_selected);
        }
        Ok(num_selected > 0)
    }

    pub fn result_vector<'a>(&'a self, result_set: &'a ResultSet) -> &'a ValueVector {
        match self {
            ExpressionEvaluator::Literal(e) => e.result_vector(),
            ExpressionEvaluator::Reference(e) => e.result_vector(result_set),
            ExpressionEvaluator::Case(e) => e.result_vector(),
            ExpressionEvaluator::Function(e) => e.result_vector(),
            ExpressionEvaluator::Path(e) => e.result_vector(),
            ExpressionEvaluator::NodeRel(e) => e.result_vector(),
            ExpressionEvaluator::LambdaParam(e) => e.result_vector(result_set),
            ExpressionEvaluator::ListLambda(e) => e.result_vector(),
        }
    }

    pub fn result_state(&self) -> StateId {
        match self {
            ExpressionEvaluator::Literal(e) => e.result_state(),
            ExpressionEvaluator::Reference(e) => e.result_state(),
            ExpressionEvaluator::Case(e) => e.result_state(),
            ExpressionEvaluator::Function(e) => e.result_state(),
            ExpressionEvaluator::Path(e) => e.result_state(),
            ExpressionEvaluator::NodeRel(e) => e.result_state(),
            ExpressionEvaluator::LambdaParam(e) => e.result_state(),
            ExpressionEvaluator::ListLambda(e) => e.result_state(),
        }
    }

    pub fn data_type(&self) -> &LogicalType {
        match self {
            ExpressionEvaluator::Literal(e) => e.result_vector().data_type(),
            ExpressionEvaluator::Reference(e) => e.data_type(),
            ExpressionEvaluator::Case(e) => e.result_vector().data_type(),
            ExpressionEvaluator::Function(e) => e.result_vector().data_type(),
            ExpressionEvaluator::Path(e) => e.result_vector().data_type(),
            ExpressionEvaluator::NodeRel(e) => e.result_vector().data_type(),
            ExpressionEvaluator::LambdaParam(e) => e.data_type(),
            ExpressionEvaluator::ListLambda(e) => e.result_vector().data_type(),
        }
    }

    pub fn is_result_flat(&self, result_set: &ResultSet) -> bool {
        result_set.state(self.result_state()).is_flat()
    }

    /// The single position of a flat result, `None` when unflat
    pub fn flat_pos(&self, result_set: &ResultSet) -> Option<usize> {
        let state = result_set.state(self.result_state());
        state.is_flat().then(|| state.sel_vector().get(0))
    }

    /// Slot holding the value for output position `pos`
    #[inline]
    pub fn input_pos(&self, result_set: &ResultSet, pos: usize) -> usize {
        self.flat_pos(result_set).unwrap_or(pos)
    }

    pub(crate) fn as_input<'a>(&'a self, result_set: &'a ResultSet) -> FunctionInput<'a> {
        FunctionInput::new(self.result_vector(result_set), self.flat_pos(result_set))
    }
}

/// State a non-leaf evaluator computes in: the first unflat child state, or a
/// fresh single-value state when every child is flat
pub(crate) fn resolve_result_state<'a>(
    children: impl IntoIterator<Item = &'a ExpressionEvaluator>,
    result_set: &mut ResultSet,
) -> StateId {
    let unflat = children
        .into_iter()
        .map(ExpressionEvaluator::result_state)
        .find(|state| !result_set.state(*state).is_flat());
    match unflat {
        Some(state) => state,
        None => result_set.add_state(DataChunkState::single_value()),
    }
}

/// Positions an evaluator computes in `state`
pub(crate) fn active_positions<'a>(
    result_set: &'a ResultSet,
    state: StateId,
    restrict: Option<&'a SelectionVector>,
) -> &'a SelectionVector {
    let chunk_state = result_set.state(state);
    match restrict {
        Some(sel) if !chunk_state.is_flat() => sel,
        _ => chunk_state.sel_vector(),
    }
}

pub(crate) fn bound_state(state: Option<StateId>) -> StateId {
    debug_assert!(state.is_some(), "evaluator used before init");
    state.unwrap_or(StateId(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExecutionConfig;
    use crate::expression::{Expression, LambdaKind};
    use crate::functions::ComparisonKind;
    use crate::storage::Value;
    use crate::txn::Transaction;
    use crate::types::InternalId;
    use crate::vector::{DataChunkDescriptor, DataPos, ResultSetDescriptor};
    use std::sync::Arc;

    fn context() -> ExecutionContext {
        ExecutionContext::new(Arc::new(Transaction::read_only()), ExecutionConfig::default())
    }

    /// Chunk 0 (unflat): a INT64, b INT64 with rows (i, 10 * i), `a` NULL at 3.
    /// Chunk 1 (flat): k INT64 = 7 at slot 2.
    fn result_set(num_rows: usize) -> ResultSet {
        let descriptor = ResultSetDescriptor::new(vec![
            DataChunkDescriptor::new(vec![LogicalType::Int64, LogicalType::Int64]),
            DataChunkDescriptor::flat(vec![LogicalType::Int64]),
        ]);
        let mut rs = ResultSet::new(&descriptor);
        for i in 0..num_rows {
            rs.vector_mut(DataPos::new(0, 0)).set_value(i, i as i64);
            rs.vector_mut(DataPos::new(0, 1)).set_value(i, 10 * i as i64);
        }
        if num_rows > 3 {
            rs.vector_mut(DataPos::new(0, 0)).set_null(3, true);
        }
        rs.chunk_state_mut(0).init_original_and_selected_size(num_rows);
        rs.vector_mut(DataPos::new(1, 0)).set_value::<i64>(2, 7);
        rs.chunk_state_mut(1).sel_vector_mut().mutable_buffer()[0] = 2;
        rs.chunk_state_mut(1).sel_vector_mut().set_to_filtered_with_size(1);
        rs
    }

    fn a() -> Expression {
        Expression::column("a", DataPos::new(0, 0), LogicalType::Int64)
    }

    fn b() -> Expression {
        Expression::column("b", DataPos::new(0, 1), LogicalType::Int64)
    }

    fn k() -> Expression {
        Expression::column("k", DataPos::new(1, 0), LogicalType::Int64)
    }

    fn build(expression: &Expression, rs: &mut ResultSet) -> ExpressionEvaluator {
        let mut evaluator = ExpressionMapper::map_expression(expression).unwrap();
        evaluator.init(rs, &context()).unwrap();
        evaluator
    }

    fn values(evaluator: &ExpressionEvaluator, rs: &ResultSet) -> Vec<Value> {
        let sel = rs.state(evaluator.result_state()).sel_vector();
        sel.iter()
            .map(|pos| evaluator.result_vector(rs).get(pos))
            .collect()
    }

    #[test]
    fn test_literal_and_reference_are_idempotent() {
        let mut rs = result_set(5);
        for expression in [Expression::literal(42i64), b()] {
            let mut evaluator = build(&expression, &mut rs);
            evaluator.evaluate(&rs).unwrap();
            let first = values(&evaluator, &rs);
            evaluator.evaluate(&rs).unwrap();
            assert_eq!(first, values(&evaluator, &rs));
        }
    }

    #[test]
    fn test_result_state_follows_unflat_child() {
        let mut rs = result_set(5);
        let expression = Expression::function(
            crate::functions::names::ADD,
            vec![a(), k()],
            LogicalType::Int64,
        );
        let mut evaluator = build(&expression, &mut rs);
        evaluator.evaluate(&rs).unwrap();
        assert_eq!(evaluator.result_state(), rs.chunk_state_id(0));
        assert_eq!(
            rs.state(evaluator.result_state()).sel_size(),
            rs.chunk_state(0).sel_size()
        );
        assert_eq!(
            values(&evaluator, &rs),
            vec![
                Value::Int64(7),
                Value::Int64(8),
                Value::Int64(9),
                Value::Null,
                Value::Int64(11)
            ]
        );

        let all_flat = Expression::function(
            crate::functions::names::ADD,
            vec![k(), Expression::literal(1i64)],
            LogicalType::Int64,
        );
        let mut evaluator = build(&all_flat, &mut rs);
        evaluator.evaluate(&rs).unwrap();
        assert!(evaluator.is_result_flat(&rs));
        assert_eq!(values(&evaluator, &rs), vec![Value::Int64(8)]);
    }

    #[test]
    fn test_select_compacts_unflat_selection() {
        let mut rs = result_set(6);
        let predicate =
            Expression::comparison(ComparisonKind::GreaterThan, a(), Expression::literal(1i64));
        let mut evaluator = build(&predicate, &mut rs);
        let mut sel = rs.chunk_state(0).sel_vector().clone();
        assert!(evaluator.select(&rs, &mut sel, true).unwrap());
        // slot 3 is NULL and never selected
        assert_eq!(sel.iter().collect::<Vec<_>>(), vec![2, 4, 5]);
        assert!(!sel.is_unfiltered());
    }

    #[test]
    fn test_flat_select_leaves_selection_untouched() {
        let mut rs = result_set(4);
        let mut sel = rs.chunk_state(1).sel_vector().clone();
        for (threshold, expected) in [(5i64, true), (9, false)] {
            let predicate = Expression::comparison(
                ComparisonKind::GreaterThan,
                k(),
                Expression::literal(threshold),
            );
            let mut evaluator = build(&predicate, &mut rs);
            assert_eq!(evaluator.select(&rs, &mut sel, false).unwrap(), expected);
            assert_eq!(sel.sel_size(), 1);
            assert_eq!(sel.get(0), 2);
        }
    }

    #[test]
    fn test_case_first_match_wins() {
        let mut rs = result_set(6);
        // CASE WHEN a > 3 THEN 'big' WHEN a > 1 THEN 'mid' ELSE 'small' END
        let expression = Expression::case(
            vec![
                (
                    Expression::comparison(ComparisonKind::GreaterThan, a(), Expression::literal(3i64)),
                    Expression::literal("big"),
                ),
                (
                    Expression::comparison(ComparisonKind::GreaterThan, a(), Expression::literal(1i64)),
                    Expression::literal("mid"),
                ),
            ],
            Expression::literal("small"),
            LogicalType::String,
        );
        let mut evaluator = build(&expression, &mut rs);
        evaluator.evaluate(&rs).unwrap();
        let expected: Vec<Value> = ["small", "small", "mid", "small", "big", "big"]
            .into_iter()
            .map(Value::from)
            .collect();
        assert_eq!(values(&evaluator, &rs), expected);

        // a second batch over the same evaluator starts from a clean mask
        rs.chunk_state_mut(0).init_original_and_selected_size(3);
        evaluator.evaluate(&rs).unwrap();
        assert_eq!(values(&evaluator, &rs), expected[..3].to_vec());
    }

    #[test]
    fn test_case_then_sees_only_matched_rows() {
        let mut rs = result_set(4);
        rs.vector_mut(DataPos::new(0, 1)).set_value::<i64>(0, 0);
        // CASE WHEN b <> 0 THEN 100 / b ELSE -1 END never divides by zero
        let expression = Expression::case(
            vec![(
                Expression::comparison(ComparisonKind::NotEquals, b(), Expression::literal(0i64)),
                Expression::function(
                    crate::functions::names::DIVIDE,
                    vec![Expression::literal(100i64), b()],
                    LogicalType::Int64,
                ),
            )],
            Expression::literal(-1i64),
            LogicalType::Int64,
        );
        let mut evaluator = build(&expression, &mut rs);
        evaluator.evaluate(&rs).unwrap();
        assert_eq!(
            values(&evaluator, &rs),
            vec![
                Value::Int64(-1),
                Value::Int64(10),
                Value::Int64(5),
                Value::Int64(3)
            ]
        );
    }

    #[test]
    fn test_case_with_flat_when_broadcasts() {
        let mut rs = result_set(3);
        let expression = Expression::case(
            vec![(
                Expression::comparison(ComparisonKind::Equals, k(), Expression::literal(7i64)),
                b(),
            )],
            Expression::literal(0i64),
            LogicalType::Int64,
        );
        let mut evaluator = build(&expression, &mut rs);
        evaluator.evaluate(&rs).unwrap();
        assert_eq!(
            values(&evaluator, &rs),
            vec![Value::Int64(0), Value::Int64(10), Value::Int64(20)]
        );
    }

    #[test]
    fn test_node_and_path_values() {
        let descriptor = ResultSetDescriptor::new(vec![DataChunkDescriptor::new(vec![
            LogicalType::InternalId,
            LogicalType::InternalId,
            LogicalType::InternalId,
        ])]);
        let mut rs = ResultSet::new(&descriptor);
        rs.vector_mut(DataPos::new(0, 0))
            .set_value(0, InternalId::new(1, 0));
        rs.vector_mut(DataPos::new(0, 1))
            .set_value(0, InternalId::new(9, 5));
        rs.vector_mut(DataPos::new(0, 2))
            .set_value(0, InternalId::new(2, 0));
        rs.chunk_state_mut(0).init_original_and_selected_size(1);

        let id = |i: usize| Expression::column("id", DataPos::new(0, i), LogicalType::InternalId);
        let node = |i: usize| Expression::Node {
            name: "n".to_string(),
            id: Box::new(id(i)),
            label: Box::new(Expression::literal("Person")),
            properties: vec![],
        };
        let rel = Expression::Rel {
            name: "r".to_string(),
            id: Box::new(id(1)),
            label: Box::new(Expression::literal("KNOWS")),
            src: Box::new(id(0)),
            dst: Box::new(id(2)),
            properties: vec![("since".to_string(), Expression::literal(2020i64))],
        };
        let path = Expression::Path {
            name: "p".to_string(),
            children: vec![node(0), rel, node(2)],
        };
        let mut evaluator = build(&path, &mut rs);
        evaluator.evaluate(&rs).unwrap();
        let value = evaluator.result_vector(&rs).get(0);
        let nodes = value.struct_field("_NODES").and_then(Value::as_list).unwrap();
        let rels = value.struct_field("_RELS").and_then(Value::as_list).unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0].struct_field("since"), Some(&Value::Int64(2020)));
        assert_eq!(
            nodes[1].struct_field("_ID"),
            Some(&Value::InternalId(InternalId::new(2, 0)))
        );

        // no relationships: only the first node is kept
        let single = Expression::Path {
            name: "p".to_string(),
            children: vec![node(0), node(2)],
        };
        let mut evaluator = build(&single, &mut rs);
        evaluator.evaluate(&rs).unwrap();
        let value = evaluator.result_vector(&rs).get(0);
        assert_eq!(
            value.struct_field("_NODES").and_then(Value::as_list).map(|n| n.len()),
            Some(1)
        );
    }

    #[test]
    fn test_list_lambdas() {
        let list_type = LogicalType::List(Box::new(LogicalType::Int64));
        let descriptor =
            ResultSetDescriptor::new(vec![DataChunkDescriptor::new(vec![list_type.clone()])]);
        let mut rs = ResultSet::new(&descriptor);
        let list = |items: &[i64]| Value::List(items.iter().map(|v| Value::Int64(*v)).collect());
        rs.vector_mut(DataPos::new(0, 0)).set(0, &list(&[1, 2, 3])).unwrap();
        rs.vector_mut(DataPos::new(0, 0)).set_null(1, true);
        rs.vector_mut(DataPos::new(0, 0)).set(2, &list(&[])).unwrap();
        rs.chunk_state_mut(0).init_original_and_selected_size(3);

        let column = Expression::column("l", DataPos::new(0, 0), list_type);
        let x = Expression::LambdaParam {
            name: "x".to_string(),
            data_type: LogicalType::Int64,
        };
        let doubled = Expression::list_lambda(
            LambdaKind::Transform,
            column.clone(),
            "x",
            Expression::function(
                crate::functions::names::MULTIPLY,
                vec![x.clone(), Expression::literal(2i64)],
                LogicalType::Int64,
            ),
        );
        let mut evaluator = build(&doubled, &mut rs);
        evaluator.evaluate(&rs).unwrap();
        assert_eq!(
            values(&evaluator, &rs),
            vec![list(&[2, 4, 6]), Value::Null, list(&[])]
        );

        let all_positive = Expression::list_lambda(
            LambdaKind::All,
            column,
            "x",
            Expression::comparison(ComparisonKind::GreaterThan, x, Expression::literal(0i64)),
        );
        let mut evaluator = build(&all_positive, &mut rs);
        evaluator.evaluate(&rs).unwrap();
        assert_eq!(
            values(&evaluator, &rs),
            vec![Value::Bool(true), Value::Null, Value::Bool(true)]
        );
    }

    #[test]
    fn test_mapper_rejects_invalid_trees() {
        let stray_param = Expression::LambdaParam {
            name: "x".to_string(),
            data_type: LogicalType::Int64,
        };
        assert!(matches!(
            ExpressionMapper::map_expression(&stray_param),
            Err(crate::exec::ExecutionError::InvalidPlan(_))
        ));
        let unknown = Expression::function("NO_SUCH_FUNCTION", vec![], LogicalType::Int64);
        assert!(matches!(
            ExpressionMapper::map_expression(&unknown),
            Err(crate::exec::ExecutionError::Function(_))
        ));
        let body_with_column = Expression::list_lambda(
            LambdaKind::Any,
            Expression::column(
                "l",
                DataPos::new(0, 0),
                LogicalType::List(Box::new(LogicalType::Int64)),
            ),
            "x",
            Expression::comparison(ComparisonKind::Equals, a(), Expression::literal(1i64)),
        );
        assert!(ExpressionMapper::map_expression(&body_with_column).is_err());
    }
}
