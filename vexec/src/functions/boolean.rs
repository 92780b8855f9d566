// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Boolean connectives with three-valued logic

use super::function_trait::{
    Arity, FunctionInput, FunctionResult, NullHandling, ScalarFunction,
};
use super::names;
use crate::storage::Value;
use crate::types::LogicalType;
use crate::vector::{SelectionVector, ValueVector};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanOp {
    And,
    Or,
    Xor,
    Not,
}

impl BooleanOp {
    /// `None` stands for NULL
    pub fn apply(self, left: Option<bool>, right: Option<bool>) -> Option<bool> {
        match self {
            BooleanOp::And => match (left, right) {
                (Some(false), _) | (_, Some(false)) => Some(false),
                (Some(true), Some(true)) => Some(true),
                _ => None,
            },
            BooleanOp::Or => match (left, right) {
                (Some(true), _) | (_, Some(true)) => Some(true),
                (Some(false), Some(false)) => Some(false),
                _ => None,
            },
            BooleanOp::Xor => Some(left? != right?),
            BooleanOp::Not => left.map(|b| !b),
        }
    }
}

#[derive(Debug)]
pub struct BooleanFunction {
    op: BooleanOp,
}

impl BooleanFunction {
    pub fn new(op: BooleanOp) -> Self {
        Self { op }
    }
}

fn read_bool(input: &FunctionInput<'_>, pos: usize) -> Option<bool> {
    let pos = input.pos(pos);
    (!input.vector.is_null(pos)).then(|| input.vector.get_value::<bool>(pos))
}

impl ScalarFunction for BooleanFunction {
    fn name(&self) -> &str {
        match self.op {
            BooleanOp::And => names::AND,
            BooleanOp::Or => names::OR,
            BooleanOp::Xor => names::XOR,
            BooleanOp::Not => names::NOT,
        }
    }

    fn description(&self) -> &str {
        "Boolean connective with SQL three-valued logic"
    }

    fn arity(&self) -> Arity {
        match self.op {
            BooleanOp::Not => Arity::Exact(1),
            _ => Arity::Exact(2),
        }
    }

    fn null_handling(&self) -> NullHandling {
        NullHandling::Custom
    }

    fn execute(&self, args: &[Value], _return_type: &LogicalType) -> FunctionResult<Value> {
        let left = args[0].as_bool();
        let right = args.get(1).and_then(Value::as_bool);
        Ok(self
            .op
            .apply(left, right)
            .map(Value::Bool)
            .unwrap_or(Value::Null))
    }

    fn execute_vectors(
        &self,
        inputs: &[FunctionInput<'_>],
        positions: &SelectionVector,
        result: &mut ValueVector,
    ) -> FunctionResult<bool> {
        for pos in positions.iter() {
            let left = read_bool(&inputs[0], pos);
            let right = inputs.get(1).and_then(|input| read_bool(input, pos));
            match self.op.apply(left, right) {
                Some(b) => result.set_value(pos, b),
                None => result.set_null(pos, true),
            }
        }
        Ok(true)
    }
}
