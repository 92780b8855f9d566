// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Comparison functions: EQUALS, NOT_EQUALS, GREATER_THAN, GREATER_THAN_EQUALS,
//! LESS_THAN, LESS_THAN_EQUALS

use super::function_trait::{
    Arity, FunctionInput, FunctionResult, ScalarFunction,
};
use super::names;
use crate::storage::Value;
use crate::types::LogicalType;
use crate::vector::{SelectionVector, ValueVector};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonKind {
    Equals,
    NotEquals,
    GreaterThan,
    GreaterThanEquals,
    LessThan,
    LessThanEquals,
}

impl ComparisonKind {
    pub const ALL: [ComparisonKind; 6] = [
        ComparisonKind::Equals,
        ComparisonKind::NotEquals,
        ComparisonKind::GreaterThan,
        ComparisonKind::GreaterThanEquals,
        ComparisonKind::LessThan,
        ComparisonKind::LessThanEquals,
    ];

    pub fn function_name(self) -> &'static str {
        match self {
            ComparisonKind::Equals => names::EQUALS,
            ComparisonKind::NotEquals => names::NOT_EQUALS,
            ComparisonKind::GreaterThan => names::GREATER_THAN,
            ComparisonKind::GreaterThanEquals => names::GREATER_THAN_EQUALS,
            ComparisonKind::LessThan => names::LESS_THAN,
            ComparisonKind::LessThanEquals => names::LESS_THAN_EQUALS,
        }
    }

    pub fn from_function_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.function_name().eq_ignore_ascii_case(name))
    }

    /// Comparison with the operands swapped: `a < b` iff `b > a`
    pub fn reverse(self) -> Self {
        match self {
            ComparisonKind::GreaterThan => ComparisonKind::LessThan,
            ComparisonKind::GreaterThanEquals => ComparisonKind::LessThanEquals,
            ComparisonKind::LessThan => ComparisonKind::GreaterThan,
            ComparisonKind::LessThanEquals => ComparisonKind::GreaterThanEquals,
            other => other,
        }
    }

    /// Whether `left <op> right` holds given `left.cmp(right)`
    #[inline]
    pub fn matches(self, ordering: Ordering) -> bool {
        match self {
            ComparisonKind::Equals => ordering == Ordering::Equal,
            ComparisonKind::NotEquals => ordering != Ordering::Equal,
            ComparisonKind::GreaterThan => ordering == Ordering::Greater,
            ComparisonKind::GreaterThanEquals => ordering != Ordering::Less,
            ComparisonKind::LessThan => ordering == Ordering::Less,
            ComparisonKind::LessThanEquals => ordering != Ordering::Greater,
        }
    }
}

impl fmt::Display for ComparisonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            ComparisonKind::Equals => "=",
            ComparisonKind::NotEquals => "<>",
            ComparisonKind::GreaterThan => ">",
            ComparisonKind::GreaterThanEquals => ">=",
            ComparisonKind::LessThan => "<",
            ComparisonKind::LessThanEquals => "<=",
        };
        write!(f, "{}", symbol)
    }
}

#[derive(Debug)]
pub struct ComparisonFunction {
    kind: ComparisonKind,
}

impl ComparisonFunction {
    pub fn new(kind: ComparisonKind) -> Self {
        Self { kind }
    }
}

impl ScalarFunction for ComparisonFunction {
    fn name(&self) -> &str {
        self.kind.function_name()
    }

    fn description(&self) -> &str {
        "Compares two values; NULL when either side is NULL or not comparable"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(2)
    }

    fn execute(&self, args: &[Value], _return_type: &LogicalType) -> FunctionResult<Value> {
        Ok(args[0]
            .compare(&args[1])
            .map(|ordering| Value::Bool(self.kind.matches(ordering)))
            .unwrap_or(Value::Null))
    }

    fn execute_vectors(
        &self,
        inputs: &[FunctionInput<'_>],
        positions: &SelectionVector,
        result: &mut ValueVector,
    ) -> FunctionResult<bool> {
        let (left, right) = (&inputs[0], &inputs[1]);
        for pos in positions.iter() {
            match left
                .vector
                .compare_at(left.pos(pos), right.vector, right.pos(pos))
            {
                Some(ordering) => result.set_value(pos, self.kind.matches(ordering)),
                None => result.set_null(pos, true),
            }
        }
        Ok(true)
    }
}
