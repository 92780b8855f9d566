// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! NULL handling functions: IS_NULL, IS_NOT_NULL, COALESCE

use super::function_trait::{
    Arity, FunctionInput, FunctionResult, NullHandling, ScalarFunction,
};
use super::names;
use crate::storage::Value;
use crate::types::LogicalType;
use crate::vector::{SelectionVector, ValueVector};

/// IS_NULL / IS_NOT_NULL
#[derive(Debug)]
pub struct NullCheckFunction {
    negated: bool,
}

impl NullCheckFunction {
    pub fn is_null() -> Self {
        Self { negated: false }
    }

    pub fn is_not_null() -> Self {
        Self { negated: true }
    }
}

impl ScalarFunction for NullCheckFunction {
    fn name(&self) -> &str {
        if self.negated {
            names::IS_NOT_NULL
        } else {
            names::IS_NULL
        }
    }

    fn description(&self) -> &str {
        "Tests whether the argument is NULL"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }

    fn null_handling(&self) -> NullHandling {
        NullHandling::Custom
    }

    fn execute(&self, args: &[Value], _return_type: &LogicalType) -> FunctionResult<Value> {
        Ok(Value::Bool(args[0].is_null() != self.negated))
    }

    fn execute_vectors(
        &self,
        inputs: &[FunctionInput<'_>],
        positions: &SelectionVector,
        result: &mut ValueVector,
    ) -> FunctionResult<bool> {
        for pos in positions.iter() {
            result.set_value(pos, inputs[0].is_null(pos) != self.negated);
        }
        Ok(true)
    }
}

/// COALESCE: first non-NULL argument
#[derive(Debug)]
pub struct CoalesceFunction;

impl ScalarFunction for CoalesceFunction {
    fn name(&self) -> &str {
        names::COALESCE
    }

    fn description(&self) -> &str {
        "Returns the first non-NULL argument"
    }

    fn arity(&self) -> Arity {
        Arity::AtLeast(1)
    }

    fn null_handling(&self) -> NullHandling {
        NullHandling::Custom
    }

    fn execute(&self, args: &[Value], _return_type: &LogicalType) -> FunctionResult<Value> {
        Ok(args
            .iter()
            .find(|v| !v.is_null())
            .cloned()
            .unwrap_or(Value::Null))
    }
}
