// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! List functions

use super::function_trait::{
    Arity, FunctionError, FunctionResult, NullHandling, ScalarFunction,
};
use super::names;
use crate::storage::Value;
use crate::types::{LogicalType, TypeCaster};
use std::cmp::Ordering;

fn list_arg<'a>(function: &str, value: &'a Value) -> FunctionResult<&'a [Value]> {
    value
        .as_list()
        .ok_or_else(|| FunctionError::InvalidArgumentType {
            message: format!("{} expects a list argument, got {}", function, value),
        })
}

/// SIZE(list) or SIZE(string)
#[derive(Debug)]
pub struct SizeFunction;

impl ScalarFunction for SizeFunction {
    fn name(&self) -> &str {
        names::SIZE
    }

    fn description(&self) -> &str {
        "Number of elements of a list or characters of a string"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }

    fn execute(&self, args: &[Value], _return_type: &LogicalType) -> FunctionResult<Value> {
        let size = match &args[0] {
            Value::String(s) => s.chars().count(),
            other => list_arg(names::SIZE, other)?.len(),
        };
        Ok(Value::Int64(size as i64))
    }
}

/// `[a, b, c]`; elements are cast to the list's child type
#[derive(Debug)]
pub struct ListCreationFunction;

impl ScalarFunction for ListCreationFunction {
    fn name(&self) -> &str {
        names::LIST_CREATION
    }

    fn description(&self) -> &str {
        "Builds a list from its arguments"
    }

    fn arity(&self) -> Arity {
        Arity::AtLeast(0)
    }

    fn null_handling(&self) -> NullHandling {
        NullHandling::Custom
    }

    fn execute(&self, args: &[Value], return_type: &LogicalType) -> FunctionResult<Value> {
        let Some(child) = return_type.child_type() else {
            return Ok(Value::List(args.to_vec()));
        };
        args.iter()
            .map(|arg| {
                TypeCaster::cast_value(arg, child).map_err(|e| FunctionError::ExecutionError {
                    message: format!("{}: {}", names::LIST_CREATION, e),
                })
            })
            .collect::<FunctionResult<Vec<_>>>()
            .map(Value::List)
    }
}

/// LIST_EXTRACT(list, index), 1-based; out of range yields NULL
#[derive(Debug)]
pub struct ListExtractFunction;

impl ScalarFunction for ListExtractFunction {
    fn name(&self) -> &str {
        names::LIST_EXTRACT
    }

    fn description(&self) -> &str {
        "Element of a list at a 1-based index"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(2)
    }

    fn execute(&self, args: &[Value], _return_type: &LogicalType) -> FunctionResult<Value> {
        let items = list_arg(names::LIST_EXTRACT, &args[0])?;
        let index = args[1]
            .as_i64()
            .ok_or_else(|| FunctionError::InvalidArgumentType {
                message: format!("{} expects an integer index, got {}", names::LIST_EXTRACT, args[1]),
            })?;
        let item = match index.cmp(&0) {
            Ordering::Greater => items.get(index as usize - 1),
            // negative indexes count from the end
            Ordering::Less => items
                .len()
                .checked_sub(index.unsigned_abs() as usize)
                .and_then(|i| items.get(i)),
            Ordering::Equal => None,
        };
        Ok(item.cloned().unwrap_or(Value::Null))
    }
}

/// LIST_CONTAINS(list, value); NULL elements never match
#[derive(Debug)]
pub struct ListContainsFunction;

impl ScalarFunction for ListContainsFunction {
    fn name(&self) -> &str {
        names::LIST_CONTAINS
    }

    fn description(&self) -> &str {
        "Whether a list contains a value"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(2)
    }

    fn execute(&self, args: &[Value], _return_type: &LogicalType) -> FunctionResult<Value> {
        let items = list_arg(names::LIST_CONTAINS, &args[0])?;
        Ok(Value::Bool(
            items
                .iter()
                .any(|item| item.compare(&args[1]) == Some(Ordering::Equal)),
        ))
    }
}
