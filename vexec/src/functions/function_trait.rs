// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Scalar function trait
//!
//! Every scalar function has a row-at-a-time kernel ([`ScalarFunction::execute`]).
//! Hot functions (comparisons, boolean connectives, null checks, casts) also
//! provide a vectorized kernel that works directly on the input vectors.

use crate::storage::Value;
use crate::types::LogicalType;
use crate::vector::{SelectionVector, ValueVector};
use std::fmt;

/// Error type for function execution
#[derive(Debug, thiserror::Error)]
pub enum FunctionError {
    #[error("Unknown function: {name}")]
    UnknownFunction { name: String },

    #[error("Invalid argument count for {function}: expected {expected}, got {actual}")]
    InvalidArgumentCount {
        function: String,
        expected: String,
        actual: usize,
    },

    #[error("Invalid argument type: {message}")]
    InvalidArgumentType { message: String },

    #[error("Function execution failed: {message}")]
    ExecutionError { message: String },
}

/// Result type for function execution
pub type FunctionResult<T> = Result<T, FunctionError>;

/// Number of arguments a function accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn check(self, function: &str, actual: usize) -> FunctionResult<()> {
        let ok = match self {
            Arity::Exact(n) => actual == n,
            Arity::AtLeast(n) => actual >= n,
        };
        if ok {
            return Ok(());
        }
        Err(FunctionError::InvalidArgumentCount {
            function: function.to_string(),
            expected: match self {
                Arity::Exact(n) => n.to_string(),
                Arity::AtLeast(n) => format!("at least {}", n),
            },
            actual,
        })
    }
}

/// How NULL arguments are treated by the row kernel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullHandling {
    /// Any NULL argument yields NULL without calling the kernel
    Propagate,
    /// The kernel sees NULL arguments
    Custom,
}

/// One argument of a vectorized kernel
///
/// A flat argument always reads its single selected slot; an unflat argument
/// reads the slot of the result position being computed.
#[derive(Clone, Copy)]
pub struct FunctionInput<'a> {
    pub vector: &'a ValueVector,
    flat_pos: Option<usize>,
}

impl<'a> FunctionInput<'a> {
    pub fn new(vector: &'a ValueVector, flat_pos: Option<usize>) -> Self {
        Self { vector, flat_pos }
    }

    #[inline]
    pub fn pos(&self, result_pos: usize) -> usize {
        self.flat_pos.unwrap_or(result_pos)
    }

    #[inline]
    pub fn is_null(&self, result_pos: usize) -> bool {
        self.vector.is_null(self.pos(result_pos))
    }

    pub fn value(&self, result_pos: usize) -> Value {
        self.vector.get(self.pos(result_pos))
    }
}

pub trait ScalarFunction: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn arity(&self) -> Arity;

    fn null_handling(&self) -> NullHandling {
        NullHandling::Propagate
    }

    /// Row kernel
    fn execute(&self, args: &[Value], return_type: &LogicalType) -> FunctionResult<Value>;

    /// Vectorized kernel over `positions`; returns `false` when the function
    /// has none and the row kernel must be used
    fn execute_vectors(
        &self,
        _inputs: &[FunctionInput<'_>],
        _positions: &SelectionVector,
        _result: &mut ValueVector,
    ) -> FunctionResult<bool> {
        Ok(false)
    }
}

/// Run `function` over every position of `positions`, preferring its
/// vectorized kernel
pub fn execute_function(
    function: &dyn ScalarFunction,
    inputs: &[FunctionInput<'_>],
    positions: &SelectionVector,
    result: &mut ValueVector,
) -> FunctionResult<()> {
    if function.execute_vectors(inputs, positions, result)? {
        return Ok(());
    }
    let return_type = result.data_type().clone();
    let mut args = Vec::with_capacity(inputs.len());
    for pos in positions.iter() {
        if function.null_handling() == NullHandling::Propagate
            && inputs.iter().any(|input| input.is_null(pos))
        {
            result.set_null(pos, true);
            continue;
        }
        args.clear();
        args.extend(inputs.iter().map(|input| input.value(pos)));
        let value = function.execute(&args, &return_type)?;
        result
            .set(pos, &value)
            .map_err(|e| FunctionError::ExecutionError {
                message: format!("{}: {}", function.name(), e),
            })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity_check() {
        assert!(Arity::Exact(2).check("F", 2).is_ok());
        assert!(Arity::AtLeast(1).check("F", 3).is_ok());
        let err = Arity::Exact(1).check("F", 0).unwrap_err();
        assert!(err.to_string().contains("expected 1"));
    }

    #[test]
    fn test_flat_input_reads_single_slot() {
        let mut vector = ValueVector::new(LogicalType::Int64);
        vector.set_value::<i64>(4, 9);
        let flat = FunctionInput::new(&vector, Some(4));
        assert_eq!(flat.value(0), Value::Int64(9));
        assert_eq!(flat.value(100), Value::Int64(9));
        let unflat = FunctionInput::new(&vector, None);
        assert_eq!(unflat.pos(7), 7);
    }
}
