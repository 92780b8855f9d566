// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Arithmetic functions: ADD, SUBTRACT, MULTIPLY, DIVIDE, MODULO, NEGATE, ABS
//!
//! Integer results are computed with checked `i64` arithmetic and overflow is
//! an error. A zero integer divisor yields NULL, so guarded divisions inside
//! CASE branches never fail. DOUBLE results follow IEEE semantics.

use super::function_trait::{Arity, FunctionError, FunctionResult, ScalarFunction};
use super::names;
use crate::storage::Value;
use crate::types::LogicalType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

impl ArithmeticOp {
    fn name(self) -> &'static str {
        match self {
            ArithmeticOp::Add => names::ADD,
            ArithmeticOp::Subtract => names::SUBTRACT,
            ArithmeticOp::Multiply => names::MULTIPLY,
            ArithmeticOp::Divide => names::DIVIDE,
            ArithmeticOp::Modulo => names::MODULO,
        }
    }

    fn apply_int(self, a: i64, b: i64) -> FunctionResult<Option<i64>> {
        let result = match self {
            ArithmeticOp::Add => a.checked_add(b),
            ArithmeticOp::Subtract => a.checked_sub(b),
            ArithmeticOp::Multiply => a.checked_mul(b),
            ArithmeticOp::Divide | ArithmeticOp::Modulo if b == 0 => return Ok(None),
            ArithmeticOp::Divide => a.checked_div(b),
            ArithmeticOp::Modulo => a.checked_rem(b),
        };
        result.map(Some).ok_or_else(|| FunctionError::ExecutionError {
            message: format!("{}: integer overflow on {} and {}", self.name(), a, b),
        })
    }

    fn apply_double(self, a: f64, b: f64) -> f64 {
        match self {
            ArithmeticOp::Add => a + b,
            ArithmeticOp::Subtract => a - b,
            ArithmeticOp::Multiply => a * b,
            ArithmeticOp::Divide => a / b,
            ArithmeticOp::Modulo => a % b,
        }
    }
}

#[derive(Debug)]
pub struct ArithmeticFunction {
    op: ArithmeticOp,
}

impl ArithmeticFunction {
    pub fn new(op: ArithmeticOp) -> Self {
        Self { op }
    }
}

fn narrow(value: i64, return_type: &LogicalType) -> FunctionResult<Value> {
    match return_type {
        LogicalType::Int32 => i32::try_from(value).map(Value::Int32).map_err(|_| {
            FunctionError::ExecutionError {
                message: format!("{} out of INT32 range", value),
            }
        }),
        LogicalType::Double => Ok(Value::Double(value as f64)),
        _ => Ok(Value::Int64(value)),
    }
}

impl ScalarFunction for ArithmeticFunction {
    fn name(&self) -> &str {
        self.op.name()
    }

    fn description(&self) -> &str {
        "Binary arithmetic on numeric values"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(2)
    }

    fn execute(&self, args: &[Value], return_type: &LogicalType) -> FunctionResult<Value> {
        let (left, right) = (&args[0], &args[1]);
        if self.op == ArithmeticOp::Add {
            if let (Value::String(a), Value::String(b)) = (left, right) {
                return Ok(Value::String(format!("{}{}", a, b)));
            }
        }
        let integral = matches!(left, Value::Int32(_) | Value::Int64(_))
            && matches!(right, Value::Int32(_) | Value::Int64(_));
        if integral && *return_type != LogicalType::Double {
            let (a, b) = (left.as_i64(), right.as_i64());
            if let (Some(a), Some(b)) = (a, b) {
                return match self.op.apply_int(a, b)? {
                    Some(v) => narrow(v, return_type),
                    None => Ok(Value::Null),
                };
            }
        }
        match (left.as_f64(), right.as_f64()) {
            (Some(a), Some(b)) => Ok(Value::Double(self.op.apply_double(a, b))),
            _ => Err(FunctionError::InvalidArgumentType {
                message: format!(
                    "{} expects numeric arguments, got {} and {}",
                    self.op.name(),
                    left,
                    right
                ),
            }),
        }
    }
}

/// Unary minus
#[derive(Debug)]
pub struct NegateFunction;

impl ScalarFunction for NegateFunction {
    fn name(&self) -> &str {
        names::NEGATE
    }

    fn description(&self) -> &str {
        "Arithmetic negation"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }

    fn execute(&self, args: &[Value], return_type: &LogicalType) -> FunctionResult<Value> {
        match &args[0] {
            Value::Double(d) => Ok(Value::Double(-d)),
            other => {
                let v = other.as_i64().ok_or_else(|| FunctionError::InvalidArgumentType {
                    message: format!("NEGATE expects a number, got {}", other),
                })?;
                let negated = v.checked_neg().ok_or_else(|| FunctionError::ExecutionError {
                    message: format!("NEGATE: integer overflow on {}", v),
                })?;
                narrow(negated, return_type)
            }
        }
    }
}

#[derive(Debug)]
pub struct AbsFunction;

impl ScalarFunction for AbsFunction {
    fn name(&self) -> &str {
        names::ABS
    }

    fn description(&self) -> &str {
        "Absolute value"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }

    fn execute(&self, args: &[Value], return_type: &LogicalType) -> FunctionResult<Value> {
        match &args[0] {
            Value::Double(d) => Ok(Value::Double(d.abs())),
            other => {
                let v = other.as_i64().ok_or_else(|| FunctionError::InvalidArgumentType {
                    message: format!("ABS expects a number, got {}", other),
                })?;
                let abs = v.checked_abs().ok_or_else(|| FunctionError::ExecutionError {
                    message: format!("ABS: integer overflow on {}", v),
                })?;
                narrow(abs, return_type)
            }
        }
    }
}
