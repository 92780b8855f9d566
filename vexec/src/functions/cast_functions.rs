// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! CAST and the vector cast kernel shared with scan column casters

use super::function_trait::{
    Arity, FunctionError, FunctionInput, FunctionResult, ScalarFunction,
};
use super::names;
use crate::storage::Value;
use crate::types::{LogicalType, TypeCaster};
use crate::vector::{SelectionVector, ValueVector};

/// Cast slot `src_pos` of `src` into slot `dst_pos` of `dst` (type of `dst`)
pub fn cast_entry(
    src: &ValueVector,
    src_pos: usize,
    dst: &mut ValueVector,
    dst_pos: usize,
) -> FunctionResult<()> {
    if src.is_null(src_pos) {
        dst.set_null(dst_pos, true);
        return Ok(());
    }
    match (src.data_type(), dst.data_type()) {
        (from, to) if from == to => dst.copy_from_vector(dst_pos, src, src_pos),
        (LogicalType::Int32, LogicalType::Int64) => {
            dst.set_value(dst_pos, src.get_value::<i32>(src_pos) as i64)
        }
        (LogicalType::Int32, LogicalType::Double) => {
            dst.set_value(dst_pos, src.get_value::<i32>(src_pos) as f64)
        }
        (LogicalType::Int64, LogicalType::Double) => {
            dst.set_value(dst_pos, src.get_value::<i64>(src_pos) as f64)
        }
        (_, to) => {
            let to = to.clone();
            let value = TypeCaster::cast_value(&src.get(src_pos), &to).map_err(|e| {
                FunctionError::ExecutionError {
                    message: format!("CAST: {}", e),
                }
            })?;
            dst.set(dst_pos, &value)
                .map_err(|e| FunctionError::ExecutionError {
                    message: format!("CAST: {}", e),
                })?;
        }
    }
    Ok(())
}

/// Cast every selected slot of `src` into the same slot of `dst`
pub fn cast_vector(
    src: &ValueVector,
    dst: &mut ValueVector,
    positions: &SelectionVector,
) -> FunctionResult<()> {
    for pos in positions.iter() {
        cast_entry(src, pos, dst, pos)?;
    }
    Ok(())
}

/// CAST(x AS type); the target type is the call's return type
#[derive(Debug)]
pub struct CastFunction;

impl ScalarFunction for CastFunction {
    fn name(&self) -> &str {
        names::CAST
    }

    fn description(&self) -> &str {
        "Converts a value to the target type"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }

    fn execute(&self, args: &[Value], return_type: &LogicalType) -> FunctionResult<Value> {
        TypeCaster::cast_value(&args[0], return_type).map_err(|e| FunctionError::ExecutionError {
            message: format!("CAST: {}", e),
        })
    }

    fn execute_vectors(
        &self,
        inputs: &[FunctionInput<'_>],
        positions: &SelectionVector,
        result: &mut ValueVector,
    ) -> FunctionResult<bool> {
        let input = &inputs[0];
        for pos in positions.iter() {
            cast_entry(input.vector, input.pos(pos), result, pos)?;
        }
        Ok(true)
    }
}
