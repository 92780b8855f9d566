// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Casting of scanned columns whose stored type differs from the output type

use crate::exec::{ExecutionError, ExecutionResult};
use crate::functions::cast_functions::cast_vector;
use crate::types::{LogicalType, TypeCaster};
use crate::vector::{SelectionVector, ValueVector};

/// Scans one column into a temporary vector of the stored type and casts the
/// selected slots into the output vector
#[derive(Debug, Clone)]
pub struct ColumnCaster {
    temp: ValueVector,
    target_type: LogicalType,
}

impl ColumnCaster {
    pub fn new(source_type: LogicalType, target_type: LogicalType) -> ExecutionResult<Self> {
        if !TypeCaster::can_cast(&source_type, &target_type) {
            return Err(ExecutionError::TypeError(format!(
                "cannot cast scanned column of type {} to {}",
                source_type, target_type
            )));
        }
        Ok(Self {
            temp: ValueVector::new(source_type),
            target_type,
        })
    }

    pub fn source_type(&self) -> &LogicalType {
        self.temp.data_type()
    }

    pub fn target_type(&self) -> &LogicalType {
        &self.target_type
    }

    /// Vector the table writes into instead of the output vector
    pub fn temp_vector_mut(&mut self) -> &mut ValueVector {
        &mut self.temp
    }

    pub fn cast(&self, output: &mut ValueVector, sel: &SelectionVector) -> ExecutionResult<()> {
        debug_assert_eq!(output.data_type(), &self.target_type);
        cast_vector(&self.temp, output, sel)?;
        Ok(())
    }
}
