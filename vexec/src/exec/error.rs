// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Execution error types

use crate::functions::FunctionError;
use crate::storage::StorageError;
use crate::types::TypeError;
use thiserror::Error;

/// Execution errors
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Expression evaluation error: {0}")]
    ExpressionError(String),

    #[error("Type error: {0}")]
    TypeError(String),

    #[error("Function error: {0}")]
    Function(#[from] FunctionError),

    #[error("Runtime error: {0}")]
    RuntimeError(String),

    #[error("Invalid plan: {0}")]
    InvalidPlan(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Query interrupted")]
    Interrupted,
}

impl From<StorageError> for ExecutionError {
    fn from(error: StorageError) -> Self {
        ExecutionError::StorageError(error.to_string())
    }
}

impl From<TypeError> for ExecutionError {
    fn from(error: TypeError) -> Self {
        ExecutionError::TypeError(error.to_string())
    }
}

/// Result type for execution
pub type ExecutionResult<T> = Result<T, ExecutionError>;
