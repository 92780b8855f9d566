// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Storage error types

use crate::types::TypeError;
use thiserror::Error;

/// Error types for storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Node group {node_group_idx} out of range for table {table}")]
    NodeGroupOutOfRange { table: String, node_group_idx: usize },

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Corrupted statistics: {0}")]
    CorruptedStats(String),

    #[error("Duplicate primary key: {0}")]
    DuplicatePrimaryKey(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Type error: {0}")]
    Type(#[from] TypeError),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
