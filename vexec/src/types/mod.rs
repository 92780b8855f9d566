// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Logical and physical type system for vectors
//!
//! Every `ValueVector` carries a [`LogicalType`]. The logical type decides which
//! [`PhysicalType`] buffer backs the vector, e.g. DATE values are stored as
//! `i32` days since the epoch and TIMESTAMP values as `i64` microseconds.

pub mod casting;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub use self::casting::TypeCaster;

/// Identifier of a node or relationship table
pub type TableId = u64;

/// Row offset inside a table
pub type Offset = u64;

/// Column position inside a table
pub type ColumnId = u32;

/// Internal identifier of a node or relationship: (offset, table)
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct InternalId {
    pub offset: Offset,
    pub table_id: TableId,
}

impl InternalId {
    pub fn new(offset: Offset, table_id: TableId) -> Self {
        Self { offset, table_id }
    }
}

impl fmt::Display for InternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.table_id, self.offset)
    }
}

/// Physical representation of a vector buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhysicalType {
    Bool,
    Int32,
    Int64,
    Double,
    String,
    InternalId,
    /// Lists, structs, nodes, relationships and paths
    Nested,
}

/// Logical types understood by the execution layer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalType {
    Bool,
    Int32,
    Int64,
    Double,
    String,
    Date,
    Timestamp,
    InternalId,
    List(Box<LogicalType>),
    Struct(Vec<(String, LogicalType)>),
    Node,
    Rel,
    /// Variable-length relationship / path value: `{_NODES, _RELS}`
    RecursiveRel,
}

impl LogicalType {
    pub fn physical_type(&self) -> PhysicalType {
        match self {
            LogicalType::Bool => PhysicalType::Bool,
            LogicalType::Int32 | LogicalType::Date => PhysicalType::Int32,
            LogicalType::Int64 | LogicalType::Timestamp => PhysicalType::Int64,
            LogicalType::Double => PhysicalType::Double,
            LogicalType::String => PhysicalType::String,
            LogicalType::InternalId => PhysicalType::InternalId,
            LogicalType::List(_)
            | LogicalType::Struct(_)
            | LogicalType::Node
            | LogicalType::Rel
            | LogicalType::RecursiveRel => PhysicalType::Nested,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            LogicalType::Int32 | LogicalType::Int64 | LogicalType::Double
        )
    }

    pub fn is_temporal(&self) -> bool {
        matches!(self, LogicalType::Date | LogicalType::Timestamp)
    }

    /// Element type of a LIST, `None` for anything else
    pub fn child_type(&self) -> Option<&LogicalType> {
        match self {
            LogicalType::List(child) => Some(child),
            _ => None,
        }
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalType::Bool => write!(f, "BOOL"),
            LogicalType::Int32 => write!(f, "INT32"),
            LogicalType::Int64 => write!(f, "INT64"),
            LogicalType::Double => write!(f, "DOUBLE"),
            LogicalType::String => write!(f, "STRING"),
            LogicalType::Date => write!(f, "DATE"),
            LogicalType::Timestamp => write!(f, "TIMESTAMP"),
            LogicalType::InternalId => write!(f, "INTERNAL_ID"),
            LogicalType::List(child) => write!(f, "{}[]", child),
            LogicalType::Struct(fields) => {
                write!(f, "STRUCT(")?;
                for (i, (name, ty)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} {}", name, ty)?;
                }
                write!(f, ")")
            }
            LogicalType::Node => write!(f, "NODE"),
            LogicalType::Rel => write!(f, "REL"),
            LogicalType::RecursiveRel => write!(f, "RECURSIVE_REL"),
        }
    }
}

/// Type error for cast and type-resolution operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TypeError {
    #[error("Cannot cast from {0} to {1}")]
    InvalidCast(String, String),

    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("Numeric overflow: {0}")]
    NumericOverflow(String),

    #[error("Conversion error: {0}")]
    ConversionError(String),
}

/// Result type for type system operations
pub type TypeResult<T> = Result<T, TypeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temporal_types_use_integer_buffers() {
        assert_eq!(LogicalType::Date.physical_type(), PhysicalType::Int32);
        assert_eq!(LogicalType::Timestamp.physical_type(), PhysicalType::Int64);
        assert_eq!(
            LogicalType::List(Box::new(LogicalType::Int64)).physical_type(),
            PhysicalType::Nested
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(
            LogicalType::List(Box::new(LogicalType::String)).to_string(),
            "STRING[]"
        );
        assert_eq!(InternalId::new(7, 2).to_string(), "2:7");
    }
}
