// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Scalar value type
//!
//! `Value` is the row-at-a-time representation used for literals, predicate
//! constants, statistics bounds and nested vector slots. Columnar buffers never
//! store `Value` for primitive types; see `vector::ValueVector`.

use crate::types::{InternalId, LogicalType};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Field name of the id inside node and relationship struct values
pub const ID_FIELD: &str = "_ID";
/// Field name of the label inside node and relationship struct values
pub const LABEL_FIELD: &str = "_LABEL";
/// Source node id of a relationship struct value
pub const SRC_FIELD: &str = "_SRC";
/// Destination node id of a relationship struct value
pub const DST_FIELD: &str = "_DST";
/// Node list of a path / recursive relationship value
pub const NODES_FIELD: &str = "_NODES";
/// Relationship list of a path / recursive relationship value
pub const RELS_FIELD: &str = "_RELS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Double(f64),
    String(String),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    InternalId(InternalId),
    List(Vec<Value>),
    /// Struct, node, relationship and path values
    Struct(Vec<(String, Value)>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Extract an integer, widening INT32
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int32(v) => Some(*v as i64),
            Value::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Extract any numeric value as f64
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int32(v) => Some(*v as f64),
            Value::Int64(v) => Some(*v as f64),
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_internal_id(&self) -> Option<InternalId> {
        match self {
            Value::InternalId(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Look up a field of a struct value by name
    pub fn struct_field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Struct(fields) => fields.iter().find(|(n, _)| n == name).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Logical type of a non-null scalar; nested values report their shape
    pub fn logical_type(&self) -> Option<LogicalType> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(LogicalType::Bool),
            Value::Int32(_) => Some(LogicalType::Int32),
            Value::Int64(_) => Some(LogicalType::Int64),
            Value::Double(_) => Some(LogicalType::Double),
            Value::String(_) => Some(LogicalType::String),
            Value::Date(_) => Some(LogicalType::Date),
            Value::Timestamp(_) => Some(LogicalType::Timestamp),
            Value::InternalId(_) => Some(LogicalType::InternalId),
            Value::List(items) => {
                let child = items
                    .iter()
                    .find_map(|v| v.logical_type())
                    .unwrap_or(LogicalType::Int64);
                Some(LogicalType::List(Box::new(child)))
            }
            Value::Struct(fields) => Some(LogicalType::Struct(
                fields
                    .iter()
                    .map(|(n, v)| (n.clone(), v.logical_type().unwrap_or(LogicalType::Int64)))
                    .collect(),
            )),
        }
    }

    /// Ordering between two values, `None` when either side is NULL or the
    /// types are not comparable. Numeric types compare across widths; DATE
    /// compares with TIMESTAMP at midnight.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, _) | (_, Value::Null) => None,
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Int32(_) | Value::Int64(_), Value::Int32(_) | Value::Int64(_)) => {
                Some(self.as_i64()?.cmp(&other.as_i64()?))
            }
            (
                Value::Int32(_) | Value::Int64(_) | Value::Double(_),
                Value::Int32(_) | Value::Int64(_) | Value::Double(_),
            ) => self.as_f64()?.partial_cmp(&other.as_f64()?),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
            (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
            (Value::Date(a), Value::Timestamp(b)) => Some(a.and_hms_opt(0, 0, 0)?.cmp(b)),
            (Value::Timestamp(a), Value::Date(b)) => Some(a.cmp(&b.and_hms_opt(0, 0, 0)?)),
            (Value::InternalId(a), Value::InternalId(b)) => Some(a.cmp(b)),
            (Value::List(a), Value::List(b)) => {
                for (x, y) in a.iter().zip(b.iter()) {
                    match x.compare(y)? {
                        Ordering::Equal => continue,
                        ord => return Some(ord),
                    }
                }
                Some(a.len().cmp(&b.len()))
            }
            _ => None,
        }
    }
}

fn epoch_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default()
}

/// Days since 1970-01-01
pub fn date_to_days(date: &NaiveDate) -> i32 {
    date.signed_duration_since(epoch_date()).num_days() as i32
}

pub fn days_to_date(days: i32) -> Option<NaiveDate> {
    epoch_date().checked_add_signed(Duration::days(days as i64))
}

/// Microseconds since 1970-01-01 00:00:00
pub fn timestamp_to_micros(ts: &NaiveDateTime) -> Option<i64> {
    let epoch = epoch_date().and_hms_opt(0, 0, 0)?;
    ts.signed_duration_since(epoch).num_microseconds()
}

pub fn micros_to_timestamp(micros: i64) -> Option<NaiveDateTime> {
    let epoch = epoch_date().and_hms_opt(0, 0, 0)?;
    epoch.checked_add_signed(Duration::microseconds(micros))
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int32(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::Double(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "{}", s),
            Value::Date(d) => write!(f, "{}", d),
            Value::Timestamp(ts) => write!(f, "{}", ts),
            Value::InternalId(id) => write!(f, "{}", id),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Struct(fields) => {
                write!(f, "{{")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<InternalId> for Value {
    fn from(v: InternalId) -> Self {
        Value::InternalId(v)
    }
}
