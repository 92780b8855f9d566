// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Type casting for CAST functions and multi-table column casters

use crate::storage::value::{days_to_date, Value};
use crate::types::{LogicalType, TypeError, TypeResult};
use chrono::{NaiveDate, NaiveDateTime};

/// Type caster for explicit CAST operations
#[derive(Debug)]
pub struct TypeCaster;

impl TypeCaster {
    /// Check if a type can be explicitly cast to another
    pub fn can_cast(from: &LogicalType, to: &LogicalType) -> bool {
        if from == to {
            return true;
        }

        match (from, to) {
            (LogicalType::Bool, LogicalType::String) => true,
            (LogicalType::Bool, to_t) if to_t.is_numeric() => true,
            (LogicalType::String, LogicalType::Bool) => true,
            (from_t, LogicalType::Bool) if from_t.is_numeric() => true,

            (from_t, to_t) if from_t.is_numeric() && to_t.is_numeric() => true,
            (LogicalType::String, to_t) if to_t.is_numeric() => true,

            (LogicalType::Date, LogicalType::Timestamp) => true,
            (LogicalType::Timestamp, LogicalType::Date) => true,
            (LogicalType::String, to_t) if to_t.is_temporal() => true,

            (LogicalType::List(from_elem), LogicalType::List(to_elem)) => {
                Self::can_cast(from_elem, to_elem)
            }

            // Most scalars can be rendered as strings
            (from_t, LogicalType::String) => !matches!(
                from_t,
                LogicalType::Node | LogicalType::Rel | LogicalType::RecursiveRel
            ),

            _ => false,
        }
    }

    /// Whether `cast(x)` preserves ordering *and* the literal domain, so that
    /// bounds computed on the uncast column remain valid for predicates on the
    /// cast column. Only lossless numeric widenings qualify.
    pub fn is_order_preserving(from: &LogicalType, to: &LogicalType) -> bool {
        from == to
            || matches!(
                (from, to),
                (LogicalType::Int32, LogicalType::Int64)
                    | (LogicalType::Int32, LogicalType::Double)
                    | (LogicalType::Date, LogicalType::Timestamp)
            )
    }

    /// Cast a single non-null value to the target type
    pub fn cast_value(value: &Value, to: &LogicalType) -> TypeResult<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }

        let invalid = || {
            TypeError::InvalidCast(
                value
                    .logical_type()
                    .map(|t| t.to_string())
                    .unwrap_or_else(|| "NULL".to_string()),
                to.to_string(),
            )
        };

        match (value, to) {
            (Value::Bool(b), LogicalType::Bool) => Ok(Value::Bool(*b)),
            (Value::Bool(b), LogicalType::Int32) => Ok(Value::Int32(*b as i32)),
            (Value::Bool(b), LogicalType::Int64) => Ok(Value::Int64(*b as i64)),
            (Value::Bool(b), LogicalType::Double) => Ok(Value::Double(*b as i64 as f64)),

            (Value::Int32(_) | Value::Int64(_) | Value::Double(_), LogicalType::Bool) => {
                Ok(Value::Bool(value.as_f64().unwrap_or(0.0) != 0.0))
            }
            (Value::Int32(_) | Value::Int64(_), LogicalType::Int32) => {
                let v = value.as_i64().ok_or_else(invalid)?;
                i32::try_from(v)
                    .map(Value::Int32)
                    .map_err(|_| TypeError::NumericOverflow(format!("{} out of INT32 range", v)))
            }
            (Value::Int32(_) | Value::Int64(_), LogicalType::Int64) => {
                Ok(Value::Int64(value.as_i64().ok_or_else(invalid)?))
            }
            (Value::Double(d), LogicalType::Int32) => {
                let rounded = d.round();
                if rounded < i32::MIN as f64 || rounded > i32::MAX as f64 || rounded.is_nan() {
                    return Err(TypeError::NumericOverflow(format!(
                        "{} out of INT32 range",
                        d
                    )));
                }
                Ok(Value::Int32(rounded as i32))
            }
            (Value::Double(d), LogicalType::Int64) => {
                let rounded = d.round();
                if rounded < i64::MIN as f64 || rounded >= i64::MAX as f64 || rounded.is_nan() {
                    return Err(TypeError::NumericOverflow(format!(
                        "{} out of INT64 range",
                        d
                    )));
                }
                Ok(Value::Int64(rounded as i64))
            }
            (Value::Int32(_) | Value::Int64(_) | Value::Double(_), LogicalType::Double) => {
                Ok(Value::Double(value.as_f64().ok_or_else(invalid)?))
            }

            (Value::String(s), LogicalType::Bool) => match s.trim().to_ascii_lowercase().as_str()
            {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(TypeError::ConversionError(format!(
                    "Cannot parse '{}' as BOOL",
                    s
                ))),
            },
            (Value::String(s), LogicalType::Int32) => s
                .trim()
                .parse::<i32>()
                .map(Value::Int32)
                .map_err(|e| TypeError::ConversionError(format!("'{}': {}", s, e))),
            (Value::String(s), LogicalType::Int64) => s
                .trim()
                .parse::<i64>()
                .map(Value::Int64)
                .map_err(|e| TypeError::ConversionError(format!("'{}': {}", s, e))),
            (Value::String(s), LogicalType::Double) => s
                .trim()
                .parse::<f64>()
                .map(Value::Double)
                .map_err(|e| TypeError::ConversionError(format!("'{}': {}", s, e))),
            (Value::String(s), LogicalType::Date) => {
                NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                    .map(Value::Date)
                    .map_err(|e| TypeError::ConversionError(format!("'{}': {}", s, e)))
            }
            (Value::String(s), LogicalType::Timestamp) => {
                NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%d %H:%M:%S")
                    .map(Value::Timestamp)
                    .map_err(|e| TypeError::ConversionError(format!("'{}': {}", s, e)))
            }

            (Value::Date(d), LogicalType::Date) => Ok(Value::Date(*d)),
            (Value::Date(d), LogicalType::Timestamp) => d
                .and_hms_opt(0, 0, 0)
                .map(Value::Timestamp)
                .ok_or_else(invalid),
            (Value::Timestamp(ts), LogicalType::Timestamp) => Ok(Value::Timestamp(*ts)),
            (Value::Timestamp(ts), LogicalType::Date) => Ok(Value::Date(ts.date())),
            // DATE stored in an INT32 buffer surfaces as Int32 when read untyped
            (Value::Int32(days), LogicalType::Date) => {
                days_to_date(*days).map(Value::Date).ok_or_else(invalid)
            }

            (Value::List(items), LogicalType::List(child)) => items
                .iter()
                .map(|item| Self::cast_value(item, child))
                .collect::<TypeResult<Vec<_>>>()
                .map(Value::List),

            (Value::Struct(_), LogicalType::String) => Ok(Value::String(value.to_string())),
            (_, LogicalType::String) => Ok(Value::String(value.to_string())),
            (Value::InternalId(id), LogicalType::InternalId) => Ok(Value::InternalId(*id)),

            _ => Err(invalid()),
        }
    }
}
