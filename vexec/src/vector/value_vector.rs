// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Columnar value vectors
//!
//! A `ValueVector` holds up to `capacity` values of one logical type in a typed
//! buffer plus a parallel null mask. Slot contents are only meaningful when the
//! slot is not null, so every reader checks [`ValueVector::is_null`] first.

use super::bitmask::BitMask;
use super::chunk_state::StateId;
use super::DEFAULT_VECTOR_CAPACITY;
use crate::storage::value::{
    date_to_days, days_to_date, micros_to_timestamp, timestamp_to_micros, Value,
};
use crate::types::{InternalId, LogicalType, PhysicalType, TypeError, TypeResult};
use std::cmp::Ordering;

/// Typed backing buffer of a vector
#[doc(hidden)]
#[derive(Debug, Clone)]
pub enum VectorData {
    Bool(Vec<bool>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    Double(Vec<f64>),
    String(Vec<String>),
    InternalId(Vec<InternalId>),
    Nested(Vec<Value>),
}

impl VectorData {
    fn allocate(physical: PhysicalType, capacity: usize) -> Self {
        match physical {
            PhysicalType::Bool => VectorData::Bool(vec![false; capacity]),
            PhysicalType::Int32 => VectorData::Int32(vec![0; capacity]),
            PhysicalType::Int64 => VectorData::Int64(vec![0; capacity]),
            PhysicalType::Double => VectorData::Double(vec![0.0; capacity]),
            PhysicalType::String => VectorData::String(vec![String::new(); capacity]),
            PhysicalType::InternalId => {
                VectorData::InternalId(vec![InternalId::default(); capacity])
            }
            PhysicalType::Nested => VectorData::Nested(vec![Value::Null; capacity]),
        }
    }
}

/// Fixed-width types that can be read and written through
/// [`ValueVector::get_value`] / [`ValueVector::set_value`]
pub trait PrimitiveValue: Copy + Default {
    fn buffer(data: &VectorData) -> Option<&[Self]>;
    fn buffer_mut(data: &mut VectorData) -> Option<&mut [Self]>;
}

macro_rules! impl_primitive_value {
    ($ty:ty, $variant:ident) => {
        impl PrimitiveValue for $ty {
            fn buffer(data: &VectorData) -> Option<&[Self]> {
                match data {
                    VectorData::$variant(values) => Some(values),
                    _ => None,
                }
            }

            fn buffer_mut(data: &mut VectorData) -> Option<&mut [Self]> {
                match data {
                    VectorData::$variant(values) => Some(values),
                    _ => None,
                }
            }
        }
    };
}

impl_primitive_value!(bool, Bool);
impl_primitive_value!(i32, Int32);
impl_primitive_value!(i64, Int64);
impl_primitive_value!(f64, Double);
impl_primitive_value!(InternalId, InternalId);

#[derive(Debug, Clone)]
pub struct ValueVector {
    data_type: LogicalType,
    data: VectorData,
    nulls: BitMask,
    state: Option<StateId>,
}

impl ValueVector {
    pub fn new(data_type: LogicalType) -> Self {
        Self::with_capacity(data_type, DEFAULT_VECTOR_CAPACITY)
    }

    pub fn with_capacity(data_type: LogicalType, capacity: usize) -> Self {
        Self {
            data: VectorData::allocate(data_type.physical_type(), capacity),
            data_type,
            nulls: BitMask::new(capacity),
            state: None,
        }
    }

    pub fn data_type(&self) -> &LogicalType {
        &self.data_type
    }

    pub fn capacity(&self) -> usize {
        self.nulls.capacity()
    }

    pub fn state(&self) -> Option<StateId> {
        self.state
    }

    pub fn set_state(&mut self, state: StateId) {
        self.state = Some(state);
    }

    #[inline]
    pub fn is_null(&self, pos: usize) -> bool {
        self.nulls.is_set(pos)
    }

    #[inline]
    pub fn set_null(&mut self, pos: usize, is_null: bool) {
        self.nulls.set(pos, is_null);
    }

    pub fn set_all_null(&mut self) {
        self.nulls.set_all();
    }

    pub fn set_all_non_null(&mut self) {
        self.nulls.clear_all();
    }

    pub fn has_no_nulls(&self) -> bool {
        self.nulls.is_clear()
    }

    /// Read a fixed-width value. Reading with the wrong primitive type is an
    /// invariant violation.
    #[inline]
    pub fn get_value<T: PrimitiveValue>(&self, pos: usize) -> T {
        match T::buffer(&self.data) {
            Some(values) => values[pos],
            None => {
                debug_assert!(false, "primitive read on {} vector", self.data_type);
                T::default()
            }
        }
    }

    /// Write a fixed-width value and clear the null bit
    #[inline]
    pub fn set_value<T: PrimitiveValue>(&mut self, pos: usize, value: T) {
        match T::buffer_mut(&mut self.data) {
            Some(values) => {
                values[pos] = value;
                self.nulls.set(pos, false);
            }
            None => debug_assert!(false, "primitive write on {} vector", self.data_type),
        }
    }

    pub fn get_str(&self, pos: usize) -> &str {
        match &self.data {
            VectorData::String(values) => &values[pos],
            _ => {
                debug_assert!(false, "string read on {} vector", self.data_type);
                ""
            }
        }
    }

    pub fn set_str(&mut self, pos: usize, value: &str) {
        match &mut self.data {
            VectorData::String(values) => {
                values[pos].clear();
                values[pos].push_str(value);
                self.nulls.set(pos, false);
            }
            _ => debug_assert!(false, "string write on {} vector", self.data_type),
        }
    }

    /// Borrow a nested (list/struct/node/rel/path) slot
    pub fn get_nested(&self, pos: usize) -> &Value {
        match &self.data {
            VectorData::Nested(values) => &values[pos],
            _ => {
                debug_assert!(false, "nested read on {} vector", self.data_type);
                &Value::Null
            }
        }
    }

    /// Materialize slot `pos` as a [`Value`], `Value::Null` when the slot is null
    pub fn get(&self, pos: usize) -> Value {
        if self.is_null(pos) {
            return Value::Null;
        }
        match (&self.data, &self.data_type) {
            (VectorData::Bool(v), _) => Value::Bool(v[pos]),
            (VectorData::Int32(v), LogicalType::Date) => {
                days_to_date(v[pos]).map(Value::Date).unwrap_or(Value::Null)
            }
            (VectorData::Int32(v), _) => Value::Int32(v[pos]),
            (VectorData::Int64(v), LogicalType::Timestamp) => micros_to_timestamp(v[pos])
                .map(Value::Timestamp)
                .unwrap_or(Value::Null),
            (VectorData::Int64(v), _) => Value::Int64(v[pos]),
            (VectorData::Double(v), _) => Value::Double(v[pos]),
            (VectorData::String(v), _) => Value::String(v[pos].clone()),
            (VectorData::InternalId(v), _) => Value::InternalId(v[pos]),
            (VectorData::Nested(v), _) => v[pos].clone(),
        }
    }

    /// Store a [`Value`] into slot `pos`. The value must already have the
    /// vector's type; conversions belong to CAST.
    pub fn set(&mut self, pos: usize, value: &Value) -> TypeResult<()> {
        if value.is_null() {
            self.nulls.set(pos, true);
            return Ok(());
        }
        let mismatch = || TypeError::TypeMismatch {
            expected: self.data_type.to_string(),
            actual: value
                .logical_type()
                .map(|t| t.to_string())
                .unwrap_or_else(|| "NULL".to_string()),
        };
        match (&mut self.data, value) {
            (VectorData::Bool(v), Value::Bool(b)) => v[pos] = *b,
            (VectorData::Int32(v), Value::Int32(x)) => v[pos] = *x,
            (VectorData::Int32(v), Value::Date(d)) => v[pos] = date_to_days(d),
            (VectorData::Int64(v), Value::Int64(x)) => v[pos] = *x,
            (VectorData::Int64(v), Value::Int32(x)) => v[pos] = *x as i64,
            (VectorData::Int64(v), Value::Timestamp(ts)) => {
                v[pos] = timestamp_to_micros(ts).ok_or_else(|| {
                    TypeError::NumericOverflow(format!("timestamp {} out of range", ts))
                })?
            }
            (VectorData::Double(v), Value::Double(x)) => v[pos] = *x,
            (VectorData::Double(v), Value::Int32(_) | Value::Int64(_)) => {
                v[pos] = value.as_f64().ok_or_else(mismatch)?
            }
            (VectorData::String(v), Value::String(s)) => {
                v[pos].clear();
                v[pos].push_str(s);
            }
            (VectorData::InternalId(v), Value::InternalId(id)) => v[pos] = *id,
            (VectorData::Nested(v), Value::List(_) | Value::Struct(_)) => v[pos] = value.clone(),
            _ => return Err(mismatch()),
        }
        self.nulls.set(pos, false);
        Ok(())
    }

    /// Copy slot `src_pos` of `src` (including its null bit) into slot `pos`
    pub fn copy_from_vector(&mut self, pos: usize, src: &ValueVector, src_pos: usize) {
        if src.is_null(src_pos) {
            self.nulls.set(pos, true);
            return;
        }
        match (&mut self.data, &src.data) {
            (VectorData::Bool(d), VectorData::Bool(s)) => d[pos] = s[src_pos],
            (VectorData::Int32(d), VectorData::Int32(s)) => d[pos] = s[src_pos],
            (VectorData::Int64(d), VectorData::Int64(s)) => d[pos] = s[src_pos],
            (VectorData::Double(d), VectorData::Double(s)) => d[pos] = s[src_pos],
            (VectorData::String(d), VectorData::String(s)) => {
                d[pos].clear();
                d[pos].push_str(&s[src_pos]);
            }
            (VectorData::InternalId(d), VectorData::InternalId(s)) => d[pos] = s[src_pos],
            (VectorData::Nested(d), VectorData::Nested(s)) => d[pos] = s[src_pos].clone(),
            _ => {
                let value = src.get(src_pos);
                if self.set(pos, &value).is_err() {
                    debug_assert!(
                        false,
                        "copy between {} and {} vectors",
                        src.data_type, self.data_type
                    );
                    self.nulls.set(pos, true);
                }
                return;
            }
        }
        self.nulls.set(pos, false);
    }

    /// Compare slot `pos` with slot `other_pos` of `other`; `None` if either is
    /// null or the types are not comparable
    pub fn compare_at(&self, pos: usize, other: &ValueVector, other_pos: usize) -> Option<Ordering> {
        if self.is_null(pos) || other.is_null(other_pos) {
            return None;
        }
        if self.data_type == other.data_type {
            match (&self.data, &other.data) {
                (VectorData::Bool(a), VectorData::Bool(b)) => return Some(a[pos].cmp(&b[other_pos])),
                (VectorData::Int32(a), VectorData::Int32(b)) => {
                    return Some(a[pos].cmp(&b[other_pos]))
                }
                (VectorData::Int64(a), VectorData::Int64(b)) => {
                    return Some(a[pos].cmp(&b[other_pos]))
                }
                (VectorData::Double(a), VectorData::Double(b)) => {
                    return a[pos].partial_cmp(&b[other_pos])
                }
                (VectorData::String(a), VectorData::String(b)) => {
                    return Some(a[pos].cmp(&b[other_pos]))
                }
                (VectorData::InternalId(a), VectorData::InternalId(b)) => {
                    return Some(a[pos].cmp(&b[other_pos]))
                }
                _ => {}
            }
        }
        self.get(pos).compare(&other.get(other_pos))
    }

    /// Boolean at `pos` treating NULL as false
    #[inline]
    pub fn is_true(&self, pos: usize) -> bool {
        !self.is_null(pos) && self.get_value::<bool>(pos)
    }
}
