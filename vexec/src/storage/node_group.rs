// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Node groups: fixed-size row groups of a table, the unit of a scan morsel

use super::stats::{MergedColumnChunkStats, StatsBuilder};
use super::types::{StorageError, StorageResult};
use super::value::Value;
use crate::types::{ColumnId, LogicalType, Offset, PhysicalType, TypeCaster};
use crate::vector::ValueVector;

/// Values of one column inside a node group plus their running statistics
#[derive(Debug, Clone)]
pub struct ColumnChunk {
    data_type: LogicalType,
    values: Vec<Value>,
    stats: StatsBuilder,
}

impl ColumnChunk {
    fn new(data_type: LogicalType, capacity: usize) -> Self {
        Self {
            data_type,
            values: Vec::with_capacity(capacity.min(crate::vector::DEFAULT_VECTOR_CAPACITY)),
            stats: StatsBuilder::new(),
        }
    }

    fn append(&mut self, value: Value) -> StorageResult<()> {
        let value = coerce(value, &self.data_type)?;
        self.stats.update(&value);
        self.values.push(value);
        Ok(())
    }

    pub fn data_type(&self) -> &LogicalType {
        &self.data_type
    }

    pub fn value(&self, row: usize) -> &Value {
        &self.values[row]
    }

    pub fn stats(&self) -> MergedColumnChunkStats {
        self.stats.finish()
    }
}

/// Bring a value to the column type so that vectors can store it as is
pub(crate) fn coerce(value: Value, data_type: &LogicalType) -> StorageResult<Value> {
    if value.is_null() || data_type.physical_type() == PhysicalType::Nested {
        return Ok(value);
    }
    if value.logical_type().as_ref() == Some(data_type) {
        return Ok(value);
    }
    Ok(TypeCaster::cast_value(&value, data_type)?)
}

#[derive(Debug, Clone)]
pub struct NodeGroup {
    start_offset: Offset,
    capacity: usize,
    num_rows: usize,
    columns: Vec<ColumnChunk>,
}

impl NodeGroup {
    pub fn new(start_offset: Offset, capacity: usize, types: &[LogicalType]) -> Self {
        Self {
            start_offset,
            capacity,
            num_rows: 0,
            columns: types
                .iter()
                .map(|ty| ColumnChunk::new(ty.clone(), capacity))
                .collect(),
        }
    }

    pub fn start_offset(&self) -> Offset {
        self.start_offset
    }

    /// Offset one past the last row currently in the group
    pub fn end_offset(&self) -> Offset {
        self.start_offset + self.num_rows as Offset
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn is_full(&self) -> bool {
        self.num_rows >= self.capacity
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, column: ColumnId) -> Option<&ColumnChunk> {
        self.columns.get(column as usize)
    }

    /// Append one row and return its offset
    pub fn append(&mut self, row: Vec<Value>) -> StorageResult<Offset> {
        if self.is_full() {
            return Err(StorageError::InvalidOperation(format!(
                "node group starting at {} is full",
                self.start_offset
            )));
        }
        if row.len() != self.columns.len() {
            return Err(StorageError::InvalidOperation(format!(
                "expected {} values, got {}",
                self.columns.len(),
                row.len()
            )));
        }
        for (chunk, value) in self.columns.iter_mut().zip(row) {
            chunk.append(value)?;
        }
        let offset = self.end_offset();
        self.num_rows += 1;
        Ok(offset)
    }

    pub fn value(&self, row: usize, column: ColumnId) -> Option<&Value> {
        if row >= self.num_rows {
            return None;
        }
        self.column(column).map(|chunk| chunk.value(row))
    }

    pub fn stats(&self, column: ColumnId) -> Option<MergedColumnChunkStats> {
        self.column(column).map(|chunk| chunk.stats())
    }

    /// Write row `row` of the requested columns into slot `pos` of `outputs`.
    /// A `None` column id produces NULL.
    pub fn read_row_into(
        &self,
        row: usize,
        column_ids: &[Option<ColumnId>],
        outputs: &mut [&mut ValueVector],
        pos: usize,
    ) -> StorageResult<()> {
        for (column_id, output) in column_ids.iter().zip(outputs.iter_mut()) {
            match column_id.and_then(|id| self.value(row, id)) {
                Some(value) => output.set(pos, value)?,
                None => output.set_null(pos, true),
            }
        }
        Ok(())
    }
}
