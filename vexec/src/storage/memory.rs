// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! In-memory node and relationship tables
//!
//! Rows are kept in fixed-size node groups with per-column statistics so that
//! scans can be split into morsels and pruned by zone maps. Relationship tables
//! keep forward and backward adjacency lists with statistics per bound-node
//! node group.

use super::node_group::{coerce, NodeGroup};
use super::stats::{MergedColumnChunkStats, StatsBuilder};
use super::table::{RelDataDirection, ScanOutput, Table, TableScanSource, TableScanState};
use super::types::{StorageError, StorageResult};
use super::value::{Value, ID_FIELD};
use crate::config::ExecutionConfig;
use crate::txn::Transaction;
use crate::types::{ColumnId, InternalId, LogicalType, Offset, TableId};
use crate::vector::{ValueVector, DEFAULT_VECTOR_CAPACITY};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::ops::Range;

/// Hashable form of a primary key value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum PrimaryKey {
    Int(i64),
    String(String),
}

impl PrimaryKey {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int32(_) | Value::Int64(_) => value.as_i64().map(PrimaryKey::Int),
            Value::String(s) => Some(PrimaryKey::String(s.clone())),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct NodeTableData {
    groups: Vec<NodeGroup>,
    pk_index: HashMap<PrimaryKey, Offset>,
}

impl NodeTableData {
    fn num_rows(&self) -> Offset {
        self.groups.last().map_or(0, |g| g.end_offset())
    }
}

/// In-memory node table
#[derive(Debug)]
pub struct MemoryNodeTable {
    table_id: TableId,
    name: String,
    column_names: Vec<String>,
    types: Vec<LogicalType>,
    primary_key: Option<ColumnId>,
    node_group_size: usize,
    data: RwLock<NodeTableData>,
}

impl MemoryNodeTable {
    pub fn new(
        table_id: TableId,
        name: impl Into<String>,
        columns: Vec<(String, LogicalType)>,
        node_group_size: usize,
    ) -> Self {
        let (column_names, types) = columns.into_iter().unzip();
        Self {
            table_id,
            name: name.into(),
            column_names,
            types,
            primary_key: None,
            node_group_size: node_group_size.max(1),
            data: RwLock::new(NodeTableData::default()),
        }
    }

    /// Table whose node groups follow [`ExecutionConfig::node_group_size`]
    pub fn with_config(
        table_id: TableId,
        name: impl Into<String>,
        columns: Vec<(String, LogicalType)>,
        config: &ExecutionConfig,
    ) -> Self {
        Self::new(table_id, name, columns, config.node_group_size)
    }

    /// Index `column` as the primary key; only INT32, INT64 and STRING keys
    /// are supported
    pub fn with_primary_key(mut self, column: &str) -> StorageResult<Self> {
        let column_id = self
            .column_id(column)
            .ok_or_else(|| StorageError::ColumnNotFound(column.to_string()))?;
        match &self.types[column_id as usize] {
            LogicalType::Int32 | LogicalType::Int64 | LogicalType::String => {}
            other => {
                return Err(StorageError::InvalidOperation(format!(
                    "{} cannot be a primary key",
                    other
                )))
            }
        }
        self.primary_key = Some(column_id);
        Ok(self)
    }

    pub fn node_group_size(&self) -> usize {
        self.node_group_size
    }

    pub fn num_rows(&self) -> Offset {
        self.data.read().num_rows()
    }

    fn primary_key_of(&self, row: &[Value]) -> StorageResult<Option<PrimaryKey>> {
        let Some(pk_column) = self.primary_key else {
            return Ok(None);
        };
        let value = row
            .get(pk_column as usize)
            .map(|v| coerce(v.clone(), &self.types[pk_column as usize]))
            .transpose()?
            .unwrap_or(Value::Null);
        PrimaryKey::from_value(&value).map(Some).ok_or_else(|| {
            StorageError::InvalidOperation(format!(
                "primary key of {} must be a non-null INT or STRING, got {}",
                self.name, value
            ))
        })
    }

    /// Append a committed row
    pub fn append(&self, row: Vec<Value>) -> StorageResult<Offset> {
        let key = self.primary_key_of(&row)?;
        let mut data = self.data.write();
        if let Some(key) = &key {
            if data.pk_index.contains_key(key) {
                return Err(StorageError::DuplicatePrimaryKey(format!("{:?}", key)));
            }
        }
        let needs_group = data.groups.last().map_or(true, |g| g.is_full());
        if needs_group {
            let start = data.num_rows();
            data.groups
                .push(NodeGroup::new(start, self.node_group_size, &self.types));
        }
        let num_groups = data.groups.len();
        let offset = data.groups[num_groups - 1].append(row)?;
        if let Some(key) = key {
            data.pk_index.insert(key, offset);
        }
        Ok(offset)
    }

    /// Insert an uncommitted row into the transaction's local storage
    pub fn insert(&self, transaction: &Transaction, row: Vec<Value>) -> StorageResult<Offset> {
        let key = self.primary_key_of(&row)?;
        if let Some(key) = &key {
            if self.data.read().pk_index.contains_key(key)
                || self.find_local_pk(transaction, key).is_some()
            {
                return Err(StorageError::DuplicatePrimaryKey(format!("{:?}", key)));
            }
        }
        let start_offset = self.num_rows();
        let mut local = transaction.local_storage_mut()?;
        local
            .get_or_create_table(self.table_id, start_offset, self.node_group_size, &self.types)
            .append(row)
    }

    fn find_local_pk(&self, transaction: &Transaction, key: &PrimaryKey) -> Option<Offset> {
        let pk_column = self.primary_key?;
        let local = transaction.local_storage();
        let table = local.table(self.table_id)?;
        table.node_groups().iter().find_map(|group| {
            (0..group.num_rows()).find_map(|row| {
                let value = group.value(row, pk_column)?;
                (PrimaryKey::from_value(value).as_ref() == Some(key))
                    .then(|| group.start_offset() + row as Offset)
            })
        })
    }

    fn out_of_range(&self, node_group_idx: usize) -> StorageError {
        StorageError::NodeGroupOutOfRange {
            table: self.name.clone(),
            node_group_idx,
        }
    }

    fn with_node_group<R>(
        &self,
        transaction: &Transaction,
        source: TableScanSource,
        node_group_idx: usize,
        f: impl FnOnce(&NodeGroup) -> StorageResult<R>,
    ) -> StorageResult<R> {
        match source {
            TableScanSource::Committed => {
                let data = self.data.read();
                let group = data
                    .groups
                    .get(node_group_idx)
                    .ok_or_else(|| self.out_of_range(node_group_idx))?;
                f(group)
            }
            TableScanSource::Uncommitted => {
                let local = transaction.local_storage();
                let group = local
                    .table(self.table_id)
                    .and_then(|t| t.node_group(node_group_idx))
                    .ok_or_else(|| self.out_of_range(node_group_idx))?;
                f(group)
            }
            TableScanSource::None => Err(StorageError::InvalidOperation(
                "scan state is not positioned on a node group".to_string(),
            )),
        }
    }
}

impl Table for MemoryNodeTable {
    fn table_id(&self) -> TableId {
        self.table_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn num_columns(&self) -> usize {
        self.types.len()
    }

    fn column_type(&self, column: ColumnId) -> Option<&LogicalType> {
        self.types.get(column as usize)
    }

    fn column_id(&self, name: &str) -> Option<ColumnId> {
        self.column_names
            .iter()
            .position(|n| n.eq_ignore_ascii_case(name))
            .map(|idx| idx as ColumnId)
    }

    fn num_committed_node_groups(&self) -> usize {
        self.data.read().groups.len()
    }

    fn node_group_range(
        &self,
        transaction: &Transaction,
        source: TableScanSource,
        node_group_idx: usize,
    ) -> StorageResult<Range<Offset>> {
        self.with_node_group(transaction, source, node_group_idx, |group| {
            Ok(group.start_offset()..group.end_offset())
        })
    }

    fn init_scan_state(
        &self,
        transaction: &Transaction,
        state: &mut TableScanState,
    ) -> StorageResult<()> {
        self.with_node_group(transaction, state.source, state.node_group_idx, |_| Ok(()))?;
        state.next_row = 0;
        Ok(())
    }

    fn scan(
        &self,
        transaction: &Transaction,
        state: &mut TableScanState,
        output: &mut ScanOutput<'_>,
    ) -> StorageResult<bool> {
        let table_id = self.table_id;
        let start_row = state.next_row;
        let num_read =
            self.with_node_group(transaction, state.source, state.node_group_idx, |group| {
                let num_read = group
                    .num_rows()
                    .saturating_sub(start_row)
                    .min(DEFAULT_VECTOR_CAPACITY);
                for i in 0..num_read {
                    let row = start_row + i;
                    let id = InternalId::new(group.start_offset() + row as Offset, table_id);
                    output.id_vector.set_value(i, id);
                    group.read_row_into(row, &state.column_ids, &mut output.columns, i)?;
                }
                Ok(num_read)
            })?;
        state.next_row += num_read;
        output.state.init_original_and_selected_size(num_read);
        Ok(num_read > 0)
    }

    fn merged_stats(
        &self,
        transaction: &Transaction,
        state: &TableScanState,
        column: ColumnId,
    ) -> StorageResult<Option<MergedColumnChunkStats>> {
        if column as usize >= self.types.len() {
            return Err(StorageError::ColumnNotFound(format!(
                "{}.{}",
                self.name, column
            )));
        }
        self.with_node_group(transaction, state.source, state.node_group_idx, |group| {
            Ok(group.stats(column))
        })
    }

    fn lookup_pk(
        &self,
        transaction: &Transaction,
        key_vector: &ValueVector,
        pos: usize,
    ) -> StorageResult<Option<Offset>> {
        let Some(pk_column) = self.primary_key else {
            return Err(StorageError::InvalidOperation(format!(
                "{} has no primary key",
                self.name
            )));
        };
        if key_vector.is_null(pos) {
            return Ok(None);
        }
        let key_value = coerce(key_vector.get(pos), &self.types[pk_column as usize])?;
        let Some(key) = PrimaryKey::from_value(&key_value) else {
            return Ok(None);
        };
        if let Some(offset) = self.data.read().pk_index.get(&key) {
            return Ok(Some(*offset));
        }
        Ok(self.find_local_pk(transaction, &key))
    }

    fn lookup(
        &self,
        transaction: &Transaction,
        state: &TableScanState,
        offset: Offset,
        output: &mut ScanOutput<'_>,
        pos: usize,
    ) -> StorageResult<bool> {
        let committed_rows = self.num_rows();
        let (source, node_group_idx) = if offset < committed_rows {
            (
                TableScanSource::Committed,
                (offset / self.node_group_size as Offset) as usize,
            )
        } else {
            let local = transaction.local_storage();
            let found = local.table(self.table_id).and_then(|table| {
                table
                    .node_groups()
                    .iter()
                    .position(|g| g.start_offset() <= offset && offset < g.end_offset())
            });
            match found {
                Some(idx) => (TableScanSource::Uncommitted, idx),
                None => return Ok(false),
            }
        };
        let table_id = self.table_id;
        self.with_node_group(transaction, source, node_group_idx, |group| {
            let row = (offset - group.start_offset()) as usize;
            output
                .id_vector
                .set_value(pos, InternalId::new(offset, table_id));
            group.read_row_into(row, &state.column_ids, &mut output.columns, pos)?;
            Ok(true)
        })
    }
}

#[derive(Debug, Clone)]
struct RelRecord {
    src: Offset,
    dst: Offset,
    /// Property values, without the leading `_ID` column
    properties: Vec<Value>,
}

/// Adjacency lists of one direction plus their zone maps
#[derive(Debug, Default)]
struct Adjacency {
    lists: HashMap<Offset, Vec<usize>>,
    /// Statistics per bound-node node group, one builder per column
    stats: HashMap<usize, Vec<StatsBuilder>>,
}

#[derive(Debug, Default)]
struct RelTableData {
    rels: Vec<RelRecord>,
    fwd: Adjacency,
    bwd: Adjacency,
}

impl RelTableData {
    fn adjacency(&self, direction: RelDataDirection) -> &Adjacency {
        match direction {
            RelDataDirection::Fwd => &self.fwd,
            RelDataDirection::Bwd => &self.bwd,
        }
    }
}

/// In-memory relationship table
///
/// Column 0 is the relationship id (`_ID`); properties follow.
#[derive(Debug)]
pub struct MemoryRelTable {
    table_id: TableId,
    name: String,
    src_table_id: TableId,
    dst_table_id: TableId,
    column_names: Vec<String>,
    types: Vec<LogicalType>,
    node_group_size: usize,
    data: RwLock<RelTableData>,
}

impl MemoryRelTable {
    pub fn new(
        table_id: TableId,
        name: impl Into<String>,
        src_table_id: TableId,
        dst_table_id: TableId,
        properties: Vec<(String, LogicalType)>,
        node_group_size: usize,
    ) -> Self {
        let mut column_names = vec![ID_FIELD.to_string()];
        let mut types = vec![LogicalType::InternalId];
        for (name, ty) in properties {
            column_names.push(name);
            types.push(ty);
        }
        Self {
            table_id,
            name: name.into(),
            src_table_id,
            dst_table_id,
            column_names,
            types,
            node_group_size: node_group_size.max(1),
            data: RwLock::new(RelTableData::default()),
        }
    }

    pub fn src_table_id(&self) -> TableId {
        self.src_table_id
    }

    pub fn dst_table_id(&self) -> TableId {
        self.dst_table_id
    }

    pub fn num_rels(&self) -> usize {
        self.data.read().rels.len()
    }

    /// Append a committed relationship and return its offset
    pub fn append(&self, src: Offset, dst: Offset, properties: Vec<Value>) -> StorageResult<Offset> {
        if properties.len() + 1 != self.types.len() {
            return Err(StorageError::InvalidOperation(format!(
                "expected {} properties, got {}",
                self.types.len() - 1,
                properties.len()
            )));
        }
        let properties = properties
            .into_iter()
            .zip(self.types.iter().skip(1))
            .map(|(value, ty)| coerce(value, ty))
            .collect::<StorageResult<Vec<_>>>()?;

        let mut guard = self.data.write();
        let data = &mut *guard;
        let rel_idx = data.rels.len();
        let rel_id = Value::InternalId(InternalId::new(rel_idx as Offset, self.table_id));
        let num_columns = self.types.len();
        for (bound, adjacency) in [(src, &mut data.fwd), (dst, &mut data.bwd)] {
            adjacency.lists.entry(bound).or_default().push(rel_idx);
            let group = (bound / self.node_group_size as Offset) as usize;
            let builders = adjacency
                .stats
                .entry(group)
                .or_insert_with(|| vec![StatsBuilder::new(); num_columns]);
            builders[0].update(&rel_id);
            for (builder, value) in builders[1..].iter_mut().zip(properties.iter()) {
                builder.update(value);
            }
        }
        data.rels.push(RelRecord {
            src,
            dst,
            properties,
        });
        Ok(rel_idx as Offset)
    }

    fn write_columns(
        &self,
        rel_idx: usize,
        record: &RelRecord,
        column_ids: &[Option<ColumnId>],
        outputs: &mut [&mut ValueVector],
        pos: usize,
    ) -> StorageResult<()> {
        for (column_id, output) in column_ids.iter().zip(outputs.iter_mut()) {
            match column_id {
                Some(0) => output.set_value(pos, InternalId::new(rel_idx as Offset, self.table_id)),
                Some(column) => match record.properties.get(*column as usize - 1) {
                    Some(value) => output.set(pos, value)?,
                    None => output.set_null(pos, true),
                },
                None => output.set_null(pos, true),
            }
        }
        Ok(())
    }

    fn bound_table(&self, direction: RelDataDirection) -> TableId {
        match direction {
            RelDataDirection::Fwd => self.src_table_id,
            RelDataDirection::Bwd => self.dst_table_id,
        }
    }

    fn nbr_table(&self, direction: RelDataDirection) -> TableId {
        self.bound_table(direction.reverse())
    }
}

impl Table for MemoryRelTable {
    fn table_id(&self) -> TableId {
        self.table_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn num_columns(&self) -> usize {
        self.types.len()
    }

    fn column_type(&self, column: ColumnId) -> Option<&LogicalType> {
        self.types.get(column as usize)
    }

    fn column_id(&self, name: &str) -> Option<ColumnId> {
        self.column_names
            .iter()
            .position(|n| n.eq_ignore_ascii_case(name))
            .map(|idx| idx as ColumnId)
    }

    /// Number of source-node node groups with at least one relationship
    fn num_committed_node_groups(&self) -> usize {
        self.data
            .read()
            .fwd
            .stats
            .keys()
            .max()
            .map_or(0, |max| max + 1)
    }

    fn node_group_range(
        &self,
        _transaction: &Transaction,
        source: TableScanSource,
        node_group_idx: usize,
    ) -> StorageResult<Range<Offset>> {
        if source != TableScanSource::Committed {
            return Ok(0..0);
        }
        let size = self.node_group_size as Offset;
        let start = node_group_idx as Offset * size;
        Ok(start..start + size)
    }

    fn init_scan_state(
        &self,
        _transaction: &Transaction,
        state: &mut TableScanState,
    ) -> StorageResult<()> {
        if state.bound_node.is_none() {
            return Err(StorageError::InvalidOperation(format!(
                "scan of {} requires a bound node",
                self.name
            )));
        }
        state.next_row = 0;
        Ok(())
    }

    fn scan(
        &self,
        _transaction: &Transaction,
        state: &mut TableScanState,
        output: &mut ScanOutput<'_>,
    ) -> StorageResult<bool> {
        let Some(bound) = state.bound_node else {
            output.state.init_original_and_selected_size(0);
            return Ok(false);
        };
        let data = self.data.read();
        let list = if bound.table_id == self.bound_table(state.direction) {
            data.adjacency(state.direction).lists.get(&bound.offset)
        } else {
            None
        };
        let list = list.map(Vec::as_slice).unwrap_or(&[]);
        let start = state.next_row.min(list.len());
        let num_read = (list.len() - start).min(DEFAULT_VECTOR_CAPACITY);
        let nbr_table = self.nbr_table(state.direction);
        for (i, &rel_idx) in list[start..start + num_read].iter().enumerate() {
            let record = &data.rels[rel_idx];
            let nbr = match state.direction {
                RelDataDirection::Fwd => record.dst,
                RelDataDirection::Bwd => record.src,
            };
            output
                .id_vector
                .set_value(i, InternalId::new(nbr, nbr_table));
            self.write_columns(rel_idx, record, &state.column_ids, &mut output.columns, i)?;
        }
        state.next_row = start + num_read;
        output.state.init_original_and_selected_size(num_read);
        Ok(num_read > 0)
    }

    fn merged_stats(
        &self,
        _transaction: &Transaction,
        state: &TableScanState,
        column: ColumnId,
    ) -> StorageResult<Option<MergedColumnChunkStats>> {
        if column as usize >= self.types.len() {
            return Err(StorageError::ColumnNotFound(format!(
                "{}.{}",
                self.name, column
            )));
        }
        let Some(bound) = state.bound_node else {
            return Ok(None);
        };
        let group = (bound.offset / self.node_group_size as Offset) as usize;
        let data = self.data.read();
        Ok(data
            .adjacency(state.direction)
            .stats
            .get(&group)
            .map(|builders| builders[column as usize].finish()))
    }

    fn lookup_pk(
        &self,
        _transaction: &Transaction,
        _key_vector: &ValueVector,
        _pos: usize,
    ) -> StorageResult<Option<Offset>> {
        Err(StorageError::InvalidOperation(format!(
            "relationship table {} has no primary key",
            self.name
        )))
    }

    fn lookup(
        &self,
        _transaction: &Transaction,
        state: &TableScanState,
        offset: Offset,
        output: &mut ScanOutput<'_>,
        pos: usize,
    ) -> StorageResult<bool> {
        let data = self.data.read();
        let Some(record) = data.rels.get(offset as usize) else {
            return Ok(false);
        };
        output
            .id_vector
            .set_value(pos, InternalId::new(record.dst, self.dst_table_id));
        self.write_columns(offset as usize, record, &state.column_ids, &mut output.columns, pos)?;
        Ok(true)
    }
}
