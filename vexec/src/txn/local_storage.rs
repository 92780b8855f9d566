// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Uncommitted node groups of a write transaction

use crate::storage::node_group::NodeGroup;
use crate::storage::{StorageResult, Value};
use crate::types::{LogicalType, Offset, TableId};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct LocalStorage {
    tables: HashMap<TableId, LocalNodeTable>,
}

impl LocalStorage {
    pub fn table(&self, table_id: TableId) -> Option<&LocalNodeTable> {
        self.tables.get(&table_id)
    }

    /// Local table for `table_id`, created on first insert. Uncommitted
    /// offsets continue after `start_offset`.
    pub fn get_or_create_table(
        &mut self,
        table_id: TableId,
        start_offset: Offset,
        node_group_size: usize,
        types: &[LogicalType],
    ) -> &mut LocalNodeTable {
        self.tables
            .entry(table_id)
            .or_insert_with(|| LocalNodeTable::new(start_offset, node_group_size, types.to_vec()))
    }

    pub fn is_empty(&self) -> bool {
        self.tables.values().all(|table| table.num_rows() == 0)
    }
}

/// Insert buffer of one node table
#[derive(Debug)]
pub struct LocalNodeTable {
    start_offset: Offset,
    node_group_size: usize,
    types: Vec<LogicalType>,
    groups: Vec<NodeGroup>,
}

impl LocalNodeTable {
    fn new(start_offset: Offset, node_group_size: usize, types: Vec<LogicalType>) -> Self {
        Self {
            start_offset,
            node_group_size,
            types,
            groups: Vec::new(),
        }
    }

    pub fn num_node_groups(&self) -> usize {
        self.groups.len()
    }

    pub fn node_group(&self, idx: usize) -> Option<&NodeGroup> {
        self.groups.get(idx)
    }

    pub fn node_groups(&self) -> &[NodeGroup] {
        &self.groups
    }

    pub fn num_rows(&self) -> u64 {
        self.groups.iter().map(|g| g.num_rows() as u64).sum()
    }

    pub fn append(&mut self, row: Vec<Value>) -> StorageResult<Offset> {
        let needs_group = self.groups.last().map_or(true, |g| g.is_full());
        if needs_group {
            let start = self.start_offset + self.num_rows();
            self.groups
                .push(NodeGroup::new(start, self.node_group_size, &self.types));
        }
        let num_groups = self.groups.len();
        self.groups[num_groups - 1].append(row)
    }
}
