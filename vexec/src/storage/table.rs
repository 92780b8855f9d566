// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! The table contract consumed by the scan operators
//!
//! A scan drives a table through three calls: the operator positions a
//! [`TableScanState`] on a morsel (node group) or a bound node,
//! [`Table::init_scan_state`] prepares it, and [`Table::scan`] is called until
//! it returns `false`. Every successful `scan` writes rows into slots
//! `0..n` of the output vectors and sets the output chunk state to an
//! unfiltered selection of size `n`.

use super::stats::MergedColumnChunkStats;
use super::types::StorageResult;
use crate::txn::Transaction;
use crate::types::{ColumnId, InternalId, LogicalType, Offset, TableId};
use crate::vector::{DataChunkState, ValueVector};
use std::fmt;
use std::ops::Range;

/// Which node groups a morsel refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableScanSource {
    Committed,
    /// Node groups held in the transaction's local storage
    Uncommitted,
    None,
}

/// Storage order of relationship adjacency lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelDataDirection {
    /// Bound node is the source; neighbours are destinations
    Fwd,
    /// Bound node is the destination; neighbours are sources
    Bwd,
}

impl RelDataDirection {
    pub fn reverse(self) -> Self {
        match self {
            RelDataDirection::Fwd => RelDataDirection::Bwd,
            RelDataDirection::Bwd => RelDataDirection::Fwd,
        }
    }

    /// Value written into direction output vectors
    pub fn is_bwd(self) -> bool {
        self == RelDataDirection::Bwd
    }
}

impl fmt::Display for RelDataDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelDataDirection::Fwd => write!(f, "FWD"),
            RelDataDirection::Bwd => write!(f, "BWD"),
        }
    }
}

/// Cursor of one scan over one table
#[derive(Debug, Clone)]
pub struct TableScanState {
    /// Columns to read, aligned with [`ScanOutput::columns`]; `None` reads NULL
    pub column_ids: Vec<Option<ColumnId>>,
    pub source: TableScanSource,
    pub node_group_idx: usize,
    /// Next row to read inside the node group or adjacency list
    pub next_row: usize,
    /// Bound node of a relationship scan
    pub bound_node: Option<InternalId>,
    pub direction: RelDataDirection,
}

impl TableScanState {
    pub fn new(column_ids: Vec<Option<ColumnId>>) -> Self {
        Self {
            column_ids,
            source: TableScanSource::None,
            node_group_idx: 0,
            next_row: 0,
            bound_node: None,
            direction: RelDataDirection::Fwd,
        }
    }

    /// Position the state on a node group
    pub fn set_morsel(&mut self, source: TableScanSource, node_group_idx: usize) {
        self.source = source;
        self.node_group_idx = node_group_idx;
        self.next_row = 0;
    }

    /// Position the state on the adjacency list of a bound node
    pub fn set_bound_node(&mut self, bound_node: InternalId, direction: RelDataDirection) {
        self.source = TableScanSource::Committed;
        self.bound_node = Some(bound_node);
        self.direction = direction;
        self.next_row = 0;
    }

    pub fn reset(&mut self) {
        self.source = TableScanSource::None;
        self.node_group_idx = 0;
        self.next_row = 0;
        self.bound_node = None;
    }
}

/// Vectors a scan or lookup writes into
///
/// `id_vector` receives node ids for node tables and neighbour node ids for
/// relationship tables. `columns` is aligned with the scan state's column ids.
pub struct ScanOutput<'a> {
    pub id_vector: &'a mut ValueVector,
    pub columns: Vec<&'a mut ValueVector>,
    pub state: &'a mut DataChunkState,
}

impl<'a> ScanOutput<'a> {
    pub fn new(
        id_vector: &'a mut ValueVector,
        columns: Vec<&'a mut ValueVector>,
        state: &'a mut DataChunkState,
    ) -> Self {
        Self {
            id_vector,
            columns,
            state,
        }
    }
}

/// Node or relationship table as seen by the scan engine
pub trait Table: Send + Sync + fmt::Debug {
    fn table_id(&self) -> TableId;

    fn name(&self) -> &str;

    fn num_columns(&self) -> usize;

    fn column_type(&self, column: ColumnId) -> Option<&LogicalType>;

    fn column_id(&self, name: &str) -> Option<ColumnId>;

    fn num_committed_node_groups(&self) -> usize;

    /// Uncommitted node groups the transaction holds for this table
    fn num_uncommitted_node_groups(&self, transaction: &Transaction) -> usize {
        transaction.num_uncommitted_node_groups(self.table_id())
    }

    /// Offsets covered by a node group
    fn node_group_range(
        &self,
        transaction: &Transaction,
        source: TableScanSource,
        node_group_idx: usize,
    ) -> StorageResult<Range<Offset>>;

    /// Prepare `state` for the morsel or bound node it is positioned on
    fn init_scan_state(
        &self,
        transaction: &Transaction,
        state: &mut TableScanState,
    ) -> StorageResult<()>;

    /// Read the next batch; `false` once the morsel is exhausted
    fn scan(
        &self,
        transaction: &Transaction,
        state: &mut TableScanState,
        output: &mut ScanOutput<'_>,
    ) -> StorageResult<bool>;

    /// Statistics of `column` over the zone `state` is positioned on; `None`
    /// when the table keeps no statistics for it
    fn merged_stats(
        &self,
        transaction: &Transaction,
        state: &TableScanState,
        column: ColumnId,
    ) -> StorageResult<Option<MergedColumnChunkStats>>;

    /// Resolve the primary key held at `key_vector[pos]` to an offset
    fn lookup_pk(
        &self,
        transaction: &Transaction,
        key_vector: &ValueVector,
        pos: usize,
    ) -> StorageResult<Option<Offset>>;

    /// Read the state's columns of the row at `offset` into slot `pos`;
    /// `false` if no such row exists
    fn lookup(
        &self,
        transaction: &Transaction,
        state: &TableScanState,
        offset: Offset,
        output: &mut ScanOutput<'_>,
        pos: usize,
    ) -> StorageResult<bool>;
}
