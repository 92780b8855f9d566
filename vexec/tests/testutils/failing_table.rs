//! Table wrapper that fails on demand
//!
//! Delegates to a working table and returns `StorageError::Io` from the
//! configured call, so error propagation through the scan operators can be
//! observed.

use std::ops::Range;
use std::sync::Arc;
use vexec::storage::{
    MergedColumnChunkStats, ScanOutput, StorageError, StorageResult, TableScanSource,
    TableScanState,
};
use vexec::txn::Transaction;
use vexec::types::{ColumnId, Offset, TableId};
use vexec::vector::ValueVector;
use vexec::{LogicalType, Table};

/// Which storage call fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePoint {
    /// `scan` of one committed node group
    Scan { node_group_idx: usize },
    /// `merged_stats` of one committed node group
    Stats { node_group_idx: usize },
    /// every `lookup_pk`
    LookupPk,
}

#[derive(Debug)]
pub struct FailingTable {
    inner: Arc<dyn Table>,
    failure: FailurePoint,
}

impl FailingTable {
    pub fn new(inner: Arc<dyn Table>, failure: FailurePoint) -> Arc<Self> {
        Arc::new(Self { inner, failure })
    }

    fn io_error(&self, what: &str) -> StorageError {
        StorageError::Io(format!("{} of {} failed", what, self.inner.name()))
    }

    fn fails_on(&self, state: &TableScanState, point: FailurePoint) -> bool {
        state.source == TableScanSource::Committed && self.failure == point
    }
}

impl Table for FailingTable {
    fn table_id(&self) -> TableId {
        self.inner.table_id()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn num_columns(&self) -> usize {
        self.inner.num_columns()
    }

    fn column_type(&self, column: ColumnId) -> Option<&LogicalType> {
        self.inner.column_type(column)
    }

    fn column_id(&self, name: &str) -> Option<ColumnId> {
        self.inner.column_id(name)
    }

    fn num_committed_node_groups(&self) -> usize {
        self.inner.num_committed_node_groups()
    }

    fn num_uncommitted_node_groups(&self, transaction: &Transaction) -> usize {
        self.inner.num_uncommitted_node_groups(transaction)
    }

    fn node_group_range(
        &self,
        transaction: &Transaction,
        source: TableScanSource,
        node_group_idx: usize,
    ) -> StorageResult<Range<Offset>> {
        self.inner.node_group_range(transaction, source, node_group_idx)
    }

    fn init_scan_state(
        &self,
        transaction: &Transaction,
        state: &mut TableScanState,
    ) -> StorageResult<()> {
        self.inner.init_scan_state(transaction, state)
    }

    fn scan(
        &self,
        transaction: &Transaction,
        state: &mut TableScanState,
        output: &mut ScanOutput<'_>,
    ) -> StorageResult<bool> {
        let point = FailurePoint::Scan {
            node_group_idx: state.node_group_idx,
        };
        if self.fails_on(state, point) {
            return Err(self.io_error("scan"));
        }
        self.inner.scan(transaction, state, output)
    }

    fn merged_stats(
        &self,
        transaction: &Transaction,
        state: &TableScanState,
        column: ColumnId,
    ) -> StorageResult<Option<MergedColumnChunkStats>> {
        let point = FailurePoint::Stats {
            node_group_idx: state.node_group_idx,
        };
        if self.fails_on(state, point) {
            return Err(self.io_error("statistics read"));
        }
        self.inner.merged_stats(transaction, state, column)
    }

    fn lookup_pk(
        &self,
        transaction: &Transaction,
        key_vector: &ValueVector,
        pos: usize,
    ) -> StorageResult<Option<Offset>> {
        if self.failure == FailurePoint::LookupPk {
            return Err(self.io_error("primary key lookup"));
        }
        self.inner.lookup_pk(transaction, key_vector, pos)
    }

    fn lookup(
        &self,
        transaction: &Transaction,
        state: &TableScanState,
        offset: Offset,
        output: &mut ScanOutput<'_>,
        pos: usize,
    ) -> StorageResult<bool> {
        self.inner.lookup(transaction, state, offset, output, pos)
    }
}
