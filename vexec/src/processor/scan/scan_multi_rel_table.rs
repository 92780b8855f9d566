// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Relationship scans over several relationship tables at once
//!
//! For every bound node pulled from the child, the operator picks the
//! [`RelTableCollectionScanner`] registered for the bound node's table and
//! drains the adjacency lists of its relationship tables in order. Each
//! (table, direction) pair is one entry, so an undirected pattern over one
//! table registers it twice. An optional direction vector records, per
//! output row, whether the row was read backward.

use super::{cast_columns, read_batch, ScanOutputInfo, ScanTableInfo};
use crate::exec::{ExecutionContext, ExecutionError, ExecutionResult};
use crate::predicate::ZoneMapCheckResult;
use crate::processor::operator::{OperatorMetrics, PhysicalOperator};
use crate::storage::{RelDataDirection, TableScanState};
use crate::types::{InternalId, TableId};
use crate::vector::{DataPos, ResultSet};
use std::collections::HashMap;

/// One relationship table read in one direction
#[derive(Debug, Clone)]
pub struct RelScanTableInfo {
    pub info: ScanTableInfo,
    pub direction: RelDataDirection,
}

impl RelScanTableInfo {
    pub fn new(info: ScanTableInfo, direction: RelDataDirection) -> Self {
        Self { info, direction }
    }
}

#[derive(Debug, Clone)]
struct RelTableEntry {
    rel: RelScanTableInfo,
    scan_state: TableScanState,
}

/// Scans the relationship tables reachable from one bound node table
#[derive(Debug, Clone)]
pub struct RelTableCollectionScanner {
    entries: Vec<RelTableEntry>,
    current: usize,
    current_initialized: bool,
}

impl RelTableCollectionScanner {
    pub fn new(tables: Vec<RelScanTableInfo>) -> Self {
        let entries = tables
            .into_iter()
            .map(|rel| RelTableEntry {
                scan_state: TableScanState::new(rel.info.column_ids.clone()),
                rel,
            })
            .collect();
        Self {
            entries,
            current: 0,
            current_initialized: false,
        }
    }

    pub fn num_tables(&self) -> usize {
        self.entries.len()
    }

    /// Rewind to the first table and position every entry on `bound`
    pub fn reset_state(&mut self, bound: InternalId) {
        for entry in &mut self.entries {
            entry.scan_state.set_bound_node(bound, entry.rel.direction);
        }
        self.current = 0;
        self.current_initialized = false;
    }

    fn advance(&mut self) {
        self.current += 1;
        self.current_initialized = false;
    }

    /// Read the next non-empty batch for the current bound node; `false` once
    /// every table is drained
    fn scan(
        &mut self,
        result_set: &mut ResultSet,
        outputs: &ScanOutputInfo,
        direction_pos: Option<DataPos>,
        context: &ExecutionContext,
        metrics: &mut OperatorMetrics,
    ) -> ExecutionResult<bool> {
        let transaction = context.transaction();
        loop {
            let Some(entry) = self.entries.get_mut(self.current) else {
                return Ok(false);
            };
            let RelTableEntry { rel, scan_state } = entry;
            if !self.current_initialized {
                if context.config.enable_zone_map
                    && rel.info.has_predicates()
                    && rel.info.check_zone_map(transaction, scan_state)?
                        == ZoneMapCheckResult::SkipScan
                {
                    log::debug!(
                        "zone map skips {} {} for bound node {:?}",
                        rel.info.table.name(),
                        rel.direction,
                        scan_state.bound_node
                    );
                    metrics.record_skip();
                    self.advance();
                    continue;
                }
                rel.info.table.init_scan_state(transaction, scan_state)?;
                self.current_initialized = true;
            }

            let table = &rel.info.table;
            let scanned = read_batch(result_set, outputs, &mut rel.info.casters, |output| {
                table.scan(transaction, scan_state, output)
            })?;
            if !scanned {
                self.advance();
                continue;
            }
            cast_columns(result_set, outputs, &rel.info.casters)?;
            if let Some(direction_pos) = direction_pos {
                let (vectors, state) = result_set.chunk_parts_mut(direction_pos.chunk_pos);
                let is_bwd = rel.direction.is_bwd();
                let direction_vector = &mut vectors[direction_pos.vector_pos];
                for pos in state.sel_vector().iter() {
                    direction_vector.set_value(pos, is_bwd);
                }
            }
            return Ok(true);
        }
    }
}

/// Expand each bound node through the relationship tables of its label
#[derive(Debug)]
pub struct ScanMultiRelTable {
    bound_node_pos: DataPos,
    outputs: ScanOutputInfo,
    direction_pos: Option<DataPos>,
    scanners: HashMap<TableId, RelTableCollectionScanner>,
    current_scanner: Option<TableId>,
    child: Box<dyn PhysicalOperator>,
    metrics: OperatorMetrics,
}

impl ScanMultiRelTable {
    /// `outputs.node_id_pos` receives neighbour node ids. The bound node
    /// vector must be in a chunk the child keeps flat.
    pub fn new(
        bound_node_pos: DataPos,
        outputs: ScanOutputInfo,
        direction_pos: Option<DataPos>,
        scanners: HashMap<TableId, RelTableCollectionScanner>,
        child: Box<dyn PhysicalOperator>,
    ) -> ExecutionResult<Self> {
        if bound_node_pos.chunk_pos == outputs.chunk_pos() {
            return Err(ExecutionError::InvalidPlan(
                "bound node and neighbours must live in different chunks".to_string(),
            ));
        }
        if let Some(pos) = direction_pos {
            if pos.chunk_pos != outputs.chunk_pos() {
                return Err(ExecutionError::InvalidPlan(format!(
                    "direction vector {:?} is not in the neighbour chunk",
                    pos
                )));
            }
        }
        for scanner in scanners.values() {
            for entry in &scanner.entries {
                entry.rel.info.validate(outputs.num_columns())?;
            }
        }
        Ok(Self {
            bound_node_pos,
            outputs,
            direction_pos,
            scanners,
            current_scanner: None,
            child,
            metrics: OperatorMetrics::default(),
        })
    }
}

impl PhysicalOperator for ScanMultiRelTable {
    fn name(&self) -> &str {
        "SCAN_MULTI_REL_TABLE"
    }

    fn init_global_state(&self, context: &ExecutionContext) -> ExecutionResult<()> {
        self.child.init_global_state(context)
    }

    fn init_local_state(
        &mut self,
        result_set: &mut ResultSet,
        context: &ExecutionContext,
    ) -> ExecutionResult<()> {
        self.current_scanner = None;
        self.child.init_local_state(result_set, context)
    }

    fn get_next_tuple(
        &mut self,
        result_set: &mut ResultSet,
        context: &ExecutionContext,
    ) -> ExecutionResult<bool> {
        loop {
            if let Some(scanner) = self
                .current_scanner
                .and_then(|table_id| self.scanners.get_mut(&table_id))
            {
                if scanner.scan(
                    result_set,
                    &self.outputs,
                    self.direction_pos,
                    context,
                    &mut self.metrics,
                )? {
                    let num_tuples = result_set.chunk_state(self.outputs.chunk_pos()).sel_size();
                    self.metrics.record_batch(num_tuples);
                    return Ok(true);
                }
            }

            if !self.child.get_next_tuple(result_set, context)? {
                self.metrics.log_finished(self.name(), context.worker_id);
                return Ok(false);
            }
            let state = result_set.vector_state(self.bound_node_pos);
            debug_assert!(state.is_flat(), "bound node chunk must be flat");
            let pos = state.sel_vector().get(0);
            let bound_vector = result_set.vector(self.bound_node_pos);
            if bound_vector.is_null(pos) {
                self.current_scanner = None;
                continue;
            }
            let bound = bound_vector.get_value::<InternalId>(pos);
            self.current_scanner = match self.scanners.get_mut(&bound.table_id) {
                Some(scanner) => {
                    scanner.reset_state(bound);
                    Some(bound.table_id)
                }
                None => None,
            };
        }
    }

    fn clone_box(&self) -> Box<dyn PhysicalOperator> {
        Box::new(Self {
            bound_node_pos: self.bound_node_pos,
            outputs: self.outputs.clone(),
            direction_pos: self.direction_pos,
            scanners: self.scanners.clone(),
            current_scanner: None,
            child: self.child.clone_box(),
            metrics: OperatorMetrics::default(),
        })
    }

    fn metrics(&self) -> &OperatorMetrics {
        &self.metrics
    }
}
