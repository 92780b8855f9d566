// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Morsel-driven node table scan
//!
//! The node groups of a table are morsels. Workers claim them from the
//! table's [`ScanNodeTableSharedState`], committed groups first and then the
//! groups held in the transaction's local storage, so every group is scanned
//! by exactly one worker. A claimed group is skipped without being read when
//! its statistics rule out the pushed-down predicates, or when a published
//! semi-mask holds none of its offsets.

use super::{
    apply_semi_mask, cast_columns, read_batch, validate_infos, ScanOutputInfo, ScanTableInfo,
    SemiMask,
};
use crate::exec::{ExecutionContext, ExecutionResult};
use crate::predicate::ZoneMapCheckResult;
use crate::processor::operator::{OperatorMetrics, PhysicalOperator};
use crate::storage::{TableScanSource, TableScanState};
use crate::types::TableId;
use crate::vector::ResultSet;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

/// Progress of the morsel cursor of one table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStatus {
    NotInitialized,
    HasCommittedMorsels,
    HasUncommittedMorsels,
    Exhausted,
}

/// One node group handed to one worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Morsel {
    pub source: TableScanSource,
    pub node_group_idx: usize,
}

#[derive(Debug)]
struct MorselCursor {
    status: ScanStatus,
    next_committed: usize,
    num_committed: usize,
    next_uncommitted: usize,
    num_uncommitted: usize,
}

impl MorselCursor {
    fn new() -> Self {
        Self {
            status: ScanStatus::NotInitialized,
            next_committed: 0,
            num_committed: 0,
            next_uncommitted: 0,
            num_uncommitted: 0,
        }
    }

    fn next(&mut self) -> Option<Morsel> {
        match self.status {
            ScanStatus::HasCommittedMorsels => {
                let node_group_idx = self.next_committed;
                self.next_committed += 1;
                if self.next_committed >= self.num_committed {
                    self.status = if self.num_uncommitted > 0 {
                        ScanStatus::HasUncommittedMorsels
                    } else {
                        ScanStatus::Exhausted
                    };
                }
                Some(Morsel {
                    source: TableScanSource::Committed,
                    node_group_idx,
                })
            }
            ScanStatus::HasUncommittedMorsels => {
                let node_group_idx = self.next_uncommitted;
                self.next_uncommitted += 1;
                if self.next_uncommitted >= self.num_uncommitted {
                    self.status = ScanStatus::Exhausted;
                }
                Some(Morsel {
                    source: TableScanSource::Uncommitted,
                    node_group_idx,
                })
            }
            ScanStatus::NotInitialized | ScanStatus::Exhausted => None,
        }
    }
}

/// Morsel cursor and semi-mask of one scanned table, shared by all workers
#[derive(Debug)]
pub struct ScanNodeTableSharedState {
    table_id: TableId,
    cursor: Mutex<MorselCursor>,
    semi_mask: RwLock<Option<Arc<SemiMask>>>,
}

impl ScanNodeTableSharedState {
    pub fn new(table_id: TableId) -> Self {
        Self {
            table_id,
            cursor: Mutex::new(MorselCursor::new()),
            semi_mask: RwLock::new(None),
        }
    }

    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    /// Reset the cursor over `num_committed` committed and `num_uncommitted`
    /// uncommitted node groups
    pub fn init(&self, num_committed: usize, num_uncommitted: usize) {
        let mut cursor = self.cursor.lock();
        *cursor = MorselCursor::new();
        cursor.num_committed = num_committed;
        cursor.num_uncommitted = num_uncommitted;
        cursor.status = if num_committed > 0 {
            ScanStatus::HasCommittedMorsels
        } else if num_uncommitted > 0 {
            ScanStatus::HasUncommittedMorsels
        } else {
            ScanStatus::Exhausted
        };
        log::debug!(
            "table {}: {} committed and {} uncommitted node groups to scan",
            self.table_id,
            num_committed,
            num_uncommitted
        );
    }

    /// Claim the next unscanned node group
    pub fn next_morsel(&self) -> Option<Morsel> {
        self.cursor.lock().next()
    }

    pub fn status(&self) -> ScanStatus {
        self.cursor.lock().status
    }

    /// Install the mask of a finished build pipeline; only call before the
    /// probe pipeline starts
    pub fn set_semi_mask(&self, mask: Arc<SemiMask>) {
        debug_assert_eq!(mask.table_id(), self.table_id);
        *self.semi_mask.write() = Some(mask);
    }

    pub fn semi_mask(&self) -> Option<Arc<SemiMask>> {
        self.semi_mask.read().clone()
    }
}

/// Scan of one or more node tables, one table after the other
#[derive(Debug)]
pub struct ScanNodeTable {
    outputs: ScanOutputInfo,
    infos: Vec<ScanTableInfo>,
    shared_states: Vec<Arc<ScanNodeTableSharedState>>,
    scan_states: Vec<TableScanState>,
    current_table: usize,
    /// Semi-mask of the current table, fetched when the table is entered
    current_mask: Option<Arc<SemiMask>>,
    has_morsel: bool,
    metrics: OperatorMetrics,
}

impl ScanNodeTable {
    pub fn new(outputs: ScanOutputInfo, infos: Vec<ScanTableInfo>) -> ExecutionResult<Self> {
        validate_infos(&infos, &outputs)?;
        let shared_states = infos
            .iter()
            .map(|info| Arc::new(ScanNodeTableSharedState::new(info.table.table_id())))
            .collect();
        let scan_states = infos
            .iter()
            .map(|info| TableScanState::new(info.column_ids.clone()))
            .collect();
        Ok(Self {
            outputs,
            infos,
            shared_states,
            scan_states,
            current_table: 0,
            current_mask: None,
            has_morsel: false,
            metrics: OperatorMetrics::default(),
        })
    }

    /// Shared states, one per scanned table, in scan order
    pub fn shared_states(&self) -> &[Arc<ScanNodeTableSharedState>] {
        &self.shared_states
    }

    pub fn infos(&self) -> &[ScanTableInfo] {
        &self.infos
    }

    /// Claim and prepare the next morsel of the current table; `false` once
    /// every table is exhausted
    fn next_morsel(&mut self, context: &ExecutionContext) -> ExecutionResult<bool> {
        let transaction = context.transaction();
        loop {
            let idx = self.current_table;
            let Some(info) = self.infos.get(idx) else {
                return Ok(false);
            };
            context.check_interrupted()?;
            let Some(morsel) = self.shared_states[idx].next_morsel() else {
                log::trace!("worker {} done with table {}", context.worker_id, info.table.name());
                self.current_table += 1;
                self.current_mask = self
                    .shared_states
                    .get(self.current_table)
                    .and_then(|shared| shared.semi_mask())
                    .filter(|_| context.config.enable_semi_mask);
                continue;
            };
            let state = &mut self.scan_states[idx];
            state.set_morsel(morsel.source, morsel.node_group_idx);
            log::trace!(
                "worker {} claimed {:?} node group {} of {}",
                context.worker_id,
                morsel.source,
                morsel.node_group_idx,
                info.table.name()
            );

            if context.config.enable_zone_map
                && info.has_predicates()
                && info.check_zone_map(transaction, state)? == ZoneMapCheckResult::SkipScan
            {
                log::debug!(
                    "zone map skips node group {} of {}",
                    morsel.node_group_idx,
                    info.table.name()
                );
                self.metrics.record_skip();
                continue;
            }
            if let Some(mask) = &self.current_mask {
                let range =
                    info.table
                        .node_group_range(transaction, morsel.source, morsel.node_group_idx)?;
                if !mask.has_any_in(range) {
                    log::debug!(
                        "semi-mask skips node group {} of {}",
                        morsel.node_group_idx,
                        info.table.name()
                    );
                    self.metrics.record_skip();
                    continue;
                }
            }
            info.table.init_scan_state(transaction, state)?;
            return Ok(true);
        }
    }
}

impl PhysicalOperator for ScanNodeTable {
    fn name(&self) -> &str {
        "SCAN_NODE_TABLE"
    }

    fn init_global_state(&self, context: &ExecutionContext) -> ExecutionResult<()> {
        let transaction = context.transaction();
        for (info, shared) in self.infos.iter().zip(&self.shared_states) {
            shared.init(
                info.table.num_committed_node_groups(),
                info.table.num_uncommitted_node_groups(transaction),
            );
        }
        Ok(())
    }

    fn init_local_state(
        &mut self,
        _result_set: &mut ResultSet,
        context: &ExecutionContext,
    ) -> ExecutionResult<()> {
        self.current_table = 0;
        self.has_morsel = false;
        for state in &mut self.scan_states {
            state.reset();
        }
        self.current_mask = self.shared_states[0]
            .semi_mask()
            .filter(|_| context.config.enable_semi_mask);
        Ok(())
    }

    fn get_next_tuple(
        &mut self,
        result_set: &mut ResultSet,
        context: &ExecutionContext,
    ) -> ExecutionResult<bool> {
        let transaction = context.transaction();
        loop {
            if !self.has_morsel {
                if !self.next_morsel(context)? {
                    self.metrics.log_finished(self.name(), context.worker_id);
                    return Ok(false);
                }
                self.has_morsel = true;
            }
            let idx = self.current_table;
            let info = &mut self.infos[idx];
            let table = &info.table;
            let state = &mut self.scan_states[idx];
            let scanned = read_batch(result_set, &self.outputs, &mut info.casters, |output| {
                table.scan(transaction, state, output)
            })?;
            if !scanned {
                self.has_morsel = false;
                continue;
            }
            if let Some(mask) = &self.current_mask {
                if apply_semi_mask(result_set, &self.outputs, mask) == 0 {
                    continue;
                }
            }
            cast_columns(result_set, &self.outputs, &info.casters)?;
            let num_tuples = result_set.chunk_state(self.outputs.chunk_pos()).sel_size();
            self.metrics.record_batch(num_tuples);
            return Ok(true);
        }
    }

    fn clone_box(&self) -> Box<dyn PhysicalOperator> {
        Box::new(Self {
            outputs: self.outputs.clone(),
            infos: self.infos.clone(),
            shared_states: self.shared_states.clone(),
            scan_states: self.scan_states.clone(),
            current_table: 0,
            current_mask: None,
            has_morsel: false,
            metrics: OperatorMetrics::default(),
        })
    }

    fn metrics(&self) -> &OperatorMetrics {
        &self.metrics
    }
}
