// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Point lookup of a node by primary key
//!
//! Each candidate table is probed by exactly one worker: workers claim table
//! indexes from a shared cursor, evaluate the key expression, resolve it
//! through the table's primary-key index and emit at most one flat tuple.

use super::{cast_columns, read_batch, validate_infos, ScanOutputInfo, ScanTableInfo};
use crate::evaluator::{ExpressionEvaluator, ExpressionMapper};
use crate::exec::{ExecutionContext, ExecutionResult};
use crate::expression::Expression;
use crate::processor::operator::{OperatorMetrics, PhysicalOperator};
use crate::storage::TableScanState;
use crate::vector::ResultSet;
use parking_lot::Mutex;
use std::sync::Arc;

/// A table to probe and the expression producing its key
#[derive(Debug, Clone)]
pub struct PrimaryKeyScanTableInfo {
    pub info: ScanTableInfo,
    pub key: Expression,
}

impl PrimaryKeyScanTableInfo {
    pub fn new(info: ScanTableInfo, key: Expression) -> Self {
        Self { info, key }
    }
}

/// Cursor over the candidate tables, shared by all workers
#[derive(Debug)]
pub struct PrimaryKeyScanSharedState {
    num_tables: usize,
    next_table: Mutex<usize>,
}

impl PrimaryKeyScanSharedState {
    pub fn new(num_tables: usize) -> Self {
        Self {
            num_tables,
            next_table: Mutex::new(0),
        }
    }

    pub fn reset(&self) {
        *self.next_table.lock() = 0;
    }

    /// Claim the next table index
    pub fn next_table(&self) -> Option<usize> {
        let mut next = self.next_table.lock();
        if *next >= self.num_tables {
            return None;
        }
        let idx = *next;
        *next += 1;
        Some(idx)
    }
}

#[derive(Debug)]
pub struct PrimaryKeyScanNodeTable {
    outputs: ScanOutputInfo,
    infos: Vec<ScanTableInfo>,
    keys: Vec<ExpressionEvaluator>,
    scan_states: Vec<TableScanState>,
    shared: Arc<PrimaryKeyScanSharedState>,
    metrics: OperatorMetrics,
}

impl PrimaryKeyScanNodeTable {
    pub fn new(
        outputs: ScanOutputInfo,
        tables: Vec<PrimaryKeyScanTableInfo>,
    ) -> ExecutionResult<Self> {
        let mut infos = Vec::with_capacity(tables.len());
        let mut keys = Vec::with_capacity(tables.len());
        for table in tables {
            keys.push(ExpressionMapper::map_expression(&table.key)?);
            infos.push(table.info);
        }
        validate_infos(&infos, &outputs)?;
        let scan_states = infos
            .iter()
            .map(|info| TableScanState::new(info.column_ids.clone()))
            .collect();
        Ok(Self {
            outputs,
            shared: Arc::new(PrimaryKeyScanSharedState::new(infos.len())),
            infos,
            keys,
            scan_states,
            metrics: OperatorMetrics::default(),
        })
    }
}

impl PhysicalOperator for PrimaryKeyScanNodeTable {
    fn name(&self) -> &str {
        "PRIMARY_KEY_SCAN_NODE_TABLE"
    }

    fn init_global_state(&self, _context: &ExecutionContext) -> ExecutionResult<()> {
        self.shared.reset();
        Ok(())
    }

    fn init_local_state(
        &mut self,
        result_set: &mut ResultSet,
        context: &ExecutionContext,
    ) -> ExecutionResult<()> {
        for key in &mut self.keys {
            key.init(result_set, context)?;
        }
        Ok(())
    }

    fn get_next_tuple(
        &mut self,
        result_set: &mut ResultSet,
        context: &ExecutionContext,
    ) -> ExecutionResult<bool> {
        let transaction = context.transaction();
        loop {
            context.check_interrupted()?;
            let Some(idx) = self.shared.next_table() else {
                self.metrics.log_finished(self.name(), context.worker_id);
                return Ok(false);
            };
            let info = &mut self.infos[idx];
            let key = &mut self.keys[idx];
            key.evaluate(result_set)?;
            let offset = {
                let key_state = result_set.state(key.result_state());
                debug_assert!(key_state.is_flat(), "primary key must evaluate to one value");
                if key_state.sel_size() == 0 {
                    None
                } else {
                    let pos = key_state.sel_vector().get(0);
                    info.table
                        .lookup_pk(transaction, key.result_vector(result_set), pos)?
                }
            };
            let Some(offset) = offset else {
                log::debug!("no key match in {}", info.table.name());
                continue;
            };

            let state = result_set.chunk_state_mut(self.outputs.chunk_pos());
            state.set_to_flat();
            state.sel_vector_mut().set_to_unfiltered_with_size(1);

            let table = &info.table;
            let scan_state = &self.scan_states[idx];
            let found = read_batch(result_set, &self.outputs, &mut info.casters, |output| {
                table.lookup(transaction, scan_state, offset, output, 0)
            })?;
            if !found {
                continue;
            }
            cast_columns(result_set, &self.outputs, &info.casters)?;
            log::debug!("key match at offset {} of {}", offset, info.table.name());
            self.metrics.record_batch(1);
            return Ok(true);
        }
    }

    fn clone_box(&self) -> Box<dyn PhysicalOperator> {
        Box::new(Self {
            outputs: self.outputs.clone(),
            infos: self.infos.clone(),
            keys: self.keys.clone(),
            scan_states: self.scan_states.clone(),
            shared: self.shared.clone(),
            metrics: OperatorMetrics::default(),
        })
    }

    fn metrics(&self) -> &OperatorMetrics {
        &self.metrics
    }
}
