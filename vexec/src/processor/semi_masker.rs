// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Build side of semi-masks
//!
//! A [`SemiMasker`] passes its child's batches through unchanged and records
//! the node ids it sees in worker-local masks. At end of stream every worker
//! unions its masks into the [`SemiMaskerSharedState`]; once the build
//! pipeline has finished, [`SemiMaskerSharedState::publish`] hands the merged
//! masks to the scans of the probe pipeline.

use super::operator::{OperatorMetrics, PhysicalOperator};
use super::scan::{ScanNodeTableSharedState, SemiMask};
use crate::exec::{ExecutionContext, ExecutionResult};
use crate::types::{InternalId, TableId};
use crate::vector::{DataPos, ResultSet};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Merged masks of every worker, one per masked table
#[derive(Debug)]
pub struct SemiMaskerSharedState {
    masks: Mutex<HashMap<TableId, SemiMask>>,
}

impl SemiMaskerSharedState {
    pub fn new(table_ids: impl IntoIterator<Item = TableId>) -> Self {
        let masks = table_ids
            .into_iter()
            .map(|table_id| (table_id, SemiMask::new(table_id)))
            .collect();
        Self {
            masks: Mutex::new(masks),
        }
    }

    pub fn table_ids(&self) -> Vec<TableId> {
        let mut ids: Vec<TableId> = self.masks.lock().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    fn empty_local_masks(&self) -> HashMap<TableId, SemiMask> {
        self.masks
            .lock()
            .keys()
            .map(|&table_id| (table_id, SemiMask::new(table_id)))
            .collect()
    }

    /// Union a worker's local masks into the shared ones
    pub fn merge(&self, local: &HashMap<TableId, SemiMask>) {
        let mut masks = self.masks.lock();
        for (table_id, local_mask) in local {
            if let Some(mask) = masks.get_mut(table_id) {
                mask.union_with(local_mask);
            }
        }
    }

    pub fn mask(&self, table_id: TableId) -> Option<SemiMask> {
        self.masks.lock().get(&table_id).cloned()
    }

    /// Install the merged mask of each target's table; targets of tables
    /// this masker does not cover are left alone
    pub fn publish(&self, targets: &[Arc<ScanNodeTableSharedState>]) {
        let masks = self.masks.lock();
        for target in targets {
            if let Some(mask) = masks.get(&target.table_id()) {
                log::debug!(
                    "publishing semi-mask of table {} with {} offsets",
                    target.table_id(),
                    mask.num_masked()
                );
                target.set_semi_mask(Arc::new(mask.clone()));
            }
        }
    }
}

#[derive(Debug)]
pub struct SemiMasker {
    node_id_pos: DataPos,
    child: Box<dyn PhysicalOperator>,
    shared: Arc<SemiMaskerSharedState>,
    local_masks: HashMap<TableId, SemiMask>,
    metrics: OperatorMetrics,
}

impl SemiMasker {
    pub fn new(
        node_id_pos: DataPos,
        child: Box<dyn PhysicalOperator>,
        shared: Arc<SemiMaskerSharedState>,
    ) -> Self {
        Self {
            node_id_pos,
            child,
            shared,
            local_masks: HashMap::new(),
            metrics: OperatorMetrics::default(),
        }
    }

    pub fn shared_state(&self) -> &Arc<SemiMaskerSharedState> {
        &self.shared
    }
}

impl PhysicalOperator for SemiMasker {
    fn name(&self) -> &str {
        "SEMI_MASKER"
    }

    fn init_global_state(&self, context: &ExecutionContext) -> ExecutionResult<()> {
        self.child.init_global_state(context)
    }

    fn init_local_state(
        &mut self,
        result_set: &mut ResultSet,
        context: &ExecutionContext,
    ) -> ExecutionResult<()> {
        self.local_masks = self.shared.empty_local_masks();
        self.child.init_local_state(result_set, context)
    }

    fn get_next_tuple(
        &mut self,
        result_set: &mut ResultSet,
        context: &ExecutionContext,
    ) -> ExecutionResult<bool> {
        if !self.child.get_next_tuple(result_set, context)? {
            self.shared.merge(&self.local_masks);
            self.metrics.log_finished(self.name(), context.worker_id);
            return Ok(false);
        }
        let ids = result_set.vector(self.node_id_pos);
        let state = result_set.vector_state(self.node_id_pos);
        for pos in state.sel_vector().iter() {
            if ids.is_null(pos) {
                continue;
            }
            let id = ids.get_value::<InternalId>(pos);
            if let Some(mask) = self.local_masks.get_mut(&id.table_id) {
                mask.mark(id.offset);
            }
        }
        self.metrics.record_batch(state.sel_size());
        Ok(true)
    }

    fn clone_box(&self) -> Box<dyn PhysicalOperator> {
        Box::new(Self::new(
            self.node_id_pos,
            self.child.clone_box(),
            self.shared.clone(),
        ))
    }

    fn metrics(&self) -> &OperatorMetrics {
        &self.metrics
    }
}
