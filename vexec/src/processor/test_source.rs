// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Canned batch source for operator unit tests

use super::operator::{OperatorMetrics, PhysicalOperator};
use crate::config::ExecutionConfig;
use crate::exec::{ExecutionContext, ExecutionResult};
use crate::storage::Value;
use crate::txn::Transaction;
use crate::types::LogicalType;
use crate::vector::{DataChunkDescriptor, DataPos, ResultSet, ResultSetDescriptor};
use std::sync::Arc;

/// Emits fixed batches into vector 0 of chunk 0. A `None` slot is written as
/// NULL and left out of the selection.
#[derive(Debug, Clone)]
pub struct BatchSource {
    batches: Arc<Vec<Vec<Option<Value>>>>,
    next: usize,
    metrics: OperatorMetrics,
}

impl BatchSource {
    pub fn new(batches: Vec<Vec<Option<Value>>>) -> Self {
        Self {
            batches: Arc::new(batches),
            next: 0,
            metrics: OperatorMetrics::default(),
        }
    }

    /// Result set with one unflat chunk holding a vector of `data_type`, and
    /// a single-threaded context
    pub fn harness(data_type: LogicalType) -> (ResultSet, ExecutionContext) {
        let result_set = ResultSet::new(&ResultSetDescriptor::new(vec![DataChunkDescriptor::new(
            vec![data_type],
        )]));
        let context = ExecutionContext::new(
            Arc::new(Transaction::read_only()),
            ExecutionConfig::single_threaded(),
        );
        (result_set, context)
    }
}

impl PhysicalOperator for BatchSource {
    fn name(&self) -> &str {
        "BATCH_SOURCE"
    }

    fn init_local_state(
        &mut self,
        _result_set: &mut ResultSet,
        _context: &ExecutionContext,
    ) -> ExecutionResult<()> {
        self.next = 0;
        Ok(())
    }

    fn get_next_tuple(
        &mut self,
        result_set: &mut ResultSet,
        _context: &ExecutionContext,
    ) -> ExecutionResult<bool> {
        let Some(batch) = self.batches.get(self.next) else {
            return Ok(false);
        };
        self.next += 1;
        let vector = result_set.vector_mut(DataPos::new(0, 0));
        for (pos, value) in batch.iter().enumerate() {
            vector.set(pos, value.as_ref().unwrap_or(&Value::Null))?;
        }
        let state = result_set.chunk_state_mut(0);
        state.set_to_unflat();
        let sel = state.sel_vector_mut();
        if batch.iter().all(Option::is_some) {
            sel.set_to_unfiltered_with_size(batch.len());
        } else {
            let mut size = 0;
            for (pos, value) in batch.iter().enumerate() {
                if value.is_some() {
                    sel.mutable_buffer()[size] = pos;
                    size += 1;
                }
            }
            sel.set_to_filtered_with_size(size);
        }
        self.metrics.record_batch(sel.sel_size());
        Ok(true)
    }

    fn clone_box(&self) -> Box<dyn PhysicalOperator> {
        Box::new(self.clone())
    }

    fn metrics(&self) -> &OperatorMetrics {
        &self.metrics
    }
}
