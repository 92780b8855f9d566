// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Pipeline sink materializing batches into rows
//!
//! Collected columns may come from several chunks. Every batch is expanded
//! into the cross product of the selected positions of the chunks involved;
//! a flat chunk contributes its single position.

use super::operator::PhysicalOperator;
use crate::exec::{ExecutionContext, ExecutionResult};
use crate::storage::Value;
use crate::vector::{DataPos, ResultSet};
use parking_lot::Mutex;
use std::sync::Arc;

/// Rows appended by every worker
#[derive(Debug, Default)]
pub struct ResultCollectorSharedState {
    rows: Mutex<Vec<Vec<Value>>>,
}

impl ResultCollectorSharedState {
    pub fn append(&self, mut rows: Vec<Vec<Value>>) {
        self.rows.lock().append(&mut rows);
    }

    pub fn num_rows(&self) -> usize {
        self.rows.lock().len()
    }

    pub fn take_rows(&self) -> Vec<Vec<Value>> {
        std::mem::take(&mut *self.rows.lock())
    }
}

#[derive(Debug)]
pub struct ResultCollector {
    columns: Vec<DataPos>,
    /// Distinct chunks of `columns`, in first-use order
    chunks: Vec<usize>,
    /// Index into `chunks` of each column
    column_chunks: Vec<usize>,
    child: Box<dyn PhysicalOperator>,
    shared: Arc<ResultCollectorSharedState>,
    local_rows: Vec<Vec<Value>>,
}

impl ResultCollector {
    pub fn new(columns: Vec<DataPos>, child: Box<dyn PhysicalOperator>) -> Self {
        let mut chunks = Vec::new();
        let mut column_chunks = Vec::with_capacity(columns.len());
        for column in &columns {
            let idx = match chunks.iter().position(|&c| c == column.chunk_pos) {
                Some(idx) => idx,
                None => {
                    chunks.push(column.chunk_pos);
                    chunks.len() - 1
                }
            };
            column_chunks.push(idx);
        }
        Self {
            columns,
            chunks,
            column_chunks,
            child,
            shared: Arc::new(ResultCollectorSharedState::default()),
            local_rows: Vec::new(),
        }
    }

    pub fn shared_state(&self) -> &Arc<ResultCollectorSharedState> {
        &self.shared
    }

    pub fn child(&self) -> &dyn PhysicalOperator {
        self.child.as_ref()
    }

    pub fn init_global_state(&self, context: &ExecutionContext) -> ExecutionResult<()> {
        self.child.init_global_state(context)
    }

    pub fn init_local_state(
        &mut self,
        result_set: &mut ResultSet,
        context: &ExecutionContext,
    ) -> ExecutionResult<()> {
        self.local_rows.clear();
        self.child.init_local_state(result_set, context)
    }

    /// Drain the child and publish the collected rows; returns the number of
    /// rows this worker produced
    pub fn execute(
        &mut self,
        result_set: &mut ResultSet,
        context: &ExecutionContext,
    ) -> ExecutionResult<usize> {
        while self.child.get_next_tuple(result_set, context)? {
            self.collect_batch(result_set);
        }
        let num_rows = self.local_rows.len();
        self.shared.append(std::mem::take(&mut self.local_rows));
        Ok(num_rows)
    }

    fn collect_batch(&mut self, result_set: &ResultSet) {
        if self.columns.is_empty() {
            return;
        }
        let positions: Vec<Vec<usize>> = self
            .chunks
            .iter()
            .map(|&chunk_pos| {
                result_set
                    .chunk_state(chunk_pos)
                    .sel_vector()
                    .iter()
                    .collect()
            })
            .collect();
        if positions.iter().any(Vec::is_empty) {
            return;
        }
        // odometer over the chunks' selected positions
        let mut cursor = vec![0usize; positions.len()];
        loop {
            let row = self
                .columns
                .iter()
                .zip(&self.column_chunks)
                .map(|(column, &chunk_idx)| {
                    result_set
                        .vector(*column)
                        .get(positions[chunk_idx][cursor[chunk_idx]])
                })
                .collect();
            self.local_rows.push(row);

            let mut idx = positions.len();
            loop {
                if idx == 0 {
                    return;
                }
                idx -= 1;
                cursor[idx] += 1;
                if cursor[idx] < positions[idx].len() {
                    break;
                }
                cursor[idx] = 0;
            }
        }
    }

    /// Copy for another worker, appending to the same shared state
    pub fn clone_for_worker(&self) -> Self {
        Self {
            columns: self.columns.clone(),
            chunks: self.chunks.clone(),
            column_chunks: self.column_chunks.clone(),
            child: self.child.clone_box(),
            shared: self.shared.clone(),
            local_rows: Vec::new(),
        }
    }
}
