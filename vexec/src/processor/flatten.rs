// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Flatten: turn an unflat chunk into a stream of one-tuple flat batches

use super::operator::{OperatorMetrics, PhysicalOperator};
use crate::exec::{ExecutionContext, ExecutionResult};
use crate::vector::{ResultSet, SelectionVector, DEFAULT_VECTOR_CAPACITY};

#[derive(Debug)]
pub struct Flatten {
    chunk_pos: usize,
    child: Box<dyn PhysicalOperator>,
    /// Child selection of the batch being flattened
    prev_sel: SelectionVector,
    next_idx: usize,
    metrics: OperatorMetrics,
}

impl Flatten {
    pub fn new(chunk_pos: usize, child: Box<dyn PhysicalOperator>) -> Self {
        Self {
            chunk_pos,
            child,
            prev_sel: SelectionVector::new(DEFAULT_VECTOR_CAPACITY),
            next_idx: 0,
            metrics: OperatorMetrics::default(),
        }
    }

    fn has_more(&self) -> bool {
        self.next_idx < self.prev_sel.sel_size()
    }
}

impl PhysicalOperator for Flatten {
    fn name(&self) -> &str {
        "FLATTEN"
    }

    fn init_global_state(&self, context: &ExecutionContext) -> ExecutionResult<()> {
        self.child.init_global_state(context)
    }

    fn init_local_state(
        &mut self,
        result_set: &mut ResultSet,
        context: &ExecutionContext,
    ) -> ExecutionResult<()> {
        self.prev_sel.set_to_unfiltered_with_size(0);
        self.next_idx = 0;
        self.child.init_local_state(result_set, context)
    }

    fn get_next_tuple(
        &mut self,
        result_set: &mut ResultSet,
        context: &ExecutionContext,
    ) -> ExecutionResult<bool> {
        while !self.has_more() {
            // hand the child back the selection it produced
            let state = result_set.chunk_state_mut(self.chunk_pos);
            state.set_to_unflat();
            state.sel_vector_mut().copy_from(&self.prev_sel);
            if !self.child.get_next_tuple(result_set, context)? {
                self.metrics.log_finished(self.name(), context.worker_id);
                return Ok(false);
            }
            self.prev_sel
                .copy_from(result_set.chunk_state(self.chunk_pos).sel_vector());
            self.next_idx = 0;
        }
        let pos = self.prev_sel.get(self.next_idx);
        self.next_idx += 1;
        let state = result_set.chunk_state_mut(self.chunk_pos);
        state.set_to_flat();
        let sel = state.sel_vector_mut();
        sel.mutable_buffer()[0] = pos;
        sel.set_to_filtered_with_size(1);
        self.metrics.record_batch(1);
        Ok(true)
    }

    fn clone_box(&self) -> Box<dyn PhysicalOperator> {
        Box::new(Self::new(self.chunk_pos, self.child.clone_box()))
    }

    fn metrics(&self) -> &OperatorMetrics {
        &self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::test_source::BatchSource;
    use crate::storage::Value;
    use crate::types::LogicalType;
    use crate::vector::DataPos;

    #[test]
    fn test_emits_each_selected_position() {
        let source = BatchSource::new(vec![
            vec![Some(Value::Int64(1)), None, Some(Value::Int64(3))],
            vec![],
            vec![Some(Value::Int64(4))],
        ]);
        let mut flatten = Flatten::new(0, Box::new(source));
        let (mut result_set, context) = BatchSource::harness(LogicalType::Int64);
        flatten.init_global_state(&context).unwrap();
        flatten.init_local_state(&mut result_set, &context).unwrap();

        let mut values = Vec::new();
        while flatten.get_next_tuple(&mut result_set, &context).unwrap() {
            let state = result_set.chunk_state(0);
            assert!(state.is_flat());
            assert_eq!(state.sel_size(), 1);
            let pos = state.sel_vector().get(0);
            values.push(result_set.vector(DataPos::new(0, 0)).get_value::<i64>(pos));
        }
        assert_eq!(values, vec![1, 3, 4]);
    }
}
