// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! The pull-based physical operator contract
//!
//! A pipeline is a chain of operators rooted at a sink. The plan root is
//! initialized once through [`PhysicalOperator::init_global_state`]; every
//! worker then receives its own copy via [`PhysicalOperator::clone_box`],
//! binds it to a private [`ResultSet`] and pulls batches until
//! [`PhysicalOperator::get_next_tuple`] returns `false`. Copies share only the
//! `Arc`ed shared states created at plan time.

use crate::exec::{ExecutionContext, ExecutionResult};
use crate::vector::ResultSet;
use std::fmt;

/// Base trait for every physical operator
pub trait PhysicalOperator: Send + fmt::Debug {
    /// Operator name used in logs
    fn name(&self) -> &str;

    /// Initialize state shared by all workers; called once on the plan before
    /// it is cloned. Operators with children must forward the call.
    fn init_global_state(&self, _context: &ExecutionContext) -> ExecutionResult<()> {
        Ok(())
    }

    /// Bind this copy of the operator to the worker's result set
    fn init_local_state(
        &mut self,
        result_set: &mut ResultSet,
        context: &ExecutionContext,
    ) -> ExecutionResult<()>;

    /// Produce the next batch in `result_set`; `false` at end of stream
    fn get_next_tuple(
        &mut self,
        result_set: &mut ResultSet,
        context: &ExecutionContext,
    ) -> ExecutionResult<bool>;

    /// Fresh copy for another worker, sharing the shared states
    fn clone_box(&self) -> Box<dyn PhysicalOperator>;

    fn metrics(&self) -> &OperatorMetrics;
}

impl Clone for Box<dyn PhysicalOperator> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Per-worker counters of one operator
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperatorMetrics {
    pub num_output_tuples: u64,
    pub num_output_batches: u64,
    /// Node groups or tables skipped by zone maps or semi-masks
    pub num_skipped_groups: u64,
}

impl OperatorMetrics {
    pub fn record_batch(&mut self, num_tuples: usize) {
        self.num_output_batches += 1;
        self.num_output_tuples += num_tuples as u64;
    }

    pub fn record_skip(&mut self) {
        self.num_skipped_groups += 1;
    }

    /// Log the counters once the operator reached end of stream
    pub fn log_finished(&self, operator: &str, worker_id: usize) {
        log::debug!(
            "{} on worker {} finished: {} tuples in {} batches, {} groups skipped",
            operator,
            worker_id,
            self.num_output_tuples,
            self.num_output_batches,
            self.num_skipped_groups
        );
    }
}
