//! Pass-through operator recording the selection size of every batch

use parking_lot::Mutex;
use std::sync::Arc;
use vexec::processor::{OperatorMetrics, PhysicalOperator};
use vexec::vector::ResultSet;
use vexec::{ExecutionContext, ExecutionResult};

/// Batch sizes seen by every copy of one [`BatchAudit`]
pub type BatchLog = Arc<Mutex<Vec<usize>>>;

#[derive(Debug)]
pub struct BatchAudit {
    chunk_pos: usize,
    child: Box<dyn PhysicalOperator>,
    log: BatchLog,
    metrics: OperatorMetrics,
}

impl BatchAudit {
    pub fn new(chunk_pos: usize, child: Box<dyn PhysicalOperator>) -> (Self, BatchLog) {
        let log = BatchLog::default();
        let audit = Self {
            chunk_pos,
            child,
            log: log.clone(),
            metrics: OperatorMetrics::default(),
        };
        (audit, log)
    }
}

impl PhysicalOperator for BatchAudit {
    fn name(&self) -> &str {
        "BATCH_AUDIT"
    }

    fn init_global_state(&self, context: &ExecutionContext) -> ExecutionResult<()> {
        self.child.init_global_state(context)
    }

    fn init_local_state(
        &mut self,
        result_set: &mut ResultSet,
        context: &ExecutionContext,
    ) -> ExecutionResult<()> {
        self.child.init_local_state(result_set, context)
    }

    fn get_next_tuple(
        &mut self,
        result_set: &mut ResultSet,
        context: &ExecutionContext,
    ) -> ExecutionResult<bool> {
        if !self.child.get_next_tuple(result_set, context)? {
            return Ok(false);
        }
        let size = result_set.chunk_state(self.chunk_pos).sel_size();
        self.log.lock().push(size);
        self.metrics.record_batch(size);
        Ok(true)
    }

    fn clone_box(&self) -> Box<dyn PhysicalOperator> {
        Box::new(Self {
            chunk_pos: self.chunk_pos,
            child: self.child.clone_box(),
            log: self.log.clone(),
            metrics: OperatorMetrics::default(),
        })
    }

    fn metrics(&self) -> &OperatorMetrics {
        &self.metrics
    }
}
