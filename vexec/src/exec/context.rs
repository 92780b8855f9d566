// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Execution context shared by every operator of a query

use super::error::{ExecutionError, ExecutionResult};
use crate::config::ExecutionConfig;
use crate::txn::Transaction;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Per-query context; cloned once per worker thread
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Transaction the query runs in
    pub transaction: Arc<Transaction>,
    pub config: ExecutionConfig,
    /// Index of the worker running this copy of the pipeline
    pub worker_id: usize,
    interrupted: Arc<AtomicBool>,
}

impl ExecutionContext {
    pub fn new(transaction: Arc<Transaction>, config: ExecutionConfig) -> Self {
        Self {
            transaction,
            config,
            worker_id: 0,
            interrupted: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Copy of this context for another worker; the interrupt flag is shared
    pub fn for_worker(&self, worker_id: usize) -> Self {
        let mut context = self.clone();
        context.worker_id = worker_id;
        context
    }

    pub fn transaction(&self) -> &Transaction {
        &self.transaction
    }

    /// Ask every worker of the query to stop at its next morsel boundary
    pub fn interrupt(&self) {
        self.interrupted.store(true, Ordering::Release);
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::Acquire)
    }

    pub fn check_interrupted(&self) -> ExecutionResult<()> {
        if self.is_interrupted() {
            return Err(ExecutionError::Interrupted);
        }
        Ok(())
    }
}
