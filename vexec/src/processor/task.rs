// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Parallel execution of one pipeline
//!
//! The sink's operator tree is initialized once, copied per worker and run on
//! a rayon pool sized by [`ExecutionConfig::num_threads`]. Each worker owns
//! its copy and its [`ResultSet`]; workers only meet in the shared states the
//! copies point to. The first failing worker interrupts the others.
//!
//! [`ExecutionConfig::num_threads`]: crate::config::ExecutionConfig::num_threads

use super::result_collector::ResultCollector;
use crate::exec::{ExecutionContext, ExecutionError, ExecutionResult};
use crate::storage::Value;
use crate::vector::{ResultSet, ResultSetDescriptor};
use rayon::prelude::*;
use std::time::Instant;

/// Run the pipeline ending in `sink` to completion and return its rows
pub fn execute_pipeline(
    sink: &ResultCollector,
    descriptor: &ResultSetDescriptor,
    context: &ExecutionContext,
) -> ExecutionResult<Vec<Vec<Value>>> {
    let num_threads = context.config.num_threads.max(1);
    let started = Instant::now();
    sink.init_global_state(context)?;

    let workers: Vec<ResultCollector> = (0..num_threads).map(|_| sink.clone_for_worker()).collect();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()
        .map_err(|e| ExecutionError::RuntimeError(format!("failed to start workers: {}", e)))?;

    let outcome: Vec<ExecutionResult<usize>> = pool.install(|| {
        workers
            .into_par_iter()
            .enumerate()
            .map(|(worker_id, mut worker)| {
                let worker_context = context.for_worker(worker_id);
                let result = run_worker(&mut worker, descriptor, &worker_context);
                if let Err(e) = &result {
                    if !matches!(e, ExecutionError::Interrupted) {
                        log::warn!("worker {} failed: {}", worker_id, e);
                    }
                    context.interrupt();
                }
                result
            })
            .collect()
    });
    let rows_per_worker = merge_worker_results(outcome)?;

    log::debug!(
        "pipeline {} finished on {} workers in {:?}: {:?} rows per worker",
        sink.child().name(),
        num_threads,
        started.elapsed(),
        rows_per_worker
    );
    Ok(sink.shared_state().take_rows())
}

/// Rows per worker, or the error that ended the pipeline
///
/// Workers interrupted by a failing sibling report `Interrupted`; the
/// sibling's own error takes precedence.
fn merge_worker_results(
    results: Vec<ExecutionResult<usize>>,
) -> ExecutionResult<Vec<usize>> {
    let mut rows_per_worker = Vec::with_capacity(results.len());
    let mut interrupted = None;
    for result in results {
        match result {
            Ok(rows) => rows_per_worker.push(rows),
            Err(ExecutionError::Interrupted) => interrupted = Some(ExecutionError::Interrupted),
            Err(e) => return Err(e),
        }
    }
    match interrupted {
        Some(e) => Err(e),
        None => Ok(rows_per_worker),
    }
}

fn run_worker(
    worker: &mut ResultCollector,
    descriptor: &ResultSetDescriptor,
    context: &ExecutionContext,
) -> ExecutionResult<usize> {
    log::trace!("worker {} started", context.worker_id);
    let mut result_set = ResultSet::new(descriptor);
    worker.init_local_state(&mut result_set, context)?;
    worker.execute(&mut result_set, context)
}
