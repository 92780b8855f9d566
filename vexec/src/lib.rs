// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! vexec - Vectorized execution layer for an embedded graph database
//!
//! Query pipelines move data in batches of up to
//! [`DEFAULT_VECTOR_CAPACITY`](vector::DEFAULT_VECTOR_CAPACITY) tuples. A
//! batch is a set of column vectors sharing a selection vector; operators
//! narrow the selection instead of copying rows.
//!
//! # Layers
//!
//! - **Batch model** ([`vector`]): value vectors, selection vectors, chunk
//!   states and result sets
//! - **Expressions** ([`expression`], [`evaluator`], [`functions`]): bound
//!   expression trees and their vectorized evaluators
//! - **Predicate pushdown** ([`predicate`]): column predicates checked against
//!   per node group statistics (zone maps)
//! - **Operators** ([`processor`]): morsel-driven table scans, filters,
//!   semi-masks and the parallel pipeline driver
//! - **Storage contract** ([`storage`], [`txn`]): the [`Table`] trait scans
//!   consume, with in-memory node and relationship tables
//!
//! # Usage
//!
//! ```ignore
//! use vexec::processor::{execute_pipeline, Filter, ResultCollector, ScanNodeTable};
//!
//! let scan = ScanNodeTable::new(outputs, vec![info])?;
//! let filter = Filter::new(predicate, 0, Box::new(scan))?;
//! let sink = ResultCollector::new(columns, Box::new(filter));
//! let rows = execute_pipeline(&sink, &descriptor, &context)?;
//! ```

pub mod config;
pub mod evaluator;
pub mod exec;
pub mod expression;
pub mod functions;
pub mod predicate;
pub mod processor;
pub mod storage;
pub mod txn;
pub mod types;
pub mod vector;

pub use config::ExecutionConfig;
pub use evaluator::{ExpressionEvaluator, ExpressionMapper};
pub use exec::{ExecutionContext, ExecutionError, ExecutionResult};
pub use expression::Expression;
pub use storage::{Table, Value};
pub use types::{InternalId, LogicalType};

/// vexec version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize `env_logger` from `RUST_LOG`; later calls are no-ops
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("warn"),
    )
    .try_init();
}
