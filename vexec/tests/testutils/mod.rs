//! Test utilities for vexec integration tests
//!
//! - graph_fixture: in-memory tables and a pipeline runner
//! - batch_audit: pass-through operator recording the batches it sees
//! - failing_table: table wrapper returning storage errors

#![allow(dead_code)]

pub mod batch_audit;
pub mod failing_table;
pub mod graph_fixture;
