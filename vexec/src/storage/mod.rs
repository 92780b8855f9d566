// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Storage contract of the execution layer
//!
//! Scans only talk to storage through the [`Table`] trait. [`MemoryNodeTable`]
//! and [`MemoryRelTable`] are the in-memory implementations used by tests,
//! benches and embedders without a disk format.

pub mod memory;
pub mod node_group;
pub mod stats;
pub mod table;
pub mod types;
pub mod value;

pub use memory::{MemoryNodeTable, MemoryRelTable};
pub use node_group::NodeGroup;
pub use stats::{MergedColumnChunkStats, StatsBuilder};
pub use table::{RelDataDirection, ScanOutput, Table, TableScanSource, TableScanState};
pub use types::{StorageError, StorageResult};
pub use value::Value;
