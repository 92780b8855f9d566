// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Physical operators and pipeline execution

pub mod filter;
pub mod flatten;
pub mod operator;
pub mod result_collector;
pub mod scan;
pub mod semi_masker;
pub mod task;

#[cfg(test)]
mod test_source;

pub use filter::{Filter, NodeLabelFilter};
pub use flatten::Flatten;
pub use operator::{OperatorMetrics, PhysicalOperator};
pub use result_collector::{ResultCollector, ResultCollectorSharedState};
pub use scan::{
    ColumnCaster, Morsel, PrimaryKeyScanNodeTable, PrimaryKeyScanSharedState,
    PrimaryKeyScanTableInfo, RelScanTableInfo, RelTableCollectionScanner, ScanMultiRelTable,
    ScanNodeTable, ScanNodeTableSharedState, ScanOutputInfo, ScanStatus, ScanTableInfo, SemiMask,
};
pub use semi_masker::{SemiMasker, SemiMaskerSharedState};
pub use task::execute_pipeline;
