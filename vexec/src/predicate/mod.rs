// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Predicate pushdown into scans
//!
//! Filters on a scanned column are converted once, when the scan is planned,
//! into [`ColumnPredicateSet`]s. Scans consult them against per node group
//! statistics to skip groups without reading them.

mod column_predicate;

pub use column_predicate::{
    split_conjunctions, try_convert, ColumnPredicate, ColumnPredicateSet, NullCheckKind,
    ZoneMapCheckResult,
};
