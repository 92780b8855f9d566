// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Per node group column statistics (zone maps)

use super::value::Value;
use std::cmp::Ordering;

/// Statistics of one column over one node group
///
/// `min`/`max` are `None` when the chunk has no non-null values or when its
/// values are not orderable; predicates must then assume anything can match.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedColumnChunkStats {
    pub guaranteed_no_nulls: bool,
    pub guaranteed_all_nulls: bool,
    pub min: Option<Value>,
    pub max: Option<Value>,
}

impl MergedColumnChunkStats {
    pub fn new(min: Option<Value>, max: Option<Value>) -> Self {
        Self {
            guaranteed_no_nulls: true,
            guaranteed_all_nulls: false,
            min,
            max,
        }
    }

    /// Statistics of a chunk holding only NULLs
    pub fn all_nulls() -> Self {
        Self {
            guaranteed_no_nulls: false,
            guaranteed_all_nulls: true,
            min: None,
            max: None,
        }
    }

    pub fn with_nulls(mut self) -> Self {
        self.guaranteed_no_nulls = false;
        self
    }

    /// Every non-null value of the chunk is the same
    pub fn is_constant(&self) -> bool {
        match (&self.min, &self.max) {
            (Some(min), Some(max)) => min.compare(max) == Some(Ordering::Equal),
            _ => false,
        }
    }
}

/// Incrementally computes [`MergedColumnChunkStats`] while a chunk is filled
#[derive(Debug, Clone, Default)]
pub struct StatsBuilder {
    num_values: u64,
    num_nulls: u64,
    min: Option<Value>,
    max: Option<Value>,
    /// Set once a value that cannot be ordered against the bounds was seen
    unordered: bool,
}

impl StatsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, value: &Value) {
        self.num_values += 1;
        if value.is_null() {
            self.num_nulls += 1;
            return;
        }
        if self.unordered {
            return;
        }
        let Some(current_min) = &self.min else {
            self.min = Some(value.clone());
            self.max = Some(value.clone());
            return;
        };
        match value.compare(current_min) {
            Some(Ordering::Less) => self.min = Some(value.clone()),
            Some(_) => {}
            None => {
                self.mark_unordered();
                return;
            }
        }
        if let Some(current_max) = &self.max {
            match value.compare(current_max) {
                Some(Ordering::Greater) => self.max = Some(value.clone()),
                Some(_) => {}
                None => self.mark_unordered(),
            }
        }
    }

    fn mark_unordered(&mut self) {
        self.unordered = true;
        self.min = None;
        self.max = None;
    }

    pub fn num_values(&self) -> u64 {
        self.num_values
    }

    pub fn finish(&self) -> MergedColumnChunkStats {
        MergedColumnChunkStats {
            guaranteed_no_nulls: self.num_nulls == 0,
            guaranteed_all_nulls: self.num_values > 0 && self.num_nulls == self.num_values,
            min: self.min.clone(),
            max: self.max.clone(),
        }
    }
}
