// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Column predicates checked against zone maps
//!
//! A predicate may only answer [`ZoneMapCheckResult::SkipScan`] when no row of
//! the zone can satisfy it. Anything it cannot prove (missing bounds,
//! incomparable types, NaN) answers [`ZoneMapCheckResult::AlwaysScan`].

use crate::expression::Expression;
use crate::functions::{names, ComparisonKind};
use crate::storage::{MergedColumnChunkStats, Value};
use crate::types::TypeCaster;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ZoneMapCheckResult {
    AlwaysScan,
    SkipScan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NullCheckKind {
    IsNull,
    IsNotNull,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnPredicate {
    /// `column <comparison> value`
    Constant {
        column: String,
        comparison: ComparisonKind,
        value: Value,
    },
    NullCheck {
        column: String,
        kind: NullCheckKind,
    },
}

impl ColumnPredicate {
    pub fn constant(column: impl Into<String>, comparison: ComparisonKind, value: Value) -> Self {
        ColumnPredicate::Constant {
            column: column.into(),
            comparison,
            value,
        }
    }

    pub fn null_check(column: impl Into<String>, kind: NullCheckKind) -> Self {
        ColumnPredicate::NullCheck {
            column: column.into(),
            kind,
        }
    }

    pub fn column(&self) -> &str {
        match self {
            ColumnPredicate::Constant { column, .. } | ColumnPredicate::NullCheck { column, .. } => {
                column
            }
        }
    }

    pub fn check_zone_map(&self, stats: &MergedColumnChunkStats) -> ZoneMapCheckResult {
        let skip = match self {
            ColumnPredicate::Constant {
                comparison, value, ..
            } => constant_rules_out(*comparison, value, stats),
            ColumnPredicate::NullCheck { kind, .. } => match kind {
                NullCheckKind::IsNull => stats.guaranteed_no_nulls,
                NullCheckKind::IsNotNull => stats.guaranteed_all_nulls,
            },
        };
        if skip {
            ZoneMapCheckResult::SkipScan
        } else {
            ZoneMapCheckResult::AlwaysScan
        }
    }
}

/// Whether no value in `[min, max]` can satisfy `x <comparison> value`
fn constant_rules_out(
    comparison: ComparisonKind,
    value: &Value,
    stats: &MergedColumnChunkStats,
) -> bool {
    // comparisons against NULL rows are never true
    if stats.guaranteed_all_nulls {
        return true;
    }
    let (Some(min), Some(max)) = (&stats.min, &stats.max) else {
        return false;
    };
    let (Some(vs_min), Some(vs_max)) = (value.compare(min), value.compare(max)) else {
        return false;
    };
    match comparison {
        ComparisonKind::Equals => vs_min == Ordering::Less || vs_max == Ordering::Greater,
        ComparisonKind::NotEquals => stats.is_constant() && vs_min == Ordering::Equal,
        // x > v is impossible when max <= v
        ComparisonKind::GreaterThan => vs_max != Ordering::Less,
        ComparisonKind::GreaterThanEquals => vs_max == Ordering::Greater,
        // x < v is impossible when min >= v
        ComparisonKind::LessThan => vs_min != Ordering::Greater,
        ComparisonKind::LessThanEquals => vs_min == Ordering::Less,
    }
}

impl fmt::Display for ColumnPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnPredicate::Constant {
                column,
                comparison,
                value,
            } => write!(f, "{} {} {}", column, comparison, value),
            ColumnPredicate::NullCheck { column, kind } => match kind {
                NullCheckKind::IsNull => write!(f, "{} IS NULL", column),
                NullCheckKind::IsNotNull => write!(f, "{} IS NOT NULL", column),
            },
        }
    }
}

/// Conjunction of predicates over one column
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnPredicateSet {
    predicates: Vec<ColumnPredicate>,
}

impl ColumnPredicateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert every convertible conjunct of `predicates` on `column`
    pub fn from_predicates<'a>(
        column: &Expression,
        predicates: impl IntoIterator<Item = &'a Expression>,
    ) -> Self {
        let mut set = Self::new();
        for predicate in predicates {
            for conjunct in split_conjunctions(predicate) {
                if let Some(converted) = try_convert(column, conjunct) {
                    set.add(converted);
                }
            }
        }
        set
    }

    pub fn add(&mut self, predicate: ColumnPredicate) {
        self.predicates.push(predicate);
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn predicates(&self) -> &[ColumnPredicate] {
        &self.predicates
    }

    /// `SkipScan` iff any member rules the zone out
    pub fn check_zone_map(&self, stats: &MergedColumnChunkStats) -> ZoneMapCheckResult {
        if self
            .predicates
            .iter()
            .any(|p| p.check_zone_map(stats) == ZoneMapCheckResult::SkipScan)
        {
            ZoneMapCheckResult::SkipScan
        } else {
            ZoneMapCheckResult::AlwaysScan
        }
    }
}

impl fmt::Display for ColumnPredicateSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, predicate) in self.predicates.iter().enumerate() {
            if i > 0 {
                write!(f, " AND ")?;
            }
            write!(f, "{}", predicate)?;
        }
        Ok(())
    }
}

/// Top-level AND operands of `expression`
pub fn split_conjunctions(expression: &Expression) -> Vec<&Expression> {
    match expression {
        Expression::Function { name, children, .. } if name.eq_ignore_ascii_case(names::AND) => {
            children.iter().flat_map(split_conjunctions).collect()
        }
        other => vec![other],
    }
}

/// `expression` is `column` itself or an order-preserving CAST of it
fn is_column_or_cast(column: &Expression, expression: &Expression) -> bool {
    if expression == column {
        return true;
    }
    match expression {
        Expression::Function {
            name,
            children,
            return_type,
        } if name.eq_ignore_ascii_case(names::CAST) && children.len() == 1 => {
            children[0] == *column
                && TypeCaster::is_order_preserving(&column.data_type(), return_type)
        }
        _ => false,
    }
}

fn column_name(column: &Expression) -> String {
    match column {
        Expression::Column { name, .. } => name.clone(),
        other => other.to_string(),
    }
}

/// Convert `predicate` into a predicate on `column`, if it has one of the
/// recognized shapes:
///
/// * `column <cmp> literal` or `literal <cmp> column`, the column optionally
///   wrapped in an order-preserving CAST
/// * `column IS NULL` / `column IS NOT NULL`
pub fn try_convert(column: &Expression, predicate: &Expression) -> Option<ColumnPredicate> {
    let Expression::Function { name, children, .. } = predicate else {
        return None;
    };
    if let Some(comparison) = ComparisonKind::from_function_name(name) {
        let [left, right] = children.as_slice() else {
            return None;
        };
        let (comparison, literal) = match (left, right) {
            (l, Expression::Literal { value, .. }) if is_column_or_cast(column, l) => {
                (comparison, value)
            }
            (Expression::Literal { value, .. }, r) if is_column_or_cast(column, r) => {
                (comparison.reverse(), value)
            }
            _ => return None,
        };
        if literal.is_null() {
            return None;
        }
        return Some(ColumnPredicate::constant(
            column_name(column),
            comparison,
            literal.clone(),
        ));
    }
    let kind = if name.eq_ignore_ascii_case(names::IS_NULL) {
        NullCheckKind::IsNull
    } else if name.eq_ignore_ascii_case(names::IS_NOT_NULL) {
        NullCheckKind::IsNotNull
    } else {
        return None;
    };
    match children.as_slice() {
        [child] if child == column => Some(ColumnPredicate::null_check(column_name(column), kind)),
        _ => None,
    }
}
