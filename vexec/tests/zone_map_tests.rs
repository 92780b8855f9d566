//! Zone-map soundness tests
//!
//! A node group may only be skipped when none of its rows can satisfy the
//! pushed-down predicates. Data is clustered per node group so that random
//! predicates skip a fair share of groups.

#[path = "testutils/mod.rs"]
mod testutils;

use std::sync::Arc;
use testutils::graph_fixture::*;
use vexec::functions::ComparisonKind;
use vexec::predicate::ZoneMapCheckResult;
use vexec::processor::{Filter, ScanNodeTable, ScanTableInfo};
use vexec::storage::{MemoryNodeTable, TableScanSource, TableScanState, Value};
use vexec::txn::Transaction;
use vexec::{Expression, LogicalType};

const GROUP_SIZE: usize = 32;

const KINDS: [ComparisonKind; 6] = [
    ComparisonKind::Equals,
    ComparisonKind::NotEquals,
    ComparisonKind::GreaterThan,
    ComparisonKind::GreaterThanEquals,
    ComparisonKind::LessThan,
    ComparisonKind::LessThanEquals,
];

/// Ages clustered by node group; some groups are entirely NULL and some hold
/// a single distinct value
fn clustered_ages(rng: &mut fastrand::Rng, num_groups: usize) -> Vec<Option<i32>> {
    let mut ages = Vec::with_capacity(num_groups * GROUP_SIZE);
    for group in 0..num_groups {
        let base = group as i32 * 10;
        let shape = rng.u8(0..10);
        for _ in 0..GROUP_SIZE {
            let age = match shape {
                0 => None,
                1 => Some(base),
                2 => (rng.u8(0..4) != 0).then(|| base + rng.i32(0..15)),
                _ => Some(base + rng.i32(0..15)),
            };
            ages.push(age);
        }
    }
    ages
}

fn table_of(ages: &[Option<i32>]) -> Arc<MemoryNodeTable> {
    let ages = ages.to_vec();
    person_table(ages.len() as i64, GROUP_SIZE, move |i| ages[i as usize])
}

/// Row-level meaning of a predicate on `age`
type RowCheck = Box<dyn Fn(Option<i64>) -> bool>;

/// A random predicate on `age` and the row-level check it stands for
fn random_predicate(rng: &mut fastrand::Rng, age: &Expression, max: i64) -> (Expression, RowCheck) {
    match rng.u8(0..8) {
        0 => {
            let check: RowCheck = Box::new(|value: Option<i64>| value.is_none());
            (Expression::is_null(age.clone()), check)
        }
        1 => {
            let check: RowCheck = Box::new(|value: Option<i64>| value.is_some());
            (Expression::is_not_null(age.clone()), check)
        }
        _ => {
            let kind = KINDS[rng.usize(..KINDS.len())];
            let constant = rng.i64(-5..max + 5);
            let predicate = if rng.bool() {
                Expression::comparison(kind, age.clone(), Expression::literal(Value::Int64(constant)))
            } else {
                // literal on the left
                Expression::comparison(
                    kind.reverse(),
                    Expression::literal(Value::Int64(constant)),
                    age.clone(),
                )
            };
            let check: RowCheck = Box::new(move |value: Option<i64>| {
                value.map_or(false, |value| kind.matches(value.cmp(&constant)))
            });
            (predicate, check)
        }
    }
}

#[test]
fn test_skipped_groups_hold_no_matching_row() {
    let mut rng = fastrand::Rng::with_seed(42);
    let transaction = Transaction::read_only();
    let mut num_skipped = 0;
    let mut num_checked = 0;

    for _ in 0..40 {
        let num_groups = rng.usize(1..20);
        let ages = clustered_ages(&mut rng, num_groups);
        let table = table_of(&ages);
        let age = column("age", 0, LogicalType::Int64);
        let (predicate, matches) = random_predicate(&mut rng, &age, num_groups as i64 * 10 + 15);

        let mut info = ScanTableInfo::for_columns(table, &[("age", LogicalType::Int64)]).unwrap();
        assert_eq!(info.push_down(0, &age, &predicate), 1, "{:?}", predicate);
        let mut state = TableScanState::new(info.column_ids.clone());

        for group in 0..num_groups {
            state.set_morsel(TableScanSource::Committed, group);
            let result = info.check_zone_map(&transaction, &state).unwrap();
            num_checked += 1;
            if result != ZoneMapCheckResult::SkipScan {
                continue;
            }
            num_skipped += 1;
            let rows = &ages[group * GROUP_SIZE..(group + 1) * GROUP_SIZE];
            assert!(
                rows.iter().all(|age| !matches(age.map(i64::from))),
                "group {} skipped for {:?} although a row matches: {:?}",
                group,
                predicate,
                rows
            );
        }
    }
    assert!(num_skipped > 0 && num_skipped < num_checked);
}

#[test]
fn test_pruning_never_changes_filter_results() {
    let mut rng = fastrand::Rng::with_seed(1234);
    for _ in 0..10 {
        let num_groups = rng.usize(2..40);
        let ages = clustered_ages(&mut rng, num_groups);
        let table = table_of(&ages);
        let age = column("age", 1, LogicalType::Int64);
        let max = num_groups as i64 * 10 + 15;
        let (first, first_matches) = random_predicate(&mut rng, &age, max);
        let (second, second_matches) = random_predicate(&mut rng, &age, max);
        let predicate = Expression::and(first, second);

        let mut info = ScanTableInfo::for_columns(
            table,
            &[("id", LogicalType::Int64), ("age", LogicalType::Int64)],
        )
        .unwrap();
        assert_eq!(info.push_down(1, &age, &predicate), 2);

        let expected: Vec<i64> = ages
            .iter()
            .enumerate()
            .filter(|(_, age)| {
                let age = age.map(i64::from);
                first_matches(age) && second_matches(age)
            })
            .map(|(id, _)| id as i64)
            .collect();

        for enable_zone_map in [true, false] {
            let mut config = config(3);
            config.enable_zone_map = enable_zone_map;
            let scan = ScanNodeTable::new(scan_outputs(2), vec![info.clone()]).unwrap();
            let filter = Filter::new(predicate.clone(), 0, Box::new(scan)).unwrap();
            let rows = run(
                Box::new(filter),
                column_positions(2),
                &scan_descriptor(&[LogicalType::Int64, LogicalType::Int64]),
                &read_only_context(config),
            )
            .unwrap();
            assert_eq!(sorted_ints(&rows, 0), expected, "zone map enabled: {}", enable_zone_map);
        }
    }
}

#[test]
fn test_rounding_cast_column_is_never_pruned() {
    // score DOUBLE read as INT64: 3.2, 3.4 and 2.6 all round to 3, although
    // the first group's stored minimum is above 3
    let table = MemoryNodeTable::new(
        0,
        "reading",
        vec![
            ("id".to_string(), LogicalType::Int64),
            ("score".to_string(), LogicalType::Double),
        ],
        2,
    );
    for (id, score) in [3.2, 3.4, 2.6, 9.0, 10.0, 11.0].into_iter().enumerate() {
        table
            .append(vec![Value::Int64(id as i64), Value::Double(score)])
            .unwrap();
    }
    let mut info = ScanTableInfo::for_columns(
        Arc::new(table),
        &[("id", LogicalType::Int64), ("score", LogicalType::Int64)],
    )
    .unwrap();
    let score = column("score", 1, LogicalType::Int64);
    let predicate = Expression::comparison(
        ComparisonKind::Equals,
        score.clone(),
        Expression::literal(Value::Int64(3)),
    );
    info.push_down(1, &score, &predicate);

    for enable_zone_map in [false, true] {
        let mut config = config(2);
        config.enable_zone_map = enable_zone_map;
        let scan = ScanNodeTable::new(scan_outputs(2), vec![info.clone()]).unwrap();
        let filter = Filter::new(predicate.clone(), 0, Box::new(scan)).unwrap();
        let rows = run(
            Box::new(filter),
            column_positions(2),
            &scan_descriptor(&[LogicalType::Int64, LogicalType::Int64]),
            &read_only_context(config),
        )
        .unwrap();
        assert_eq!(sorted_ints(&rows, 0), vec![0, 1, 2], "zone map enabled: {}", enable_zone_map);
        assert_eq!(sorted_ints(&rows, 1), vec![3, 3, 3]);
    }

    // age INT32 widened to INT64 keeps its statistics: max 60 rules out > 100
    let ages = [Some(1), Some(2), Some(50), Some(60)];
    let mut info = ScanTableInfo::for_columns(table_of(&ages), &[("age", LogicalType::Int64)]).unwrap();
    let age = column("age", 0, LogicalType::Int64);
    let predicate = Expression::comparison(
        ComparisonKind::GreaterThan,
        age.clone(),
        Expression::literal(Value::Int64(100)),
    );
    info.push_down(0, &age, &predicate);
    let mut state = TableScanState::new(info.column_ids.clone());
    state.set_morsel(TableScanSource::Committed, 0);
    assert_eq!(
        info.check_zone_map(&Transaction::read_only(), &state).unwrap(),
        ZoneMapCheckResult::SkipScan
    );
}
