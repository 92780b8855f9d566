//! Filter integration tests
//!
//! Filters over parallel scans must return exactly the qualifying rows and
//! never hand an empty batch to their parent.

#[path = "testutils/mod.rs"]
mod testutils;

use std::collections::HashSet;
use testutils::batch_audit::BatchAudit;
use testutils::graph_fixture::*;
use vexec::functions::{names, ComparisonKind};
use vexec::processor::{Filter, NodeLabelFilter, ScanNodeTable, ScanTableInfo};
use vexec::storage::Value;
use vexec::vector::DataPos;
use vexec::{Expression, LogicalType};

const KINDS: [ComparisonKind; 6] = [
    ComparisonKind::Equals,
    ComparisonKind::NotEquals,
    ComparisonKind::GreaterThan,
    ComparisonKind::GreaterThanEquals,
    ComparisonKind::LessThan,
    ComparisonKind::LessThanEquals,
];

fn random_ages(rng: &mut fastrand::Rng, num_rows: usize) -> Vec<Option<i32>> {
    (0..num_rows)
        .map(|_| (!rng.bool() || rng.u8(..) > 20).then(|| rng.i32(0..100)))
        .collect()
}

#[test]
fn test_filter_returns_exactly_qualifying_rows() {
    let mut rng = fastrand::Rng::with_seed(7);
    for _ in 0..12 {
        let num_rows = rng.usize(0..6000);
        let ages = random_ages(&mut rng, num_rows);
        let group_size = rng.usize(64..3000);
        let kind = KINDS[rng.usize(..KINDS.len())];
        let constant = rng.i64(-5..105);

        let table = {
            let ages = ages.clone();
            person_table(num_rows as i64, group_size, move |i| ages[i as usize])
        };
        let info = ScanTableInfo::for_columns(
            table,
            &[("id", LogicalType::Int64), ("age", LogicalType::Int64)],
        )
        .unwrap();
        let age = column("age", 1, LogicalType::Int64);
        let predicate =
            Expression::comparison(kind, age, Expression::literal(Value::Int64(constant)));
        let scan = ScanNodeTable::new(scan_outputs(2), vec![info]).unwrap();
        let filter = Filter::new(predicate, 0, Box::new(scan)).unwrap();
        let (audit, batches) = BatchAudit::new(0, Box::new(filter));

        let rows = run(
            Box::new(audit),
            column_positions(2),
            &scan_descriptor(&[LogicalType::Int64, LogicalType::Int64]),
            &read_only_context(config(1 + rng.usize(..4))),
        )
        .unwrap();

        let expected: Vec<i64> = ages
            .iter()
            .enumerate()
            .filter(|(_, age)| age.map_or(false, |age| kind.matches(i64::from(age).cmp(&constant))))
            .map(|(id, _)| id as i64)
            .collect();
        assert_eq!(
            sorted_ints(&rows, 0),
            expected,
            "{} rows, groups of {}, age {} {}",
            num_rows,
            group_size,
            kind,
            constant
        );
        let batches = batches.lock();
        assert!(batches.iter().all(|&size| size > 0), "empty batch in {:?}", batches);
        assert_eq!(batches.iter().sum::<usize>(), expected.len());
    }
}

#[test]
fn test_stacked_filters_with_case() {
    let table = person_table(300, 128, |i| if i % 7 == 0 { None } else { Some(i as i32 % 100) });
    let info = ScanTableInfo::for_columns(
        table,
        &[("id", LogicalType::Int64), ("age", LogicalType::Int64)],
    )
    .unwrap();
    let age = column("age", 1, LogicalType::Int64);
    let literal = |v: i64| Expression::literal(Value::Int64(v));

    // CASE WHEN age < 10 THEN true WHEN age > 90 THEN false ELSE age % 2 = 0 END
    let even = Expression::comparison(
        ComparisonKind::Equals,
        Expression::function(names::MODULO, vec![age.clone(), literal(2)], LogicalType::Int64),
        literal(0),
    );
    let case = Expression::case(
        vec![
            (
                Expression::comparison(ComparisonKind::LessThan, age.clone(), literal(10)),
                Expression::literal(true),
            ),
            (
                Expression::comparison(ComparisonKind::GreaterThan, age.clone(), literal(90)),
                Expression::literal(false),
            ),
        ],
        even,
        LogicalType::Bool,
    );
    let not_null = Expression::is_not_null(age);

    let scan = ScanNodeTable::new(scan_outputs(2), vec![info]).unwrap();
    let inner = Filter::new(not_null, 0, Box::new(scan)).unwrap();
    let outer = Filter::new(case, 0, Box::new(inner)).unwrap();
    let (audit, batches) = BatchAudit::new(0, Box::new(outer));
    let rows = run(
        Box::new(audit),
        column_positions(2),
        &scan_descriptor(&[LogicalType::Int64, LogicalType::Int64]),
        &read_only_context(config(3)),
    )
    .unwrap();

    let expected: Vec<i64> = (0..300)
        .filter(|i| i % 7 != 0)
        .filter(|i| {
            let age = i % 100;
            age < 10 || (age <= 90 && age % 2 == 0)
        })
        .collect();
    assert_eq!(sorted_ints(&rows, 0), expected);
    assert!(batches.lock().iter().all(|&size| size > 0));
}

#[test]
fn test_node_label_filter_over_multi_table_scan() {
    let persons = person_table(50, 16, |i| Some(i as i32));
    let robots = robot_table(&["r2d2", "c3po"]);
    let employees = employee_table(&[("ann", 41)], 4);
    let columns = [("age", LogicalType::Int64)];
    let infos = vec![
        ScanTableInfo::for_columns(persons, &columns).unwrap(),
        ScanTableInfo::for_columns(robots, &columns).unwrap(),
        ScanTableInfo::for_columns(employees, &columns).unwrap(),
    ];
    let scan = ScanNodeTable::new(scan_outputs(1), infos).unwrap();
    let filter = NodeLabelFilter::new(
        DataPos::new(0, 0),
        HashSet::from([ROBOT, EMPLOYEE]),
        Box::new(scan),
    );
    let rows = run(
        Box::new(filter),
        vec![DataPos::new(0, 0)],
        &scan_descriptor(&[LogicalType::Int64]),
        &read_only_context(config(2)),
    )
    .unwrap();

    let mut tables: Vec<u64> = rows
        .iter()
        .map(|row| row[0].as_internal_id().unwrap().table_id)
        .collect();
    tables.sort_unstable();
    assert_eq!(tables, vec![EMPLOYEE, ROBOT, ROBOT]);
}
