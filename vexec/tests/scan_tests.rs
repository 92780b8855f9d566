//! Table scan integration tests
//!
//! Morsel distribution across workers, uncommitted data, zone-map pruning,
//! casting across tables, primary key lookups and relationship scans

#[path = "testutils/mod.rs"]
mod testutils;

use std::collections::HashMap;
use std::sync::Arc;
use testutils::graph_fixture::*;
use vexec::functions::ComparisonKind;
use vexec::processor::{
    Filter, Flatten, Morsel, PhysicalOperator, PrimaryKeyScanNodeTable, PrimaryKeyScanTableInfo,
    RelScanTableInfo, RelTableCollectionScanner, ScanMultiRelTable, ScanNodeTable,
    ScanNodeTableSharedState, ScanOutputInfo, ScanStatus, ScanTableInfo,
};
use vexec::storage::{RelDataDirection, TableScanSource, Value};
use vexec::txn::Transaction;
use vexec::vector::{DataChunkDescriptor, DataPos, ResultSet, ResultSetDescriptor};
use vexec::{ExecutionConfig, ExecutionContext, Expression, LogicalType, Table};

fn claim_all(shared: &ScanNodeTableSharedState, num_threads: usize) -> Vec<Morsel> {
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..num_threads)
            .map(|_| scope.spawn(|| std::iter::from_fn(|| shared.next_morsel()).collect::<Vec<_>>()))
            .collect();
        handles
            .into_iter()
            .flat_map(|handle| handle.join().expect("Worker panicked"))
            .collect()
    })
}

fn group_indexes(morsels: &[Morsel], source: TableScanSource) -> Vec<usize> {
    let mut indexes: Vec<usize> = morsels
        .iter()
        .filter(|morsel| morsel.source == source)
        .map(|morsel| morsel.node_group_idx)
        .collect();
    indexes.sort_unstable();
    indexes
}

#[test]
fn test_morsels_are_claimed_exactly_once() {
    for (num_committed, num_uncommitted) in [(0, 0), (1, 0), (0, 3), (37, 5), (500, 64)] {
        let shared = ScanNodeTableSharedState::new(PERSON);
        shared.init(num_committed, num_uncommitted);

        let morsels = claim_all(&shared, 8);
        assert_eq!(morsels.len(), num_committed + num_uncommitted);
        assert_eq!(
            group_indexes(&morsels, TableScanSource::Committed),
            (0..num_committed).collect::<Vec<_>>()
        );
        assert_eq!(
            group_indexes(&morsels, TableScanSource::Uncommitted),
            (0..num_uncommitted).collect::<Vec<_>>()
        );
        assert_eq!(shared.status(), ScanStatus::Exhausted);
        assert_eq!(shared.next_morsel(), None);
    }
}

fn id_scan(table: Arc<dyn Table>) -> Box<dyn PhysicalOperator> {
    let info = ScanTableInfo::for_columns(table, &[("id", LogicalType::Int64)]).unwrap();
    Box::new(ScanNodeTable::new(scan_outputs(1), vec![info]).unwrap())
}

#[test]
fn test_scan_reads_uncommitted_rows_of_own_transaction() {
    let table = person_table(10, 4, |i| Some(i as i32));
    let transaction = Arc::new(Transaction::read_write());
    for id in 10..15 {
        table
            .insert(&transaction, person_row(id, Some(id as i32)))
            .expect("Failed to insert person");
    }
    let descriptor = scan_descriptor(&[LogicalType::Int64]);
    let columns = vec![DataPos::new(0, 0), DataPos::new(0, 1)];

    let rows = run(
        id_scan(table.clone()),
        columns.clone(),
        &descriptor,
        &context(transaction, config(3)),
    )
    .unwrap();
    assert_eq!(sorted_ints(&rows, 1), (0..15).collect::<Vec<_>>());
    for row in &rows {
        let node = row[0].as_internal_id().expect("node id");
        assert_eq!(node.table_id, PERSON);
        assert_eq!(Some(node.offset as i64), row[1].as_i64());
    }

    // other transactions only see committed rows
    let rows = run(id_scan(table), columns, &descriptor, &read_only_context(config(3))).unwrap();
    assert_eq!(sorted_ints(&rows, 1), (0..10).collect::<Vec<_>>());
}

/// `age >= value` over the `idx`-th scanned column
fn age_at_least(idx: usize, value: i64) -> (Expression, Expression) {
    let age = column("age", idx, LogicalType::Int64);
    let filter = Expression::comparison(
        ComparisonKind::GreaterThanEquals,
        age.clone(),
        Expression::literal(Value::Int64(value)),
    );
    (age, filter)
}

#[test]
fn test_zone_map_prunes_first_group_across_workers() {
    // node groups of 500, 500 and 10 rows
    let table = person_table(1010, 500, |i| Some(i as i32));
    let (age, filter) = age_at_least(1, 500);
    let mut info = ScanTableInfo::for_columns(
        table,
        &[("id", LogicalType::Int64), ("age", LogicalType::Int64)],
    )
    .unwrap();
    assert_eq!(info.push_down(1, &age, &filter), 1);
    let descriptor = scan_descriptor(&[LogicalType::Int64, LogicalType::Int64]);

    let scan = ScanNodeTable::new(scan_outputs(2), vec![info.clone()]).unwrap();
    let root = Filter::new(filter.clone(), 0, Box::new(scan)).unwrap();
    let rows = run(Box::new(root), column_positions(2), &descriptor, &read_only_context(config(4)))
        .unwrap();
    assert_eq!(rows.len(), 510);
    assert_eq!(sorted_ints(&rows, 0), (500..1010).collect::<Vec<_>>());

    // a single worker sees the pruned group in its metrics
    let mut scan = ScanNodeTable::new(scan_outputs(2), vec![info]).unwrap();
    let context = read_only_context(ExecutionConfig::single_threaded());
    let mut result_set = ResultSet::new(&descriptor);
    scan.init_global_state(&context).unwrap();
    scan.init_local_state(&mut result_set, &context).unwrap();
    while scan.get_next_tuple(&mut result_set, &context).unwrap() {
        let vector = result_set.vector(DataPos::new(0, 1));
        let state = result_set.chunk_state(0);
        assert!(state.sel_vector().iter().all(|pos| vector.get_value::<i64>(pos) >= 500));
    }
    assert_eq!(scan.metrics().num_skipped_groups, 1);
    assert_eq!(scan.metrics().num_output_tuples, 510);
}

#[test]
fn test_disabled_zone_map_scans_every_group() {
    let table = person_table(1010, 500, |i| Some(i as i32));
    let (age, filter) = age_at_least(0, 500);
    let mut info = ScanTableInfo::for_columns(table, &[("age", LogicalType::Int64)]).unwrap();
    info.push_down(0, &age, &filter);
    let descriptor = scan_descriptor(&[LogicalType::Int64]);

    let mut config = config(2);
    config.enable_zone_map = false;
    let scan = ScanNodeTable::new(scan_outputs(1), vec![info.clone()]).unwrap();
    let rows = run(Box::new(scan), column_positions(1), &descriptor, &read_only_context(config.clone()))
        .unwrap();
    assert_eq!(rows.len(), 1010);

    // pruning never changes what the filter returns
    let scan = ScanNodeTable::new(scan_outputs(1), vec![info]).unwrap();
    let root = Filter::new(filter, 0, Box::new(scan)).unwrap();
    let rows = run(Box::new(root), column_positions(1), &descriptor, &read_only_context(config))
        .unwrap();
    assert_eq!(sorted_ints(&rows, 0), (500..1010).collect::<Vec<_>>());
}

#[test]
fn test_cast_columns_across_tables() {
    let persons = person_table(6, 4, |i| if i == 2 { None } else { Some(20 + i as i32) });
    let employees = employee_table(&[("ann", 41), ("bob", 19)], 4);
    let robots = robot_table(&["r2d2", "c3po", "t800"]);
    let columns = [("age", LogicalType::Int64)];
    let infos = vec![
        ScanTableInfo::for_columns(persons, &columns).unwrap(),
        ScanTableInfo::for_columns(employees, &columns).unwrap(),
        ScanTableInfo::for_columns(robots, &columns).unwrap(),
    ];
    assert!(infos[0].casters[0].is_some());
    assert!(infos[1].casters[0].is_none());
    assert_eq!(infos[2].column_ids, vec![None]);
    let descriptor = scan_descriptor(&[LogicalType::Int64]);

    let scan = ScanNodeTable::new(scan_outputs(1), infos.clone()).unwrap();
    let rows = run(
        Box::new(scan),
        vec![DataPos::new(0, 0), DataPos::new(0, 1)],
        &descriptor,
        &read_only_context(config(3)),
    )
    .unwrap();
    assert_eq!(rows.len(), 11);
    assert_eq!(sorted_ints(&rows, 1), vec![19, 20, 21, 23, 24, 25, 41]);
    // the person without an age and every robot
    assert_eq!(rows.iter().filter(|row| row[1].is_null()).count(), 4);
    assert!(rows
        .iter()
        .filter(|row| row[0].as_internal_id().map(|id| id.table_id) == Some(ROBOT))
        .all(|row| row[1].is_null()));

    let (_, filter) = age_at_least(0, 24);
    let scan = ScanNodeTable::new(scan_outputs(1), infos).unwrap();
    let root = Filter::new(filter, 0, Box::new(scan)).unwrap();
    let rows = run(Box::new(root), column_positions(1), &descriptor, &read_only_context(config(3)))
        .unwrap();
    assert_eq!(sorted_ints(&rows, 0), vec![24, 25, 41]);
}

fn primary_key_scan(keys: Vec<(Arc<dyn Table>, Value)>) -> PrimaryKeyScanNodeTable {
    let tables = keys
        .into_iter()
        .map(|(table, key)| {
            let info = ScanTableInfo::for_columns(table, &[("age", LogicalType::Int64)]).unwrap();
            PrimaryKeyScanTableInfo::new(info, Expression::literal(key))
        })
        .collect();
    PrimaryKeyScanNodeTable::new(scan_outputs(1), tables).unwrap()
}

#[test]
fn test_primary_key_lookup_over_tables() {
    let persons = person_table(100, 16, |i| Some(i as i32 * 2));
    let employees = employee_table(&[("ann", 41), ("bob", 19)], 4);
    let descriptor = scan_descriptor(&[LogicalType::Int64]);
    let columns = vec![DataPos::new(0, 0), DataPos::new(0, 1)];

    // the person key misses, the employee key hits
    let scan = primary_key_scan(vec![
        (persons.clone() as Arc<dyn Table>, Value::Int64(1000)),
        (employees.clone() as Arc<dyn Table>, Value::from("bob")),
    ]);
    let rows = run(Box::new(scan), columns.clone(), &descriptor, &read_only_context(config(2)))
        .unwrap();
    assert_eq!(rows.len(), 1);
    let node = rows[0][0].as_internal_id().unwrap();
    assert_eq!((node.table_id, node.offset), (EMPLOYEE, 1));
    assert_eq!(rows[0][1], Value::Int64(19));

    // one row per hit, each table looked up once across workers
    let scan = primary_key_scan(vec![
        (persons.clone() as Arc<dyn Table>, Value::Int64(42)),
        (employees as Arc<dyn Table>, Value::from("ann")),
    ]);
    let rows = run(Box::new(scan), columns.clone(), &descriptor, &read_only_context(config(4)))
        .unwrap();
    assert_eq!(sorted_ints(&rows, 1), vec![41, 84]);

    let scan = primary_key_scan(vec![(persons as Arc<dyn Table>, Value::Int64(-1))]);
    let rows = run(Box::new(scan), columns, &descriptor, &read_only_context(config(2))).unwrap();
    assert!(rows.is_empty());
}

fn knows_edges() -> Vec<(u64, u64, i64)> {
    (0..40u64)
        .flat_map(|src| {
            (1..=src % 4).map(move |step| (src, (src * 7 + step) % 40, 1990 + (src + step) as i64))
        })
        .collect()
}

/// Persons in chunk 0 `[id, person.id]`, neighbours in chunk 1
/// `[neighbour id, since]`
fn expand(scanner: RelTableCollectionScanner, num_persons: i64) -> Box<dyn PhysicalOperator> {
    let persons = person_table(num_persons, 8, |i| Some(i as i32));
    let info = ScanTableInfo::for_columns(persons, &[("id", LogicalType::Int64)]).unwrap();
    let scan = ScanNodeTable::new(scan_outputs(1), vec![info]).unwrap();
    let flatten = Flatten::new(0, Box::new(scan));
    let outputs = ScanOutputInfo::new(DataPos::new(1, 0), vec![DataPos::new(1, 1)]).unwrap();
    Box::new(
        ScanMultiRelTable::new(
            DataPos::new(0, 0),
            outputs,
            None,
            HashMap::from([(PERSON, scanner)]),
            Box::new(flatten),
        )
        .unwrap(),
    )
}

fn expand_descriptor() -> ResultSetDescriptor {
    ResultSetDescriptor::new(vec![
        DataChunkDescriptor::new(vec![LogicalType::InternalId, LogicalType::Int64]),
        DataChunkDescriptor::new(vec![LogicalType::InternalId, LogicalType::Int64]),
    ])
}

fn expanded_edges(root: Box<dyn PhysicalOperator>, context: &ExecutionContext) -> Vec<(u64, u64, i64)> {
    let rows = run(
        root,
        vec![DataPos::new(0, 1), DataPos::new(1, 0), DataPos::new(1, 1)],
        &expand_descriptor(),
        context,
    )
    .unwrap();
    let mut edges: Vec<(u64, u64, i64)> = rows
        .iter()
        .map(|row| {
            (
                row[0].as_i64().unwrap() as u64,
                row[1].as_internal_id().unwrap().offset,
                row[2].as_i64().unwrap(),
            )
        })
        .collect();
    edges.sort_unstable();
    edges
}

#[test]
fn test_multi_rel_scan_expands_every_node() {
    let edges = knows_edges();
    let knows: Arc<dyn Table> = knows_table(&edges, 4);
    let info = ScanTableInfo::for_columns(knows, &[("since", LogicalType::Int64)]).unwrap();
    let scanner = RelTableCollectionScanner::new(vec![RelScanTableInfo::new(
        info,
        RelDataDirection::Fwd,
    )]);

    let mut expected = edges.clone();
    expected.sort_unstable();
    let actual = expanded_edges(expand(scanner, 40), &read_only_context(config(4)));
    assert_eq!(actual, expected);
}

#[test]
fn test_multi_rel_scan_both_directions_with_pruning() {
    let edges = knows_edges();
    let knows: Arc<dyn Table> = knows_table(&edges, 4);
    let since = Expression::column("since", DataPos::new(1, 1), LogicalType::Int64);
    let filter = Expression::comparison(
        ComparisonKind::LessThan,
        since.clone(),
        Expression::literal(Value::Int64(2000)),
    );
    let directions = [RelDataDirection::Fwd, RelDataDirection::Bwd];
    let rels = directions
        .iter()
        .map(|direction| {
            let mut info =
                ScanTableInfo::for_columns(knows.clone(), &[("since", LogicalType::Int64)]).unwrap();
            info.push_down(0, &since, &filter);
            RelScanTableInfo::new(info, *direction)
        })
        .collect();
    let scanner = RelTableCollectionScanner::new(rels);
    let root = Filter::new(filter, 1, expand(scanner, 40)).unwrap();
    let actual = expanded_edges(Box::new(root), &read_only_context(config(3)));

    let mut expected: Vec<(u64, u64, i64)> = edges
        .iter()
        .filter(|(_, _, since)| *since < 2000)
        .flat_map(|&(src, dst, since)| [(src, dst, since), (dst, src, since)])
        .collect();
    expected.sort_unstable();
    assert_eq!(actual, expected);
}
