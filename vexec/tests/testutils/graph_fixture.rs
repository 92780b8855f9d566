//! In-memory graph fixtures
//!
//! Builds node and relationship tables through the public storage API and
//! runs operator trees with [`execute_pipeline`]. Pipelines read node ids
//! into vector 0 of chunk 0 and the scanned columns into the vectors after it.

use std::sync::Arc;
use vexec::processor::{execute_pipeline, PhysicalOperator, ResultCollector, ScanOutputInfo};
use vexec::storage::{MemoryNodeTable, MemoryRelTable, Value};
use vexec::txn::Transaction;
use vexec::types::TableId;
use vexec::vector::{DataChunkDescriptor, DataPos, ResultSetDescriptor};
use vexec::{ExecutionConfig, ExecutionContext, ExecutionResult, Expression, LogicalType};

pub const PERSON: TableId = 0;
pub const EMPLOYEE: TableId = 1;
pub const ROBOT: TableId = 2;
pub const KNOWS: TableId = 10;

/// `person(id INT64 PRIMARY KEY, age INT32, name STRING)`; row `i` has id `i`
/// and the age `age_of(i)` returns
pub fn person_table(
    num_rows: i64,
    node_group_size: usize,
    age_of: impl Fn(i64) -> Option<i32>,
) -> Arc<MemoryNodeTable> {
    let table = MemoryNodeTable::new(
        PERSON,
        "person",
        vec![
            ("id".to_string(), LogicalType::Int64),
            ("age".to_string(), LogicalType::Int32),
            ("name".to_string(), LogicalType::String),
        ],
        node_group_size,
    )
    .with_primary_key("id")
    .expect("Failed to index person.id");
    for i in 0..num_rows {
        table
            .append(person_row(i, age_of(i)))
            .expect("Failed to append person");
    }
    Arc::new(table)
}

pub fn person_row(id: i64, age: Option<i32>) -> Vec<Value> {
    vec![
        Value::Int64(id),
        age.map_or(Value::Null, Value::Int32),
        Value::String(format!("person{}", id)),
    ]
}

/// `employee(name STRING PRIMARY KEY, age INT64)`
pub fn employee_table(rows: &[(&str, i64)], node_group_size: usize) -> Arc<MemoryNodeTable> {
    let table = MemoryNodeTable::new(
        EMPLOYEE,
        "employee",
        vec![
            ("name".to_string(), LogicalType::String),
            ("age".to_string(), LogicalType::Int64),
        ],
        node_group_size,
    )
    .with_primary_key("name")
    .expect("Failed to index employee.name");
    for (name, age) in rows {
        table
            .append(vec![Value::from(*name), Value::Int64(*age)])
            .expect("Failed to append employee");
    }
    Arc::new(table)
}

/// `robot(serial STRING)`, a table without an age column
pub fn robot_table(serials: &[&str]) -> Arc<MemoryNodeTable> {
    let table = MemoryNodeTable::with_config(
        ROBOT,
        "robot",
        vec![("serial".to_string(), LogicalType::String)],
        &ExecutionConfig::small_node_groups(4),
    );
    for serial in serials {
        table
            .append(vec![Value::from(*serial)])
            .expect("Failed to append robot");
    }
    Arc::new(table)
}

/// `knows(_ID, since INT64)` between persons
pub fn knows_table(edges: &[(u64, u64, i64)], node_group_size: usize) -> Arc<MemoryRelTable> {
    let table = MemoryRelTable::new(
        KNOWS,
        "knows",
        PERSON,
        PERSON,
        vec![("since".to_string(), LogicalType::Int64)],
        node_group_size,
    );
    for (src, dst, since) in edges {
        table
            .append(*src, *dst, vec![Value::Int64(*since)])
            .expect("Failed to append knows");
    }
    Arc::new(table)
}

pub fn read_only_context(config: ExecutionConfig) -> ExecutionContext {
    context(Arc::new(Transaction::read_only()), config)
}

pub fn context(transaction: Arc<Transaction>, config: ExecutionConfig) -> ExecutionContext {
    vexec::init_logging();
    ExecutionContext::new(transaction, config)
}

pub fn config(num_threads: usize) -> ExecutionConfig {
    ExecutionConfig::default().with_num_threads(num_threads)
}

/// One unflat chunk: a node id followed by one vector per type
pub fn scan_descriptor(types: &[LogicalType]) -> ResultSetDescriptor {
    let mut chunk = vec![LogicalType::InternalId];
    chunk.extend(types.iter().cloned());
    ResultSetDescriptor::new(vec![DataChunkDescriptor::new(chunk)])
}

/// Outputs of a scan over `num_columns` columns in chunk 0
pub fn scan_outputs(num_columns: usize) -> ScanOutputInfo {
    ScanOutputInfo::new(DataPos::new(0, 0), column_positions(num_columns))
        .expect("Failed to build scan outputs")
}

pub fn column_positions(num_columns: usize) -> Vec<DataPos> {
    (1..=num_columns).map(|idx| DataPos::new(0, idx)).collect()
}

/// Reference to the `idx`-th scanned column
pub fn column(name: &str, idx: usize, data_type: LogicalType) -> Expression {
    Expression::column(name, DataPos::new(0, idx + 1), data_type)
}

/// Run `root` to completion and collect `columns`
pub fn run(
    root: Box<dyn PhysicalOperator>,
    columns: Vec<DataPos>,
    descriptor: &ResultSetDescriptor,
    context: &ExecutionContext,
) -> ExecutionResult<Vec<Vec<Value>>> {
    let sink = ResultCollector::new(columns, root);
    execute_pipeline(&sink, descriptor, context)
}

/// Integer column `idx` of `rows`, sorted, nulls dropped
pub fn sorted_ints(rows: &[Vec<Value>], idx: usize) -> Vec<i64> {
    let mut values: Vec<i64> = rows.iter().filter_map(|row| row[idx].as_i64()).collect();
    values.sort_unstable();
    values
}
