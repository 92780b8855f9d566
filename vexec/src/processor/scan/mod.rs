// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Table scan operators
//!
//! - [`ScanNodeTable`]: morsel-driven scan over one or more node tables
//! - [`PrimaryKeyScanNodeTable`]: point lookups by primary key
//! - [`ScanMultiRelTable`]: adjacency scans of the bound node of each tuple
//!
//! All scans write into one output chunk: a node id vector followed by one
//! vector per requested column. Columns whose stored type differs from the
//! output type are read through a [`ColumnCaster`].

mod column_caster;
mod primary_key_scan;
mod scan_multi_rel_table;
mod scan_node_table;
mod semi_mask;

pub use column_caster::ColumnCaster;
pub use primary_key_scan::{PrimaryKeyScanNodeTable, PrimaryKeyScanSharedState, PrimaryKeyScanTableInfo};
pub use scan_multi_rel_table::{RelScanTableInfo, RelTableCollectionScanner, ScanMultiRelTable};
pub use scan_node_table::{
    Morsel, ScanNodeTable, ScanNodeTableSharedState, ScanStatus,
};
pub use semi_mask::SemiMask;

use crate::exec::{ExecutionError, ExecutionResult};
use crate::expression::Expression;
use crate::predicate::{ColumnPredicateSet, ZoneMapCheckResult};
use crate::storage::{ScanOutput, StorageResult, Table, TableScanState};
use crate::txn::Transaction;
use crate::types::{ColumnId, InternalId, LogicalType, TypeCaster};
use crate::vector::{pick_vectors_mut, DataPos, ResultSet};
use std::sync::Arc;

/// What a scan reads from one table
#[derive(Debug, Clone)]
pub struct ScanTableInfo {
    pub table: Arc<dyn Table>,
    /// Columns to read, aligned with the scan's output vectors; `None` for a
    /// column the table lacks
    pub column_ids: Vec<Option<ColumnId>>,
    /// Pushed-down predicates, aligned with `column_ids`
    pub column_predicates: Vec<ColumnPredicateSet>,
    /// Casters for columns stored with another type, aligned with `column_ids`
    pub casters: Vec<Option<ColumnCaster>>,
}

impl ScanTableInfo {
    pub fn new(table: Arc<dyn Table>, column_ids: Vec<Option<ColumnId>>) -> Self {
        let num_columns = column_ids.len();
        Self {
            table,
            column_ids,
            column_predicates: vec![ColumnPredicateSet::new(); num_columns],
            casters: vec![None; num_columns],
        }
    }

    /// Resolve output columns by name, adding a caster wherever the stored
    /// type differs from the requested one
    pub fn for_columns(
        table: Arc<dyn Table>,
        columns: &[(&str, LogicalType)],
    ) -> ExecutionResult<Self> {
        let mut column_ids = Vec::with_capacity(columns.len());
        let mut casters = Vec::with_capacity(columns.len());
        for (name, output_type) in columns {
            let column_id = table.column_id(name);
            let caster = match column_id.and_then(|id| table.column_type(id)) {
                Some(stored) if stored != output_type => {
                    Some(ColumnCaster::new(stored.clone(), output_type.clone())?)
                }
                _ => None,
            };
            column_ids.push(column_id);
            casters.push(caster);
        }
        let mut info = Self::new(table, column_ids);
        info.casters = casters;
        Ok(info)
    }

    /// Push the convertible conjuncts of `filter` on `column` down to the
    /// scan's `column_idx`-th column; returns how many were converted
    pub fn push_down(&mut self, column_idx: usize, column: &Expression, filter: &Expression) -> usize {
        let converted = ColumnPredicateSet::from_predicates(column, [filter]);
        let num_converted = converted.len();
        if let Some(set) = self.column_predicates.get_mut(column_idx) {
            for predicate in converted.predicates() {
                set.add(predicate.clone());
            }
        }
        num_converted
    }

    pub fn num_columns(&self) -> usize {
        self.column_ids.len()
    }

    pub fn has_predicates(&self) -> bool {
        self.column_predicates.iter().any(|set| !set.is_empty())
    }

    fn validate(&self, num_outputs: usize) -> ExecutionResult<()> {
        if self.column_ids.len() != num_outputs
            || self.column_predicates.len() != num_outputs
            || self.casters.len() != num_outputs
        {
            return Err(ExecutionError::InvalidPlan(format!(
                "scan of {} reads {} columns into {} output vectors",
                self.table.name(),
                self.column_ids.len(),
                num_outputs
            )));
        }
        Ok(())
    }

    /// Consult the statistics of the zone `state` is positioned on
    ///
    /// Statistics are kept in the stored type, so a cast column only takes
    /// part when its cast keeps both order and values.
    pub fn check_zone_map(
        &self,
        transaction: &Transaction,
        state: &TableScanState,
    ) -> ExecutionResult<ZoneMapCheckResult> {
        let columns = self
            .column_ids
            .iter()
            .zip(&self.column_predicates)
            .zip(&self.casters);
        for ((column_id, predicates), caster) in columns {
            let Some(column_id) = column_id else {
                continue;
            };
            if predicates.is_empty() {
                continue;
            }
            if let Some(caster) = caster {
                if !TypeCaster::is_order_preserving(caster.source_type(), caster.target_type()) {
                    continue;
                }
            }
            let Some(stats) = self.table.merged_stats(transaction, state, *column_id)? else {
                continue;
            };
            if predicates.check_zone_map(&stats) == ZoneMapCheckResult::SkipScan {
                return Ok(ZoneMapCheckResult::SkipScan);
            }
        }
        Ok(ZoneMapCheckResult::AlwaysScan)
    }
}

/// Output vectors of a scan; all of them live in one chunk
#[derive(Debug, Clone)]
pub struct ScanOutputInfo {
    pub node_id_pos: DataPos,
    pub out_vectors_pos: Vec<DataPos>,
    /// `node_id_pos` followed by `out_vectors_pos`, as vector indexes
    vector_positions: Vec<usize>,
}

impl ScanOutputInfo {
    pub fn new(node_id_pos: DataPos, out_vectors_pos: Vec<DataPos>) -> ExecutionResult<Self> {
        if let Some(pos) = out_vectors_pos
            .iter()
            .find(|pos| pos.chunk_pos != node_id_pos.chunk_pos)
        {
            return Err(ExecutionError::InvalidPlan(format!(
                "scan output {:?} is not in the node id chunk {}",
                pos, node_id_pos.chunk_pos
            )));
        }
        let vector_positions = std::iter::once(node_id_pos.vector_pos)
            .chain(out_vectors_pos.iter().map(|pos| pos.vector_pos))
            .collect();
        Ok(Self {
            node_id_pos,
            out_vectors_pos,
            vector_positions,
        })
    }

    pub fn chunk_pos(&self) -> usize {
        self.node_id_pos.chunk_pos
    }

    pub fn num_columns(&self) -> usize {
        self.out_vectors_pos.len()
    }
}

fn validate_infos(infos: &[ScanTableInfo], outputs: &ScanOutputInfo) -> ExecutionResult<()> {
    if infos.is_empty() {
        return Err(ExecutionError::InvalidPlan(
            "scan without tables".to_string(),
        ));
    }
    infos
        .iter()
        .try_for_each(|info| info.validate(outputs.num_columns()))
}

/// Let `read` fill the scan's output chunk, routing cast columns through
/// their casters' temporary vectors
fn read_batch<F>(
    result_set: &mut ResultSet,
    outputs: &ScanOutputInfo,
    casters: &mut [Option<ColumnCaster>],
    read: F,
) -> ExecutionResult<bool>
where
    F: FnOnce(&mut ScanOutput<'_>) -> StorageResult<bool>,
{
    let (vectors, state) = result_set.chunk_parts_mut(outputs.chunk_pos());
    let mut picked = pick_vectors_mut(vectors, &outputs.vector_positions).into_iter();
    let Some(id_vector) = picked.next() else {
        return Err(ExecutionError::InvalidPlan(
            "scan output chunk has no node id vector".to_string(),
        ));
    };
    let columns = picked
        .zip(casters.iter_mut())
        .map(|(output, caster)| match caster {
            Some(caster) => caster.temp_vector_mut(),
            None => output,
        })
        .collect();
    let mut output = ScanOutput::new(id_vector, columns, state);
    Ok(read(&mut output)?)
}

/// Cast the selected slots of every cast column into its output vector
fn cast_columns(
    result_set: &mut ResultSet,
    outputs: &ScanOutputInfo,
    casters: &[Option<ColumnCaster>],
) -> ExecutionResult<()> {
    if casters.iter().all(Option::is_none) {
        return Ok(());
    }
    let (vectors, state) = result_set.chunk_parts_mut(outputs.chunk_pos());
    for (pos, caster) in outputs.out_vectors_pos.iter().zip(casters) {
        if let Some(caster) = caster {
            caster.cast(&mut vectors[pos.vector_pos], state.sel_vector())?;
        }
    }
    Ok(())
}

/// Drop the scanned rows whose node id is not in `mask`; returns the number
/// of rows left
fn apply_semi_mask(result_set: &mut ResultSet, outputs: &ScanOutputInfo, mask: &SemiMask) -> usize {
    let (vectors, state) = result_set.chunk_parts_mut(outputs.chunk_pos());
    let ids = &vectors[outputs.node_id_pos.vector_pos];
    state
        .sel_vector_mut()
        .retain(|pos| !ids.is_null(pos) && mask.is_node_masked(ids.get_value::<InternalId>(pos)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::Expression;
    use crate::functions::ComparisonKind;
    use crate::storage::{MemoryNodeTable, Value};

    fn table() -> Arc<dyn Table> {
        Arc::new(MemoryNodeTable::new(
            0,
            "person",
            vec![
                ("id".to_string(), LogicalType::Int64),
                ("age".to_string(), LogicalType::Int32),
            ],
            4,
        ))
    }

    #[test]
    fn test_for_columns_resolves_and_adds_casters() {
        let info = ScanTableInfo::for_columns(
            table(),
            &[
                ("id", LogicalType::Int64),
                ("age", LogicalType::Int64),
                ("email", LogicalType::String),
            ],
        )
        .unwrap();
        assert_eq!(info.column_ids, vec![Some(0), Some(1), None]);
        assert!(info.casters[0].is_none());
        assert_eq!(
            info.casters[1].as_ref().map(|c| c.source_type().clone()),
            Some(LogicalType::Int32)
        );
        assert!(info.casters[2].is_none());
    }

    #[test]
    fn test_push_down_and_validate() {
        let mut info = ScanTableInfo::new(table(), vec![Some(1)]);
        let age = Expression::column("age", DataPos::new(0, 1), LogicalType::Int32);
        let filter = Expression::and(
            Expression::comparison(ComparisonKind::GreaterThan, age.clone(), Expression::literal(Value::Int64(30))),
            Expression::is_not_null(age.clone()),
        );
        assert_eq!(info.push_down(0, &age, &filter), 2);
        assert!(info.has_predicates());
        assert!(info.validate(1).is_ok());
        assert!(info.validate(2).is_err());
    }

    #[test]
    fn test_outputs_must_share_a_chunk() {
        assert!(ScanOutputInfo::new(DataPos::new(0, 0), vec![DataPos::new(0, 1)]).is_ok());
        assert!(ScanOutputInfo::new(DataPos::new(0, 0), vec![DataPos::new(1, 0)]).is_err());
    }
}
