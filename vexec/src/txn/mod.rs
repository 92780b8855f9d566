// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Transactions as seen by the execution layer
//!
//! Isolation is not modelled here. A transaction only carries its access mode
//! and, for write transactions, the node groups it inserted but has not
//! committed yet. Scans read those after the committed ones.

pub mod local_storage;

pub use local_storage::{LocalNodeTable, LocalStorage};

use crate::storage::{StorageError, StorageResult};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TRANSACTION_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(u64);

impl TransactionId {
    pub fn next() -> Self {
        TransactionId(NEXT_TRANSACTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "txn_{}", self.0)
    }
}

/// Transaction access mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessMode {
    ReadOnly,
    ReadWrite,
}

#[derive(Debug)]
pub struct Transaction {
    id: TransactionId,
    access_mode: AccessMode,
    local_storage: RwLock<LocalStorage>,
}

impl Transaction {
    pub fn new(access_mode: AccessMode) -> Self {
        Self {
            id: TransactionId::next(),
            access_mode,
            local_storage: RwLock::new(LocalStorage::default()),
        }
    }

    pub fn read_only() -> Self {
        Self::new(AccessMode::ReadOnly)
    }

    pub fn read_write() -> Self {
        Self::new(AccessMode::ReadWrite)
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn access_mode(&self) -> AccessMode {
        self.access_mode
    }

    pub fn is_read_only(&self) -> bool {
        self.access_mode == AccessMode::ReadOnly
    }

    /// Uncommitted data of this transaction
    pub fn local_storage(&self) -> RwLockReadGuard<'_, LocalStorage> {
        self.local_storage.read()
    }

    /// Mutable local storage; fails for read-only transactions
    pub fn local_storage_mut(&self) -> StorageResult<RwLockWriteGuard<'_, LocalStorage>> {
        if self.is_read_only() {
            return Err(StorageError::InvalidOperation(format!(
                "{} is read-only",
                self.id
            )));
        }
        Ok(self.local_storage.write())
    }

    /// Number of uncommitted node groups this transaction holds for a table
    pub fn num_uncommitted_node_groups(&self, table_id: crate::types::TableId) -> usize {
        self.local_storage()
            .table(table_id)
            .map_or(0, |table| table.num_node_groups())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_only_transaction_has_no_local_storage() {
        let txn = Transaction::read_only();
        assert!(txn.local_storage_mut().is_err());
        assert_eq!(txn.num_uncommitted_node_groups(1), 0);
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Transaction::read_write();
        let b = Transaction::read_write();
        assert_ne!(a.id(), b.id());
        assert!(a.local_storage_mut().is_ok());
    }
}
