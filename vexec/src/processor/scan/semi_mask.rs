// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Semi-masks: the set of node offsets of one table a scan may emit

use crate::types::{InternalId, Offset, TableId};
use std::ops::Range;

/// Growable offset bitset of one node table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemiMask {
    table_id: TableId,
    words: Vec<u64>,
    num_masked: u64,
}

impl SemiMask {
    pub fn new(table_id: TableId) -> Self {
        Self {
            table_id,
            words: Vec::new(),
            num_masked: 0,
        }
    }

    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    pub fn num_masked(&self) -> u64 {
        self.num_masked
    }

    pub fn is_empty(&self) -> bool {
        self.num_masked == 0
    }

    pub fn mark(&mut self, offset: Offset) {
        let (word, bit) = Self::locate(offset);
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        if self.words[word] & bit == 0 {
            self.words[word] |= bit;
            self.num_masked += 1;
        }
    }

    /// Mark a node id; ids of other tables are ignored
    pub fn mark_node(&mut self, node: InternalId) {
        if node.table_id == self.table_id {
            self.mark(node.offset);
        }
    }

    pub fn is_masked(&self, offset: Offset) -> bool {
        let (word, bit) = Self::locate(offset);
        self.words.get(word).is_some_and(|w| w & bit != 0)
    }

    pub fn is_node_masked(&self, node: InternalId) -> bool {
        node.table_id == self.table_id && self.is_masked(node.offset)
    }

    /// Whether any offset of `range` is masked
    pub fn has_any_in(&self, range: Range<Offset>) -> bool {
        if range.is_empty() || self.is_empty() {
            return false;
        }
        let (first_word, _) = Self::locate(range.start);
        let (last_word, _) = Self::locate(range.end - 1);
        let last_word = last_word.min(self.words.len().saturating_sub(1));
        if first_word >= self.words.len() {
            return false;
        }
        for word_idx in first_word..=last_word {
            let mut word = self.words[word_idx];
            if word == 0 {
                continue;
            }
            let word_start = word_idx as Offset * 64;
            if range.start > word_start {
                word &= !0u64 << (range.start - word_start);
            }
            let word_end = word_start + 64;
            if range.end < word_end {
                word &= (1u64 << (range.end - word_start)) - 1;
            }
            if word != 0 {
                return true;
            }
        }
        false
    }

    /// Add every offset of `other` to this mask
    pub fn union_with(&mut self, other: &SemiMask) {
        debug_assert_eq!(self.table_id, other.table_id);
        if other.words.len() > self.words.len() {
            self.words.resize(other.words.len(), 0);
        }
        for (word, other_word) in self.words.iter_mut().zip(&other.words) {
            *word |= other_word;
        }
        self.num_masked = self.words.iter().map(|w| w.count_ones() as u64).sum();
    }

    #[inline]
    fn locate(offset: Offset) -> (usize, u64) {
        ((offset / 64) as usize, 1u64 << (offset % 64))
    }
}
