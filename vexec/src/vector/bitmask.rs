// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Fixed-capacity bitmask used for null tracking and CASE fill tracking

const BITS_PER_WORD: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitMask {
    words: Vec<u64>,
    capacity: usize,
    /// False only when no bit can possibly be set
    may_have_set_bits: bool,
}

impl BitMask {
    /// Create a mask with every bit cleared
    pub fn new(capacity: usize) -> Self {
        Self {
            words: vec![0; capacity.div_ceil(BITS_PER_WORD)],
            capacity,
            may_have_set_bits: false,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn is_set(&self, pos: usize) -> bool {
        debug_assert!(pos < self.capacity, "bit {} out of capacity", pos);
        self.may_have_set_bits && (self.words[pos / BITS_PER_WORD] >> (pos % BITS_PER_WORD)) & 1 == 1
    }

    #[inline]
    pub fn set(&mut self, pos: usize, value: bool) {
        debug_assert!(pos < self.capacity, "bit {} out of capacity", pos);
        let word = &mut self.words[pos / BITS_PER_WORD];
        let bit = 1u64 << (pos % BITS_PER_WORD);
        if value {
            *word |= bit;
            self.may_have_set_bits = true;
        } else {
            *word &= !bit;
        }
    }

    pub fn set_all(&mut self) {
        self.words.iter_mut().for_each(|w| *w = u64::MAX);
        self.may_have_set_bits = true;
    }

    pub fn clear_all(&mut self) {
        if self.may_have_set_bits {
            self.words.iter_mut().for_each(|w| *w = 0);
            self.may_have_set_bits = false;
        }
    }

    /// True when no bit is set; cheap when the mask was never written
    pub fn is_clear(&self) -> bool {
        !self.may_have_set_bits || self.words.iter().all(|w| *w == 0)
    }

    /// Number of set bits among the first `len` positions
    pub fn count_set(&self, len: usize) -> usize {
        (0..len.min(self.capacity)).filter(|&i| self.is_set(i)).count()
    }
}
