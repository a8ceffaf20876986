// Copyright 2024 The Glimmer Project
// SPDX-License-Identifier: BSD-3-Clause

use crate::{
    common::FixedHash,
    merkle::{mmr::Mmr, node_index},
};

/// An MMR holding every node in memory. Backs the historical-state commitment in tests and small
/// tools; node databases implement [Mmr] over their own storage instead.
#[derive(Clone, Debug, Default)]
pub struct MemMmr {
    leaf_count: u64,
    nodes: Vec<FixedHash>,
}

impl MemMmr {
    pub fn new() -> Self {
        Self::default()
    }

    /// The hash of the leaf at `leaf_index`.
    pub fn leaf(&self, leaf_index: u64) -> Option<&FixedHash> {
        self.nodes.get(node_index(leaf_index) as usize)
    }
}

impl Mmr for MemMmr {
    fn leaf_count(&self) -> u64 {
        self.leaf_count
    }

    fn set_leaf_count(&mut self, count: u64) {
        self.leaf_count = count;
    }

    fn load_element(&self, pos: u64) -> FixedHash {
        self.nodes.get(pos as usize).copied().unwrap_or_else(FixedHash::zero)
    }

    fn save_element(&mut self, pos: u64, hash: &FixedHash) {
        let pos = pos as usize;
        if pos >= self.nodes.len() {
            self.nodes.resize(pos + 1, FixedHash::zero());
        }
        self.nodes[pos] = *hash;
    }
}
