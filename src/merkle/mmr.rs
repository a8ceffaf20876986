// Copyright 2024. The Glimmer Project
//
// Redistribution and use in source and binary forms, with or without modification, are permitted provided that the
// following conditions are met:
//
// 1. Redistributions of source code must retain the above copyright notice, this list of conditions and the following
// disclaimer.
//
// 2. Redistributions in binary form must reproduce the above copyright notice, this list of conditions and the
// following disclaimer in the documentation and/or other materials provided with the distribution.
//
// 3. Neither the name of the copyright holder nor the names of its contributors may be used to endorse or promote
// products derived from this software without specific prior written permission.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS IS" AND ANY EXPRESS OR IMPLIED WARRANTIES,
// INCLUDING, BUT NOT LIMITED TO, THE IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE ARE
// DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT HOLDER OR CONTRIBUTORS BE LIABLE FOR ANY DIRECT, INDIRECT, INCIDENTAL,
// SPECIAL, EXEMPLARY, OR CONSEQUENTIAL DAMAGES (INCLUDING, BUT NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR
// SERVICES; LOSS OF USE, DATA, OR PROFITS; OR BUSINESS INTERRUPTION) HOWEVER CAUSED AND ON ANY THEORY OF LIABILITY,
// WHETHER IN CONTRACT, STRICT LIABILITY, OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE
// USE OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

use crate::{
    common::FixedHash,
    merkle::{
        common::{family_branch, find_peaks, is_left_sibling, node_count, node_index, peak_map_height},
        hash_nodes,
        interpret,
    },
};

/// Sink for proof nodes as an MMR emits them in verification order. A proof builder collects
/// them; a hard-proof verifier ignores the hash, takes the side, and folds its own stream.
pub trait ProofBuilder {
    /// Returns false to abort proof generation.
    fn append_node(&mut self, on_right: bool, hash: &FixedHash) -> bool;
}

/// The append-only Merkle mountain range view. Implementors supply element storage; appending,
/// root bagging and proof emission are derived entirely from the structure maths, so a storage
/// can be as thin as "nothing at all" (a verifier that replays proof structure).
pub trait Mmr {
    fn leaf_count(&self) -> u64;
    fn set_leaf_count(&mut self, count: u64);

    /// Loads the hash stored at the given node position. Verifier-side implementations with no
    /// storage may return anything; the emitted hashes are ignored there.
    fn load_element(&self, pos: u64) -> FixedHash;
    fn save_element(&mut self, pos: u64, hash: &FixedHash);

    fn node_count(&self) -> u64 {
        node_count(self.leaf_count())
    }

    /// Appends a leaf, merging peaks as mandated by the structure.
    fn append_leaf(&mut self, hash: &FixedHash) {
        let mut pos = self.node_count();
        let (peak_map, height) = peak_map_height(pos);
        debug_assert_eq!(height, 0);

        self.save_element(pos, hash);
        let mut current = *hash;
        let mut peak = 1;
        while (peak_map & peak) != 0 {
            let left_sibling = pos + 1 - 2 * peak;
            let left = self.load_element(left_sibling);
            current = hash_nodes(&left, &current);
            peak <<= 1;
            pos += 1;
            self.save_element(pos, &current);
        }

        self.set_leaf_count(self.leaf_count() + 1);
    }

    /// The root: peaks bagged right-to-left, so that every peak's proof is a pair-hash chain.
    fn root(&self) -> FixedHash {
        let peaks = find_peaks(self.node_count());
        let mut iter = peaks.iter().rev();
        let mut acc = match iter.next() {
            Some(pos) => self.load_element(*pos),
            None => return FixedHash::zero(),
        };
        for pos in iter {
            acc = hash_nodes(&self.load_element(*pos), &acc);
        }
        acc
    }

    /// Emits the proof for `leaf_index` in verification order: siblings up to the local peak,
    /// then the bagged right peaks as a single node, then each left peak nearest-first.
    fn get_proof(&self, builder: &mut dyn ProofBuilder, leaf_index: u64) -> bool {
        if leaf_index >= self.leaf_count() {
            return false;
        }
        let size = self.node_count();
        let pos = node_index(leaf_index);

        let branch = family_branch(pos, size);
        for (_, sibling) in &branch {
            let on_right = !is_left_sibling(*sibling);
            if !builder.append_node(on_right, &self.load_element(*sibling)) {
                return false;
            }
        }

        let local_peak = branch.last().map(|(parent, _)| *parent).unwrap_or(pos);
        let peaks = find_peaks(size);
        let j = match peaks.iter().position(|p| *p == local_peak) {
            Some(j) => j,
            None => return false,
        };

        if j + 1 < peaks.len() {
            let mut bag = self.load_element(peaks[peaks.len() - 1]);
            for p in peaks[j + 1..peaks.len() - 1].iter().rev() {
                bag = hash_nodes(&self.load_element(*p), &bag);
            }
            if !builder.append_node(true, &bag) {
                return false;
            }
        }

        for p in peaks[..j].iter().rev() {
            if !builder.append_node(false, &self.load_element(*p)) {
                return false;
            }
        }

        true
    }
}

/// Folds a hard proof against the known tree shape: sides come from the structure, hashes from
/// the supplied stream.
pub struct HardProofFolder<'a> {
    hashes: std::slice::Iter<'a, FixedHash>,
    pub running: FixedHash,
    consumed: usize,
    pub ok: bool,
}

impl<'a> HardProofFolder<'a> {
    pub fn new(leaf_hash: FixedHash, hashes: &'a [FixedHash]) -> Self {
        Self {
            hashes: hashes.iter(),
            running: leaf_hash,
            consumed: 0,
            ok: true,
        }
    }

    /// Folds one more hash from the stream, e.g. the live-state root a definition combines in.
    pub fn fold_once(&mut self, on_right: bool) -> bool {
        match self.hashes.next() {
            Some(hash) => {
                interpret(&mut self.running, hash, on_right);
                self.consumed += 1;
                true
            },
            None => {
                self.ok = false;
                false
            },
        }
    }

    pub fn consumed(&self) -> usize {
        self.consumed
    }
}

impl ProofBuilder for HardProofFolder<'_> {
    fn append_node(&mut self, on_right: bool, _hash: &FixedHash) -> bool {
        self.fold_once(on_right)
    }
}
