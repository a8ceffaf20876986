// Copyright 2024 The Glimmer Project
// SPDX-License-Identifier: BSD-3-Clause

use serde::{Deserialize, Serialize};

use crate::{
    common::FixedHash,
    merkle::{
        mmr::{HardProofFolder, Mmr, ProofBuilder},
        HardProof,
    },
};

/// Hard proofs for several leaves of one MMR, concatenated in query order into a single hash
/// stream. The verifier replays the same queries against the same tree shape and consumes the
/// stream with a cursor, which is what makes a proof croppable to a prefix.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiProof {
    pub hashes: HardProof,
}

/// Collects emitted proof nodes into a flat hash stream.
pub struct CollectProof<'a> {
    hashes: &'a mut Vec<FixedHash>,
}

impl<'a> CollectProof<'a> {
    pub fn new(hashes: &'a mut Vec<FixedHash>) -> Self {
        Self { hashes }
    }
}

impl ProofBuilder for CollectProof<'_> {
    fn append_node(&mut self, _on_right: bool, hash: &FixedHash) -> bool {
        self.hashes.push(*hash);
        true
    }
}

/// A shape-only MMR view: the verifier knows the leaf count and nothing else.
struct VerifierView {
    leaf_count: u64,
}

impl Mmr for VerifierView {
    fn leaf_count(&self) -> u64 {
        self.leaf_count
    }

    fn set_leaf_count(&mut self, count: u64) {
        self.leaf_count = count;
    }

    fn load_element(&self, _pos: u64) -> FixedHash {
        // Never used for anything: the folder takes its hashes from the proof stream.
        FixedHash::zero()
    }

    fn save_element(&mut self, _pos: u64, _hash: &FixedHash) {}
}

/// Replays a [MultiProof] query by query.
pub struct MultiProofVerifier<'a> {
    hashes: &'a [FixedHash],
    cursor: usize,
    leaf_count: u64,
}

impl<'a> MultiProofVerifier<'a> {
    pub fn new(proof: &'a MultiProof, leaf_count: u64) -> Self {
        Self {
            hashes: &proof.hashes,
            cursor: 0,
            leaf_count,
        }
    }

    /// Folds `leaf_hash` up from `leaf_index`, consuming exactly the hashes that query needs.
    /// Returns the computed root, or `None` when the stream runs dry or the index is out of
    /// shape.
    pub fn process(&mut self, leaf_index: u64, leaf_hash: FixedHash) -> Option<FixedHash> {
        let view = VerifierView {
            leaf_count: self.leaf_count,
        };
        let mut folder = HardProofFolder::new(leaf_hash, &self.hashes[self.cursor..]);
        if !view.get_proof(&mut folder, leaf_index) || !folder.ok {
            return None;
        }
        self.cursor += folder.consumed();
        Some(folder.running)
    }

    /// Number of stream hashes consumed so far; a valid prefix for [MultiProof] cropping.
    pub fn consumed(&self) -> usize {
        self.cursor
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::merkle::MemMmr;

    fn leaf(i: u64) -> FixedHash {
        let mut bytes = [0u8; 32];
        bytes[0] = 0xaa;
        bytes[24..].copy_from_slice(&i.to_be_bytes());
        bytes.into()
    }

    fn build(n: u64) -> MemMmr {
        let mut mmr = MemMmr::new();
        for i in 0..n {
            mmr.append_leaf(&leaf(i));
        }
        mmr
    }

    #[test]
    fn multi_query_round_trip() {
        let mmr = build(11);
        let root = mmr.root();

        let queries = [9u64, 5, 2, 0];
        let mut proof = MultiProof::default();
        for q in queries {
            assert!(mmr.get_proof(&mut CollectProof::new(&mut proof.hashes), q));
        }

        let mut verifier = MultiProofVerifier::new(&proof, 11);
        for q in queries {
            assert_eq!(verifier.process(q, leaf(q)), Some(root));
        }
        assert_eq!(verifier.consumed(), proof.hashes.len());
    }

    #[test]
    fn truncated_stream_fails() {
        let mmr = build(7);
        let mut proof = MultiProof::default();
        assert!(mmr.get_proof(&mut CollectProof::new(&mut proof.hashes), 3));
        proof.hashes.pop();

        let mut verifier = MultiProofVerifier::new(&proof, 7);
        assert!(verifier.process(3, leaf(3)).is_none());
    }

    #[test]
    fn prefix_consumption_supports_cropping() {
        let mmr = build(9);
        let root = mmr.root();

        let mut proof = MultiProof::default();
        for q in [8u64, 4] {
            assert!(mmr.get_proof(&mut CollectProof::new(&mut proof.hashes), q));
        }

        // Verify only the first query, then crop to what was consumed.
        let mut verifier = MultiProofVerifier::new(&proof, 9);
        assert_eq!(verifier.process(8, leaf(8)), Some(root));
        let cut = verifier.consumed();
        assert!(cut < proof.hashes.len());
        proof.hashes.truncate(cut);

        let mut verifier = MultiProofVerifier::new(&proof, 9);
        assert_eq!(verifier.process(8, leaf(8)), Some(root));
    }
}
