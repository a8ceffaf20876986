// Copyright 2024 The Glimmer Project
// SPDX-License-Identifier: BSD-3-Clause

//! Merkle proofs over the chain's history.
//!
//! Two proof flavours exist. A [Proof] carries a side bit with every sibling hash. A [HardProof]
//! carries only the hashes: the verifier derives each side from the known tree shape, so an
//! attacker cannot relocate a leaf to a different position under the same root.

mod common;
mod mem_mmr;
mod mmr;
mod multi_proof;

use serde::{Deserialize, Serialize};

pub use common::{bintree_height, family_branch, find_peaks, is_left_sibling, node_count, node_index, peak_map_height};
pub use mem_mmr::MemMmr;
pub use mmr::{HardProofFolder, Mmr, ProofBuilder};
pub use multi_proof::{CollectProof, MultiProof, MultiProofVerifier};

use crate::{
    common::FixedHash,
    consensus::{DomainSeparatedConsensusHasher, MerkleHashDomain},
};

/// One step of a Merkle proof: the sibling hash and the side it goes on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// True when the provided hash lands on the right of the running hash.
    pub on_right: bool,
    pub hash: FixedHash,
}

/// A proof with explicit side bits.
pub type Proof = Vec<Node>;

/// A proof whose side bits are implied by the tree position.
pub type HardProof = Vec<FixedHash>;

/// The pair hash every interior node is built from.
pub fn hash_nodes(left: &FixedHash, right: &FixedHash) -> FixedHash {
    DomainSeparatedConsensusHasher::<MerkleHashDomain>::new("node")
        .chain(left)
        .chain(right)
        .finalize()
}

/// Folds one sibling into the running hash, on the given side.
pub fn interpret(running: &mut FixedHash, sibling: &FixedHash, on_right: bool) {
    *running = if on_right {
        hash_nodes(running, sibling)
    } else {
        hash_nodes(sibling, running)
    };
}

/// Folds a whole proof into the running hash.
pub fn interpret_proof(running: &mut FixedHash, proof: &[Node]) {
    for node in proof {
        interpret(running, &node.hash, node.on_right);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn side_bits_matter() {
        let a = FixedHash::from([1u8; 32]);
        let b = FixedHash::from([2u8; 32]);

        let mut left = a;
        interpret(&mut left, &b, true);
        let mut right = a;
        interpret(&mut right, &b, false);

        assert_eq!(left, hash_nodes(&a, &b));
        assert_eq!(right, hash_nodes(&b, &a));
        assert_ne!(left, right);
    }

    #[test]
    fn proof_folding_is_sequential() {
        let a = FixedHash::from([1u8; 32]);
        let b = FixedHash::from([2u8; 32]);
        let c = FixedHash::from([3u8; 32]);

        let mut hv = a;
        interpret_proof(&mut hv, &[
            Node { on_right: true, hash: b },
            Node { on_right: false, hash: c },
        ]);
        assert_eq!(hv, hash_nodes(&c, &hash_nodes(&a, &b)));
    }
}
