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

use std::{
    cmp::Ordering,
    fmt::{Display, Error, Formatter},
};

use chrono::{DateTime, NaiveDateTime, Utc};
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use tari_utilities::epoch_time::EpochTime;

use crate::{
    common::{FixedHash, Height},
    consensus::{BlocksHashDomain, ConsensusRules, DomainSeparatedConsensusHasher},
    merkle::{self, HardProof, MultiProof, MultiProofVerifier, Proof},
    proof_of_work::{get_median_timestamp, ProofOfWork},
    transactions::{
        transaction_components::{Input, TxKernel},
        HeightRange,
    },
};

/// A block header: the full system state a chain commits to at one height. The `definition` root
/// commits to both the historical header MMR and the live UTXO set; `chain_work` is the
/// cumulative sum of raw difficulties since genesis.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlockHeader {
    pub height: Height,
    pub prev_hash: FixedHash,
    pub chain_work: U256,
    pub definition: FixedHash,
    pub timestamp: EpochTime,
    pub pow: ProofOfWork,
}

/// The compact identity of a header.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderId {
    pub height: Height,
    pub hash: FixedHash,
}

impl PartialOrd for HeaderId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeaderId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.height.cmp(&other.height).then(self.hash.cmp(&other.hash))
    }
}

/// The part of a header sequence that consecutive headers derive from each other: the first
/// height, its predecessor hash and the chain work entering the sequence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequencePrefix {
    pub height: Height,
    pub prev_hash: FixedHash,
    pub chain_work: U256,
}

/// The per-block remainder of a header in a sequence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceElement {
    pub definition: FixedHash,
    pub timestamp: EpochTime,
    pub pow: ProofOfWork,
}

impl BlockHeader {
    /// The solver challenge: everything except the solution itself.
    pub fn hash_for_pow(&self) -> FixedHash {
        self.hash_internal(false)
    }

    /// The full header hash, including the PoW solution and nonce.
    pub fn hash(&self) -> FixedHash {
        self.hash_internal(true)
    }

    fn hash_internal(&self, total: bool) -> FixedHash {
        let mut hp = DomainSeparatedConsensusHasher::<BlocksHashDomain>::new("header");
        hp.update(&self.height);
        hp.update(&self.prev_hash);
        hp.update(&self.chain_work);
        hp.update(&self.definition);
        hp.update(&self.timestamp);
        hp.update(&self.pow.difficulty.as_packed());

        if total {
            hp.update(self.pow.solution.as_slice());
            hp.update(&self.pow.nonce);
        }

        hp.finalize()
    }

    pub fn id(&self) -> HeaderId {
        HeaderId {
            height: self.height,
            hash: self.hash(),
        }
    }

    pub fn is_sane(&self, rules: &ConsensusRules) -> bool {
        if self.height < rules.height_genesis {
            return false;
        }
        if self.height == rules.height_genesis && !self.prev_hash.is_zero() {
            return false;
        }
        true
    }

    pub fn is_valid_pow(&self, rules: &ConsensusRules) -> bool {
        self.pow.is_valid(&self.hash_for_pow(), rules)
    }

    /// Runs the solver against this header's challenge. The callback is polled for cancellation.
    pub fn generate_pow(&mut self, rules: &ConsensusRules, cancel: &dyn Fn() -> bool) -> bool {
        let challenge = self.hash_for_pow();
        self.pow.solve(&challenge, rules, cancel)
    }

    /// Advances the header in place to the next position in a sequence: the previous hash becomes
    /// this header's hash and the height increments. The remaining fields are the next block's to
    /// fill in.
    pub fn next_prefix(&mut self) {
        self.prev_hash = self.hash();
        self.height += 1;
    }

    pub fn split_sequence(&self) -> (SequencePrefix, SequenceElement) {
        (
            SequencePrefix {
                height: self.height,
                prev_hash: self.prev_hash,
                chain_work: self.chain_work,
            },
            SequenceElement {
                definition: self.definition,
                timestamp: self.timestamp,
                pow: self.pow.clone(),
            },
        )
    }

    pub fn from_sequence(prefix: &SequencePrefix, element: &SequenceElement) -> Self {
        Self {
            height: prefix.height,
            prev_hash: prefix.prev_hash,
            chain_work: prefix.chain_work,
            definition: element.definition,
            timestamp: element.timestamp,
            pow: element.pow.clone(),
        }
    }

    /// Timestamp rules: strictly after the median of the trailing window, and not further in the
    /// future than the tolerated clock skew.
    pub fn verify_timestamp(&self, prev_timestamps: &[EpochTime], rules: &ConsensusRules, now: EpochTime) -> bool {
        if self.timestamp.as_u64() > now.as_u64().saturating_add(rules.timestamp_ahead_threshold_s) {
            return false;
        }
        let window = prev_timestamps
            .iter()
            .rev()
            .take(rules.window_for_median as usize)
            .copied()
            .collect::<Vec<_>>();
        match get_median_timestamp(window) {
            Some(median) => self.timestamp > median,
            None => true,
        }
    }

    /// Verifies a hard proof that the state identified by `id` is an ancestor committed into this
    /// header's definition. The proof stream holds the MMR path followed by the live-state root.
    pub fn verify_state_proof(&self, id: &HeaderId, proof: &HardProof, rules: &ConsensusRules) -> bool {
        if id.height < rules.height_genesis || id.height >= self.height {
            return false;
        }

        let leaf_count = self.height - rules.height_genesis;
        let wrapped = MultiProof { hashes: proof.clone() };
        let mut verifier = MultiProofVerifier::new(&wrapped, leaf_count);
        let Some(history_root) = verifier.process(id.height - rules.height_genesis, id.hash) else {
            return false;
        };

        // One more hash must remain: the live-state root, folded in on the right.
        if verifier.consumed() + 1 != proof.len() {
            return false;
        }
        let mut definition = history_root;
        merkle::interpret(&mut definition, &proof[verifier.consumed()], true);

        definition == self.definition
    }

    /// Verifies a kernel's inclusion under this header's definition. The kernel subtree sits on
    /// the far left, so the last two proof steps must both present their sibling on the left.
    pub fn verify_kernel_proof(&self, kernel: &TxKernel, proof: &Proof) -> bool {
        let n = proof.len();
        if n < 2 || proof[n - 1].on_right || proof[n - 2].on_right {
            return false;
        }
        let Some(id) = kernel.id(None) else { return false };

        let mut hv = id;
        merkle::interpret_proof(&mut hv, proof);
        hv == self.definition
    }

    /// Verifies an unspent output's inclusion under this header's definition. The live UTXO
    /// subtree hangs right of the history root: the last step presents its sibling on the left,
    /// the one before on the right.
    pub fn verify_utxo_proof(&self, input: &Input, count: u64, proof: &Proof) -> bool {
        let n = proof.len();
        if n < 2 || proof[n - 1].on_right || !proof[n - 2].on_right {
            return false;
        }

        let mut hv = utxo_leaf_hash(input, count);
        merkle::interpret_proof(&mut hv, proof);
        hv == self.definition
    }
}

/// The live-set leaf for a UTXO: its identity plus the number of identical instances.
pub fn utxo_leaf_hash(input: &Input, count: u64) -> FixedHash {
    DomainSeparatedConsensusHasher::<BlocksHashDomain>::new("utxo_leaf")
        .chain(&input.commitment)
        .chain(&input.maturity)
        .chain(&count)
        .finalize()
}

impl PartialEq for BlockHeader {
    fn eq(&self, other: &Self) -> bool {
        self.hash() == other.hash()
    }
}

impl Eq for BlockHeader {}

impl Default for BlockHeader {
    fn default() -> Self {
        Self {
            height: 1,
            prev_hash: FixedHash::zero(),
            chain_work: U256::zero(),
            definition: FixedHash::zero(),
            timestamp: EpochTime::from(0),
            pow: ProofOfWork::default(),
        }
    }
}

impl BlockHeader {
    pub fn to_chrono_datetime(&self) -> DateTime<Utc> {
        let dt = NaiveDateTime::from_timestamp_opt(self.timestamp.as_u64().min(i64::MAX as u64) as i64, 0)
            .unwrap_or(NaiveDateTime::MAX);
        DateTime::from_naive_utc_and_offset(dt, Utc)
    }
}

impl Display for BlockHeader {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result<(), Error> {
        writeln!(
            fmt,
            "Height: {}\nPrevious hash: {}\nTimestamp: {}\nChain work: {}\nDefinition: {}",
            self.height,
            self.prev_hash,
            self.to_chrono_datetime().to_rfc2822(),
            self.chain_work,
            self.definition,
        )
    }
}

/// Narrows a header-derived height window; blocks validate their body against `[height, height]`.
pub fn block_height_range(header: &BlockHeader) -> HeightRange {
    HeightRange::new(header.height, header.height)
}
