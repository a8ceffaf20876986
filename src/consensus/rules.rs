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

use tari_crypto::commitment::HomomorphicCommitmentFactory;

use crate::{
    common::{FixedHash, Height},
    consensus::{ConsensusHashing, DomainSeparatedConsensusHasher, RulesHashDomain},
    crypto::{CommitmentFactory, PrivateKey},
    proof_of_work::{Difficulty, EQUIHASH_K, EQUIHASH_N, POW_NONCE_BITS},
};

/// The version tag folded into the rules checksum. Incremented whenever anything in the protocol
/// changes shape without a corresponding rule constant changing value.
const PROTOCOL_VERSION: u32 = 4;

/// The network parameters every node must agree on.
///
/// The struct is built once at startup, [ConsensusRules::update_checksum] is called, and the value
/// is treated as immutable from then on. Validators take a `&ConsensusRules` rather than reaching
/// for a process-wide singleton, which keeps rule sets isolated between tests. Two peers refuse to
/// exchange block data when their checksums differ.
#[derive(Clone, Debug)]
pub struct ConsensusRules {
    /// The height of the first block. Heights below this do not exist.
    pub height_genesis: Height,
    /// Atomic units per coin.
    pub coin: u64,
    /// The amount minted per block, in atomic units.
    pub coinbase_emission: u64,
    /// Blocks before a coinbase output may be spent.
    pub maturity_coinbase: Height,
    /// Blocks before a regular output may be spent.
    pub maturity_std: Height,
    /// Upper bound on a serialized block body.
    pub max_body_size: u64,
    /// Accept any proof of work. Test networks only.
    pub fake_pow: bool,
    /// Permit non-coinbase outputs with publicly visible values.
    pub allow_public_utxos: bool,
    /// Target seconds per block.
    pub desired_rate_s: u64,
    /// Blocks between difficulty reviews.
    pub difficulty_review_cycle: u32,
    /// Cap on the difficulty order change per review.
    pub max_difficulty_change: u32,
    /// Tolerated clock skew for headers from the future, in seconds.
    pub timestamp_ahead_threshold_s: u64,
    /// Number of trailing headers whose timestamp median gates a new header.
    pub window_for_median: u32,
    /// Difficulty of the first block.
    pub start_difficulty: Difficulty,
    /// Digest of every rule above, refreshed by [ConsensusRules::update_checksum].
    pub checksum: FixedHash,
}

impl Default for ConsensusRules {
    fn default() -> Self {
        let coin = 1_000_000;
        let mut rules = Self {
            height_genesis: 1,
            coin,
            coinbase_emission: coin * 80,
            maturity_coinbase: 60,
            maturity_std: 0,
            max_body_size: 0x0010_0000,
            fake_pow: false,
            allow_public_utxos: false,
            desired_rate_s: 60,
            difficulty_review_cycle: 1440,
            max_difficulty_change: 2,
            timestamp_ahead_threshold_s: 7200,
            window_for_median: 25,
            start_difficulty: Difficulty::from_packed(1 << Difficulty::MANTISSA_BITS),
            checksum: FixedHash::zero(),
        };
        rules.update_checksum();
        rules
    }
}

impl ConsensusRules {
    /// A rule set suitable for unit tests: proof of work is not checked and public outputs are
    /// allowed outside coinbases.
    pub fn testing() -> Self {
        let mut rules = Self {
            fake_pow: true,
            allow_public_utxos: true,
            ..Default::default()
        };
        rules.update_checksum();
        rules
    }

    /// Recomputes the rules checksum. Must be called after any rule changes; all parameters are
    /// absorbed, including ones currently hardcoded, in case later versions make them
    /// configurable.
    pub fn update_checksum(&mut self) {
        self.checksum = DomainSeparatedConsensusHasher::<RulesHashDomain>::new("checksum")
            .chain(&primitives_checksum())
            .chain(&self.height_genesis)
            .chain(&self.coin)
            .chain(&self.coinbase_emission)
            .chain(&self.maturity_coinbase)
            .chain(&self.maturity_std)
            .chain(&self.max_body_size)
            .chain(&self.fake_pow)
            .chain(&self.allow_public_utxos)
            .chain(&self.desired_rate_s)
            .chain(&self.difficulty_review_cycle)
            .chain(&self.max_difficulty_change)
            .chain(&self.timestamp_ahead_threshold_s)
            .chain(&self.window_for_median)
            .chain(&self.start_difficulty.as_packed())
            .chain(&EQUIHASH_K)
            .chain(&EQUIHASH_N)
            .chain(&POW_NONCE_BITS)
            .chain(&PROTOCOL_VERSION)
            .finalize();
    }

    /// Retargets `d` after one review cycle that ran from `cycle_begin_s` to `cycle_end_s`.
    pub fn adjust_difficulty(&self, d: &mut Difficulty, cycle_begin_s: u64, cycle_end_s: u64) {
        let dt_trg_s = self.desired_rate_s * u64::from(self.difficulty_review_cycle);

        // Evaluate carefully, the timestamps are attacker-influenced.
        let dt_s = cycle_end_s.saturating_sub(cycle_begin_s).min(u64::from(u32::MAX)) as u32;

        let dt_trg_s = dt_trg_s.min(u64::from(u32::MAX)) as u32;
        d.adjust(dt_s, dt_trg_s, self.max_difficulty_change);
    }
}

/// Checksum of the underlying cryptographic context: a commitment to fixed values captures the
/// generator points in use.
fn primitives_checksum() -> FixedHash {
    let factory = CommitmentFactory::default();
    let probe = factory.commit(&PrivateKey::from(1), &PrivateKey::from(1));
    DomainSeparatedConsensusHasher::<RulesHashDomain>::new("primitives")
        .chain(&probe)
        .finalize()
}

impl ConsensusHashing for Difficulty {
    fn consensus_hash_into(&self, hasher: &mut crate::consensus::ConsensusHasher) {
        self.as_packed().consensus_hash_into(hasher);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_tracks_rule_changes() {
        let rules = ConsensusRules::default();
        let mut modified = rules.clone();
        modified.coinbase_emission += 1;
        modified.update_checksum();
        assert_ne!(rules.checksum, modified.checksum);

        modified.coinbase_emission -= 1;
        modified.update_checksum();
        assert_eq!(rules.checksum, modified.checksum);
    }

    #[test]
    fn checksum_is_not_zero() {
        assert!(!ConsensusRules::default().checksum.is_zero());
    }

    #[test]
    fn retarget_against_slow_blocks_lowers_difficulty() {
        let rules = ConsensusRules::default();
        let mut d = Difficulty::from_packed(10 << Difficulty::MANTISSA_BITS);
        let before = d.unpack_raw();
        let dt = rules.desired_rate_s * u64::from(rules.difficulty_review_cycle);
        rules.adjust_difficulty(&mut d, 0, dt * 2);
        assert!(d.unpack_raw() < before);
    }
}
