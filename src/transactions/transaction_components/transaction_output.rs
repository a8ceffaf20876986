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
    fmt::{Display, Formatter},
};

use serde::{Deserialize, Serialize};
use tari_crypto::commitment::HomomorphicCommitmentFactory;
use tari_utilities::hex::Hex;

use crate::{
    common::{height_add, Height},
    consensus::ConsensusRules,
    crypto::{Commitment, CryptoFactories, Oracle, PrivateKey},
    transactions::{
        transaction_components::{cmp_commitments, BulletRangeProof, PublicValueProof, RangeProof, TransactionError},
        MicroGlim,
    },
};

/// A new UTXO. The committed value is attested by exactly one of the two range-proof forms;
/// coinbase outputs must use the public form so the minted amount is visible to validators.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub commitment: Commitment,
    pub maturity: Height,
    pub coinbase: bool,
    /// Extra blocks, on top of the standard maturity, before this output may be spent.
    pub incubation: Height,
    pub proof: RangeProof,
}

impl Output {
    /// Builds an output for `value` blinded by `spending_key`, with either a public or a
    /// confidential proof. The proof transcript binds the incubation period, so the field cannot
    /// be altered after creation.
    pub fn create(
        spending_key: &PrivateKey,
        value: MicroGlim,
        public: bool,
        incubation: Height,
        factories: &CryptoFactories,
    ) -> Result<Self, TransactionError> {
        let commitment = factories.commitment.commit_value(spending_key, value.as_u64());
        let proof = if public {
            let mut oracle = Self::proof_transcript(incubation);
            RangeProof::Public(PublicValueProof::create(spending_key, value, &commitment, &mut oracle)?)
        } else {
            RangeProof::Confidential(BulletRangeProof::create(spending_key, value, factories)?)
        };
        Ok(Self {
            commitment,
            maturity: 0,
            coinbase: false,
            incubation,
            proof,
        })
    }

    /// Builds the output minted by a block. Coinbase values are always public.
    pub fn new_coinbase(
        spending_key: &PrivateKey,
        value: MicroGlim,
        factories: &CryptoFactories,
    ) -> Result<Self, TransactionError> {
        let mut output = Self::create(spending_key, value, true, 0, factories)?;
        output.coinbase = true;
        Ok(output)
    }

    fn proof_transcript(incubation: Height) -> Oracle {
        let mut oracle = Oracle::new();
        oracle.absorb(&incubation);
        oracle
    }

    /// Runs the range proof and the public/coinbase structure rules.
    pub fn is_valid(&self, rules: &ConsensusRules, factories: &CryptoFactories) -> bool {
        match &self.proof {
            RangeProof::Confidential(proof) => {
                if self.coinbase {
                    // coinbase must have visible amount
                    return false;
                }
                proof.is_valid(&self.commitment, factories)
            },
            RangeProof::Public(proof) => {
                if !(rules.allow_public_utxos || self.coinbase) {
                    return false;
                }
                let mut oracle = Self::proof_transcript(self.incubation);
                proof.is_valid(&self.commitment, &mut oracle, factories)
            },
        }
    }

    pub fn is_coinbase(&self) -> bool {
        self.coinbase
    }

    /// The first height at which this output may be spent when created at height `h`: creation
    /// height plus the applicable maturity class plus incubation, saturating.
    pub fn min_maturity(&self, h: Height, rules: &ConsensusRules) -> Height {
        let maturity = if self.coinbase {
            rules.maturity_coinbase
        } else {
            rules.maturity_std
        };
        height_add(height_add(h, maturity), self.incubation)
    }
}

impl PartialOrd for Output {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Output {
    fn cmp(&self, other: &Self) -> Ordering {
        cmp_commitments(&self.commitment, &other.commitment)
            .then(self.maturity.cmp(&other.maturity))
            .then(self.coinbase.cmp(&other.coinbase))
            .then(self.incubation.cmp(&other.incubation))
            .then_with(|| self.proof.canonical_cmp(&other.proof))
    }
}

impl Display for Output {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            fmt,
            "{} [maturity {}{}]",
            self.commitment.to_hex(),
            self.maturity,
            if self.coinbase { ", coinbase" } else { "" }
        )
    }
}
