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

use std::cmp::Ordering;

use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use tari_crypto::{
    commitment::HomomorphicCommitmentFactory,
    keys::SecretKey,
    range_proof::RangeProofService as RangeProofServiceTrait,
};
use tari_utilities::{hex::Hex, ByteArray};

use crate::{
    crypto::{Commitment, CryptoFactories, Oracle, PrivateKey, Signature},
    transactions::{transaction_components::TransactionError, MicroGlim},
};

/// The proof attached to an output that its committed value is well-formed. Exactly one of the
/// two forms is present, enforced structurally: a publicly visible value carries a signature
/// proving knowledge of the blinding factor, while a hidden value carries a bulletproof.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RangeProof {
    Public(PublicValueProof),
    Confidential(BulletRangeProof),
}

impl RangeProof {
    pub fn is_public(&self) -> bool {
        matches!(self, RangeProof::Public(_))
    }

    /// The publicly visible value, when there is one.
    pub fn public_value(&self) -> Option<MicroGlim> {
        match self {
            RangeProof::Public(p) => Some(p.value),
            RangeProof::Confidential(_) => None,
        }
    }

    fn ordinal(&self) -> u8 {
        match self {
            RangeProof::Public(_) => 0,
            RangeProof::Confidential(_) => 1,
        }
    }

    /// Canonical ordering: public proofs sort before confidential ones, then by contents.
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (RangeProof::Public(a), RangeProof::Public(b)) => a.canonical_cmp(b),
            (RangeProof::Confidential(a), RangeProof::Confidential(b)) => a.0.cmp(&b.0),
            _ => self.ordinal().cmp(&other.ordinal()),
        }
    }
}

/// Proof form for an output whose value is public: the value itself plus a signature under the
/// blinding component `commitment − value·H`, over a challenge drawn from the given transcript.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicValueProof {
    pub value: MicroGlim,
    pub signature: Signature,
}

impl PublicValueProof {
    fn challenge(value: MicroGlim, commitment: &Commitment, oracle: &mut Oracle) -> Vec<u8> {
        oracle.absorb(&value.as_u64()).absorb(commitment);
        oracle.squeeze().to_vec()
    }

    pub fn create(
        blinding: &PrivateKey,
        value: MicroGlim,
        commitment: &Commitment,
        oracle: &mut Oracle,
    ) -> Result<Self, TransactionError> {
        let e = Self::challenge(value, commitment, oracle);
        let nonce = PrivateKey::random(&mut OsRng);
        let signature = Signature::sign_raw(blinding, nonce, &e)?;
        Ok(Self { value, signature })
    }

    pub fn is_valid(&self, commitment: &Commitment, oracle: &mut Oracle, factories: &CryptoFactories) -> bool {
        // Strip the value component; what remains is the blinding key the signature must verify
        // under.
        let value_part = factories
            .commitment
            .commit_value(&PrivateKey::default(), self.value.as_u64());
        let blinding_part = commitment - &value_part;
        let e = Self::challenge(self.value, commitment, oracle);
        self.signature.verify_challenge(blinding_part.as_public_key(), &e)
    }

    fn canonical_cmp(&self, other: &Self) -> Ordering {
        self.value
            .cmp(&other.value)
            .then_with(|| {
                self.signature
                    .get_public_nonce()
                    .as_bytes()
                    .cmp(other.signature.get_public_nonce().as_bytes())
            })
            .then_with(|| {
                self.signature
                    .get_signature()
                    .as_bytes()
                    .cmp(other.signature.get_signature().as_bytes())
            })
    }
}

/// An opaque bulletproof that the committed value lies in `[0, 2^64)`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulletRangeProof(pub Vec<u8>);

impl BulletRangeProof {
    pub fn create(
        blinding: &PrivateKey,
        value: MicroGlim,
        factories: &CryptoFactories,
    ) -> Result<Self, TransactionError> {
        let proof = factories.range_proof.construct_proof(blinding, value.as_u64())?;
        Ok(Self(proof))
    }

    pub fn is_valid(&self, commitment: &Commitment, factories: &CryptoFactories) -> bool {
        factories.range_proof.verify(&self.0, commitment)
    }

    pub fn to_hex(&self) -> String {
        self.0.to_hex()
    }
}
