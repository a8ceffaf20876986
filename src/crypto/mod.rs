// Copyright 2024 The Glimmer Project
// SPDX-License-Identifier: BSD-3-Clause

//! The primitives facade: concrete curve, commitment, signature and range-proof types used by the
//! consensus core, and the factories that construct and verify them.
//!
//! The core treats these as opaque; swapping the curve or proof system means redefining the type
//! aliases here and nothing else.

mod oracle;

use std::sync::Arc;

use blake2::Blake2b;
use digest::consts::U32;
use tari_crypto::{
    commitment::HomomorphicCommitmentFactory,
    ristretto::{
        bulletproofs_plus::BulletproofsPlusService,
        pedersen::{extended_commitment_factory::ExtendedPedersenCommitmentFactory, PedersenCommitment},
        RistrettoPublicKey,
        RistrettoSchnorr,
        RistrettoSecretKey,
    },
};

pub use oracle::Oracle;

/// The signature scheme for kernel and public-value proofs.
pub type Signature = RistrettoSchnorr;

/// Pedersen commitment `v·H + k·G` hiding an amount behind a blinding factor.
pub type Commitment = PedersenCommitment;
pub type CommitmentFactory = ExtendedPedersenCommitmentFactory;

pub type PublicKey = RistrettoPublicKey;
pub type PrivateKey = RistrettoSecretKey;
pub type BlindingFactor = RistrettoSecretKey;

/// The confidential range-proof system.
pub type RangeProofService = BulletproofsPlusService;

/// The digest backing every consensus hash.
pub type HashDigest = Blake2b<U32>;

/// Range proofs cover values in `[0, 2^64)`.
pub const RANGE_PROOF_BIT_LENGTH: usize = 64;
pub const RANGE_PROOF_AGGREGATION_FACTOR: usize = 1;

/// A convenience struct wrapping the cryptographic factories used throughout the core.
/// Uses Arcs internally so calling clone on this is cheap, no need to wrap this in an Arc.
pub struct CryptoFactories {
    pub commitment: Arc<CommitmentFactory>,
    pub range_proof: Arc<RangeProofService>,
}

impl Default for CryptoFactories {
    fn default() -> Self {
        CryptoFactories::new(RANGE_PROOF_BIT_LENGTH)
    }
}

impl CryptoFactories {
    /// Create a new set of crypto factories.
    ///
    /// ## Parameters
    ///
    /// * `max_proof_range`: Sets the maximum value in range proofs, where `max = 2^max_proof_range`
    pub fn new(max_proof_range: usize) -> Self {
        Self {
            commitment: Arc::new(CommitmentFactory::default()),
            range_proof: Arc::new(
                RangeProofService::init(
                    max_proof_range,
                    RANGE_PROOF_AGGREGATION_FACTOR,
                    CommitmentFactory::default(),
                )
                .expect("range proof service parameters are hardcoded and valid"),
            ),
        }
    }
}

impl Clone for CryptoFactories {
    fn clone(&self) -> Self {
        Self {
            commitment: self.commitment.clone(),
            range_proof: self.range_proof.clone(),
        }
    }
}

/// The commitment to zero with a zero blinding factor, i.e. the group identity.
pub fn zero_commitment() -> Commitment {
    Commitment::from_public_key(&PublicKey::default())
}

/// The additive inverse of a commitment.
pub fn negate_commitment(c: &Commitment) -> Commitment {
    &zero_commitment() - c
}

#[cfg(test)]
mod tests {
    use tari_crypto::keys::PublicKey as PublicKeyTrait;

    use super::*;

    #[test]
    fn negation_cancels() {
        let k = PrivateKey::from(1234u64);
        let c = CommitmentFactory::default().commit_value(&k, 5000);
        let sum = &c + &negate_commitment(&c);
        assert_eq!(sum, zero_commitment());
    }

    #[test]
    fn zero_commitment_is_identity() {
        let (_, p) = PublicKey::random_keypair(&mut rand::rngs::OsRng);
        let c = Commitment::from_public_key(&p);
        assert_eq!(&c + &zero_commitment(), c);
    }
}
