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

use std::marker::PhantomData;

use blake2::Blake2b;
use digest::{consts::U32, Digest};
use primitive_types::U256;
use tari_crypto::{hash_domain, hashing::DomainSeparation};
use tari_utilities::{epoch_time::EpochTime, ByteArray};

use crate::{
    common::FixedHash,
    crypto::{Commitment, PrivateKey, PublicKey, Signature},
};

hash_domain!(TransactionHashDomain, "com.glimmer.core.transactions", 0);
hash_domain!(BlocksHashDomain, "com.glimmer.core.blocks", 0);
hash_domain!(MerkleHashDomain, "com.glimmer.core.merkle", 0);
hash_domain!(OracleHashDomain, "com.glimmer.core.oracle", 0);
hash_domain!(RulesHashDomain, "com.glimmer.core.rules", 0);

/// Domain separated consensus hasher. Each hash used by a consensus rule is tagged with its own
/// domain and label so that a hash computed for one purpose can never be replayed for another.
pub struct DomainSeparatedConsensusHasher<M> {
    _m: PhantomData<M>,
}

impl<M: DomainSeparation> DomainSeparatedConsensusHasher<M> {
    #[allow(clippy::new_ret_no_self)]
    pub fn new(label: &'static str) -> ConsensusHasher {
        let mut digest = Blake2b::<U32>::default();
        M::add_domain_separation_tag(&mut digest, label);
        ConsensusHasher::from_digest(digest)
    }
}

/// Streams canonically encoded values into a digest. The encoding is fixed-width little-endian for
/// integers and raw bytes for curve points and hashes; variable-length byte strings are
/// length-prefixed so that adjacent fields cannot be reinterpreted across their boundary.
#[derive(Clone)]
pub struct ConsensusHasher {
    digest: Blake2b<U32>,
}

impl ConsensusHasher {
    fn from_digest(digest: Blake2b<U32>) -> Self {
        Self { digest }
    }

    /// Wraps a digest mid-stream. Used by the transcript oracle, which owns its digest state
    /// across absorb/squeeze cycles.
    pub(crate) fn default_for_transcript(digest: Blake2b<U32>) -> Self {
        Self { digest }
    }

    pub(crate) fn into_digest(self) -> Blake2b<U32> {
        self.digest
    }

    pub fn update<T: ConsensusHashing + ?Sized>(&mut self, data: &T) {
        data.consensus_hash_into(self);
    }

    pub fn chain<T: ConsensusHashing + ?Sized>(mut self, data: &T) -> Self {
        self.update(data);
        self
    }

    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.digest.update(bytes);
    }

    pub fn finalize(self) -> FixedHash {
        let out: [u8; 32] = self.digest.finalize().into();
        out.into()
    }
}

/// Canonical absorption of a value into a [ConsensusHasher].
pub trait ConsensusHashing {
    fn consensus_hash_into(&self, hasher: &mut ConsensusHasher);
}

impl ConsensusHashing for bool {
    fn consensus_hash_into(&self, hasher: &mut ConsensusHasher) {
        hasher.write_raw(&[u8::from(*self)]);
    }
}

macro_rules! impl_consensus_hashing_for_int {
    ($($ty:ty),*) => {
        $(impl ConsensusHashing for $ty {
            fn consensus_hash_into(&self, hasher: &mut ConsensusHasher) {
                hasher.write_raw(&self.to_le_bytes());
            }
        })*
    };
}

impl_consensus_hashing_for_int!(u8, u16, u32, u64);

impl ConsensusHashing for [u8] {
    fn consensus_hash_into(&self, hasher: &mut ConsensusHasher) {
        (self.len() as u64).consensus_hash_into(hasher);
        hasher.write_raw(self);
    }
}

impl ConsensusHashing for FixedHash {
    fn consensus_hash_into(&self, hasher: &mut ConsensusHasher) {
        hasher.write_raw(self.as_slice());
    }
}

impl ConsensusHashing for U256 {
    fn consensus_hash_into(&self, hasher: &mut ConsensusHasher) {
        let mut bytes = [0u8; 32];
        self.to_big_endian(&mut bytes);
        hasher.write_raw(&bytes);
    }
}

impl ConsensusHashing for EpochTime {
    fn consensus_hash_into(&self, hasher: &mut ConsensusHasher) {
        self.as_u64().consensus_hash_into(hasher);
    }
}

impl ConsensusHashing for Commitment {
    fn consensus_hash_into(&self, hasher: &mut ConsensusHasher) {
        hasher.write_raw(self.as_bytes());
    }
}

impl ConsensusHashing for PublicKey {
    fn consensus_hash_into(&self, hasher: &mut ConsensusHasher) {
        hasher.write_raw(self.as_bytes());
    }
}

impl ConsensusHashing for PrivateKey {
    fn consensus_hash_into(&self, hasher: &mut ConsensusHasher) {
        hasher.write_raw(self.as_bytes());
    }
}

impl ConsensusHashing for Signature {
    fn consensus_hash_into(&self, hasher: &mut ConsensusHasher) {
        hasher.write_raw(self.get_public_nonce().as_bytes());
        hasher.write_raw(self.get_signature().as_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinct_labels_yield_distinct_hashes() {
        let a = DomainSeparatedConsensusHasher::<TransactionHashDomain>::new("kernel")
            .chain(&42u64)
            .finalize();
        let b = DomainSeparatedConsensusHasher::<TransactionHashDomain>::new("kernel_id")
            .chain(&42u64)
            .finalize();
        assert_ne!(a, b);
    }

    #[test]
    fn distinct_domains_yield_distinct_hashes() {
        let a = DomainSeparatedConsensusHasher::<TransactionHashDomain>::new("x")
            .chain(&42u64)
            .finalize();
        let b = DomainSeparatedConsensusHasher::<BlocksHashDomain>::new("x")
            .chain(&42u64)
            .finalize();
        assert_ne!(a, b);
    }

    #[test]
    fn hashing_is_not_the_bare_digest() {
        let tagged = DomainSeparatedConsensusHasher::<MerkleHashDomain>::new("node").finalize();
        let bare: [u8; 32] = Blake2b::<U32>::default().finalize().into();
        assert_ne!(tagged.as_slice(), &bare);
    }
}
