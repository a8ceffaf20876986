// Copyright 2024 The Glimmer Project
// SPDX-License-Identifier: BSD-3-Clause

use blake2::Blake2b;
use digest::{consts::U32, Digest};
use tari_crypto::hashing::DomainSeparation;

use crate::{
    common::FixedHash,
    consensus::{ConsensusHasher, ConsensusHashing, OracleHashDomain},
};

/// Deterministic transcript hash used as a Fiat–Shamir random beacon.
///
/// The oracle is a sponge: any number of items may be absorbed, a 32-byte value squeezed out, and
/// absorption continued. Both sides of a protocol replaying the same absorption sequence draw the
/// same values, so the oracle converts an interactive sampling protocol into a non-interactive one.
#[derive(Clone)]
pub struct Oracle {
    digest: Blake2b<U32>,
    /// Number of squeezes so far. Folded into every squeeze so that consecutive draws differ even
    /// without intervening absorption.
    counter: u64,
}

impl Oracle {
    pub fn new() -> Self {
        let mut digest = Blake2b::<U32>::default();
        OracleHashDomain::add_domain_separation_tag(&mut digest, "transcript");
        Self { digest, counter: 0 }
    }

    /// Absorbs one item into the transcript.
    pub fn absorb<T: ConsensusHashing + ?Sized>(&mut self, data: &T) -> &mut Self {
        let mut hasher = ConsensusHasher::default_for_transcript(self.digest.clone());
        hasher.update(data);
        self.digest = hasher.into_digest();
        self
    }

    /// Squeezes the next 32-byte value out of the transcript.
    pub fn squeeze(&mut self) -> FixedHash {
        let mut fork = self.digest.clone();
        fork.update(self.counter.to_le_bytes());
        self.counter += 1;
        let out: [u8; 32] = fork.finalize().into();
        out.into()
    }
}

impl Default for Oracle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replay_is_deterministic() {
        let mut a = Oracle::new();
        let mut b = Oracle::new();
        a.absorb(&1u64).absorb(&2u64);
        b.absorb(&1u64).absorb(&2u64);
        assert_eq!(a.squeeze(), b.squeeze());
        assert_eq!(a.squeeze(), b.squeeze());
    }

    #[test]
    fn consecutive_draws_differ() {
        let mut o = Oracle::new();
        o.absorb(&7u32);
        assert_ne!(o.squeeze(), o.squeeze());
    }

    #[test]
    fn absorption_changes_the_stream() {
        let mut a = Oracle::new();
        let mut b = Oracle::new();
        a.absorb(&1u64);
        b.absorb(&2u64);
        assert_ne!(a.squeeze(), b.squeeze());
    }
}
