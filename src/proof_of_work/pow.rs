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

use std::fmt::{Display, Error, Formatter};

use serde::{Deserialize, Serialize};
use tari_utilities::hex::Hex;

use crate::{
    common::FixedHash,
    consensus::{BlocksHashDomain, ConsensusRules, DomainSeparatedConsensusHasher},
    proof_of_work::Difficulty,
};

/// Equihash parameters. These feed the rules checksum, so peers with different solvers never
/// exchange blocks.
pub const EQUIHASH_N: u32 = 150;
pub const EQUIHASH_K: u32 = 5;
pub const POW_NONCE_BITS: u32 = 64;

/// The byte length of an Equihash(150, 5) solution: `2^K` indices of `N/(K+1) + 1` bits each.
pub const SOLUTION_BYTES: usize = 104;

/// The proof-of-work summary carried by a block header: the packed difficulty target, the solver
/// nonce and the Equihash solution indices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofOfWork {
    pub difficulty: Difficulty,
    pub nonce: u64,
    pub solution: Vec<u8>,
}

impl ProofOfWork {
    /// The hash the difficulty target is measured against.
    fn solution_hash(&self, challenge: &FixedHash) -> FixedHash {
        DomainSeparatedConsensusHasher::<BlocksHashDomain>::new("pow_solution")
            .chain(challenge)
            .chain(&self.nonce)
            .chain(self.solution.as_slice())
            .finalize()
    }

    /// Checks the Equihash solution against `challenge` and the solution hash against the
    /// difficulty target. With `fake_pow` set in the rules everything passes; test networks only.
    pub fn is_valid(&self, challenge: &FixedHash, rules: &ConsensusRules) -> bool {
        if rules.fake_pow {
            return true;
        }

        if self.solution.len() != SOLUTION_BYTES {
            return false;
        }

        if equihash::is_valid_solution(
            EQUIHASH_N,
            EQUIHASH_K,
            challenge.as_slice(),
            &self.nonce.to_le_bytes(),
            &self.solution,
        )
        .is_err()
        {
            return false;
        }

        self.difficulty.is_target_reached(&self.solution_hash(challenge))
    }

    /// Searches for a nonce meeting the difficulty target. Only the fake-PoW mode is mined
    /// in-process; real solving is the solver's job, outside the consensus core. The callback is
    /// polled so a caller can abandon the search.
    pub fn solve(&mut self, challenge: &FixedHash, rules: &ConsensusRules, cancel: &dyn Fn() -> bool) -> bool {
        if !rules.fake_pow {
            return false;
        }

        self.solution = vec![0u8; SOLUTION_BYTES];
        loop {
            if self.difficulty.is_target_reached(&self.solution_hash(challenge)) {
                return true;
            }
            if cancel() {
                return false;
            }
            self.nonce = self.nonce.wrapping_add(1);
        }
    }
}

impl Display for ProofOfWork {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result<(), Error> {
        writeln!(fmt, "Difficulty: {}", self.difficulty)?;
        writeln!(fmt, "Nonce: {}", self.nonce)?;
        writeln!(fmt, "Solution: {}", self.solution.to_hex())?;
        Ok(())
    }
}
