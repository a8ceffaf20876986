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

//! The succinct chain-work proof a light client authenticates a tip with.
//!
//! Every header commits (through its definition root) to the Merkle mountain range of all
//! inherited headers, and every header's difficulty and cumulative chain work are bound into its
//! hash. The work axis is therefore a Merkle-committed sequence of contiguous work ranges up to
//! the tip. A verifier draws random points on that axis from a transcript seeded with the tip
//! hash; the prover presents, for each point, the header whose range covers it plus an MMR proof
//! of its inclusion.
//!
//! Sampling runs from the tip downward: each step takes the next 1/128 slice below the remaining
//! suffix and draws a point inside it. Downward sampling is what makes a long proof croppable to
//! a shorter suffix without rebuilding. Against an attacker holding under 2/3 of the honest
//! power, roughly 128 samples per suffix push the forgery probability per transcript below
//! `(2/3)^128`; remining the tip buys the attacker fresh transcripts, which the margin over the
//! target threshold absorbs.
//!
//! Consecutively sampled headers at adjacent heights need no MMR proof: the later header's
//! `prev_hash` already pins the earlier one.

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::{
    blocks::BlockHeader,
    common::{FixedHash, Height},
    consensus::ConsensusRules,
    crypto::Oracle,
    merkle::{self, CollectProof, MultiProof, MultiProofVerifier, ProofBuilder},
};

/// Draws work-axis points from the transcript, high to low.
pub struct Sampler {
    oracle: Oracle,
    pub begin: U256,
    pub end: U256,
    pub lower_bound: U256,
}

impl Sampler {
    pub fn new(tip: &BlockHeader) -> Self {
        let mut oracle = Oracle::new();
        oracle.absorb(&tip.hash());

        Self {
            oracle,
            begin: tip.pow.difficulty.subtracted_from(&tip.chain_work),
            end: tip.chain_work,
            lower_bound: U256::zero(),
        }
    }

    /// One 1/128 slice of the remaining range, never zero.
    fn take_fraction(v: U256) -> U256 {
        let f = v >> 7;
        if f.is_zero() {
            U256::one()
        } else {
            f
        }
    }

    /// An unbiased draw from `[0, threshold)`: mask the draw down to the threshold's bit length
    /// and accept/reject. `None` iff the threshold is zero.
    fn uniform_random(&mut self, threshold: &U256) -> Option<U256> {
        let bits = threshold.bits();
        if bits == 0 {
            return None;
        }
        let n_order = bits - 1;
        let n_offs = 31 - (n_order >> 3);
        let mask = ((2u16 << (n_order & 7)) - 1) as u8;

        let mut threshold_bytes = [0u8; 32];
        threshold.to_big_endian(&mut threshold_bytes);

        loop {
            let draw = self.oracle.squeeze();
            let mut bytes: [u8; 32] = *draw;
            for b in bytes[..n_offs].iter_mut() {
                *b = 0;
            }
            bytes[n_offs] &= mask;

            if bytes[n_offs..] < threshold_bytes[n_offs..] {
                return Some(U256::from_big_endian(&bytes));
            }
        }
    }

    /// Draws the next sample below the current window, or `None` when the axis below the lower
    /// bound is exhausted. Arithmetic wraps; a wrapped sample lands outside the window and ends
    /// the run, so the wrap is harmless.
    pub fn sample_point(&mut self) -> Option<U256> {
        let range = Self::take_fraction(self.end.overflowing_sub(self.begin).0);

        let all_covered = range >= self.begin;

        let rand = self
            .uniform_random(&range)
            .expect("range is never zero after take_fraction");

        let out = self.begin.overflowing_add(rand).0.overflowing_sub(range).0;

        if out < self.lower_bound || out >= self.begin {
            return None;
        }

        if all_covered {
            self.begin = U256::zero();
        } else {
            self.begin = self.begin.overflowing_sub(range).0;
        }

        Some(out)
    }
}

/// What the prover samples from: a chain database that can look up the header covering a point
/// on the work axis and emit MMR proofs against the tip's history tree.
pub trait ChainWorkSource {
    /// The header whose `[chain_work − difficulty, chain_work)` range contains `work`.
    fn state_at(&self, work: &U256) -> Option<BlockHeader>;

    /// Emits the history-MMR proof for the header at `height`, against the tree the tip's
    /// definition commits to.
    fn history_proof(&self, builder: &mut dyn ProofBuilder, height: Height) -> bool;
}

/// The proof itself: the sampled headers (tip first, strictly descending), the concatenated MMR
/// hash stream for the non-adjacent jumps, the work bound the proof stops at, and the live-state
/// root the history root combines with into the tip definition.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ChainWorkProof {
    pub states: Vec<BlockHeader>,
    pub proof: MultiProof,
    pub lower_bound: U256,
    pub root_live: FixedHash,
}

impl ChainWorkProof {
    /// Builds a proof for `tip` down to `lower_bound`. Fails only if the source cannot serve a
    /// sampled point.
    pub fn create(
        src: &dyn ChainWorkSource,
        tip: BlockHeader,
        lower_bound: U256,
        root_live: FixedHash,
        rules: &ConsensusRules,
    ) -> Option<Self> {
        let mut out = Self {
            states: Vec::new(),
            proof: MultiProof::default(),
            lower_bound,
            root_live,
        };

        let mut samp = Sampler::new(&tip);
        samp.lower_bound = lower_bound;
        out.states.push(tip);

        while let Some(d) = samp.sample_point() {
            let s = src.state_at(&d)?;

            let last = out.states.last().expect("never empty");
            debug_assert!(s.height >= rules.height_genesis && s.height < last.height);
            if s.height + 1 != last.height {
                let mut collect = CollectProof::new(&mut out.proof.hashes);
                if !src.history_proof(&mut collect, s.height) {
                    return None;
                }
            }

            let d_lo = s.pow.difficulty.subtracted_from(&s.chain_work);
            out.states.push(s);

            // The sampled point's whole covering range is spent; drop the window below it.
            if samp.begin > d_lo {
                samp.begin = d_lo;
            }
        }

        Some(out)
    }

    /// Replays the sampler and checks every sampled state: PoW, work-range coverage, strictly
    /// decreasing heights and chain work, direct linkage for adjacent heights, MMR inclusion for
    /// jumps. The whole proof must be consumed exactly.
    pub fn is_valid(&self, rules: &ConsensusRules) -> bool {
        match self.is_valid_internal(rules) {
            Some((n_states, n_hashes)) => n_states == self.states.len() && n_hashes == self.proof.hashes.len(),
            None => false,
        }
    }

    /// Truncates the proof to the states and hashes a verifier bounded by `lower_bound` actually
    /// consumes. Returns false (leaving the proof untouched) if the retained part is invalid.
    pub fn crop(&mut self, rules: &ConsensusRules) -> bool {
        match self.is_valid_internal(rules) {
            Some((n_states, n_hashes)) => {
                self.states.truncate(n_states);
                self.proof.hashes.truncate(n_hashes);
                true
            },
            None => false,
        }
    }

    fn is_valid_internal(&self, rules: &ConsensusRules) -> Option<(usize, usize)> {
        if self.states.is_empty() {
            return None;
        }

        for s in &self.states {
            if !(s.is_sane(rules) && s.is_valid_pow(rules)) {
                return None;
            }
        }

        let tip = &self.states[0];
        let leaf_count = tip.height - rules.height_genesis;
        let mut verifier = MultiProofVerifier::new(&self.proof, leaf_count);

        let mut samp = Sampler::new(tip);
        if samp.begin >= samp.end {
            // overflow attack
            return None;
        }
        samp.lower_bound = self.lower_bound;

        let mut d_lo_prev = tip.pow.difficulty.subtracted_from(&tip.chain_work);

        let mut i_state = 1;
        while let Some(d) = samp.sample_point() {
            let s = self.states.get(i_state)?;
            let s0 = &self.states[i_state - 1];

            // The sample must land inside this state's work range.
            if d >= s.chain_work {
                return None;
            }
            let d_lo = s.pow.difficulty.subtracted_from(&s.chain_work);
            if d < d_lo {
                return None;
            }

            let hv = s.hash();
            if s.height + 1 == s0.height {
                // Direct linkage: the successor pins both the hash and the work.
                if s0.prev_hash != hv {
                    return None;
                }
                if s.chain_work != d_lo_prev {
                    return None;
                }
            } else {
                if s.height >= s0.height {
                    return None;
                }
                if s.chain_work >= d_lo_prev {
                    return None;
                }

                let history_root = verifier.process(s.height - rules.height_genesis, hv)?;
                let mut definition = history_root;
                merkle::interpret(&mut definition, &self.root_live, true);
                if definition != tip.definition {
                    return None;
                }
            }

            d_lo_prev = d_lo;
            if samp.begin > d_lo {
                samp.begin = d_lo;
            }
            i_state += 1;
        }

        Some((i_state, verifier.consumed()))
    }
}
