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

//! The streaming validator.
//!
//! A [Context] consumes the sorted component streams of a transaction or block and folds them
//! into a single commitment sum `Σ`, a fee total and a coinbase total. At stream end `Σ` must
//! equal zero (transactions) or the declared subsidy (blocks). Every rejection is a bare `false`:
//! the adversary controls the input, and a reason code would only aid probing.

use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

use log::*;
use primitive_types::U256;
use tari_crypto::keys::PublicKey as PublicKeyTrait;

use crate::{
    blocks::BodyBase,
    consensus::ConsensusRules,
    crypto::{negate_commitment, zero_commitment, Commitment, CryptoFactories, PublicKey},
    transactions::{
        transaction_components::{Input, Output, TxKernel},
        AmountBig,
        HeightRange,
        TxBase,
        TxReader,
    },
};

pub const LOG_TARGET: &str = "c::val::context";

/// The validator state machine. One context validates one stream; N contexts with the same
/// `verifiers` count and distinct `verifier_index` values can each take every N-th element of the
/// same stream in parallel and be [Context::merge]d afterwards.
pub struct Context<'a> {
    /// The running commitment sum.
    pub sigma: Commitment,
    /// Total fee of all verified output kernels.
    pub fee: AmountBig,
    /// Total value minted by verified coinbase outputs.
    pub coinbase: AmountBig,
    /// The height window the stream is valid in. Block mode: fixed by the caller. Transaction
    /// mode: starts unbounded and is narrowed by every kernel's height range.
    pub height: HeightRange,
    /// Blocks may mint coinbase outputs; transactions may not.
    pub block_mode: bool,
    /// Total number of parallel verifiers sharing this stream.
    pub verifiers: u32,
    /// This context's slot in `[0, verifiers)`.
    pub verifier_index: u32,
    /// Polled between elements for bounded-latency cancellation.
    pub abort: Option<&'a AtomicBool>,
    rules: &'a ConsensusRules,
    factories: &'a CryptoFactories,
}

impl<'a> Context<'a> {
    pub fn new(rules: &'a ConsensusRules, factories: &'a CryptoFactories) -> Self {
        Self {
            sigma: zero_commitment(),
            fee: AmountBig::zero(),
            coinbase: AmountBig::zero(),
            height: HeightRange::default(),
            block_mode: false,
            verifiers: 1,
            verifier_index: 0,
            abort: None,
            rules,
            factories,
        }
    }

    /// A context for validating a block body covering the given height range.
    pub fn for_block(rules: &'a ConsensusRules, factories: &'a CryptoFactories, height: HeightRange) -> Self {
        let mut ctx = Self::new(rules, factories);
        ctx.height = height;
        ctx.block_mode = true;
        ctx
    }

    /// Returns the context to its initial state, keeping the sharding configuration.
    pub fn reset(&mut self) {
        self.sigma = zero_commitment();
        self.fee = AmountBig::zero();
        self.coinbase = AmountBig::zero();
        self.height.reset();
        self.block_mode = false;
    }

    /// Round-robin sharding: each verifier takes every N-th element.
    fn should_verify(&self, iv: &mut u32) -> bool {
        if *iv != 0 {
            *iv -= 1;
            return false;
        }
        *iv = self.verifiers - 1;
        true
    }

    fn should_abort(&self) -> bool {
        self.abort.map_or(false, |flag| flag.load(AtomicOrdering::Relaxed))
    }

    /// Intersects the permitted window with an element's height range. In transaction mode the
    /// window shrinks; in block mode the caller's range is authoritative and only emptiness is
    /// checked.
    fn handle_element_height(&mut self, hr: &HeightRange) -> bool {
        let mut r = self.height;
        r.intersect(hr);
        if r.is_empty() {
            return false;
        }
        if !self.block_mode {
            self.height = r;
        }
        true
    }

    /// Folds a parallel verifier's partial summary into this one. Both contexts must have been
    /// configured identically apart from their `verifier_index`.
    pub fn merge(&mut self, other: &Context<'_>) -> bool {
        debug_assert_eq!(self.block_mode, other.block_mode);
        if self.block_mode != other.block_mode {
            return false;
        }
        if !self.handle_element_height(&other.height) {
            return false;
        }
        self.sigma = &self.sigma + &other.sigma;
        self.fee += &other.fee;
        self.coinbase += &other.coinbase;
        true
    }

    /// Streams the four component vectors through the context in canonical order, enforcing
    /// strict ascending order within each, validating proofs and signatures, and folding
    /// everything into `Σ`. Inputs are effectively subtracted by negating `Σ` around their pass.
    pub fn validate_and_summarize(&mut self, base: &TxBase, reader: &mut dyn TxReader) -> bool {
        if self.height.is_empty() {
            return false;
        }

        self.sigma = negate_commitment(&self.sigma);
        let mut fee_inp = AmountBig::zero(); // input-kernel fees were accounted when the kernel was created
        let mut iv = self.verifier_index;

        reader.reset();

        // Inputs
        let mut prev: Option<Input> = None;
        while let Some(cur) = reader.utxo_in() {
            if self.should_abort() {
                return false;
            }
            if self.should_verify(&mut iv) {
                if prev.as_ref().map_or(false, |p| p >= cur) {
                    trace!(target: LOG_TARGET, "input stream not strictly ascending");
                    return false;
                }
                self.sigma = &self.sigma + &cur.commitment;
            }
            prev = Some(cur.clone());
            reader.next_utxo_in();
        }

        // Input kernels
        let mut prev: Option<TxKernel> = None;
        while let Some(cur) = reader.kernel_in().cloned() {
            if self.should_abort() {
                return false;
            }

            // Locate the corresponding output kernel: same excess, strictly greater multiplier.
            // Kernels sort by excess then multiplier, so the output-kernel cursor only ever moves
            // forward. This runs on every shard regardless of the round-robin, so no shard can be
            // confused by duplicated inputs with fewer outputs.
            loop {
                let Some(out) = reader.kernel_out() else {
                    trace!(target: LOG_TARGET, "input kernel without an output counterpart");
                    return false;
                };
                let ord = crate::transactions::transaction_components::cmp_commitments(&out.excess, &cur.excess);
                let multiplier_ok = out.multiplier > cur.multiplier;
                reader.next_kernel_out();

                match ord {
                    std::cmp::Ordering::Greater => return false,
                    std::cmp::Ordering::Equal => {
                        if !multiplier_ok {
                            return false;
                        }
                        break;
                    },
                    std::cmp::Ordering::Less => {},
                }
            }

            if self.should_verify(&mut iv) {
                if prev.as_ref().map_or(false, |p| p >= &cur) {
                    trace!(target: LOG_TARGET, "input-kernel stream not strictly ascending");
                    return false;
                }
                if !cur.is_valid(&mut fee_inp, &mut self.sigma) {
                    trace!(target: LOG_TARGET, "input kernel failed validation");
                    return false;
                }
            }
            prev = Some(cur);
            reader.next_kernel_in();
        }

        // Inputs are now effectively subtracted.
        self.sigma = negate_commitment(&self.sigma);

        reader.reset();

        // Outputs
        let mut prev_out: Option<Output> = None;
        while let Some(cur) = reader.utxo_out() {
            if self.should_abort() {
                return false;
            }
            if self.should_verify(&mut iv) {
                if prev_out.as_ref().map_or(false, |p| p >= cur) {
                    trace!(target: LOG_TARGET, "output stream not strictly ascending");
                    return false;
                }
                if !cur.is_valid(self.rules, self.factories) {
                    trace!(target: LOG_TARGET, "output failed validation");
                    return false;
                }
                self.sigma = &self.sigma + &cur.commitment;

                if cur.is_coinbase() {
                    if !self.block_mode {
                        // only the miner mints
                        return false;
                    }
                    match cur.proof.public_value() {
                        Some(v) => self.coinbase += v,
                        None => return false,
                    }
                }
            }
            prev_out = Some(cur.clone());
            reader.next_utxo_out();
        }

        // Output kernels
        let mut prev: Option<TxKernel> = None;
        while let Some(cur) = reader.kernel_out().cloned() {
            if self.should_abort() {
                return false;
            }
            if self.should_verify(&mut iv) {
                if prev.as_ref().map_or(false, |p| p >= &cur) {
                    trace!(target: LOG_TARGET, "output-kernel stream not strictly ascending");
                    return false;
                }
                if !cur.is_valid(&mut self.fee, &mut self.sigma) {
                    trace!(target: LOG_TARGET, "output kernel failed validation");
                    return false;
                }
                if !self.handle_element_height(&cur.height) {
                    return false;
                }
            }
            prev = Some(cur);
            reader.next_kernel_out();
        }

        if self.should_verify(&mut iv) {
            let offset_commitment = Commitment::from_public_key(&PublicKey::from_secret_key(&base.offset));
            self.sigma = &self.sigma + &offset_commitment;
        }

        debug_assert!(!self.height.is_empty());
        true
    }

    /// The transaction-mode final check: no coinbase, and `Σ + fee·H = 0`.
    pub fn is_valid_transaction(&mut self) -> bool {
        if !self.coinbase.is_zero() {
            // must have been rejected during streaming already
            return false;
        }

        let mut sigma = self.sigma.clone();
        self.fee.add_to(&mut sigma, &self.factories.commitment);
        self.sigma = sigma;

        self.sigma == zero_commitment()
    }

    /// The block-mode final check: `Σ = subsidy·H`, and unless `subsidy_open`, the subsidy is
    /// bounded by the emission schedule and enough immature coinbase value remains unspent to
    /// honor maturity.
    pub fn is_valid_block(&mut self, body: &BodyBase, subsidy_open: bool) -> bool {
        self.sigma = negate_commitment(&self.sigma);
        body.subsidy.add_to(&mut self.sigma, &self.factories.commitment);

        if self.sigma != zero_commitment() {
            trace!(target: LOG_TARGET, "block sum does not match the declared subsidy");
            return false;
        }

        if subsidy_open {
            return true;
        }

        if body.subsidy_closing {
            // already closed
            return false;
        }

        let emission = U256::from(self.rules.coinbase_emission);
        let blocks_in_range = U256::from(self.height.max - self.height.min) + U256::one();

        // Subsidy is bounded by the number of blocks times the emission.
        let mut required = body.subsidy.to_u256();
        if required > blocks_in_range * emission {
            return false;
        }

        // Some coinbase outputs may legitimately have been spent already; only the tail younger
        // than the maturity window must still be present.
        let maturity = U256::from(self.rules.maturity_coinbase);
        if blocks_in_range > maturity {
            let spendable_cap = (blocks_in_range - maturity) * emission;
            required = required.saturating_sub(spendable_cap);
        }

        self.coinbase.to_u256() >= required
    }
}
