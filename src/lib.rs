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

//! The consensus-critical core of the Glimmer confidential cryptocurrency.
//!
//! This crate contains the rules by which transactions and blocks are validated, the cumulative
//! chain-work proof that lets a light client authenticate a blockchain tip without downloading the
//! full history, and the difficulty retargeting algorithm that governs block production.
//!
//! In Mimblewimble, transactions and blocks share the same algebraic structure: a set of inputs, a
//! set of outputs and a set of signed kernels, summing to a single excess commitment. The
//! [validation::Context] state machine streams these components and folds them into that sum; see
//! the [transactions] module for the ledger objects themselves and [blocks::ChainWorkProof] for
//! the light-client proof.

pub mod blocks;
pub mod common;
pub mod consensus;
pub mod crypto;
pub mod merkle;
pub mod proof_of_work;
pub mod transactions;
pub mod validation;

pub use common::FixedHash;
