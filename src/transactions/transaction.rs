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

use serde::{Deserialize, Serialize};
use tari_utilities::ByteArray;

use crate::{
    crypto::BlindingFactor,
    transactions::{
        io::{TxReader, TxWriter},
        transaction_components::{Input, Output, TxKernel},
    },
    validation::Context,
};

/// The part shared by transactions and block bodies: the offset split off the kernel keys so that
/// the component sum balances to zero.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxBase {
    pub offset: BlindingFactor,
}

/// The four sorted component vectors of a transaction or block body. In Mimblewimble cut-through
/// gives blocks and transactions the same structure, so one container serves both.
///
/// Vectors hold items by value; a hole is unrepresentable, so the null-element precondition of
/// the streaming protocol is enforced by construction.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TxVectors {
    sorted: bool,
    inputs: Vec<Input>,
    outputs: Vec<Output>,
    kernels_in: Vec<TxKernel>,
    kernels_out: Vec<TxKernel>,
}

impl PartialEq for TxVectors {
    fn eq(&self, other: &Self) -> bool {
        // `sorted` is a cache, not content.
        self.inputs == other.inputs
            && self.outputs == other.outputs
            && self.kernels_in == other.kernels_in
            && self.kernels_out == other.kernels_out
    }
}

impl Eq for TxVectors {}

impl TxVectors {
    pub fn empty() -> Self {
        Self {
            sorted: true,
            ..Default::default()
        }
    }

    pub fn new(inputs: Vec<Input>, outputs: Vec<Output>, kernels_in: Vec<TxKernel>, kernels_out: Vec<TxKernel>) -> Self {
        Self {
            sorted: false,
            inputs,
            outputs,
            kernels_in,
            kernels_out,
        }
    }

    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    pub fn kernels_in(&self) -> &[TxKernel] {
        &self.kernels_in
    }

    pub fn kernels_out(&self) -> &[TxKernel] {
        &self.kernels_out
    }

    pub fn add_input(&mut self, v: Input) {
        self.inputs.push(v);
        self.sorted = false;
    }

    pub fn add_output(&mut self, v: Output) {
        self.outputs.push(v);
        self.sorted = false;
    }

    pub fn add_kernel_in(&mut self, v: TxKernel) {
        self.kernels_in.push(v);
        self.sorted = false;
    }

    pub fn add_kernel_out(&mut self, v: TxKernel) {
        self.kernels_out.push(v);
        self.sorted = false;
    }

    /// Sorts all four vectors into canonical order. Idempotent.
    pub fn sort(&mut self) {
        if self.sorted {
            return;
        }
        self.inputs.sort();
        self.outputs.sort();
        self.kernels_in.sort();
        self.kernels_out.sort();
        self.sorted = true;
    }

    pub fn reader(&self) -> VectorsReader<'_> {
        VectorsReader {
            vectors: self,
            idx: [0; 4],
        }
    }

    /// Drops (input, output) pairs with an identical (commitment, maturity) base in one pass over
    /// the sorted vectors. This is the self-cut-through a merged transaction applies to erase its
    /// own intermediate outputs. Returns the number of cancelled pairs.
    pub fn delete_intermediate_outputs(&mut self) -> usize {
        self.sort();

        let mut del_in = vec![false; self.inputs.len()];
        let mut del_out = vec![false; self.outputs.len()];
        let mut n_del = 0;

        let mut i1 = 0;
        for (i0, input) in self.inputs.iter().enumerate() {
            while i1 < self.outputs.len() {
                match input.cmp_spend(&self.outputs[i1]) {
                    Ordering::Greater => i1 += 1,
                    Ordering::Equal => {
                        del_in[i0] = true;
                        del_out[i1] = true;
                        i1 += 1;
                        n_del += 1;
                        break;
                    },
                    Ordering::Less => break,
                }
            }
        }

        if n_del > 0 {
            let mut keep = del_in.iter();
            self.inputs.retain(|_| !keep.next().unwrap());
            let mut keep = del_out.iter();
            self.outputs.retain(|_| !keep.next().unwrap());
        }
        n_del
    }
}

impl TxWriter for TxVectors {
    fn write_utxo_in(&mut self, v: &Input) {
        self.add_input(v.clone());
    }

    fn write_utxo_out(&mut self, v: &Output) {
        self.add_output(v.clone());
    }

    fn write_kernel_in(&mut self, v: &TxKernel) {
        self.add_kernel_in(v.clone());
    }

    fn write_kernel_out(&mut self, v: &TxKernel) {
        self.add_kernel_out(v.clone());
    }
}

/// Cursor view over in-memory vectors.
#[derive(Clone)]
pub struct VectorsReader<'a> {
    vectors: &'a TxVectors,
    idx: [usize; 4],
}

impl TxReader for VectorsReader<'_> {
    fn reset(&mut self) {
        self.idx = [0; 4];
    }

    fn utxo_in(&self) -> Option<&Input> {
        self.vectors.inputs.get(self.idx[0])
    }

    fn utxo_out(&self) -> Option<&Output> {
        self.vectors.outputs.get(self.idx[1])
    }

    fn kernel_in(&self) -> Option<&TxKernel> {
        self.vectors.kernels_in.get(self.idx[2])
    }

    fn kernel_out(&self) -> Option<&TxKernel> {
        self.vectors.kernels_out.get(self.idx[3])
    }

    fn next_utxo_in(&mut self) {
        self.idx[0] += 1;
    }

    fn next_utxo_out(&mut self) {
        self.idx[1] += 1;
    }

    fn next_kernel_in(&mut self) {
        self.idx[2] += 1;
    }

    fn next_kernel_out(&mut self) {
        self.idx[3] += 1;
    }

    fn clone_boxed(&self) -> Box<dyn TxReader + '_> {
        Box::new(self.clone())
    }
}

/// A complete transaction: the blinding offset plus its four sorted component vectors.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub base: TxBase,
    pub body: TxVectors,
}

impl Transaction {
    pub fn new(offset: BlindingFactor, body: TxVectors) -> Self {
        Self {
            base: TxBase { offset },
            body,
        }
    }

    /// Streams the transaction through `ctx` and applies the transaction-mode balance check.
    pub fn is_valid(&self, ctx: &mut Context) -> bool {
        ctx.validate_and_summarize(&self.base, &mut self.body.reader()) && ctx.is_valid_transaction()
    }

    /// A dedup key for relay pools. A proper transaction has a non-trivial offset, which
    /// identifies it with sufficient probability; failing that, the key is folded from the
    /// contents.
    pub fn key(&self) -> [u8; 32] {
        let offset_bytes = self.base.offset.as_bytes();
        if offset_bytes.iter().any(|b| *b != 0) {
            let mut key = [0u8; 32];
            key.copy_from_slice(offset_bytes);
            return key;
        }

        let mut key = [0u8; 32];
        let mut fold = |bytes: &[u8]| {
            for (k, b) in key.iter_mut().zip(bytes) {
                *k ^= *b;
            }
        };
        for v in &self.body.inputs {
            fold(v.commitment.as_bytes());
        }
        for v in &self.body.outputs {
            fold(v.commitment.as_bytes());
        }
        for v in &self.body.kernels_out {
            fold(v.excess.as_bytes());
        }
        key
    }
}
