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

//! The streaming protocol shared by the validator, the cut-through merge engine and the block
//! body file serializer: four lazy cursors on the read side, four append sinks on the write side.

use std::{
    cmp::Ordering,
    sync::atomic::{AtomicBool, Ordering as AtomicOrdering},
};

use crate::transactions::transaction_components::{Input, Output, TxKernel};

/// Read side of the streaming protocol. Each cursor points at the current item of its stream, or
/// `None` past the end; `next_*` advances one stream without touching the others.
pub trait TxReader {
    /// Rewinds all four cursors to the head of their streams.
    fn reset(&mut self);

    fn utxo_in(&self) -> Option<&Input>;
    fn utxo_out(&self) -> Option<&Output>;
    fn kernel_in(&self) -> Option<&TxKernel>;
    fn kernel_out(&self) -> Option<&TxKernel>;

    fn next_utxo_in(&mut self);
    fn next_utxo_out(&mut self);
    fn next_kernel_in(&mut self);
    fn next_kernel_out(&mut self);

    /// An independent reader over the same underlying streams. Callers reset it before use.
    fn clone_boxed(&self) -> Box<dyn TxReader + '_>;
}

/// Write side of the streaming protocol.
pub trait TxWriter {
    fn write_utxo_in(&mut self, v: &Input);
    fn write_utxo_out(&mut self, v: &Output);
    fn write_kernel_in(&mut self, v: &TxKernel);
    fn write_kernel_out(&mut self, v: &TxKernel);

    /// Copies everything `r` has left, stream by stream.
    fn dump(&mut self, r: &mut dyn TxReader)
    where Self: Sized {
        r.reset();
        while let Some(v) = r.utxo_in() {
            let v = v.clone();
            self.write_utxo_in(&v);
            r.next_utxo_in();
        }
        while let Some(v) = r.utxo_out() {
            let v = v.clone();
            self.write_utxo_out(&v);
            r.next_utxo_out();
        }
        while let Some(v) = r.kernel_in() {
            let v = v.clone();
            self.write_kernel_in(&v);
            r.next_kernel_in();
        }
        while let Some(v) = r.kernel_out() {
            let v = v.clone();
            self.write_kernel_out(&v);
            r.next_kernel_out();
        }
    }

    /// K-way merges sorted readers into this writer, cancelling (input, output) pairs that share
    /// a (commitment, maturity) base and (input-kernel, output-kernel) pairs that compare equal.
    /// This is how transactions are merged with cut-through. The stop flag is polled between
    /// items; returns false if it fired.
    fn combine(&mut self, readers: &mut [&mut dyn TxReader], stop: &AtomicBool) -> bool
    where Self: Sized {
        for r in readers.iter_mut() {
            r.reset();
        }

        // Utxos
        loop {
            if stop.load(AtomicOrdering::Relaxed) {
                return false;
            }

            let mut best_in: Option<(usize, Input)> = None;
            let mut best_out: Option<(usize, Output)> = None;
            for (i, r) in readers.iter().enumerate() {
                if let Some(v) = r.utxo_in() {
                    if best_in.as_ref().map_or(true, |(_, best)| best > v) {
                        best_in = Some((i, v.clone()));
                    }
                }
                if let Some(v) = r.utxo_out() {
                    if best_out.as_ref().map_or(true, |(_, best)| best > v) {
                        best_out = Some((i, v.clone()));
                    }
                }
            }

            match (best_in, best_out) {
                (None, None) => break,
                (Some((i_in, input)), Some((i_out, output))) => match input.cmp_spend(&output) {
                    Ordering::Equal => {
                        // cancelled pair, emit neither
                        readers[i_in].next_utxo_in();
                        readers[i_out].next_utxo_out();
                    },
                    Ordering::Less => {
                        self.write_utxo_in(&input);
                        readers[i_in].next_utxo_in();
                    },
                    Ordering::Greater => {
                        self.write_utxo_out(&output);
                        readers[i_out].next_utxo_out();
                    },
                },
                (Some((i_in, input)), None) => {
                    self.write_utxo_in(&input);
                    readers[i_in].next_utxo_in();
                },
                (None, Some((i_out, output))) => {
                    self.write_utxo_out(&output);
                    readers[i_out].next_utxo_out();
                },
            }
        }

        // Kernels
        loop {
            if stop.load(AtomicOrdering::Relaxed) {
                return false;
            }

            let mut best_in: Option<(usize, TxKernel)> = None;
            let mut best_out: Option<(usize, TxKernel)> = None;
            for (i, r) in readers.iter().enumerate() {
                if let Some(v) = r.kernel_in() {
                    if best_in.as_ref().map_or(true, |(_, best)| best > v) {
                        best_in = Some((i, v.clone()));
                    }
                }
                if let Some(v) = r.kernel_out() {
                    if best_out.as_ref().map_or(true, |(_, best)| best > v) {
                        best_out = Some((i, v.clone()));
                    }
                }
            }

            match (best_in, best_out) {
                (None, None) => break,
                (Some((i_in, kernel_in)), Some((i_out, kernel_out))) => match kernel_in.cmp(&kernel_out) {
                    Ordering::Equal => {
                        // A spent kernel annihilates its counterpart; the *kernel* cursors move
                        // on, the utxo cursors are long exhausted by this phase.
                        readers[i_in].next_kernel_in();
                        readers[i_out].next_kernel_out();
                    },
                    Ordering::Less => {
                        self.write_kernel_in(&kernel_in);
                        readers[i_in].next_kernel_in();
                    },
                    Ordering::Greater => {
                        self.write_kernel_out(&kernel_out);
                        readers[i_out].next_kernel_out();
                    },
                },
                (Some((i_in, kernel_in)), None) => {
                    self.write_kernel_in(&kernel_in);
                    readers[i_in].next_kernel_in();
                },
                (None, Some((i_out, kernel_out))) => {
                    self.write_kernel_out(&kernel_out);
                    readers[i_out].next_kernel_out();
                },
            }
        }

        true
    }
}
