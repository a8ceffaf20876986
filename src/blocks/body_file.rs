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

//! The on-disk block body container: a common path prefix expanding into five binary streams,
//! one per component class plus the header sequence. Macroblocks are merged by streaming two
//! containers through [crate::transactions::TxWriter::combine] into a third.

use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Seek, SeekFrom, Write},
    sync::atomic::AtomicBool,
};

use log::*;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use crate::{
    blocks::{BodyBase, SequenceElement, SequencePrefix},
    common::FixedHash,
    consensus::ConsensusRules,
    transactions::{
        transaction_components::{Input, Output, TxKernel},
        TxReader,
        TxWriter,
    },
};

pub const LOG_TARGET: &str = "c::blocks::body_file";

/// Stream suffixes: utxo-in, utxo-out, kernel-in, kernel-out, headers.
const SUFFIXES: [&str; 5] = ["ui", "uo", "ki", "ko", "hd"];

const S_UTXO_IN: usize = 0;
const S_UTXO_OUT: usize = 1;
const S_KERNEL_IN: usize = 2;
const S_KERNEL_OUT: usize = 3;
const S_HEADERS: usize = 4;

/// The distinguished failure bands of the container: retriable I/O failures with the OS error
/// attached, the fatal rules mismatch on open, and stream corruption.
#[derive(Debug, Error)]
pub enum BodyFileError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Block rules mismatch")]
    RulesMismatch,
    #[error("Malformed stream: {0}")]
    Serialization(String),
}

impl From<bincode::Error> for BodyFileError {
    fn from(e: bincode::Error) -> Self {
        BodyFileError::Serialization(e.to_string())
    }
}

enum StreamIo {
    Read { reader: BufReader<File>, size: u64 },
    Write { writer: BufWriter<File> },
}

impl StreamIo {
    fn open(path: &str, read: bool) -> Result<Self, BodyFileError> {
        if read {
            let mut file = File::open(path)?;
            // ATE: learn the size, then rewind to the start.
            let size = file.seek(SeekFrom::End(0))?;
            file.seek(SeekFrom::Start(0))?;
            Ok(StreamIo::Read {
                reader: BufReader::new(file),
                size,
            })
        } else {
            let file = File::create(path)?;
            Ok(StreamIo::Write {
                writer: BufWriter::new(file),
            })
        }
    }

    fn is_data_remaining(&mut self) -> Result<bool, BodyFileError> {
        match self {
            StreamIo::Read { reader, size } => Ok(reader.stream_position()? < *size),
            StreamIo::Write { .. } => Ok(false),
        }
    }

    fn restart(&mut self) -> Result<(), BodyFileError> {
        if let StreamIo::Read { reader, .. } = self {
            reader.seek(SeekFrom::Start(0))?;
        }
        Ok(())
    }

    fn read_item<T: DeserializeOwned>(&mut self) -> Result<T, BodyFileError> {
        match self {
            StreamIo::Read { reader, .. } => Ok(bincode::deserialize_from(reader)?),
            StreamIo::Write { .. } => Err(BodyFileError::Serialization("stream open for writing".into())),
        }
    }

    fn write_item<T: Serialize>(&mut self, item: &T) -> Result<(), BodyFileError> {
        match self {
            StreamIo::Write { writer } => Ok(bincode::serialize_into(writer, item)?),
            StreamIo::Read { .. } => Err(BodyFileError::Serialization("stream open for reading".into())),
        }
    }

    fn flush(&mut self) -> Result<(), BodyFileError> {
        if let StreamIo::Write { writer } = self {
            writer.flush()?;
        }
        Ok(())
    }
}

/// The caller keeps a reference to the current item while the next one is being decoded, so each
/// cursor keeps the last two decoded items alive in a rotating pair.
struct Guard<T> {
    slots: [Option<T>; 2],
}

impl<T> Default for Guard<T> {
    fn default() -> Self {
        Self { slots: [None, None] }
    }
}

impl<T: DeserializeOwned> Guard<T> {
    fn advance(&mut self, stream: &mut StreamIo) -> Result<(), BodyFileError> {
        if stream.is_data_remaining()? {
            self.slots.swap(0, 1);
            self.slots[0] = Some(stream.read_item()?);
        } else {
            self.slots[0] = None;
        }
        Ok(())
    }

    fn current(&self) -> Option<&T> {
        self.slots[0].as_ref()
    }

    fn clear(&mut self) {
        self.slots = [None, None];
    }
}

/// A block body container opened over five streams at a common path prefix. One instance is
/// either a reader or a writer for its whole lifetime; [TxReader] cursors are live in read mode,
/// [TxWriter] sinks in write mode.
///
/// Consensus validation over this reader stays boolean-shaped; I/O failures park the cursors at
/// end-of-stream and are surfaced separately through [BodyFileRw::io_error].
pub struct BodyFileRw {
    path: String,
    read_mode: bool,
    auto_delete: bool,
    streams: Vec<StreamIo>,
    cur_utxo_in: Guard<Input>,
    cur_utxo_out: Guard<Output>,
    cur_kernel_in: Guard<TxKernel>,
    cur_kernel_out: Guard<TxKernel>,
    error: Option<BodyFileError>,
}

impl BodyFileRw {
    pub fn stream_paths(prefix: &str) -> [String; 5] {
        SUFFIXES.map(|s| format!("{}{}", prefix, s))
    }

    /// Opens the five streams. Read mode seeks each to its end for the size and rewinds; write
    /// mode truncates.
    pub fn open(prefix: &str, read: bool) -> Result<Self, BodyFileError> {
        let mut streams = Vec::with_capacity(SUFFIXES.len());
        for path in Self::stream_paths(prefix) {
            streams.push(StreamIo::open(&path, read)?);
        }
        Ok(Self {
            path: prefix.to_string(),
            read_mode: read,
            auto_delete: false,
            streams,
            cur_utxo_in: Guard::default(),
            cur_utxo_out: Guard::default(),
            cur_kernel_in: Guard::default(),
            cur_kernel_out: Guard::default(),
            error: None,
        })
    }

    /// Removes this container's streams when the handle drops. For temporary merge products.
    pub fn set_auto_delete(&mut self, auto_delete: bool) {
        self.auto_delete = auto_delete;
    }

    /// Deletes the five stream files at `prefix`.
    pub fn delete(prefix: &str) {
        for path in Self::stream_paths(prefix) {
            if let Err(e) = fs::remove_file(&path) {
                debug!(target: LOG_TARGET, "could not remove {}: {}", path, e);
            }
        }
    }

    /// The first I/O or decode failure, if any. Cursors read as exhausted after a failure; a
    /// caller that saw a stream end early should consult this before trusting a false verdict.
    pub fn io_error(&self) -> Option<&BodyFileError> {
        self.error.as_ref()
    }

    pub fn take_io_error(&mut self) -> Option<BodyFileError> {
        self.error.take()
    }

    fn fail(&mut self, e: BodyFileError) {
        warn!(target: LOG_TARGET, "body stream failure at {}: {}", self.path, e);
        self.cur_utxo_in.clear();
        self.cur_utxo_out.clear();
        self.cur_kernel_in.clear();
        self.cur_kernel_out.clear();
        if self.error.is_none() {
            self.error = Some(e);
        }
    }

    /// Reads the header stream's preamble: the rules checksum (which must match ours), the body
    /// base and the sequence prefix.
    pub fn get_start(&mut self, rules: &ConsensusRules) -> Result<(BodyBase, SequencePrefix), BodyFileError> {
        let checksum: FixedHash = self.streams[S_HEADERS].read_item()?;
        if checksum != rules.checksum {
            return Err(BodyFileError::RulesMismatch);
        }
        let body: BodyBase = self.streams[S_HEADERS].read_item()?;
        let prefix: SequencePrefix = self.streams[S_HEADERS].read_item()?;
        Ok((body, prefix))
    }

    /// The next per-block header element, or `None` at end of stream.
    pub fn get_next_header(&mut self) -> Result<Option<SequenceElement>, BodyFileError> {
        if !self.streams[S_HEADERS].is_data_remaining()? {
            return Ok(None);
        }
        Ok(Some(self.streams[S_HEADERS].read_item()?))
    }

    /// Writes the header stream preamble.
    pub fn put_start(
        &mut self,
        body: &BodyBase,
        prefix: &SequencePrefix,
        rules: &ConsensusRules,
    ) -> Result<(), BodyFileError> {
        self.streams[S_HEADERS].write_item(&rules.checksum)?;
        self.streams[S_HEADERS].write_item(body)?;
        self.streams[S_HEADERS].write_item(prefix)
    }

    pub fn put_next_header(&mut self, elem: &SequenceElement) -> Result<(), BodyFileError> {
        self.streams[S_HEADERS].write_item(elem)
    }

    pub fn flush(&mut self) -> Result<(), BodyFileError> {
        for s in &mut self.streams {
            s.flush()?;
        }
        Ok(())
    }

    fn restart_and_preload(&mut self) -> Result<(), BodyFileError> {
        for s in &mut self.streams {
            s.restart()?;
        }
        self.cur_utxo_in.clear();
        self.cur_utxo_out.clear();
        self.cur_kernel_in.clear();
        self.cur_kernel_out.clear();
        self.cur_utxo_in.advance(&mut self.streams[S_UTXO_IN])?;
        self.cur_utxo_out.advance(&mut self.streams[S_UTXO_OUT])?;
        self.cur_kernel_in.advance(&mut self.streams[S_KERNEL_IN])?;
        self.cur_kernel_out.advance(&mut self.streams[S_KERNEL_OUT])?;
        Ok(())
    }

    /// Merges the header streams of two source containers into this writer: bodies merge, the
    /// first prefix wins, elements concatenate.
    pub fn combine_hdr(
        &mut self,
        r0: &mut BodyFileRw,
        r1: &mut BodyFileRw,
        rules: &ConsensusRules,
        stop: &AtomicBool,
    ) -> Result<bool, BodyFileError> {
        let (mut body0, prefix0) = r0.get_start(rules)?;
        let (body1, _prefix1) = r1.get_start(rules)?;

        body0.merge(&body1);
        self.put_start(&body0, &prefix0, rules)?;

        for src in [r0, r1] {
            while let Some(elem) = src.get_next_header()? {
                if stop.load(std::sync::atomic::Ordering::Relaxed) {
                    return Ok(false);
                }
                self.put_next_header(&elem)?;
            }
        }
        Ok(true)
    }
}

impl Drop for BodyFileRw {
    fn drop(&mut self) {
        if self.auto_delete {
            let _ = self.flush();
            self.streams.clear();
            Self::delete(&self.path.clone());
        }
    }
}

impl TxReader for BodyFileRw {
    fn reset(&mut self) {
        if !self.read_mode || self.streams.len() != SUFFIXES.len() {
            return;
        }
        if let Err(e) = self.restart_and_preload() {
            self.fail(e);
        }
    }

    fn utxo_in(&self) -> Option<&Input> {
        self.cur_utxo_in.current()
    }

    fn utxo_out(&self) -> Option<&Output> {
        self.cur_utxo_out.current()
    }

    fn kernel_in(&self) -> Option<&TxKernel> {
        self.cur_kernel_in.current()
    }

    fn kernel_out(&self) -> Option<&TxKernel> {
        self.cur_kernel_out.current()
    }

    fn next_utxo_in(&mut self) {
        if let Err(e) = self.cur_utxo_in.advance(&mut self.streams[S_UTXO_IN]) {
            self.fail(e);
        }
    }

    fn next_utxo_out(&mut self) {
        if let Err(e) = self.cur_utxo_out.advance(&mut self.streams[S_UTXO_OUT]) {
            self.fail(e);
        }
    }

    fn next_kernel_in(&mut self) {
        if let Err(e) = self.cur_kernel_in.advance(&mut self.streams[S_KERNEL_IN]) {
            self.fail(e);
        }
    }

    fn next_kernel_out(&mut self) {
        if let Err(e) = self.cur_kernel_out.advance(&mut self.streams[S_KERNEL_OUT]) {
            self.fail(e);
        }
    }

    fn clone_boxed(&self) -> Box<dyn TxReader + '_> {
        match Self::open(&self.path, self.read_mode) {
            Ok(clone) => Box::new(clone),
            Err(e) => {
                // A reader that reports the failure and yields nothing.
                let mut dead = BodyFileRw {
                    path: self.path.clone(),
                    read_mode: self.read_mode,
                    auto_delete: false,
                    streams: Vec::new(),
                    cur_utxo_in: Guard::default(),
                    cur_utxo_out: Guard::default(),
                    cur_kernel_in: Guard::default(),
                    cur_kernel_out: Guard::default(),
                    error: None,
                };
                dead.fail(e);
                Box::new(dead)
            },
        }
    }
}

impl TxWriter for BodyFileRw {
    fn write_utxo_in(&mut self, v: &Input) {
        if let Err(e) = self.streams[S_UTXO_IN].write_item(v) {
            self.fail(e);
        }
    }

    fn write_utxo_out(&mut self, v: &Output) {
        if let Err(e) = self.streams[S_UTXO_OUT].write_item(v) {
            self.fail(e);
        }
    }

    fn write_kernel_in(&mut self, v: &TxKernel) {
        if let Err(e) = self.streams[S_KERNEL_IN].write_item(v) {
            self.fail(e);
        }
    }

    fn write_kernel_out(&mut self, v: &TxKernel) {
        if let Err(e) = self.streams[S_KERNEL_OUT].write_item(v) {
            self.fail(e);
        }
    }
}
