// Copyright 2024 The Glimmer Project
// SPDX-License-Identifier: BSD-3-Clause

//! Block headers, bodies, the on-disk body container and the light-client chain-work proof.

mod block_header;
mod body;
mod body_file;
mod chain_work_proof;

pub use block_header::{
    block_height_range,
    utxo_leaf_hash,
    BlockHeader,
    HeaderId,
    SequenceElement,
    SequencePrefix,
};
pub use body::{Body, BodyBase};
pub use body_file::{BodyFileError, BodyFileRw};
pub use chain_work_proof::{ChainWorkProof, ChainWorkSource, Sampler};
