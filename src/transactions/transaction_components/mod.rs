// Copyright 2024 The Glimmer Project
// SPDX-License-Identifier: BSD-3-Clause

//! The ledger objects a transaction or block body is assembled from, and their canonical ordering.
//!
//! The entire protocol depends on components being presented sorted ascending under the orderings
//! defined here: inputs and outputs compare by commitment bytes then maturity, kernels by excess,
//! multiplier, signature, fee, height window and finally their nested lists element-wise.

mod error;
mod range_proof;
mod transaction_input;
mod transaction_kernel;
mod transaction_output;

use std::cmp::Ordering;

use tari_utilities::ByteArray;

pub use error::TransactionError;
pub use range_proof::{BulletRangeProof, PublicValueProof, RangeProof};
pub use transaction_input::Input;
pub use transaction_kernel::{lock_image, HashLock, TxKernel};
pub use transaction_output::Output;

use crate::crypto::{Commitment, Signature};

/// Commitments order by their 32-byte canonical encoding, lexicographically.
pub(crate) fn cmp_commitments(a: &Commitment, b: &Commitment) -> Ordering {
    a.as_bytes().cmp(b.as_bytes())
}

/// Signatures order by public nonce bytes, then scalar bytes.
pub(crate) fn cmp_signatures(a: &Signature, b: &Signature) -> Ordering {
    a.get_public_nonce()
        .as_bytes()
        .cmp(b.get_public_nonce().as_bytes())
        .then_with(|| a.get_signature().as_bytes().cmp(b.get_signature().as_bytes()))
}
