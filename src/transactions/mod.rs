// Copyright 2024 The Glimmer Project
// SPDX-License-Identifier: BSD-3-Clause

//! Ledger objects and the streaming protocol over them.

mod amount;
mod height_range;
mod io;
pub mod test_helpers;
mod transaction;
pub mod transaction_components;

#[allow(non_upper_case_globals)]
pub use amount::uG;
pub use amount::{AmountBig, MicroGlim};
pub use height_range::HeightRange;
pub use io::{TxReader, TxWriter};
use tari_utilities::ByteArray;
pub use transaction::{Transaction, TxBase, TxVectors, VectorsReader};

use crate::{
    common::Height,
    consensus::{DomainSeparatedConsensusHasher, TransactionHashDomain},
    crypto::{BlindingFactor, PrivateKey},
};

/// Deterministically splits a kernel signing key in two: the key is nudged by a hash-derived
/// offset and the negated offset is returned for the transaction base. The kernel then signs
/// under the nudged key while the overall blinding sum is unchanged.
pub fn extract_offset(kernel_key: &mut PrivateKey, height: Height, index: u32) -> BlindingFactor {
    let hv = DomainSeparatedConsensusHasher::<TransactionHashDomain>::new("offset")
        .chain(kernel_key)
        .chain(&height)
        .chain(&index)
        .finalize();

    let mut bytes: [u8; 32] = *hv;
    // Clear the top bits so the scalar is canonical.
    bytes[31] &= 0x0f;
    let offset = PrivateKey::from_bytes(&bytes).expect("masked below the group order");

    *kernel_key = kernel_key.clone() + offset.clone();
    PrivateKey::default() - offset
}
