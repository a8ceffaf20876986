// Copyright 2024 The Glimmer Project
// SPDX-License-Identifier: BSD-3-Clause

use tari_crypto::{errors::RangeProofError, signatures::SchnorrSignatureError};
use thiserror::Error;

/// Errors raised while constructing ledger objects. Consensus *verdicts* are deliberately not
/// represented here: a validator answers with a bare boolean so that rejection reasons are not
/// leaked to whoever crafted the input.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum TransactionError {
    #[error("Error constructing a range proof: {0}")]
    RangeProof(String),
    #[error("Error signing a proof or kernel: {0}")]
    Signing(String),
    #[error("Value exceeds the provable range")]
    ValueOutOfRange,
}

impl From<RangeProofError> for TransactionError {
    fn from(e: RangeProofError) -> Self {
        TransactionError::RangeProof(e.to_string())
    }
}

impl From<SchnorrSignatureError> for TransactionError {
    fn from(e: SchnorrSignatureError) -> Self {
        TransactionError::Signing(e.to_string())
    }
}
