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

use std::{
    cmp::Ordering,
    fmt::{Display, Formatter},
};

use serde::{Deserialize, Serialize};
use tari_utilities::hex::Hex;

use crate::{
    common::Height,
    crypto::Commitment,
    transactions::transaction_components::{cmp_commitments, Output},
};

/// A transaction input spends a previously created output, referenced by its commitment and the
/// maturity it was assigned at creation. The pair uniquely identifies the UTXO being consumed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Input {
    pub commitment: Commitment,
    pub maturity: Height,
}

impl Input {
    pub fn new(commitment: Commitment, maturity: Height) -> Self {
        Self { commitment, maturity }
    }

    /// Compares only the (commitment, maturity) identity, the shared base of inputs and outputs.
    /// Cut-through cancels an input against an output exactly when this returns `Equal`.
    pub fn cmp_spend(&self, other: &Output) -> Ordering {
        cmp_commitments(&self.commitment, &other.commitment).then(self.maturity.cmp(&other.maturity))
    }
}

impl From<&Output> for Input {
    fn from(output: &Output) -> Self {
        Self {
            commitment: output.commitment.clone(),
            maturity: output.maturity,
        }
    }
}

impl PartialOrd for Input {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Input {
    fn cmp(&self, other: &Self) -> Ordering {
        cmp_commitments(&self.commitment, &other.commitment).then(self.maturity.cmp(&other.maturity))
    }
}

impl Display for Input {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> std::fmt::Result {
        write!(fmt, "{} [maturity {}]", self.commitment.to_hex(), self.maturity)
    }
}
