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
    fmt::{Display, Error, Formatter},
    iter::Sum,
    ops::{AddAssign, SubAssign},
};

use newtype_ops::newtype_ops;
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use tari_crypto::commitment::HomomorphicCommitmentFactory;
use tari_utilities::ByteArray;

use crate::crypto::{Commitment, CommitmentFactory, PrivateKey};

/// All calculations involving Glimmer amounts use this newtype to prevent unit-conversion and
/// rounding bugs. One Glim is [crate::consensus::ConsensusRules::coin] atomic units.
#[derive(Copy, Default, Clone, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MicroGlim(pub u64);

#[allow(non_upper_case_globals)]
pub const uG: MicroGlim = MicroGlim(1);

// You can only add or subtract µG from µG
newtype_ops! { [MicroGlim] {add sub} {:=} Self Self }
newtype_ops! { [MicroGlim] {add sub} {:=} &Self &Self }
newtype_ops! { [MicroGlim] {add sub} {:=} Self &Self }

// Multiplication and division only makes sense when µG is multiplied or divided by a scalar
newtype_ops! { [MicroGlim] {mul div rem} {:=} Self u64 }

impl MicroGlim {
    pub const fn zero() -> Self {
        Self(0)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn checked_sub(self, v: MicroGlim) -> Option<MicroGlim> {
        self.0.checked_sub(v.0).map(MicroGlim)
    }
}

impl From<u64> for MicroGlim {
    fn from(v: u64) -> Self {
        MicroGlim(v)
    }
}

impl From<MicroGlim> for u64 {
    fn from(v: MicroGlim) -> Self {
        v.0
    }
}

impl From<MicroGlim> for PrivateKey {
    fn from(v: MicroGlim) -> Self {
        PrivateKey::from(v.0)
    }
}

impl Display for MicroGlim {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "{} µG", self.0)
    }
}

impl Sum for MicroGlim {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(MicroGlim::zero(), |acc, x| acc + x)
    }
}

/// A 128-bit additive aggregate of [MicroGlim] amounts. Fees and coinbase totals are summed over
/// whole ranges of blocks and can exceed 64 bits long before they threaten 128.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountBig {
    pub lo: u64,
    pub hi: u64,
}

impl AmountBig {
    pub const fn zero() -> Self {
        Self { lo: 0, hi: 0 }
    }

    pub fn is_zero(&self) -> bool {
        self.lo == 0 && self.hi == 0
    }

    pub fn to_u256(&self) -> U256 {
        (U256::from(self.hi) << 64) | U256::from(self.lo)
    }

    /// The aggregate as a curve scalar, for folding `value·H` into a commitment sum.
    pub fn to_scalar(&self) -> PrivateKey {
        let mut bytes = [0u8; 32];
        bytes[..8].copy_from_slice(&self.lo.to_le_bytes());
        bytes[8..16].copy_from_slice(&self.hi.to_le_bytes());
        PrivateKey::from_bytes(&bytes).expect("128-bit values are below the group order")
    }

    /// Adds `value·H` to a commitment sum.
    pub fn add_to(&self, sum: &mut Commitment, factory: &CommitmentFactory) {
        if self.is_zero() {
            return;
        }
        *sum = &*sum + &factory.commit(&PrivateKey::default(), &self.to_scalar());
    }
}

impl From<MicroGlim> for AmountBig {
    fn from(v: MicroGlim) -> Self {
        Self { lo: v.0, hi: 0 }
    }
}

impl AddAssign<MicroGlim> for AmountBig {
    fn add_assign(&mut self, x: MicroGlim) {
        let (lo, carry) = self.lo.overflowing_add(x.0);
        self.lo = lo;
        if carry {
            self.hi = self.hi.wrapping_add(1);
        }
    }
}

impl SubAssign<MicroGlim> for AmountBig {
    fn sub_assign(&mut self, x: MicroGlim) {
        let (lo, borrow) = self.lo.overflowing_sub(x.0);
        self.lo = lo;
        if borrow {
            self.hi = self.hi.wrapping_sub(1);
        }
    }
}

impl AddAssign<&AmountBig> for AmountBig {
    fn add_assign(&mut self, x: &AmountBig) {
        *self += MicroGlim(x.lo);
        self.hi = self.hi.wrapping_add(x.hi);
    }
}

impl SubAssign<&AmountBig> for AmountBig {
    fn sub_assign(&mut self, x: &AmountBig) {
        *self -= MicroGlim(x.lo);
        self.hi = self.hi.wrapping_sub(x.hi);
    }
}

impl Display for AmountBig {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "{} µG", self.to_u256())
    }
}
