// Copyright 2024 The Glimmer Project
// SPDX-License-Identifier: BSD-3-Clause

use std::{
    convert::TryFrom,
    fmt::{Display, Formatter},
    ops::Deref,
};

use primitive_types::U256;
use serde::{Deserialize, Serialize};
use tari_utilities::hex::{from_hex, to_hex};
use thiserror::Error;

/// The width of every consensus hash in the protocol.
pub const FIXED_HASH_SIZE: usize = 32;

#[derive(Debug, Error)]
#[error("Invalid fixed hash size")]
pub struct FixedHashSizeError;

/// A 32-byte hash value, stored big-endian.
///
/// All consensus hashes (kernel hashes, header hashes, Merkle nodes, the rules checksum) are this
/// type. Comparison is lexicographic over the bytes, which for big-endian storage coincides with
/// numeric order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FixedHash([u8; FIXED_HASH_SIZE]);

impl FixedHash {
    pub const fn zero() -> Self {
        Self([0u8; FIXED_HASH_SIZE])
    }

    pub const fn byte_size() -> usize {
        FIXED_HASH_SIZE
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    /// Increments the value by one, wrapping around on overflow. Used to steer hash-derived
    /// identifiers away from reserved values.
    pub fn inc(&mut self) {
        for b in self.0.iter_mut().rev() {
            let (v, overflow) = b.overflowing_add(1);
            *b = v;
            if !overflow {
                break;
            }
        }
    }

    pub fn to_u256(&self) -> U256 {
        U256::from_big_endian(&self.0)
    }

    pub fn to_hex(&self) -> String {
        to_hex(&self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, FixedHashSizeError> {
        let bytes = from_hex(s).map_err(|_| FixedHashSizeError)?;
        Self::try_from(bytes.as_slice())
    }
}

impl From<[u8; FIXED_HASH_SIZE]> for FixedHash {
    fn from(bytes: [u8; FIXED_HASH_SIZE]) -> Self {
        Self(bytes)
    }
}

impl From<FixedHash> for [u8; FIXED_HASH_SIZE] {
    fn from(hash: FixedHash) -> Self {
        hash.0
    }
}

impl TryFrom<&[u8]> for FixedHash {
    type Error = FixedHashSizeError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() != FIXED_HASH_SIZE {
            return Err(FixedHashSizeError);
        }
        let mut buf = [0u8; FIXED_HASH_SIZE];
        buf.copy_from_slice(bytes);
        Ok(Self(buf))
    }
}

impl AsRef<[u8]> for FixedHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Deref for FixedHash {
    type Target = [u8; FIXED_HASH_SIZE];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for FixedHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn increments_with_carry() {
        let mut hv = FixedHash::zero();
        hv.inc();
        assert_eq!(hv.as_slice()[31], 1);

        let mut hv = FixedHash::from([0xffu8; 32]);
        hv.inc();
        assert!(hv.is_zero());

        let mut bytes = [0u8; 32];
        bytes[31] = 0xff;
        let mut hv = FixedHash::from(bytes);
        hv.inc();
        assert_eq!(hv.as_slice()[31], 0);
        assert_eq!(hv.as_slice()[30], 1);
    }

    #[test]
    fn ordering_is_numeric() {
        let mut lo = [0u8; 32];
        lo[31] = 5;
        let mut hi = [0u8; 32];
        hi[0] = 1;
        assert!(FixedHash::from(lo) < FixedHash::from(hi));
        assert_eq!(FixedHash::from(lo).to_u256(), 5.into());
    }
}
