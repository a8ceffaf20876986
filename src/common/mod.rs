// Copyright 2024 The Glimmer Project
// SPDX-License-Identifier: BSD-3-Clause

//! Small shared primitives used across the consensus core.

mod fixed_hash;

pub use fixed_hash::{FixedHash, FixedHashSizeError};

/// The height axis is 64-bit; the all-ones value is unreachable and doubles as "no limit".
pub type Height = u64;

/// Heights saturate at the all-ones value instead of wrapping.
pub const MAX_HEIGHT: Height = u64::MAX;

/// Adds `val` to `trg`, saturating at [MAX_HEIGHT].
pub fn height_add(trg: Height, val: Height) -> Height {
    trg.saturating_add(val)
}
