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

use std::fmt;

use primitive_types::{U256, U512};
use serde::{Deserialize, Serialize};

use crate::common::FixedHash;

/// Packed log-scale difficulty target.
///
/// The packed word holds an `order` in the high bits and a `mantissa` in the low
/// [Difficulty::MANTISSA_BITS] bits; the mantissa's leading bit is implicit. The raw target value
/// is the 256-bit integer `(2^MANTISSA_BITS | mantissa) << order`, so difficulty grows
/// exponentially in `order` and linearly in `mantissa` between octaves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Difficulty {
    packed: u32,
}

impl Difficulty {
    /// Width of the stored mantissa. Byte-aligned; the target test below relies on this.
    pub const MANTISSA_BITS: u32 = 24;
    /// Largest order for which the raw value still fits in 256 bits.
    pub const MAX_ORDER: u32 = 231;
    /// The packed encoding of an unreachable target. Orders above [Difficulty::MAX_ORDER] are
    /// reserved; anything packed above this value is invalid.
    pub const INF: u32 = (Self::MAX_ORDER + 1) << Self::MANTISSA_BITS;

    const LEADING_BIT: u32 = 1 << Self::MANTISSA_BITS;

    pub fn from_packed(packed: u32) -> Self {
        Self { packed }
    }

    pub fn as_packed(&self) -> u32 {
        self.packed
    }

    /// Packs an (order, mantissa) pair. The mantissa must carry its leading bit, i.e. lie in
    /// `[2^MANTISSA_BITS, 2^(MANTISSA_BITS+1))`. Orders beyond [Difficulty::MAX_ORDER] collapse
    /// to the infinite target.
    pub fn pack(order: u32, mantissa: u32) -> Self {
        if order <= Self::MAX_ORDER {
            debug_assert_eq!(mantissa >> Self::MANTISSA_BITS, 1);
            Self {
                packed: (mantissa & (Self::LEADING_BIT - 1)) | (order << Self::MANTISSA_BITS),
            }
        } else {
            Self { packed: Self::INF }
        }
    }

    /// Splits the packed word back into (order, mantissa), restoring the implicit leading bit.
    pub fn unpack(&self) -> (u32, u32) {
        let order = self.packed >> Self::MANTISSA_BITS;
        let mantissa = Self::LEADING_BIT | (self.packed & (Self::LEADING_BIT - 1));
        (order, mantissa)
    }

    /// The raw 256-bit difficulty value, or all-ones for the infinite target.
    pub fn unpack_raw(&self) -> U256 {
        if self.packed < Self::INF {
            let (order, mantissa) = self.unpack();
            U256::from(mantissa) << order
        } else {
            U256::MAX
        }
    }

    /// Adds the raw difficulty to a cumulative chain-work value.
    pub fn add_to(&self, work: &mut U256) {
        *work = work.overflowing_add(self.unpack_raw()).0;
    }

    /// `work − raw`, wrapping. Applied to a header's cumulative chain work this yields the lower
    /// bound of the work range the header covers.
    pub fn subtracted_from(&self, work: &U256) -> U256 {
        work.overflowing_sub(self.unpack_raw()).0
    }

    /// The standard multiply-and-check-high-bits hash target test: the target is reached iff
    /// `hv · raw` has its top `256 − MANTISSA_BITS` bits clear.
    pub fn is_target_reached(&self, hv: &FixedHash) -> bool {
        if self.packed > Self::INF {
            return false;
        }
        let a = U512::from(hv.to_u256());
        let b = U512::from(self.unpack_raw());
        let product = a * b;
        (product >> (256 + Self::MANTISSA_BITS as usize)).is_zero()
    }

    /// Retargets in place so that a cycle that actually took `actual_s` seconds would have taken
    /// `target_s`. The order may move by at most `max_order_change` octaves per call; the
    /// remaining ratio (now within a factor of two) is folded into the mantissa. Underflow clamps
    /// to the minimum target, overflow to the infinite one.
    pub fn adjust(&mut self, actual_s: u32, target_s: u32, max_order_change: u32) {
        if actual_s == 0 && target_s == 0 {
            return;
        }

        let (order, mantissa) = self.unpack();
        let mut order = i64::from(order);
        let mut mantissa = mantissa;
        Self::adjust_order_and_mantissa(actual_s, target_s, max_order_change, &mut order, &mut mantissa);

        if order < 0 {
            self.packed = 0;
        } else if order > i64::from(Self::MAX_ORDER) {
            self.packed = Self::INF;
        } else {
            *self = Self::pack(order as u32, mantissa);
        }
    }

    fn adjust_order_and_mantissa(
        actual_s: u32,
        target_s: u32,
        max_order_change: u32,
        order: &mut i64,
        mantissa: &mut u32,
    ) {
        let increase = actual_s < target_s;
        let mut src = u64::from(actual_s);
        let trg = u64::from(target_s);

        // Rough pass: move whole octaves until src and trg are within a factor of two of each
        // other, or a bound is hit. Hitting a bound leaves the order out of range, which the
        // caller clamps to the zero or infinite target.
        let mut i = 0;
        loop {
            if i == max_order_change {
                return;
            }

            if increase {
                let adj = src << 1;
                if adj > trg {
                    break;
                }
                *order += 1;
                if *order > i64::from(Self::MAX_ORDER) {
                    return;
                }
                src = adj;
            } else {
                let adj = src >> 1;
                if adj < trg {
                    break;
                }
                if *order == 0 {
                    *order = -1;
                    return;
                }
                *order -= 1;
                src = adj;
            }
            i += 1;
        }

        // src/trg now lie within a factor of two; rescale the mantissa and renormalize its
        // leading bit.
        let val = trg * u64::from(*mantissa) / src;
        *mantissa = val as u32;

        let leading = *mantissa >> Self::MANTISSA_BITS;
        if increase {
            debug_assert!(leading >= 1 && leading <= 2);
            if leading > 1 {
                *order += 1;
                *mantissa >>= 1;
            }
        } else {
            debug_assert!(leading <= 1);
            if leading == 0 {
                *order -= 1;
                *mantissa <<= 1;
                debug_assert_eq!(*mantissa >> Self::MANTISSA_BITS, 1);
            }
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let order = self.packed >> Self::MANTISSA_BITS;
        let mantissa = self.packed & (Self::LEADING_BIT - 1);
        write!(f, "{:x}-{:x}", order, mantissa)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_of(order: u32) -> Difficulty {
        Difficulty::pack(order, Difficulty::LEADING_BIT)
    }

    #[test]
    fn pack_unpack_round_trip() {
        for order in [0, 1, 24, 100, Difficulty::MAX_ORDER] {
            for mantissa in [
                Difficulty::LEADING_BIT,
                Difficulty::LEADING_BIT + 1,
                Difficulty::LEADING_BIT | 0x00ab_cdef,
                (Difficulty::LEADING_BIT << 1) - 1,
            ] {
                let d = Difficulty::pack(order, mantissa);
                assert_eq!(d.unpack(), (order, mantissa));
            }
        }
    }

    #[test]
    fn orders_beyond_max_collapse_to_inf() {
        let d = Difficulty::pack(Difficulty::MAX_ORDER + 1, Difficulty::LEADING_BIT);
        assert_eq!(d.as_packed(), Difficulty::INF);
        assert_eq!(d.unpack_raw(), U256::MAX);
    }

    #[test]
    fn raw_is_mantissa_shifted() {
        let d = Difficulty::pack(100, Difficulty::LEADING_BIT);
        assert_eq!(d.unpack_raw(), U256::from(1u64) << 124);

        let d = Difficulty::from_packed(0);
        assert_eq!(d.unpack_raw(), U256::from(1u64) << 24);
    }

    #[test]
    fn adjust_halved_interval_doubles_raw() {
        // Raw 2^100: order 76 with a bare leading mantissa bit.
        let mut d = raw_of(76);
        assert_eq!(d.unpack_raw(), U256::from(1u64) << 100);

        d.adjust(600, 1200, 4);
        assert_eq!(d.unpack_raw(), U256::from(1u64) << 101);
    }

    #[test]
    fn adjust_matches_ratio_within_one_ulp() {
        // actual = k * target for k in [0.5, 2]: the new raw value must be old / k, within one
        // mantissa ULP.
        let target = 1_000_000u32;
        for actual in [500_000u32, 750_000, 1_000_000, 1_300_000, 2_000_000] {
            let mut d = Difficulty::pack(80, Difficulty::LEADING_BIT | 0x123456);
            let before = d.unpack_raw();
            d.adjust(actual, target, 10);
            let after = d.unpack_raw();

            let expected = before * U256::from(target) / U256::from(actual);
            let ulp = U256::from(1u64) << (d.unpack().0);
            let diff = if after > expected { after - expected } else { expected - after };
            assert!(diff <= ulp, "actual={}: diff {} exceeds ulp {}", actual, diff, ulp);
        }
    }

    #[test]
    fn adjust_is_capped_by_order_change() {
        let mut d = raw_of(76);
        // 16x too fast, but order may only move 2 octaves.
        d.adjust(100, 1600, 2);
        assert_eq!(d.unpack().0, 78);
    }

    #[test]
    fn adjust_clamps_at_the_bottom() {
        let mut d = raw_of(0);
        d.adjust(4000, 1000, 10);
        assert_eq!(d.as_packed(), 0);
    }

    #[test]
    fn adjust_clamps_at_the_top() {
        let mut d = raw_of(Difficulty::MAX_ORDER);
        d.adjust(100, 1000, 10);
        assert_eq!(d.as_packed(), Difficulty::INF);
    }

    #[test]
    fn degenerate_intervals_leave_difficulty_unchanged() {
        let mut d = raw_of(10);
        d.adjust(0, 0, 4);
        assert_eq!(d, raw_of(10));
    }

    #[test]
    fn zero_actual_interval_raises_difficulty() {
        let mut d = raw_of(10);
        d.adjust(0, 1000, 4);
        assert_eq!(d.unpack().0, 14);
    }

    #[test]
    fn target_test_tracks_difficulty() {
        // Raw difficulty 2^124 (order 100): hashes below 2^(256+24-124) = 2^156 pass.
        let d = raw_of(100);

        let mut hv = [0u8; 32];
        hv[12] = 0x08; // 2^155
        assert!(d.is_target_reached(&hv.into()));

        let mut hv = [0u8; 32];
        hv[12] = 0x10; // 2^156
        assert!(!d.is_target_reached(&hv.into()));
    }

    #[test]
    fn target_test_consistency_after_adjust() {
        let mut d = raw_of(100);
        let mut hv = [0u8; 32];
        hv[12] = 0x08; // 2^155 passes at order 100, fails once difficulty doubles
        assert!(d.is_target_reached(&hv.into()));
        d.adjust(500, 1000, 4);
        assert!(!d.is_target_reached(&hv.into()));
    }

    #[test]
    fn invalid_packed_values_never_reach_target() {
        let d = Difficulty::from_packed(Difficulty::INF + 1);
        assert!(!d.is_target_reached(&FixedHash::zero()));
    }
}
