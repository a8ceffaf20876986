// Copyright 2024 The Glimmer Project
// SPDX-License-Identifier: BSD-3-Clause

use serde::{Deserialize, Serialize};

use crate::common::{Height, MAX_HEIGHT};

/// A closed interval on the height axis. Kernels carry one to restrict the heights at which they
/// may be included; a transaction's permitted window is the intersection of its kernels' ranges.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeightRange {
    pub min: Height,
    pub max: Height,
}

impl HeightRange {
    pub fn new(min: Height, max: Height) -> Self {
        Self { min, max }
    }

    /// The unbounded range.
    pub fn reset(&mut self) {
        self.min = 0;
        self.max = MAX_HEIGHT;
    }

    pub fn intersect(&mut self, other: &HeightRange) {
        self.min = self.min.max(other.min);
        self.max = self.max.min(other.max);
    }

    /// The range is empty iff the endpoints have crossed.
    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }

    pub fn is_in_range(&self, h: Height) -> bool {
        // Wrapping keeps heights below `min` out: they wrap to huge offsets.
        h.wrapping_sub(self.min) <= self.max.wrapping_sub(self.min)
    }

    /// `other` fully contains `self`.
    pub fn is_contained_by(&self, other: &HeightRange) -> bool {
        other.min <= self.min && other.max >= self.max
    }
}

impl Default for HeightRange {
    fn default() -> Self {
        Self {
            min: 0,
            max: MAX_HEIGHT,
        }
    }
}
