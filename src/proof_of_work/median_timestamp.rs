// Copyright 2024 The Glimmer Project
// SPDX-License-Identifier: BSD-3-Clause

use log::*;
use tari_utilities::epoch_time::EpochTime;

pub const LOG_TARGET: &str = "c::pow::median_timestamp";

/// Returns the median timestamp for the provided header set.
pub fn get_median_timestamp(mut timestamps: Vec<EpochTime>) -> Option<EpochTime> {
    if timestamps.is_empty() {
        return None;
    }
    timestamps.sort();
    let mid_index = timestamps.len() / 2;
    let median_timestamp = if timestamps.len() % 2 == 0 {
        (timestamps[mid_index - 1] + timestamps[mid_index]) / 2
    } else {
        timestamps[mid_index]
    };
    trace!(target: LOG_TARGET, "Median timestamp: {}", median_timestamp);
    Some(median_timestamp)
}

#[cfg(test)]
mod test {
    use super::*;

    fn epochs(v: &[u64]) -> Vec<EpochTime> {
        v.iter().map(|t| EpochTime::from(*t)).collect()
    }

    #[test]
    fn empty_set_has_no_median() {
        assert!(get_median_timestamp(vec![]).is_none());
    }

    #[test]
    fn odd_and_even_windows() {
        assert_eq!(get_median_timestamp(epochs(&[9, 3, 5])).unwrap(), EpochTime::from(5));
        assert_eq!(
            get_median_timestamp(epochs(&[4, 2, 8, 6])).unwrap(),
            EpochTime::from(5)
        );
    }

    #[test]
    fn single_timestamp_is_its_own_median() {
        assert_eq!(get_median_timestamp(epochs(&[42])).unwrap(), EpochTime::from(42));
    }
}
