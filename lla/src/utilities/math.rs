// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Helper functions for integer frequency arithmetic.

/// Divide `num` by `den`, rounding to the nearest integer (halves round up).
///
/// Returns `None` when `den` is zero.
pub fn div_round_closest(num: u64, den: u64) -> Option<u64> {
    if den == 0 {
        return None;
    }
    Some((num + den / 2) / den)
}

/// Divide `num` by `den`, rounding up. Returns `None` when `den` is zero.
pub fn div_round_up(num: u64, den: u64) -> Option<u64> {
    if den == 0 {
        return None;
    }
    Some(num.div_ceil(den))
}

/// Convert a frequency in Hz to kHz, truncating.
pub const fn hz_to_khz(hz: u32) -> u32 {
    hz / 1000
}
