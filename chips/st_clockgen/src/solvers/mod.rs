// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Frequency solvers.
//!
//! Every family exposes the same pair of pure functions:
//!
//! - `get_params(input_hz, output_hz)` finds register fields producing the
//!   closest achievable output, or fails with [`ErrorCode::INVAL`] if the
//!   output is outside the family envelope or no field combination meets the
//!   hardware constraints.
//! - `get_rate(input_hz, &params)` evaluates the family equation exactly. It
//!   fails with [`ErrorCode::INVAL`] for fields the hardware cannot hold.
//!
//! PLL families search the divider space in kHz and keep the first candidate
//! of smallest deviation. Synthesizer families invert their equation in closed
//! form.

use lla::ErrorCode;

pub mod fs216;
pub mod fs660;
pub mod pll1200;
pub mod pll1600;
pub mod pll3200;
pub mod pll800;

mod fsyn;

/// Best candidate of a divider search.
struct Best<P> {
    params: Option<P>,
    deviation: u32,
}

impl<P: Copy> Best<P> {
    const fn new() -> Self {
        Best {
            params: None,
            deviation: u32::MAX,
        }
    }

    /// Keep `params` if it beats every earlier candidate. Ties keep the
    /// earlier one. Returns `true` on an exact hit.
    fn offer(&mut self, params: P, output_khz: u32, target_khz: u32) -> bool {
        let deviation = output_khz.abs_diff(target_khz);
        if deviation < self.deviation {
            self.deviation = deviation;
            self.params = Some(params);
        }
        deviation == 0
    }

    fn finish(self) -> Result<P, ErrorCode> {
        self.params.ok_or(ErrorCode::INVAL)
    }
}

/// Multiplier candidates bracketing `ideal`: its floor and the next integer.
fn bracket(numerator: u64, denominator: u64) -> [u64; 2] {
    let floor = numerator / denominator;
    [floor, floor + 1]
}


#[cfg(test)]
mod tests {
    use super::{bracket, Best};
    use lla::ErrorCode;

    #[test]
    fn best_keeps_first_of_equal_deviation() {
        let mut best = Best::new();
        assert!(!best.offer(1u8, 95, 100));
        assert!(!best.offer(2u8, 105, 100));
        assert!(!best.offer(3u8, 98, 100));
        assert_eq!(best.finish(), Ok(3));

        let mut best = Best::new();
        assert!(best.offer(7u8, 100, 100));
        assert_eq!(best.finish(), Ok(7));

        assert_eq!(Best::<u8>::new().finish(), Err(ErrorCode::INVAL));
    }

    #[test]
    fn bracket_is_floor_and_next() {
        assert_eq!(bracket(99, 10), [9, 10]);
        assert_eq!(bracket(100, 10), [10, 11]);
    }
}
