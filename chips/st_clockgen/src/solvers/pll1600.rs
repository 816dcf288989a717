// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! PLL1600: `FVCO = 2 * N * Fin / M`.

use lla::utilities::math::hz_to_khz;
use lla::ErrorCode;

use super::{bracket, Best};

pub const OUTPUT_MIN_HZ: u32 = 600_000_000;
pub const OUTPUT_MAX_HZ: u32 = 1_800_000_000;

const MDIV_MIN: u32 = 1;
const MDIV_MAX: u32 = 7;
const NDIV_MIN: u32 = 4;
const NDIV_MAX: u32 = 255;

const PFDIN_MIN_KHZ: u32 = 4_000;
const PFDIN_MAX_KHZ: u32 = 75_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pll1600Params {
    pub mdiv: u8,
    pub ndiv: u8,
}

pub fn get_params(input_hz: u32, output_hz: u32) -> Result<Pll1600Params, ErrorCode> {
    if output_hz < OUTPUT_MIN_HZ || output_hz > OUTPUT_MAX_HZ {
        return Err(ErrorCode::INVAL);
    }
    let fin = hz_to_khz(input_hz);
    let target = hz_to_khz(output_hz);
    if fin == 0 {
        return Err(ErrorCode::INVAL);
    }

    let mut best = Best::new();
    for m in MDIV_MIN..=MDIV_MAX {
        let pfdin = fin / m;
        if pfdin < PFDIN_MIN_KHZ || pfdin > PFDIN_MAX_KHZ {
            continue;
        }
        for n in bracket(u64::from(target) * u64::from(m), 2 * u64::from(fin)) {
            if n < u64::from(NDIV_MIN) || n > u64::from(NDIV_MAX) {
                continue;
            }
            let output = (2 * n * u64::from(fin) / u64::from(m)) as u32;
            let params = Pll1600Params {
                mdiv: m as u8,
                ndiv: n as u8,
            };
            if best.offer(params, output, target) {
                return Ok(params);
            }
        }
    }
    best.finish()
}

pub fn get_rate(input_hz: u32, params: &Pll1600Params) -> Result<u32, ErrorCode> {
    let (m, n) = (u32::from(params.mdiv), u32::from(params.ndiv));
    if m < MDIV_MIN || m > MDIV_MAX || n < NDIV_MIN {
        return Err(ErrorCode::INVAL);
    }
    let rate = 2 * u64::from(n) * u64::from(input_hz) / u64::from(m);
    u32::try_from(rate).map_err(|_| ErrorCode::INVAL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solvers::test_support::within_permille;

    #[test]
    fn sweep_round_trips_within_one_percent() {
        for input in [27_000_000, 30_000_000] {
            let mut output = OUTPUT_MIN_HZ;
            while output <= OUTPUT_MAX_HZ {
                let params = get_params(input, output).unwrap();
                let rate = get_rate(input, &params).unwrap();
                assert!(within_permille(rate, output, 10), "{} -> {}: {}", input, output, rate);
                output += 3_333_333;
            }
        }
    }

    #[test]
    fn phase_detector_limits_restrict_dividers() {
        // 300 MHz reference: only M >= 4 keeps the PFD input at or below 75 MHz.
        let params = get_params(300_000_000, 1_200_000_000).unwrap();
        assert_eq!(params, Pll1600Params { mdiv: 4, ndiv: 8 });
        // 3 MHz reference is below the PFD minimum whatever M.
        assert_eq!(get_params(3_000_000, 1_200_000_000), Err(ErrorCode::INVAL));
    }

    #[test]
    fn limits() {
        assert_eq!(get_params(30_000_000, 599_999_999), Err(ErrorCode::INVAL));
        assert_eq!(get_params(30_000_000, 1_800_000_001), Err(ErrorCode::INVAL));
        assert_eq!(
            get_rate(30_000_000, &Pll1600Params { mdiv: 8, ndiv: 40 }),
            Err(ErrorCode::INVAL)
        );
        assert_eq!(
            get_rate(30_000_000, &Pll1600Params { mdiv: 1, ndiv: 3 }),
            Err(ErrorCode::INVAL)
        );
    }
}
