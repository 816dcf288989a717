// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! PLL3200: `FVCOby2 = 2 * NDIV * Fin / IDF`.
//!
//! The charge pump current has to follow the loop multiplier; it is derived
//! from NDIV and returned with the dividers.

use lla::utilities::math::hz_to_khz;
use lla::ErrorCode;

use super::{bracket, Best};

pub const OUTPUT_MIN_HZ: u32 = 800_000_000;
pub const OUTPUT_MAX_HZ: u32 = 1_600_000_000;

const IDF_MIN: u32 = 1;
const IDF_MAX: u32 = 7;
const NDIV_MIN: u32 = 8;
const NDIV_MAX: u32 = 200;

/// Highest NDIV served by charge pump settings 6, 7, 8 and so on.
const CP_TABLE: [u32; 19] = [
    48, 56, 64, 72, 80, 88, 96, 104, 112, 120, 128, 136, 144, 152, 160, 168, 176, 184, 192,
];
const CP_BASE: u8 = 6;
const CP_MAX: u8 = 25;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pll3200Params {
    pub idf: u8,
    pub ndiv: u8,
    pub cp: u8,
}

/// Charge pump setting for `ndiv`.
pub fn charge_pump(ndiv: u8) -> u8 {
    let below = CP_TABLE
        .iter()
        .filter(|&&limit| limit < u32::from(ndiv))
        .count() as u8;
    (CP_BASE + below).min(CP_MAX)
}

pub fn get_params(input_hz: u32, output_hz: u32) -> Result<Pll3200Params, ErrorCode> {
    if output_hz < OUTPUT_MIN_HZ || output_hz > OUTPUT_MAX_HZ {
        return Err(ErrorCode::INVAL);
    }
    let fin = hz_to_khz(input_hz);
    let target = hz_to_khz(output_hz);
    if fin == 0 {
        return Err(ErrorCode::INVAL);
    }

    let mut best = Best::new();
    for idf in IDF_MIN..=IDF_MAX {
        for ndiv in bracket(u64::from(target) * u64::from(idf), 2 * u64::from(fin)) {
            if ndiv < u64::from(NDIV_MIN) || ndiv > u64::from(NDIV_MAX) {
                continue;
            }
            let output = (2 * ndiv * u64::from(fin) / u64::from(idf)) as u32;
            let params = Pll3200Params {
                idf: idf as u8,
                ndiv: ndiv as u8,
                cp: charge_pump(ndiv as u8),
            };
            if best.offer(params, output, target) {
                return Ok(params);
            }
        }
    }
    best.finish()
}

pub fn get_rate(input_hz: u32, params: &Pll3200Params) -> Result<u32, ErrorCode> {
    let (idf, ndiv) = (u32::from(params.idf), u32::from(params.ndiv));
    if idf < IDF_MIN || idf > IDF_MAX || ndiv < NDIV_MIN || ndiv > NDIV_MAX {
        return Err(ErrorCode::INVAL);
    }
    let rate = 2 * u64::from(ndiv) * u64::from(input_hz) / u64::from(idf);
    u32::try_from(rate).map_err(|_| ErrorCode::INVAL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solvers::test_support::within_permille;

    #[test]
    fn charge_pump_follows_table() {
        assert_eq!(charge_pump(8), 6);
        assert_eq!(charge_pump(48), 6);
        assert_eq!(charge_pump(49), 7);
        assert_eq!(charge_pump(56), 7);
        assert_eq!(charge_pump(57), 8);
        assert_eq!(charge_pump(192), 24);
        assert_eq!(charge_pump(193), 25);
        assert_eq!(charge_pump(200), 25);
    }

    #[test]
    fn sweep_round_trips_within_one_percent() {
        for input in [27_000_000, 30_000_000] {
            let mut output = OUTPUT_MIN_HZ;
            while output <= OUTPUT_MAX_HZ {
                let params = get_params(input, output).unwrap();
                assert_eq!(params.cp, charge_pump(params.ndiv));
                let rate = get_rate(input, &params).unwrap();
                assert!(within_permille(rate, output, 10), "{} -> {}: {}", input, output, rate);
                output += 3_333_333;
            }
        }
    }

    #[test]
    fn exact_800_mhz() {
        assert_eq!(
            get_params(30_000_000, 800_000_000),
            Ok(Pll3200Params {
                idf: 3,
                ndiv: 40,
                cp: 6
            })
        );
    }

    #[test]
    fn limits() {
        assert_eq!(get_params(30_000_000, 799_999_999), Err(ErrorCode::INVAL));
        assert_eq!(get_params(30_000_000, 1_600_000_001), Err(ErrorCode::INVAL));
        let params = Pll3200Params {
            idf: 1,
            ndiv: 201,
            cp: 25,
        };
        assert_eq!(get_rate(30_000_000, &params), Err(ErrorCode::INVAL));
    }
}
