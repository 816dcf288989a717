// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! PLL800: `Fout = 2 * N * Fin / (M * 2^P)`.

use lla::utilities::math::hz_to_khz;
use lla::ErrorCode;

use super::{bracket, Best};

pub const OUTPUT_MIN_HZ: u32 = 6_250_000;
pub const OUTPUT_MAX_HZ: u32 = 800_000_000;

const MDIV_MIN: u32 = 1;
const MDIV_MAX: u32 = 255;
const NDIV_MIN: u32 = 3;
const NDIV_MAX: u32 = 255;
const PDIV_MAX: u32 = 5;

// Phase detector input and VCO limits, in kHz.
const PFDIN_MIN_KHZ: u32 = 1_000;
const PFDIN_MAX_KHZ: u32 = 50_000;
const FVCO_MIN_KHZ: u32 = 200_000;
const FVCO_MAX_KHZ: u32 = 800_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pll800Params {
    pub mdiv: u8,
    pub ndiv: u8,
    pub pdiv: u8,
}

/// Closest `(M, N, P)` for `output_hz`.
///
/// P is tried from 5 down to 0 and M upwards, so among equally close
/// candidates the smallest M with the largest P wins.
pub fn get_params(input_hz: u32, output_hz: u32) -> Result<Pll800Params, ErrorCode> {
    if output_hz < OUTPUT_MIN_HZ || output_hz > OUTPUT_MAX_HZ {
        return Err(ErrorCode::INVAL);
    }
    let fin = hz_to_khz(input_hz);
    let target = hz_to_khz(output_hz);
    if fin == 0 {
        return Err(ErrorCode::INVAL);
    }

    let mut best = Best::new();
    for p in (0..=PDIV_MAX).rev() {
        for m in MDIV_MIN..=MDIV_MAX {
            let pfdin = fin / m;
            if pfdin < PFDIN_MIN_KHZ {
                break;
            }
            if pfdin > PFDIN_MAX_KHZ {
                continue;
            }
            let divider = u64::from(m) << p;
            for n in bracket(u64::from(target) * divider, 2 * u64::from(fin)) {
                if n < u64::from(NDIV_MIN) || n > u64::from(NDIV_MAX) {
                    continue;
                }
                let fvco = 2 * n * u64::from(fin) / u64::from(m);
                if fvco < u64::from(FVCO_MIN_KHZ) || fvco > u64::from(FVCO_MAX_KHZ) {
                    continue;
                }
                let output = (2 * n * u64::from(fin) / divider) as u32;
                let params = Pll800Params {
                    mdiv: m as u8,
                    ndiv: n as u8,
                    pdiv: p as u8,
                };
                if best.offer(params, output, target) {
                    return Ok(params);
                }
            }
        }
    }
    best.finish()
}

pub fn get_rate(input_hz: u32, params: &Pll800Params) -> Result<u32, ErrorCode> {
    let (m, n, p) = (
        u32::from(params.mdiv),
        u32::from(params.ndiv),
        u32::from(params.pdiv),
    );
    if m < MDIV_MIN || n < NDIV_MIN || p > PDIV_MAX {
        return Err(ErrorCode::INVAL);
    }
    let rate = 2 * u64::from(n) * u64::from(input_hz) / (u64::from(m) << p);
    u32::try_from(rate).map_err(|_| ErrorCode::INVAL)
}
