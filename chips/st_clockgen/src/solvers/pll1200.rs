// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! PLL1200: `Fout = 2 * LDF * Fin / IDF`, before the output dividers.

use lla::utilities::math::hz_to_khz;
use lla::ErrorCode;

use super::{bracket, Best};

pub const OUTPUT_MIN_HZ: u32 = 9_520_000;
pub const OUTPUT_MAX_HZ: u32 = 1_200_000_000;

const IDF_MIN: u32 = 1;
const IDF_MAX: u32 = 7;
const LDF_MIN: u32 = 8;
const LDF_MAX: u32 = 127;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pll1200Params {
    pub idf: u8,
    pub ldf: u8,
}

pub fn get_params(input_hz: u32, output_hz: u32) -> Result<Pll1200Params, ErrorCode> {
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
        for ldf in bracket(u64::from(target) * u64::from(idf), 2 * u64::from(fin)) {
            if ldf < u64::from(LDF_MIN) || ldf > u64::from(LDF_MAX) {
                continue;
            }
            let output = (2 * ldf * u64::from(fin) / u64::from(idf)) as u32;
            let params = Pll1200Params {
                idf: idf as u8,
                ldf: ldf as u8,
            };
            if best.offer(params, output, target) {
                return Ok(params);
            }
        }
    }
    best.finish()
}

pub fn get_rate(input_hz: u32, params: &Pll1200Params) -> Result<u32, ErrorCode> {
    let (idf, ldf) = (u32::from(params.idf), u32::from(params.ldf));
    if idf < IDF_MIN || idf > IDF_MAX || ldf < LDF_MIN || ldf > LDF_MAX {
        return Err(ErrorCode::INVAL);
    }
    let rate = 2 * u64::from(ldf) * u64::from(input_hz) / u64::from(idf);
    u32::try_from(rate).map_err(|_| ErrorCode::INVAL)
}
