// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! 4FS432 (FS660) frequency synthesizer.
//!
//! The analog stage multiplies the reference into a 384-660 MHz VCO:
//!
//! ```text
//! FVCO = Fin * (ndiv + 16)
//! ```
//!
//! Each digital channel then divides the VCO:
//!
//! ```text
//! Fout = 2^20 * FVCO / (ns * 2^(sdiv + 1) * (33 * 2^15 + md * 2^15 - pe))
//! ```
//!
//! with `ns` equal to 1 when the `nsdiv` field is 1, and 3 when it is 0.

use lla::ErrorCode;

use super::fsyn;

const K1: u64 = 1 << 20;
pub const SDIV_MAX: u8 = 15;

pub const VCO_MIN_HZ: u32 = 384_000_000;
pub const VCO_MAX_HZ: u32 = 660_000_000;
pub const VCO_INPUT_MAX_HZ: u32 = 40_000_000;
const VCO_NDIV_OFFSET: u32 = 16;
const VCO_NDIV_MAX: u8 = 15;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fs660Params {
    pub md: i8,
    pub pe: u16,
    pub sdiv: u8,
    pub nsdiv: u8,
}

fn ns_ratio(nsdiv: u8) -> Result<u64, ErrorCode> {
    match nsdiv {
        1 => Ok(1),
        0 => Ok(3),
        _ => Err(ErrorCode::INVAL),
    }
}

/// Channel fields for `output_hz` from a VCO at `input_hz`.
///
/// The divide-by-one pre-divider is preferred; divide-by-three is used only
/// when the output is too low for it.
pub fn get_params(input_hz: u32, output_hz: u32) -> Result<Fs660Params, ErrorCode> {
    for nsdiv in [1, 0] {
        if let Ok(split) = fsyn::solve(K1, input_hz, output_hz, ns_ratio(nsdiv)?, SDIV_MAX) {
            return Ok(Fs660Params {
                md: split.md,
                pe: split.pe,
                sdiv: split.sdiv,
                nsdiv,
            });
        }
    }
    Err(ErrorCode::INVAL)
}

pub fn get_rate(input_hz: u32, params: &Fs660Params) -> Result<u32, ErrorCode> {
    if params.sdiv > SDIV_MAX {
        return Err(ErrorCode::INVAL);
    }
    let ns = ns_ratio(params.nsdiv)?;
    fsyn::rate(K1, input_hz, ns, params.sdiv, params.md, params.pe)
}

/// First field combination producing exactly `output_hz`, if any.
///
/// Walks nsdiv, sdiv, md and pe in that order, skipping every block whose rate
/// range cannot contain the output. Far too slow for run time; meant for
/// computing board tables.
pub fn get_params_exact(input_hz: u32, output_hz: u32) -> Option<Fs660Params> {
    for nsdiv in [1, 0] {
        let ns = ns_ratio(nsdiv).ok()?;
        for sdiv in 0..=SDIV_MAX {
            let (low, high) = fsyn::span(K1, input_hz, ns, sdiv);
            if output_hz < low || output_hz > high {
                continue;
            }
            for md in fsyn::MD_MIN..=fsyn::MD_MAX {
                let fastest = fsyn::rate(K1, input_hz, ns, sdiv, md, fsyn::PE_MAX);
                let slowest = fsyn::rate(K1, input_hz, ns, sdiv, md, 0);
                match (slowest, fastest) {
                    (Ok(slowest), Ok(fastest)) if output_hz >= slowest && output_hz <= fastest => {}
                    _ => continue,
                }
                for pe in 0..=fsyn::PE_MAX {
                    if fsyn::rate(K1, input_hz, ns, sdiv, md, pe) == Ok(output_hz) {
                        return Some(Fs660Params {
                            md,
                            pe,
                            sdiv,
                            nsdiv,
                        });
                    }
                }
            }
        }
    }
    None
}

/// VCO multiplier field for `output_hz` from the reference at `input_hz`.
///
/// Multipliers below 16 are raised to 16.
pub fn vco_get_params(input_hz: u32, output_hz: u32) -> Result<u8, ErrorCode> {
    if output_hz < VCO_MIN_HZ || output_hz > VCO_MAX_HZ {
        return Err(ErrorCode::INVAL);
    }
    if input_hz == 0 || input_hz > VCO_INPUT_MAX_HZ {
        return Err(ErrorCode::INVAL);
    }
    let n = (output_hz / input_hz).max(VCO_NDIV_OFFSET);
    let ndiv = n - VCO_NDIV_OFFSET;
    if ndiv > u32::from(VCO_NDIV_MAX) {
        return Err(ErrorCode::INVAL);
    }
    Ok(ndiv as u8)
}

pub fn vco_get_rate(input_hz: u32, ndiv: u8) -> Result<u32, ErrorCode> {
    if ndiv > VCO_NDIV_MAX {
        return Err(ErrorCode::INVAL);
    }
    let rate = u64::from(input_hz) * u64::from(u32::from(ndiv) + VCO_NDIV_OFFSET);
    u32::try_from(rate).map_err(|_| ErrorCode::INVAL)
}
