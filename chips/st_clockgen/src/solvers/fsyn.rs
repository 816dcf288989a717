// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Equation shared by the digital stages of the 4FS216 and 4FS432
//! synthesizers:
//!
//! ```text
//! Fout = K1 * Fin / (ns * 2^(sdiv + 1) * (33 * 2^15 + md * 2^15 - pe))
//! ```
//!
//! The last factor, the fractional divider `D`, ranges over
//! `[2^19 + 1, 2^20]` for md in `-16..=-1` and pe in `0..=32767`.

use lla::utilities::math::div_round_up;
use lla::ErrorCode;

pub(super) const MD_MIN: i8 = -16;
pub(super) const MD_MAX: i8 = -1;
pub(super) const PE_MAX: u16 = 32767;

const PE_SPAN: u64 = 1 << 15;
const D_MIN: u64 = 1 << 19;
const D_MAX: u64 = 1 << 20;

/// Fractional divider fields and the output divider exponent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) struct Split {
    pub md: i8,
    pub pe: u16,
    pub sdiv: u8,
}

/// Fractional divider `D` encoded by `md` and `pe`.
pub(super) fn divider(md: i8, pe: u16) -> Result<u64, ErrorCode> {
    if md < MD_MIN || md > MD_MAX || pe > PE_MAX {
        return Err(ErrorCode::INVAL);
    }
    Ok((33 + md as i64) as u64 * PE_SPAN - u64::from(pe))
}

/// Evaluate the equation. `ns` is the pre-divider ratio, not its register
/// encoding.
pub(super) fn rate(
    k1: u64,
    input_hz: u32,
    ns: u64,
    sdiv: u8,
    md: i8,
    pe: u16,
) -> Result<u32, ErrorCode> {
    let d = divider(md, pe)?;
    let den = u128::from(ns) * (1u128 << (sdiv + 1)) * u128::from(d);
    let rate = u128::from(k1) * u128::from(input_hz) / den;
    u32::try_from(rate).map_err(|_| ErrorCode::INVAL)
}

/// Closed-form inversion for a fixed `ns`.
///
/// Picks the largest `sdiv` whose ideal divider is still at least 2^19,
/// rounds the divider to the nearest integer and splits it into md and pe.
pub(super) fn solve(
    k1: u64,
    input_hz: u32,
    output_hz: u32,
    ns: u64,
    sdiv_max: u8,
) -> Result<Split, ErrorCode> {
    if input_hz == 0 || output_hz == 0 {
        return Err(ErrorCode::INVAL);
    }
    let num = u128::from(k1) * u128::from(input_hz);
    for sdiv in (0..=sdiv_max).rev() {
        let den = u128::from(ns) * (1u128 << (sdiv + 1)) * u128::from(output_hz);
        if num < u128::from(D_MIN) * den {
            continue;
        }
        let d = num
            .checked_add(den / 2)
            .map(|n| n / den)
            .and_then(|d| u64::try_from(d).ok())
            .ok_or(ErrorCode::INVAL)?;
        if d < D_MIN || d > D_MAX {
            // Only possible at the largest sdiv: output below the envelope.
            return Err(ErrorCode::INVAL);
        }
        let (md, pe) = split(d)?;
        return Ok(Split { md, pe, sdiv });
    }
    // Output above the envelope.
    Err(ErrorCode::INVAL)
}

/// Split `D` into `md` and `pe`.
///
/// `D = 2^19` would need md = -17, which the 5-bit md field cannot hold; it is
/// replaced by the neighbouring `D = 2^19 + 1`.
fn split(d: u64) -> Result<(i8, u16), ErrorCode> {
    if d == D_MIN {
        return Ok((MD_MIN, PE_MAX));
    }
    let q = div_round_up(d, PE_SPAN).ok_or(ErrorCode::INVAL)?;
    let md = q as i64 - 33;
    let pe = q * PE_SPAN - d;
    Ok((md as i8, pe as u16))
}

/// Range of outputs reachable with `ns` and `sdiv`, as `(min, max)`.
pub(super) fn span(k1: u64, input_hz: u32, ns: u64, sdiv: u8) -> (u32, u32) {
    let num = u128::from(k1) * u128::from(input_hz);
    let den = u128::from(ns) * (1u128 << (sdiv + 1));
    let min = num / (den * u128::from(D_MAX));
    let max = num / (den * u128::from(D_MIN + 1));
    (
        u32::try_from(min).unwrap_or(u32::MAX),
        u32::try_from(max).unwrap_or(u32::MAX),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn divider_range() {
        assert_eq!(divider(-1, 0), Ok(D_MAX));
        assert_eq!(divider(-16, 32767), Ok(D_MIN + 1));
        assert_eq!(divider(-17, 0), Err(ErrorCode::INVAL));
        assert_eq!(divider(0, 0), Err(ErrorCode::INVAL));
        assert_eq!(divider(-1, 32768), Err(ErrorCode::INVAL));
    }

    #[test]
    fn split_inverts_divider() {
        for d in [D_MIN + 1, D_MIN + 12_345, 700_000, 17 * PE_SPAN, D_MAX - 1, D_MAX] {
            let (md, pe) = split(d).unwrap();
            assert_eq!(divider(md, pe), Ok(d));
        }
        assert_eq!(split(D_MIN), Ok((-16, 32767)));
    }
}
