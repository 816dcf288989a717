// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! 4FS216 frequency synthesizer channel.
//!
//! `Fout = 8 * 2^20 * Fin / (2^(sdiv + 1) * (33 * 2^15 + md * 2^15 - pe))`

use lla::ErrorCode;

use super::fsyn;

const K1: u64 = 8 << 20;
const NS: u64 = 1;
pub const SDIV_MAX: u8 = 7;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fs216Params {
    pub md: i8,
    pub pe: u16,
    pub sdiv: u8,
}

pub fn get_params(input_hz: u32, output_hz: u32) -> Result<Fs216Params, ErrorCode> {
    let split = fsyn::solve(K1, input_hz, output_hz, NS, SDIV_MAX)?;
    Ok(Fs216Params {
        md: split.md,
        pe: split.pe,
        sdiv: split.sdiv,
    })
}

pub fn get_rate(input_hz: u32, params: &Fs216Params) -> Result<u32, ErrorCode> {
    if params.sdiv > SDIV_MAX {
        return Err(ErrorCode::INVAL);
    }
    fsyn::rate(K1, input_hz, NS, params.sdiv, params.md, params.pe)
}
