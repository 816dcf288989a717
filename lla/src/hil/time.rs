// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Busy-wait interface used while polling hardware status bits.

/// A calibrated busy-wait provided by the board.
///
/// Clock banks use it between two reads of a status bit (PLL lock,
/// synthesizer program handshake). It must not depend on any clock the caller
/// may be reprogramming.
pub trait Delay {
    fn delay_us(&self, us: u32);
}

/// A `Delay` that returns immediately.
///
/// Suitable for co-emulation and for in-memory register windows where the
/// status bits never change behind the driver's back.
pub struct NoDelay;

impl Delay for NoDelay {
    fn delay_us(&self, _us: u32) {}
}
