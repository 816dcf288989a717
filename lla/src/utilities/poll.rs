// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Bounded busy-polling of hardware status bits.

use crate::config::CONFIG;
use crate::hil::time::Delay;
use crate::ErrorCode;

/// Poll `condition` until it holds, waiting `CONFIG.poll_delay_us` between
/// reads.
///
/// Gives up with [`ErrorCode::TIMEOUT`] after `CONFIG.poll_iterations`
/// unsuccessful reads.
pub fn poll_until<F: FnMut() -> bool>(delay: &dyn Delay, condition: F) -> Result<(), ErrorCode> {
    poll_bounded(delay, CONFIG.poll_iterations, CONFIG.poll_delay_us, condition)
}

/// [`poll_until`] with an explicit budget.
pub fn poll_bounded<F: FnMut() -> bool>(
    delay: &dyn Delay,
    iterations: u32,
    delay_us: u32,
    mut condition: F,
) -> Result<(), ErrorCode> {
    for _ in 0..iterations {
        if condition() {
            return Ok(());
        }
        delay.delay_us(delay_us);
    }
    Err(ErrorCode::TIMEOUT)
}
