// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Interface for clock consumers.
//!
//! Peripheral drivers (audio players, converters, ...) never touch clock
//! registers. They hold a handle implementing [`Clock`], obtained from the
//! board's clock tree, and only ever read the rate, request a new rate, or
//! gate the clock.

use crate::ErrorCode;

/// Operations a consumer may perform on an already registered clock.
pub trait Clock {
    /// Name of the clock, for diagnostics.
    fn name(&self) -> &'static str;

    /// Cached rate in Hz. `0` means the clock is stopped or has no source.
    fn rate(&self) -> u32;

    /// Recompute the rate from hardware state and return it.
    fn recalc(&self) -> Result<u32, ErrorCode>;

    /// Program the closest achievable rate to `hz`.
    ///
    /// On success returns the rate actually reached, which generally differs
    /// from `hz` by the resolution of the underlying divider or PLL.
    fn set_rate(&self, hz: u32) -> Result<u32, ErrorCode>;

    fn enable(&self) -> Result<(), ErrorCode>;

    /// Gate the clock. Clocks that must stay on report success without
    /// stopping.
    fn disable(&self) -> Result<(), ErrorCode>;

    fn is_enabled(&self) -> bool;
}
