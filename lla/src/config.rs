// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Data structure for storing compile-time configuration options of the LLA.
//!
//! Configuration is a `const` object rather than a scattering of `#[cfg]`
//! attributes: every code path is type-checked whatever the configuration,
//! and the compiler folds the constants away so a disabled option costs
//! nothing in the resulting binary.
//!
//! Run-time choices (which [`Backend`](crate::clock::Backend) a bank uses,
//! which [`Delay`](crate::hil::time::Delay) a poll spins on) are passed to
//! constructors instead.

/// Data structure holding compile-time configuration options.
///
/// To change the configuration, modify the relevant values in the `CONFIG`
/// constant object defined at the end of this file.
pub struct Config {
    /// Whether every clock tree operation is traced to the debug output.
    ///
    /// If enabled, `init`, `set_rate`, `set_parent`, `enable` and `disable`
    /// print the node name and the resulting rate.
    pub trace_clock_ops: bool,

    /// Number of iterations a hardware poll (PLL lock, synthesizer program
    /// handshake) performs before giving up with
    /// [`ErrorCode::TIMEOUT`](crate::ErrorCode::TIMEOUT).
    pub poll_iterations: u32,

    /// Delay, in microseconds, between two iterations of a hardware poll.
    pub poll_delay_us: u32,
}

/// A unique instance of `Config` where compile-time configuration options are
/// defined. This is the only location in the LLA where `cfg!(feature = ...)`
/// is consulted.
pub const CONFIG: Config = Config {
    trace_clock_ops: cfg!(feature = "trace_clock_ops"),
    poll_iterations: 1000,
    poll_delay_us: 10,
};
