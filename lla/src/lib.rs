// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Clock Low Level API (LLA) core.
//!
//! The `lla` crate holds the pieces every clock-generation driver shares:
//!
//! - the bit-field register model ([`utilities::bitfield`]) and the sysconf
//!   field claims built on it ([`utilities::sysconf`]),
//! - the generic clock tree ([`clock`]): nodes addressed by [`clock::ClockId`]
//!   handles, the per-bank [`clock::ClockOps`] capability trait, rate
//!   propagation and the registration walk,
//! - the hardware interface layer used by consumers ([`hil`]),
//! - error codes, debug output and compile-time configuration.
//!
//! Chip crates implement [`clock::ClockOps`] once per clock-generation bank and
//! provide the frequency solvers for their PLL and synthesizer families.

#![no_std]

pub mod clock;
pub mod config;
pub mod debug;
pub mod hil;
pub mod utilities;

mod errorcode;

pub use crate::errorcode::ErrorCode;
