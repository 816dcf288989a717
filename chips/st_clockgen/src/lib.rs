// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Clock generation blocks of ST set-top-box SoCs.
//!
//! - [`solvers`]: conversion between a target frequency and the register
//!   fields of each PLL and frequency-synthesizer family.
//! - [`clockgen`]: [`lla::clock::ClockOps`] implementations for the four kinds
//!   of clockgen banks (dividers and muxes, PLLs, synthesizers, static
//!   clocks). SoC clock tables are built from these by the board.

#![no_std]

pub mod clockgen;
pub mod solvers;
