// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Generic clock graph.
//!
//! A SoC clock tree is a static table of [`ClockNode`]s. Nodes refer to each
//! other by [`ClockId`], which is also their index in the table, so the tree
//! is an arena and parent links are plain integers. Every node points at the
//! [`ClockOps`] implementation of the clock-generation bank that owns it; one
//! implementation serves all the nodes of a bank and tells them apart by id.
//!
//! [`ClockTree`] wraps the table and implements the semantics shared by every
//! bank: argument validation, forest checks on reparenting, caching of the
//! rate, the always-enabled rule, and recalculation of the children of nodes
//! whose rate propagates.
//!
//! ```rust,ignore
//! let nodes = [
//!     ClockNode::new(ClockId(0), "CLK_SYSIN", &oscillators).with_nominal(30_000_000),
//!     ClockNode::new(ClockId(1), "CLK_A0_PLL0HS", &plls)
//!         .with_parent(ClockId(0))
//!         .with_flags(ClockFlags::RATE_PROPAGATES),
//! ];
//! let tree = ClockTree::new(&nodes)?;
//! registration::register_all(&tree, true, None)?;
//! tree.set_rate(ClockId(1), 800_000_000)?;
//! ```

mod lock;
mod node;
mod ops;
pub mod registration;
mod tree;

pub use self::lock::{BankGuard, BankLock};
pub use self::node::{ClockFlags, ClockId, ClockNode, ClockState};
pub use self::ops::ClockOps;
pub use self::tree::{ClockHandle, ClockTree};

/// How a bank obtains the rates it reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    /// Rates are computed from the register state of the bank.
    Hardware,
    /// Co-emulation platform without PLLs: PLL and synthesizer outputs report
    /// their nominal rate and hardware polls are skipped.
    Emulated,
}
