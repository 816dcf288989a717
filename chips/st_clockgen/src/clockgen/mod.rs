// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Clockgen bank drivers.
//!
//! A clockgen block is a register window holding a few banks of identical
//! clocks: PLLs, frequency synthesizers, and the muxes and dividers fed by
//! them. Each bank driver implements [`ClockOps`](lla::clock::ClockOps) for
//! every node it lists in its slot table. A slot names the node by
//! [`ClockId`] and describes where its fields live, so nothing relies on the
//! numbering of the SoC clock table.

pub mod divider;
pub mod fixed;
pub mod fsyn;
pub mod pll;

use lla::clock::{ClockId, ClockNode};
use lla::ErrorCode;

/// Slot descriptors of any bank.
trait Slot {
    fn id(&self) -> ClockId;
}

/// The slot describing `node`, or [`ErrorCode::INVAL`] if the bank has none.
fn find_slot<'s, S: Slot>(slots: &'s [S], node: &ClockNode<'_>) -> Result<&'s S, ErrorCode> {
    slots
        .iter()
        .find(|slot| slot.id() == node.id())
        .ok_or(ErrorCode::INVAL)
}
