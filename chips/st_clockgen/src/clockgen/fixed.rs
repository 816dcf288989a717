// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Clocks without registers: oscillators and fixed-ratio dividers.
//!
//! A root node is an oscillator running at its nominal rate. A node with a
//! parent runs at the parent rate divided by its private data (a ratio of 0
//! is taken as 1).

use lla::clock::{ClockId, ClockNode, ClockOps, ClockTree};
use lla::ErrorCode;

pub struct StaticBank<'a> {
    ids: &'a [ClockId],
}

impl<'a> StaticBank<'a> {
    pub const fn new(ids: &'a [ClockId]) -> Self {
        StaticBank { ids }
    }
}

impl ClockOps for StaticBank<'_> {
    fn init(&self, _tree: &ClockTree<'_>, node: &ClockNode<'_>) -> Result<(), ErrorCode> {
        if self.ids.contains(&node.id()) {
            Ok(())
        } else {
            Err(ErrorCode::INVAL)
        }
    }

    fn recalc(&self, tree: &ClockTree<'_>, node: &ClockNode<'_>) -> u32 {
        if node.is_root() {
            node.nominal_rate()
        } else {
            tree.parent_rate(node) / node.private_data().max(1)
        }
    }
}
