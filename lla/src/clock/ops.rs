// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

use crate::clock::{ClockId, ClockNode, ClockTree};
use crate::ErrorCode;

/// Capabilities of a clock-generation bank.
///
/// Implemented once per bank and shared by all its nodes. The tree calls these
/// methods after validating its arguments, and only updates the cached rate
/// and parent link when they return `Ok`. Implementations touch hardware
/// registers only; they never modify the node.
pub trait ClockOps {
    /// Check that the bank describes `node` and bring it to a known state.
    ///
    /// Returns [`ErrorCode::INVAL`] for a node the bank knows nothing about.
    fn init(&self, tree: &ClockTree<'_>, node: &ClockNode<'_>) -> Result<(), ErrorCode>;

    /// The parent currently selected in hardware.
    fn identify_parent(&self, _tree: &ClockTree<'_>, node: &ClockNode<'_>) -> Option<ClockId> {
        node.static_parent()
    }

    /// Rate in Hz computed from the parent rate and the register state. `0`
    /// when stopped or without a parent.
    fn recalc(&self, tree: &ClockTree<'_>, node: &ClockNode<'_>) -> u32;

    fn set_rate(
        &self,
        _tree: &ClockTree<'_>,
        _node: &ClockNode<'_>,
        _hz: u32,
    ) -> Result<(), ErrorCode> {
        Err(ErrorCode::NOSUPPORT)
    }

    /// Route `parent` to `node`. The bank rejects a parent that is not one of
    /// the node's sources with [`ErrorCode::INVAL`].
    fn set_parent(
        &self,
        _tree: &ClockTree<'_>,
        _node: &ClockNode<'_>,
        _parent: ClockId,
    ) -> Result<(), ErrorCode> {
        Err(ErrorCode::NOSUPPORT)
    }

    fn enable(&self, _tree: &ClockTree<'_>, _node: &ClockNode<'_>) -> Result<(), ErrorCode> {
        Ok(())
    }

    fn disable(&self, _tree: &ClockTree<'_>, _node: &ClockNode<'_>) -> Result<(), ErrorCode> {
        Err(ErrorCode::NOSUPPORT)
    }

    /// Route the clock to the bank's observation output.
    fn observe(&self, _tree: &ClockTree<'_>, _node: &ClockNode<'_>) -> Result<(), ErrorCode> {
        Err(ErrorCode::NOSUPPORT)
    }
}
