// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Bring-up walk over a clock table.
//!
//! Boards list their clocks parents first. Each one is initialized, optionally
//! enabled, and then announced to the operating system through a
//! [`ClockRegistrar`], which is where a kernel would create its own clock
//! objects.

use crate::clock::{ClockId, ClockNode, ClockTree};
use crate::config::CONFIG;
use crate::debug;
use crate::ErrorCode;

/// Receiver of initialized clocks.
pub trait ClockRegistrar {
    fn register(&self, node: &ClockNode<'_>) -> Result<(), ErrorCode>;
}

/// Initialize the clocks in `ids`, in order.
///
/// Stops at the first failure and returns its error; clocks before it stay
/// registered.
pub fn register(
    tree: &ClockTree<'_>,
    ids: &[ClockId],
    enable: bool,
    registrar: Option<&dyn ClockRegistrar>,
) -> Result<(), ErrorCode> {
    for &id in ids {
        register_one(tree, id, enable, registrar)?;
    }
    Ok(())
}

/// [`register`] every clock of the tree in table order.
pub fn register_all(
    tree: &ClockTree<'_>,
    enable: bool,
    registrar: Option<&dyn ClockRegistrar>,
) -> Result<(), ErrorCode> {
    for node in tree.nodes() {
        register_one(tree, node.id(), enable, registrar)?;
    }
    Ok(())
}

fn register_one(
    tree: &ClockTree<'_>,
    id: ClockId,
    enable: bool,
    registrar: Option<&dyn ClockRegistrar>,
) -> Result<(), ErrorCode> {
    let node = tree.node(id)?;
    tree.init(id).inspect_err(|err| {
        debug!("clk {}: init failed: {:?}", node.name(), err);
    })?;
    if enable {
        // Clocks without gating report NOSUPPORT; they run anyway.
        match tree.enable(id) {
            Ok(()) | Err(ErrorCode::NOSUPPORT) => {}
            Err(err) => {
                debug!("clk {}: enable failed: {:?}", node.name(), err);
                return Err(err);
            }
        }
    }
    if let Some(registrar) = registrar {
        registrar.register(node)?;
    }
    if CONFIG.trace_clock_ops {
        debug!("clk {}: registered at {} Hz", node.name(), node.rate());
    }
    Ok(())
}
