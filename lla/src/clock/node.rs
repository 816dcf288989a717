// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

use core::cell::Cell;
use core::fmt;

use crate::clock::ClockOps;

/// Handle of a node in a [`ClockTree`](crate::clock::ClockTree). Equal to the
/// node's index in the table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockId(pub u16);

impl ClockId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ClockId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Node flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct ClockFlags(u8);

impl ClockFlags {
    pub const NONE: ClockFlags = ClockFlags(0);
    /// The clock must never be gated. `disable` succeeds without effect.
    pub const ALWAYS_ENABLED: ClockFlags = ClockFlags(1 << 0);
    /// Children are recalculated whenever this node's rate may have changed.
    pub const RATE_PROPAGATES: ClockFlags = ClockFlags(1 << 1);

    pub const fn union(self, other: ClockFlags) -> ClockFlags {
        ClockFlags(self.0 | other.0)
    }

    pub const fn contains(self, other: ClockFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl core::ops::BitOr for ClockFlags {
    type Output = ClockFlags;

    fn bitor(self, rhs: ClockFlags) -> ClockFlags {
        self.union(rhs)
    }
}

/// Life-cycle state of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockState {
    Uninitialized,
    Stopped,
    Running(u32),
}

/// One clock of the tree.
///
/// Only the owning [`ClockTree`](crate::clock::ClockTree) mutates the cached
/// rate and the parent link, after the bank's [`ClockOps`] accepted the
/// change.
pub struct ClockNode<'a> {
    id: ClockId,
    name: &'static str,
    rate: Cell<u32>,
    nominal_rate: u32,
    flags: ClockFlags,
    static_parent: Option<ClockId>,
    parent: Cell<Option<ClockId>>,
    ops: &'a dyn ClockOps,
    private_data: u32,
    initialized: Cell<bool>,
}

impl<'a> ClockNode<'a> {
    pub const fn new(id: ClockId, name: &'static str, ops: &'a dyn ClockOps) -> Self {
        ClockNode {
            id,
            name,
            rate: Cell::new(0),
            nominal_rate: 0,
            flags: ClockFlags::NONE,
            static_parent: None,
            parent: Cell::new(None),
            ops,
            private_data: 0,
            initialized: Cell::new(false),
        }
    }

    /// Parent the node starts with. For a muxed node this is the reset
    /// source; the actual one is read back from the hardware at `init`.
    ///
    /// Nodes built without a parent are roots.
    pub const fn with_parent(mut self, parent: ClockId) -> Self {
        self.static_parent = Some(parent);
        self.parent = Cell::new(Some(parent));
        self
    }

    /// Rate the node is designed to run at. Oscillators report it, and
    /// emulated banks report it for every PLL and synthesizer output.
    pub const fn with_nominal(mut self, hz: u32) -> Self {
        self.nominal_rate = hz;
        self
    }

    pub const fn with_flags(mut self, flags: ClockFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Opaque per-node word for the bank, e.g. a fixed divider ratio.
    pub const fn with_private(mut self, data: u32) -> Self {
        self.private_data = data;
        self
    }

    pub fn id(&self) -> ClockId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Cached rate in Hz.
    pub fn rate(&self) -> u32 {
        self.rate.get()
    }

    pub fn nominal_rate(&self) -> u32 {
        self.nominal_rate
    }

    pub fn flags(&self) -> ClockFlags {
        self.flags
    }

    pub fn parent(&self) -> Option<ClockId> {
        self.parent.get()
    }

    pub fn static_parent(&self) -> Option<ClockId> {
        self.static_parent
    }

    pub fn is_root(&self) -> bool {
        self.static_parent.is_none()
    }

    pub fn ops(&self) -> &'a dyn ClockOps {
        self.ops
    }

    pub fn private_data(&self) -> u32 {
        self.private_data
    }

    pub fn state(&self) -> ClockState {
        if !self.initialized.get() {
            ClockState::Uninitialized
        } else if self.rate.get() == 0 {
            ClockState::Stopped
        } else {
            ClockState::Running(self.rate.get())
        }
    }

    pub(crate) fn set_cached_rate(&self, hz: u32) {
        self.rate.set(hz);
    }

    pub(crate) fn set_parent_link(&self, parent: Option<ClockId>) {
        self.parent.set(parent);
    }

    pub(crate) fn mark_initialized(&self) {
        self.initialized.set(true);
    }
}

impl fmt::Debug for ClockNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ClockNode")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("rate", &self.rate.get())
            .field("parent", &self.parent.get())
            .field("flags", &self.flags)
            .finish()
    }
}
