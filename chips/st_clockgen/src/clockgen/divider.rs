// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Source muxes and integer dividers.
//!
//! Each output of the bank has an optional source selector and an optional
//! divider. The selector holds the index of the source in the slot's source
//! list, or a reserved encoding that stops the output. The divider field holds
//! the ratio minus one.

use lla::clock::{BankLock, ClockId, ClockNode, ClockOps, ClockTree};
use lla::debug;
use lla::utilities::bitfield::{BitField, RegisterWindow};
use lla::utilities::math::div_round_closest;
use lla::ErrorCode;

use super::{find_slot, Slot};

/// A source selector.
#[derive(Clone, Copy)]
pub struct Mux<'a> {
    pub field: BitField,
    /// Selectable parents, in encoding order.
    pub sources: &'a [ClockId],
    /// Encoding that stops the output.
    pub stopped: u32,
}

impl Mux<'_> {
    fn encoding(&self, parent: ClockId) -> Option<u32> {
        self.sources
            .iter()
            .position(|&source| source == parent)
            .map(|index| index as u32)
    }
}

#[derive(Clone, Copy)]
pub struct DividerSlot<'a> {
    pub id: ClockId,
    pub mux: Option<Mux<'a>>,
    pub divider: Option<BitField>,
    /// Value of the bank's observation selector routing this output.
    pub observe: Option<u32>,
}

impl Slot for DividerSlot<'_> {
    fn id(&self) -> ClockId {
        self.id
    }
}

pub struct DividerBank<'a> {
    name: &'static str,
    window: &'a dyn RegisterWindow,
    slots: &'a [DividerSlot<'a>],
    observe: Option<BitField>,
    lock: BankLock,
}

impl<'a> DividerBank<'a> {
    pub fn new(
        name: &'static str,
        window: &'a dyn RegisterWindow,
        slots: &'a [DividerSlot<'a>],
        observe: Option<BitField>,
    ) -> Self {
        DividerBank {
            name,
            window,
            slots,
            observe,
            lock: BankLock::new(),
        }
    }

    fn is_stopped(&self, slot: &DividerSlot<'_>) -> bool {
        slot.mux
            .is_some_and(|mux| mux.field.read(self.window) == mux.stopped)
    }

    fn ratio(&self, slot: &DividerSlot<'_>) -> u32 {
        slot.divider.map_or(1, |field| field.read(self.window).saturating_add(1))
    }
}

impl ClockOps for DividerBank<'_> {
    fn init(&self, _tree: &ClockTree<'_>, node: &ClockNode<'_>) -> Result<(), ErrorCode> {
        let slot = find_slot(self.slots, node)?;
        if let Some(mux) = slot.mux {
            mux.field.check(self.window)?;
            // The stopped encoding must fit and must not select a source.
            if mux.stopped > mux.field.max_value() || (mux.stopped as usize) < mux.sources.len() {
                return Err(ErrorCode::INVAL);
            }
        }
        if let Some(divider) = slot.divider {
            divider.check(self.window)?;
        }
        if let (Some(field), Some(_)) = (self.observe, slot.observe) {
            field.check(self.window)?;
        }
        Ok(())
    }

    fn identify_parent(&self, _tree: &ClockTree<'_>, node: &ClockNode<'_>) -> Option<ClockId> {
        let Ok(slot) = find_slot(self.slots, node) else {
            return node.parent();
        };
        match slot.mux {
            Some(mux) => {
                let selected = mux.field.read(self.window) as usize;
                // A stopped output keeps the source it will restart from.
                mux.sources.get(selected).copied().or(node.parent())
            }
            None => node.static_parent(),
        }
    }

    fn recalc(&self, tree: &ClockTree<'_>, node: &ClockNode<'_>) -> u32 {
        match find_slot(self.slots, node) {
            Ok(slot) if !self.is_stopped(slot) => tree.parent_rate(node) / self.ratio(slot),
            _ => 0,
        }
    }

    fn set_rate(
        &self,
        tree: &ClockTree<'_>,
        node: &ClockNode<'_>,
        hz: u32,
    ) -> Result<(), ErrorCode> {
        let slot = find_slot(self.slots, node)?;
        let field = slot.divider.ok_or(ErrorCode::NOSUPPORT)?;
        let parent_rate = u64::from(tree.parent_rate(node));
        let ratio = div_round_closest(parent_rate, u64::from(hz)).ok_or(ErrorCode::INVAL)?;
        let ratio = ratio.clamp(1, u64::from(field.max_value()) + 1);
        let _guard = self.lock.acquire()?;
        field.write(self.window, (ratio - 1) as u32)
    }

    fn set_parent(
        &self,
        _tree: &ClockTree<'_>,
        node: &ClockNode<'_>,
        parent: ClockId,
    ) -> Result<(), ErrorCode> {
        let slot = find_slot(self.slots, node)?;
        let mux = slot.mux.ok_or(ErrorCode::NOSUPPORT)?;
        let encoding = mux.encoding(parent).ok_or(ErrorCode::INVAL)?;
        let _guard = self.lock.acquire()?;
        mux.field.write(self.window, encoding)
    }

    fn enable(&self, _tree: &ClockTree<'_>, node: &ClockNode<'_>) -> Result<(), ErrorCode> {
        let slot = find_slot(self.slots, node)?;
        let Some(mux) = slot.mux else {
            return Ok(());
        };
        let Some(encoding) = node.parent().and_then(|parent| mux.encoding(parent)) else {
            debug!("{}: {} has no source to restart from", self.name, node.name());
            return Err(ErrorCode::FAIL);
        };
        let _guard = self.lock.acquire()?;
        mux.field.write(self.window, encoding)
    }

    fn disable(&self, _tree: &ClockTree<'_>, node: &ClockNode<'_>) -> Result<(), ErrorCode> {
        let slot = find_slot(self.slots, node)?;
        let mux = slot.mux.ok_or(ErrorCode::NOSUPPORT)?;
        let _guard = self.lock.acquire()?;
        mux.field.write(self.window, mux.stopped)
    }

    fn observe(&self, _tree: &ClockTree<'_>, node: &ClockNode<'_>) -> Result<(), ErrorCode> {
        let slot = find_slot(self.slots, node)?;
        let (Some(field), Some(selector)) = (self.observe, slot.observe) else {
            return Err(ErrorCode::NOSUPPORT);
        };
        let _guard = self.lock.acquire()?;
        field.write(self.window, selector)
    }
}
