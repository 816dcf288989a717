// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! PLL bank.
//!
//! A bank output is either the VCO of a PLL, whose dividers belong to one of
//! the PLL families, or a half-rate ("LS") copy of a VCO with no controls of
//! its own.
//!
//! Reprogramming a running PLL follows the same sequence for every family:
//! power down, write the dividers, power up, wait for lock. The dividers are
//! computed first, so a rate the family cannot reach leaves the PLL untouched.

use lla::clock::{Backend, BankLock, ClockId, ClockNode, ClockOps, ClockTree};
use lla::debug;
use lla::hil::time::Delay;
use lla::utilities::bitfield::{BitField, RegisterWindow};
use lla::utilities::poll::poll_until;
use lla::ErrorCode;

use super::{find_slot, Slot};
use crate::solvers::pll1200::{self, Pll1200Params};
use crate::solvers::pll1600::{self, Pll1600Params};
use crate::solvers::pll3200::{self, Pll3200Params};
use crate::solvers::pll800::{self, Pll800Params};

/// Divider fields of a PLL, by family.
#[derive(Clone, Copy, Debug)]
pub enum PllFields {
    Pll800 {
        mdiv: BitField,
        ndiv: BitField,
        pdiv: BitField,
    },
    Pll1200 {
        idf: BitField,
        ldf: BitField,
    },
    Pll1600 {
        mdiv: BitField,
        ndiv: BitField,
    },
    Pll3200 {
        idf: BitField,
        ndiv: BitField,
        cp: BitField,
    },
}

/// Divider values of one family.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PllSetting {
    Pll800(Pll800Params),
    Pll1200(Pll1200Params),
    Pll1600(Pll1600Params),
    Pll3200(Pll3200Params),
}

impl PllFields {
    fn check(&self, window: &dyn RegisterWindow) -> Result<(), ErrorCode> {
        match *self {
            PllFields::Pll800 { mdiv, ndiv, pdiv } => {
                mdiv.check(window)?;
                ndiv.check(window)?;
                pdiv.check(window)
            }
            PllFields::Pll1200 { idf, ldf } => {
                idf.check(window)?;
                ldf.check(window)
            }
            PllFields::Pll1600 { mdiv, ndiv } => {
                mdiv.check(window)?;
                ndiv.check(window)
            }
            PllFields::Pll3200 { idf, ndiv, cp } => {
                idf.check(window)?;
                ndiv.check(window)?;
                cp.check(window)
            }
        }
    }

    fn solve(&self, input_hz: u32, output_hz: u32) -> Result<PllSetting, ErrorCode> {
        Ok(match self {
            PllFields::Pll800 { .. } => {
                PllSetting::Pll800(pll800::get_params(input_hz, output_hz)?)
            }
            PllFields::Pll1200 { .. } => {
                PllSetting::Pll1200(pll1200::get_params(input_hz, output_hz)?)
            }
            PllFields::Pll1600 { .. } => {
                PllSetting::Pll1600(pll1600::get_params(input_hz, output_hz)?)
            }
            PllFields::Pll3200 { .. } => {
                PllSetting::Pll3200(pll3200::get_params(input_hz, output_hz)?)
            }
        })
    }

    fn read(&self, window: &dyn RegisterWindow) -> PllSetting {
        let byte = |field: BitField| field.read(window) as u8;
        match *self {
            PllFields::Pll800 { mdiv, ndiv, pdiv } => PllSetting::Pll800(Pll800Params {
                mdiv: byte(mdiv),
                ndiv: byte(ndiv),
                pdiv: byte(pdiv),
            }),
            PllFields::Pll1200 { idf, ldf } => PllSetting::Pll1200(Pll1200Params {
                idf: byte(idf),
                ldf: byte(ldf),
            }),
            PllFields::Pll1600 { mdiv, ndiv } => PllSetting::Pll1600(Pll1600Params {
                mdiv: byte(mdiv),
                ndiv: byte(ndiv),
            }),
            PllFields::Pll3200 { idf, ndiv, cp } => PllSetting::Pll3200(Pll3200Params {
                idf: byte(idf),
                ndiv: byte(ndiv),
                cp: byte(cp),
            }),
        }
    }

    /// Whether every value of `setting` fits in its field.
    fn fits(&self, setting: &PllSetting) -> bool {
        match (*self, *setting) {
            (PllFields::Pll800 { mdiv, ndiv, pdiv }, PllSetting::Pll800(params)) => {
                mdiv.fits(params.mdiv.into())
                    && ndiv.fits(params.ndiv.into())
                    && pdiv.fits(params.pdiv.into())
            }
            (PllFields::Pll1200 { idf, ldf }, PllSetting::Pll1200(params)) => {
                idf.fits(params.idf.into()) && ldf.fits(params.ldf.into())
            }
            (PllFields::Pll1600 { mdiv, ndiv }, PllSetting::Pll1600(params)) => {
                mdiv.fits(params.mdiv.into()) && ndiv.fits(params.ndiv.into())
            }
            (PllFields::Pll3200 { idf, ndiv, cp }, PllSetting::Pll3200(params)) => {
                idf.fits(params.idf.into())
                    && ndiv.fits(params.ndiv.into())
                    && cp.fits(params.cp.into())
            }
            _ => false,
        }
    }

    fn program(&self, window: &dyn RegisterWindow, setting: &PllSetting) -> Result<(), ErrorCode> {
        match (*self, *setting) {
            (PllFields::Pll800 { mdiv, ndiv, pdiv }, PllSetting::Pll800(params)) => {
                mdiv.write(window, params.mdiv.into())?;
                ndiv.write(window, params.ndiv.into())?;
                pdiv.write(window, params.pdiv.into())
            }
            (PllFields::Pll1200 { idf, ldf }, PllSetting::Pll1200(params)) => {
                idf.write(window, params.idf.into())?;
                ldf.write(window, params.ldf.into())
            }
            (PllFields::Pll1600 { mdiv, ndiv }, PllSetting::Pll1600(params)) => {
                mdiv.write(window, params.mdiv.into())?;
                ndiv.write(window, params.ndiv.into())
            }
            (PllFields::Pll3200 { idf, ndiv, cp }, PllSetting::Pll3200(params)) => {
                idf.write(window, params.idf.into())?;
                ndiv.write(window, params.ndiv.into())?;
                cp.write(window, params.cp.into())
            }
            _ => Err(ErrorCode::FAIL),
        }
    }
}

impl PllSetting {
    fn rate(&self, input_hz: u32) -> Result<u32, ErrorCode> {
        match self {
            PllSetting::Pll800(params) => pll800::get_rate(input_hz, params),
            PllSetting::Pll1200(params) => pll1200::get_rate(input_hz, params),
            PllSetting::Pll1600(params) => pll1600::get_rate(input_hz, params),
            PllSetting::Pll3200(params) => pll3200::get_rate(input_hz, params),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct PllLayout {
    pub fields: PllFields,
    /// Set to power the PLL down.
    pub power_down: BitField,
    /// Raised by the hardware once the PLL has locked.
    pub lock: BitField,
}

#[derive(Clone, Copy, Debug)]
pub enum PllSlotKind {
    Vco(PllLayout),
    /// Half the rate of the parent VCO, gated with it.
    HalfRate,
}

#[derive(Clone, Copy, Debug)]
pub struct PllSlot {
    pub id: ClockId,
    pub kind: PllSlotKind,
}

impl Slot for PllSlot {
    fn id(&self) -> ClockId {
        self.id
    }
}

pub struct PllBank<'a> {
    name: &'static str,
    window: &'a dyn RegisterWindow,
    slots: &'a [PllSlot],
    backend: Backend,
    delay: &'a dyn Delay,
    lock: BankLock,
}

impl<'a> PllBank<'a> {
    pub fn new(
        name: &'static str,
        window: &'a dyn RegisterWindow,
        slots: &'a [PllSlot],
        backend: Backend,
        delay: &'a dyn Delay,
    ) -> Self {
        PllBank {
            name,
            window,
            slots,
            backend,
            delay,
            lock: BankLock::new(),
        }
    }

    fn vco(&self, node: &ClockNode<'_>) -> Result<PllLayout, ErrorCode> {
        match find_slot(self.slots, node)?.kind {
            PllSlotKind::Vco(layout) => Ok(layout),
            PllSlotKind::HalfRate => Err(ErrorCode::NOSUPPORT),
        }
    }

    fn wait_lock(&self, node: &ClockNode<'_>, layout: &PllLayout) -> Result<(), ErrorCode> {
        if self.backend == Backend::Emulated {
            return Ok(());
        }
        poll_until(self.delay, || layout.lock.is_set(self.window)).inspect_err(|_| {
            debug!("{}: {} did not lock", self.name, node.name());
        })
    }
}

impl ClockOps for PllBank<'_> {
    fn init(&self, _tree: &ClockTree<'_>, node: &ClockNode<'_>) -> Result<(), ErrorCode> {
        match find_slot(self.slots, node)?.kind {
            PllSlotKind::Vco(layout) => {
                layout.fields.check(self.window)?;
                layout.power_down.check(self.window)?;
                layout.lock.check(self.window)
            }
            PllSlotKind::HalfRate => Ok(()),
        }
    }

    fn recalc(&self, tree: &ClockTree<'_>, node: &ClockNode<'_>) -> u32 {
        let Ok(slot) = find_slot(self.slots, node) else {
            return 0;
        };
        match slot.kind {
            // Gated with the VCO it halves.
            PllSlotKind::HalfRate if self.backend == Backend::Emulated => {
                if tree.parent_rate(node) == 0 {
                    0
                } else {
                    node.nominal_rate()
                }
            }
            PllSlotKind::HalfRate => tree.parent_rate(node) / 2,
            PllSlotKind::Vco(layout) => {
                if layout.power_down.is_set(self.window) {
                    return 0;
                }
                if self.backend == Backend::Emulated {
                    return node.nominal_rate();
                }
                layout
                    .fields
                    .read(self.window)
                    .rate(tree.parent_rate(node))
                    .unwrap_or(0)
            }
        }
    }

    fn set_rate(
        &self,
        tree: &ClockTree<'_>,
        node: &ClockNode<'_>,
        hz: u32,
    ) -> Result<(), ErrorCode> {
        let layout = self.vco(node)?;
        let setting = layout.fields.solve(tree.parent_rate(node), hz)?;
        if !layout.fields.fits(&setting) {
            debug!("{}: {} fields too narrow for {} Hz", self.name, node.name(), hz);
            return Err(ErrorCode::INVAL);
        }
        let _guard = self.lock.acquire()?;
        let running = !layout.power_down.is_set(self.window);
        layout.power_down.write(self.window, 1)?;
        layout.fields.program(self.window, &setting)?;
        if running {
            layout.power_down.write(self.window, 0)?;
            self.wait_lock(node, &layout)?;
        }
        Ok(())
    }

    fn enable(&self, _tree: &ClockTree<'_>, node: &ClockNode<'_>) -> Result<(), ErrorCode> {
        let layout = self.vco(node)?;
        let _guard = self.lock.acquire()?;
        layout.power_down.write(self.window, 0)?;
        self.wait_lock(node, &layout)
    }

    fn disable(&self, _tree: &ClockTree<'_>, node: &ClockNode<'_>) -> Result<(), ErrorCode> {
        let layout = self.vco(node)?;
        let _guard = self.lock.acquire()?;
        layout.power_down.write(self.window, 1)
    }
}
