// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Frequency synthesizer bank (4FS216 or 4FS432).
//!
//! A synthesizer has one analog stage, the VCO, shared by up to four digital
//! channels. On a 4FS432 the VCO multiplier is programmable; on a 4FS216 the
//! VCO only has a power control and its rate is that of the reference.
//!
//! New channel fields take effect on a pulse of the channel's program-enable
//! bit, so a channel never runs with half-written fields.

use lla::clock::{Backend, BankLock, ClockId, ClockNode, ClockOps, ClockTree};
use lla::debug;
use lla::hil::time::Delay;
use lla::utilities::bitfield::{BitField, RegisterWindow};
use lla::utilities::poll::poll_until;
use lla::ErrorCode;

use super::{find_slot, Slot};
use crate::solvers::fs216::{self, Fs216Params};
use crate::solvers::fs660::{self, Fs660Params};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FsynFamily {
    Fs216,
    Fs660,
}

#[derive(Clone, Copy, Debug)]
pub struct FsynVco {
    /// Set to power the synthesizer down.
    pub power_down: BitField,
    /// VCO multiplier, 4FS432 only.
    pub ndiv: Option<BitField>,
    /// Raised by the hardware once the VCO has locked, if the block reports
    /// it.
    pub lock: Option<BitField>,
}

#[derive(Clone, Copy, Debug)]
pub struct FsynChannel {
    pub md: BitField,
    pub pe: BitField,
    pub sdiv: BitField,
    /// Divide-by-one/three pre-divider, 4FS432 only.
    pub nsdiv: Option<BitField>,
    /// Set to run the channel output.
    pub enable: BitField,
    pub program_enable: BitField,
}

#[derive(Clone, Copy, Debug)]
pub enum FsynSlotKind {
    Vco(FsynVco),
    Channel(FsynChannel),
}

#[derive(Clone, Copy, Debug)]
pub struct FsynSlot {
    pub id: ClockId,
    pub kind: FsynSlotKind,
}

impl Slot for FsynSlot {
    fn id(&self) -> ClockId {
        self.id
    }
}

/// Channel fields of either family.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ChannelSetting {
    md: i8,
    pe: u16,
    sdiv: u8,
    nsdiv: u8,
}

impl ChannelSetting {
    fn rate(&self, family: FsynFamily, input_hz: u32) -> Result<u32, ErrorCode> {
        match family {
            FsynFamily::Fs216 => fs216::get_rate(
                input_hz,
                &Fs216Params {
                    md: self.md,
                    pe: self.pe,
                    sdiv: self.sdiv,
                },
            ),
            FsynFamily::Fs660 => fs660::get_rate(
                input_hz,
                &Fs660Params {
                    md: self.md,
                    pe: self.pe,
                    sdiv: self.sdiv,
                    nsdiv: self.nsdiv,
                },
            ),
        }
    }

    fn solve(family: FsynFamily, input_hz: u32, output_hz: u32) -> Result<Self, ErrorCode> {
        match family {
            FsynFamily::Fs216 => {
                let params = fs216::get_params(input_hz, output_hz)?;
                Ok(ChannelSetting {
                    md: params.md,
                    pe: params.pe,
                    sdiv: params.sdiv,
                    nsdiv: 1,
                })
            }
            FsynFamily::Fs660 => {
                let params = fs660::get_params(input_hz, output_hz)?;
                Ok(ChannelSetting {
                    md: params.md,
                    pe: params.pe,
                    sdiv: params.sdiv,
                    nsdiv: params.nsdiv,
                })
            }
        }
    }
}

pub struct FsynBank<'a> {
    name: &'static str,
    family: FsynFamily,
    window: &'a dyn RegisterWindow,
    slots: &'a [FsynSlot],
    backend: Backend,
    delay: &'a dyn Delay,
    lock: BankLock,
}

impl<'a> FsynBank<'a> {
    pub fn new(
        name: &'static str,
        family: FsynFamily,
        window: &'a dyn RegisterWindow,
        slots: &'a [FsynSlot],
        backend: Backend,
        delay: &'a dyn Delay,
    ) -> Self {
        FsynBank {
            name,
            family,
            window,
            slots,
            backend,
            delay,
            lock: BankLock::new(),
        }
    }

    fn read_channel(&self, channel: &FsynChannel) -> ChannelSetting {
        ChannelSetting {
            md: channel.md.read_signed(self.window) as i8,
            pe: channel.pe.read(self.window) as u16,
            sdiv: channel.sdiv.read(self.window) as u8,
            nsdiv: channel.nsdiv.map_or(1, |field| field.read(self.window) as u8),
        }
    }

    /// Whether `setting` can be written to `channel` as a whole.
    fn channel_fits(channel: &FsynChannel, setting: &ChannelSetting) -> bool {
        let nsdiv_fits = match channel.nsdiv {
            Some(field) => field.fits(setting.nsdiv.into()),
            None => setting.nsdiv == 1,
        };
        channel.md.fits_signed(setting.md.into())
            && channel.pe.fits(setting.pe.into())
            && channel.sdiv.fits(setting.sdiv.into())
            && nsdiv_fits
    }

    fn program_channel(
        &self,
        channel: &FsynChannel,
        setting: &ChannelSetting,
    ) -> Result<(), ErrorCode> {
        channel.md.write_signed(self.window, setting.md.into())?;
        channel.pe.write(self.window, setting.pe.into())?;
        channel.sdiv.write(self.window, setting.sdiv.into())?;
        if let Some(nsdiv) = channel.nsdiv {
            nsdiv.write(self.window, setting.nsdiv.into())?;
        }
        channel.program_enable.write(self.window, 1)?;
        channel.program_enable.write(self.window, 0)
    }

    fn vco_rate(&self, vco: &FsynVco, input_hz: u32) -> u32 {
        if vco.power_down.is_set(self.window) {
            return 0;
        }
        match (self.family, vco.ndiv) {
            (FsynFamily::Fs660, Some(ndiv)) => {
                fs660::vco_get_rate(input_hz, ndiv.read(self.window) as u8).unwrap_or(0)
            }
            _ => input_hz,
        }
    }

    fn wait_lock(&self, node: &ClockNode<'_>, vco: &FsynVco) -> Result<(), ErrorCode> {
        let Some(lock) = vco.lock else {
            return Ok(());
        };
        if self.backend == Backend::Emulated {
            return Ok(());
        }
        poll_until(self.delay, || lock.is_set(self.window)).inspect_err(|_| {
            debug!("{}: {} did not lock", self.name, node.name());
        })
    }
}

impl ClockOps for FsynBank<'_> {
    fn init(&self, _tree: &ClockTree<'_>, node: &ClockNode<'_>) -> Result<(), ErrorCode> {
        match find_slot(self.slots, node)?.kind {
            FsynSlotKind::Vco(vco) => {
                vco.power_down.check(self.window)?;
                if let Some(ndiv) = vco.ndiv {
                    ndiv.check(self.window)?;
                }
                if let Some(lock) = vco.lock {
                    lock.check(self.window)?;
                }
                Ok(())
            }
            FsynSlotKind::Channel(channel) => {
                if self.family == FsynFamily::Fs216 && channel.nsdiv.is_some() {
                    return Err(ErrorCode::INVAL);
                }
                channel.md.check(self.window)?;
                channel.pe.check(self.window)?;
                channel.sdiv.check(self.window)?;
                if let Some(nsdiv) = channel.nsdiv {
                    nsdiv.check(self.window)?;
                }
                channel.enable.check(self.window)?;
                channel.program_enable.check(self.window)
            }
        }
    }

    fn recalc(&self, tree: &ClockTree<'_>, node: &ClockNode<'_>) -> u32 {
        let Ok(slot) = find_slot(self.slots, node) else {
            return 0;
        };
        let input = tree.parent_rate(node);
        match slot.kind {
            FsynSlotKind::Vco(vco) if self.backend == Backend::Emulated => {
                if vco.power_down.is_set(self.window) {
                    0
                } else {
                    node.nominal_rate()
                }
            }
            FsynSlotKind::Vco(vco) => self.vco_rate(&vco, input),
            FsynSlotKind::Channel(channel) => {
                if !channel.enable.is_set(self.window) || input == 0 {
                    return 0;
                }
                if self.backend == Backend::Emulated {
                    return node.nominal_rate();
                }
                self.read_channel(&channel)
                    .rate(self.family, input)
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
        let input = tree.parent_rate(node);
        match find_slot(self.slots, node)?.kind {
            FsynSlotKind::Vco(vco) => {
                let (FsynFamily::Fs660, Some(ndiv_field)) = (self.family, vco.ndiv) else {
                    return Err(ErrorCode::NOSUPPORT);
                };
                let ndiv = fs660::vco_get_params(input, hz)?;
                if !ndiv_field.fits(ndiv.into()) {
                    return Err(ErrorCode::INVAL);
                }
                let _guard = self.lock.acquire()?;
                let running = !vco.power_down.is_set(self.window);
                vco.power_down.write(self.window, 1)?;
                ndiv_field.write(self.window, ndiv.into())?;
                if running {
                    vco.power_down.write(self.window, 0)?;
                    self.wait_lock(node, &vco)?;
                }
                Ok(())
            }
            FsynSlotKind::Channel(channel) => {
                let setting = ChannelSetting::solve(self.family, input, hz)?;
                if !Self::channel_fits(&channel, &setting) {
                    debug!("{}: {} cannot hold the setting for {} Hz", self.name, node.name(), hz);
                    return Err(ErrorCode::INVAL);
                }
                let _guard = self.lock.acquire()?;
                self.program_channel(&channel, &setting)
            }
        }
    }

    fn enable(&self, _tree: &ClockTree<'_>, node: &ClockNode<'_>) -> Result<(), ErrorCode> {
        let slot = find_slot(self.slots, node)?;
        let _guard = self.lock.acquire()?;
        match slot.kind {
            FsynSlotKind::Vco(vco) => {
                vco.power_down.write(self.window, 0)?;
                self.wait_lock(node, &vco)
            }
            FsynSlotKind::Channel(channel) => channel.enable.write(self.window, 1),
        }
    }

    fn disable(&self, _tree: &ClockTree<'_>, node: &ClockNode<'_>) -> Result<(), ErrorCode> {
        let slot = find_slot(self.slots, node)?;
        let _guard = self.lock.acquire()?;
        match slot.kind {
            FsynSlotKind::Vco(vco) => vco.power_down.write(self.window, 1),
            FsynSlotKind::Channel(channel) => channel.enable.write(self.window, 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lla::clock::ClockFlags;
    use lla::hil::time::NoDelay;
    use lla::utilities::bitfield::InMemoryWindow;
    use lla::utilities::registers::register_bitfields;

    register_bitfields![u32,
        FS_VCO_CFG [
            NDIV OFFSET(0) NUMBITS(4) [],
            POWER_DOWN OFFSET(4) NUMBITS(1) [],
            LOCK OFFSET(31) NUMBITS(1) []
        ],
        FS_CHAN_CFG [
            MD OFFSET(0) NUMBITS(5) [],
            SDIV OFFSET(6) NUMBITS(4) [],
            NSDIV OFFSET(10) NUMBITS(1) [],
            ENABLE OFFSET(11) NUMBITS(1) [],
            PROGRAM_ENABLE OFFSET(12) NUMBITS(1) [],
            PE OFFSET(16) NUMBITS(16) []
        ]
    ];

    const VCO_CFG: usize = 0x0;
    const CHAN0: usize = 0x4;
    const CHAN1: usize = 0x8;

    const fn channel(offset: usize, with_nsdiv: bool) -> FsynChannel {
        FsynChannel {
            md: BitField::from_field(offset, FS_CHAN_CFG::MD),
            pe: BitField::from_field(offset, FS_CHAN_CFG::PE),
            sdiv: BitField::from_field(offset, FS_CHAN_CFG::SDIV),
            nsdiv: if with_nsdiv {
                Some(BitField::from_field(offset, FS_CHAN_CFG::NSDIV))
            } else {
                None
            },
            enable: BitField::from_field(offset, FS_CHAN_CFG::ENABLE),
            program_enable: BitField::from_field(offset, FS_CHAN_CFG::PROGRAM_ENABLE),
        }
    }

    const FS660_SLOTS: [FsynSlot; 3] = [
        FsynSlot {
            id: ClockId(1),
            kind: FsynSlotKind::Vco(FsynVco {
                power_down: BitField::from_field(VCO_CFG, FS_VCO_CFG::POWER_DOWN),
                ndiv: Some(BitField::from_field(VCO_CFG, FS_VCO_CFG::NDIV)),
                lock: Some(BitField::from_field(VCO_CFG, FS_VCO_CFG::LOCK)),
            }),
        },
        FsynSlot {
            id: ClockId(2),
            kind: FsynSlotKind::Channel(channel(CHAN0, true)),
        },
        FsynSlot {
            id: ClockId(3),
            kind: FsynSlotKind::Channel(channel(CHAN1, false)),
        },
    ];

    struct Osc;

    impl ClockOps for Osc {
        fn init(&self, _tree: &ClockTree<'_>, _node: &ClockNode<'_>) -> Result<(), ErrorCode> {
            Ok(())
        }

        fn recalc(&self, _tree: &ClockTree<'_>, node: &ClockNode<'_>) -> u32 {
            node.nominal_rate()
        }
    }

    fn nodes<'a>(osc: &'a Osc, bank: &'a FsynBank<'a>) -> [ClockNode<'a>; 4] {
        [
            ClockNode::new(ClockId(0), "CLK_SYSIN", osc).with_nominal(30_000_000),
            ClockNode::new(ClockId(1), "CLK_FS_VCO", bank)
                .with_parent(ClockId(0))
                .with_nominal(660_000_000)
                .with_flags(ClockFlags::RATE_PROPAGATES),
            ClockNode::new(ClockId(2), "CLK_FS_CH0", bank)
                .with_parent(ClockId(1))
                .with_nominal(27_000_000),
            ClockNode::new(ClockId(3), "CLK_FS_CH1", bank)
                .with_parent(ClockId(1))
                .with_nominal(148_500_000),
        ]
    }

    fn init_all(tree: &ClockTree<'_>) {
        for node in tree.nodes() {
            tree.init(node.id()).unwrap();
        }
    }

    #[test]
    fn channels_follow_the_vco() {
        let window = InMemoryWindow::<3>::new();
        window.force_high(VCO_CFG, 1 << 31);
        let bank = FsynBank::new(
            "FS0",
            FsynFamily::Fs660,
            &window,
            &FS660_SLOTS,
            Backend::Hardware,
            &NoDelay,
        );
        let osc = Osc;
        let nodes = nodes(&osc, &bank);
        let tree = ClockTree::new(&nodes).unwrap();
        init_all(&tree);

        // Reset: VCO at 16 x 30 MHz, channels stopped.
        assert_eq!(tree.rate(ClockId(1)), Ok(480_000_000));
        assert_eq!(tree.rate(ClockId(2)), Ok(0));

        assert_eq!(tree.enable(ClockId(2)), Ok(()));
        assert_eq!(tree.set_rate(ClockId(2), 27_000_000), Ok(()));
        assert_eq!(tree.rate(ClockId(2)), Ok(27_000_010));
        // Program-enable strobe left low.
        assert_eq!(window.written(CHAN0) & (1 << 12), 0);

        assert_eq!(tree.set_rate(ClockId(1), 660_000_000), Ok(()));
        assert_eq!(tree.rate(ClockId(1)), Ok(660_000_000));
        // Same channel fields, faster VCO.
        assert_eq!(tree.rate(ClockId(2)), Ok(37_125_014));
    }

    #[test]
    fn harmonic_is_programmed_with_substitute_split() {
        let window = InMemoryWindow::<3>::new();
        window.force_high(VCO_CFG, 1 << 31);
        let bank = FsynBank::new(
            "FS0",
            FsynFamily::Fs660,
            &window,
            &FS660_SLOTS,
            Backend::Hardware,
            &NoDelay,
        );
        let osc = Osc;
        let nodes = nodes(&osc, &bank);
        let tree = ClockTree::new(&nodes).unwrap();
        init_all(&tree);

        assert_eq!(tree.enable(ClockId(2)), Ok(()));
        assert_eq!(tree.set_rate(ClockId(2), 234_375), Ok(()));
        let md = BitField::from_field(CHAN0, FS_CHAN_CFG::MD);
        let pe = BitField::from_field(CHAN0, FS_CHAN_CFG::PE);
        let sdiv = BitField::from_field(CHAN0, FS_CHAN_CFG::SDIV);
        assert_eq!(md.read_signed(&window), -16);
        assert_eq!(pe.read(&window), 32767);
        assert_eq!(sdiv.read(&window), 11);
    }

    #[test]
    fn channel_without_predivider_rejects_divide_by_three() {
        let window = InMemoryWindow::<3>::new();
        window.force_high(VCO_CFG, 1 << 31);
        let bank = FsynBank::new(
            "FS0",
            FsynFamily::Fs660,
            &window,
            &FS660_SLOTS,
            Backend::Hardware,
            &NoDelay,
        );
        let osc = Osc;
        let nodes = nodes(&osc, &bank);
        let tree = ClockTree::new(&nodes).unwrap();
        init_all(&tree);

        assert_eq!(tree.enable(ClockId(3)), Ok(()));
        assert_eq!(tree.set_rate(ClockId(3), 5_000), Err(ErrorCode::INVAL));
        assert_eq!(tree.set_rate(ClockId(3), 148_500_000), Ok(()));
        assert_eq!(tree.disable(ClockId(3)), Ok(()));
        assert_eq!(tree.rate(ClockId(3)), Ok(0));
    }

    /// Channel 0 with a 3-bit output divider, the VCO multiplier limited to
    /// 2 bits.
    const NARROW_SLOTS: [FsynSlot; 3] = [
        FsynSlot {
            id: ClockId(1),
            kind: FsynSlotKind::Vco(FsynVco {
                power_down: BitField::from_field(VCO_CFG, FS_VCO_CFG::POWER_DOWN),
                ndiv: Some(BitField::new(VCO_CFG, 0, 2)),
                lock: Some(BitField::from_field(VCO_CFG, FS_VCO_CFG::LOCK)),
            }),
        },
        FsynSlot {
            id: ClockId(2),
            kind: FsynSlotKind::Channel(FsynChannel {
                sdiv: BitField::new(CHAN0, 6, 3),
                ..channel(CHAN0, true)
            }),
        },
        FsynSlot {
            id: ClockId(3),
            kind: FsynSlotKind::Channel(channel(CHAN1, false)),
        },
    ];

    #[test]
    fn setting_wider_than_layout_is_rejected_before_any_write() {
        let window = InMemoryWindow::<3>::new();
        window.force_high(VCO_CFG, 1 << 31);
        let bank = FsynBank::new(
            "FS0",
            FsynFamily::Fs660,
            &window,
            &NARROW_SLOTS,
            Backend::Hardware,
            &NoDelay,
        );
        let osc = Osc;
        let nodes = nodes(&osc, &bank);
        let tree = ClockTree::new(&nodes).unwrap();
        init_all(&tree);

        assert_eq!(tree.enable(ClockId(2)), Ok(()));
        assert_eq!(tree.set_rate(ClockId(2), 27_000_000), Ok(()));
        let channel_word = window.written(CHAN0);
        // Needs sdiv = 11.
        assert_eq!(tree.set_rate(ClockId(2), 234_375), Err(ErrorCode::INVAL));
        assert_eq!(window.written(CHAN0), channel_word);
        assert_eq!(tree.rate(ClockId(2)), Ok(27_000_010));

        // 660 MHz needs ndiv = 6.
        let vco_word = window.written(VCO_CFG);
        assert_eq!(tree.set_rate(ClockId(1), 660_000_000), Err(ErrorCode::INVAL));
        assert_eq!(window.written(VCO_CFG), vco_word);
        assert_eq!(tree.rate(ClockId(1)), Ok(480_000_000));
    }

    #[test]
    fn vco_lock_timeout() {
        let window = InMemoryWindow::<3>::new();
        let bank = FsynBank::new(
            "FS0",
            FsynFamily::Fs660,
            &window,
            &FS660_SLOTS,
            Backend::Hardware,
            &NoDelay,
        );
        let osc = Osc;
        let nodes = nodes(&osc, &bank);
        let tree = ClockTree::new(&nodes).unwrap();
        init_all(&tree);

        assert_eq!(tree.set_rate(ClockId(1), 660_000_000), Err(ErrorCode::TIMEOUT));
        assert_eq!(tree.rate(ClockId(1)), Ok(480_000_000));
    }

    #[test]
    fn fs216_vco_passes_reference_through() {
        const SLOTS: [FsynSlot; 2] = [
            FsynSlot {
                id: ClockId(1),
                kind: FsynSlotKind::Vco(FsynVco {
                    power_down: BitField::from_field(VCO_CFG, FS_VCO_CFG::POWER_DOWN),
                    ndiv: None,
                    lock: None,
                }),
            },
            FsynSlot {
                id: ClockId(2),
                kind: FsynSlotKind::Channel(channel(CHAN0, false)),
            },
        ];
        let window = InMemoryWindow::<3>::new();
        let bank = FsynBank::new(
            "FS1",
            FsynFamily::Fs216,
            &window,
            &SLOTS,
            Backend::Hardware,
            &NoDelay,
        );
        let osc = Osc;
        let nodes = [
            ClockNode::new(ClockId(0), "CLK_SYSIN", &osc).with_nominal(30_000_000),
            ClockNode::new(ClockId(1), "CLK_FS1_VCO", &bank)
                .with_parent(ClockId(0))
                .with_flags(ClockFlags::RATE_PROPAGATES),
            ClockNode::new(ClockId(2), "CLK_FS1_CH0", &bank).with_parent(ClockId(1)),
        ];
        let tree = ClockTree::new(&nodes).unwrap();
        init_all(&tree);

        assert_eq!(tree.rate(ClockId(1)), Ok(30_000_000));
        assert_eq!(tree.set_rate(ClockId(1), 480_000_000), Err(ErrorCode::NOSUPPORT));
        assert_eq!(tree.enable(ClockId(2)), Ok(()));
        assert_eq!(tree.set_rate(ClockId(2), 100_000_000), Ok(()));
        assert_eq!(tree.rate(ClockId(2)), Ok(99_999_936));
        assert_eq!(tree.disable(ClockId(1)), Ok(()));
        assert_eq!(tree.rate(ClockId(2)), Ok(0));
    }

    #[test]
    fn emulated_backend_reports_nominal_rates() {
        let window = InMemoryWindow::<3>::new();
        let bank = FsynBank::new(
            "FS0",
            FsynFamily::Fs660,
            &window,
            &FS660_SLOTS,
            Backend::Emulated,
            &NoDelay,
        );
        let osc = Osc;
        let nodes = nodes(&osc, &bank);
        let tree = ClockTree::new(&nodes).unwrap();
        init_all(&tree);
        assert_eq!(tree.rate(ClockId(1)), Ok(660_000_000));
        // Channels come out of reset stopped.
        assert_eq!(tree.rate(ClockId(3)), Ok(0));
        assert_eq!(tree.enable(ClockId(3)), Ok(()));
        assert_eq!(tree.rate(ClockId(3)), Ok(148_500_000));
        assert_eq!(tree.set_rate(ClockId(1), 480_000_000), Ok(()));

        assert_eq!(tree.disable(ClockId(3)), Ok(()));
        assert_eq!(tree.rate(ClockId(3)), Ok(0));
        assert_eq!(tree.enable(ClockId(3)), Ok(()));
        assert_eq!(tree.disable(ClockId(1)), Ok(()));
        assert_eq!(tree.rate(ClockId(1)), Ok(0));
        assert_eq!(tree.rate(ClockId(3)), Ok(0));
    }
}
