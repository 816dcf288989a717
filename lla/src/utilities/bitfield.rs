// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Named bit-fields over a block of 32-bit registers.
//!
//! Clock-generation banks and sysconf registers are both described the same
//! way: a register block (the *window*) and, inside it, fields located by a
//! byte offset, a bit shift and a bit width. Every access goes to the
//! hardware; nothing is cached. Writing a field is a read-modify-write of the
//! word holding it.
//!
//! Layouts declared with `register_bitfields!` can be adopted directly:
//!
//! ```rust,ignore
//! register_bitfields![u32,
//!     CKGA_CLKOPSRC_SWITCH_CFG [
//!         CLK0 OFFSET(0) NUMBITS(2) [],
//!         CLK1 OFFSET(2) NUMBITS(2) []
//!     ]
//! ];
//!
//! const CLK1_MUX: BitField = BitField::from_field(0x014, CKGA_CLKOPSRC_SWITCH_CFG::CLK1);
//! CLK1_MUX.write(&window, 2)?;
//! ```

use core::cell::Cell;

use tock_registers::fields::Field;
use tock_registers::interfaces::{Readable, Writeable};
use tock_registers::registers::{InMemoryRegister, ReadWrite};
use tock_registers::{LocalRegisterCopy, RegisterLongName};

use crate::utilities::StaticRef;
use crate::ErrorCode;

/// A block of 32-bit registers addressed by byte offset.
pub trait RegisterWindow {
    /// Number of 32-bit words in the window.
    fn len_words(&self) -> usize;

    /// Read the word at byte `offset`. `offset` must have been validated with
    /// [`BitField::check`].
    fn read_word(&self, offset: usize) -> u32;

    /// Write the word at byte `offset`. `offset` must have been validated with
    /// [`BitField::check`].
    fn write_word(&self, offset: usize, value: u32);
}

/// Memory-mapped register window.
pub struct MmioWindow<const WORDS: usize> {
    registers: StaticRef<[ReadWrite<u32>; WORDS]>,
}

impl<const WORDS: usize> MmioWindow<WORDS> {
    /// ## Safety
    ///
    /// `base` must be the physical (or identity-mapped) address of `WORDS`
    /// consecutive 32-bit device registers valid for the program duration.
    pub const unsafe fn new(base: usize) -> Self {
        Self {
            registers: unsafe { StaticRef::new(base as *const [ReadWrite<u32>; WORDS]) },
        }
    }
}

impl<const WORDS: usize> RegisterWindow for MmioWindow<WORDS> {
    fn len_words(&self) -> usize {
        WORDS
    }

    fn read_word(&self, offset: usize) -> u32 {
        self.registers[offset / 4].get()
    }

    fn write_word(&self, offset: usize, value: u32) {
        self.registers[offset / 4].set(value);
    }
}

/// Register window backed by ordinary memory.
///
/// Used for co-emulation platforms and unit tests. Bits can be forced high
/// to model status flags the hardware would raise on its own (PLL lock,
/// handshake acknowledge).
pub struct InMemoryWindow<const WORDS: usize> {
    registers: [InMemoryRegister<u32>; WORDS],
    forced_high: [Cell<u32>; WORDS],
}

impl<const WORDS: usize> InMemoryWindow<WORDS> {
    pub fn new() -> Self {
        Self {
            registers: core::array::from_fn(|_| InMemoryRegister::new(0)),
            forced_high: core::array::from_fn(|_| Cell::new(0)),
        }
    }

    /// Load a reset value into the word at `offset`.
    pub fn preset(&self, offset: usize, value: u32) {
        self.registers[offset / 4].set(value);
    }

    /// Make the bits in `mask` read as one at `offset` regardless of what is
    /// written.
    pub fn force_high(&self, offset: usize, mask: u32) {
        let word = &self.forced_high[offset / 4];
        word.set(word.get() | mask);
    }

    /// Undo [`InMemoryWindow::force_high`] for the bits in `mask`.
    pub fn release(&self, offset: usize, mask: u32) {
        let word = &self.forced_high[offset / 4];
        word.set(word.get() & !mask);
    }

    /// The last value written at `offset`, without forced bits.
    pub fn written(&self, offset: usize) -> u32 {
        self.registers[offset / 4].get()
    }
}

impl<const WORDS: usize> RegisterWindow for InMemoryWindow<WORDS> {
    fn len_words(&self) -> usize {
        WORDS
    }

    fn read_word(&self, offset: usize) -> u32 {
        self.registers[offset / 4].get() | self.forced_high[offset / 4].get()
    }

    fn write_word(&self, offset: usize, value: u32) {
        self.registers[offset / 4].set(value);
    }
}

/// Location of a field: byte offset of its word, bit shift, bit width.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BitField {
    offset: usize,
    shift: u8,
    width: u8,
}

impl BitField {
    pub const fn new(offset: usize, shift: u8, width: u8) -> Self {
        BitField {
            offset,
            shift,
            width,
        }
    }

    /// Adopt a field declared with `register_bitfields!`, located in the word
    /// at byte `offset`.
    pub const fn from_field<R: RegisterLongName>(offset: usize, field: Field<u32, R>) -> Self {
        BitField {
            offset,
            shift: field.shift as u8,
            width: (32 - field.mask.leading_zeros()) as u8,
        }
    }

    pub const fn offset(&self) -> usize {
        self.offset
    }

    pub const fn shift(&self) -> u8 {
        self.shift
    }

    pub const fn width(&self) -> u8 {
        self.width
    }

    /// Largest value the field can hold.
    pub const fn max_value(&self) -> u32 {
        if self.width >= 32 {
            u32::MAX
        } else {
            (1 << self.width) - 1
        }
    }

    /// Mask of the field bits inside its word.
    pub const fn word_mask(&self) -> u32 {
        self.max_value() << self.shift
    }

    /// Whether two fields share at least one bit of the same word.
    pub const fn overlaps(&self, other: &BitField) -> bool {
        self.offset == other.offset && (self.word_mask() & other.word_mask()) != 0
    }

    /// Check the field is well formed and lies inside `window`.
    pub fn check(&self, window: &dyn RegisterWindow) -> Result<(), ErrorCode> {
        if self.width == 0
            || self.shift as usize + self.width as usize > 32
            || self.offset % 4 != 0
            || self.offset / 4 >= window.len_words()
        {
            return Err(ErrorCode::INVAL);
        }
        Ok(())
    }

    fn field(&self) -> Field<u32, ()> {
        Field::new(self.max_value(), self.shift as usize)
    }

    pub fn read(&self, window: &dyn RegisterWindow) -> u32 {
        self.field().read(window.read_word(self.offset))
    }

    pub fn is_set(&self, window: &dyn RegisterWindow) -> bool {
        self.read(window) != 0
    }

    /// Whether `value` can be written to the field.
    pub const fn fits(&self, value: u32) -> bool {
        value <= self.max_value()
    }

    /// Whether `value` can be written to the field in two's complement.
    pub const fn fits_signed(&self, value: i32) -> bool {
        if self.width == 0 {
            return false;
        }
        if self.width >= 32 {
            return true;
        }
        let half = 1i64 << (self.width - 1);
        (value as i64) >= -half && (value as i64) < half
    }

    /// Read-modify-write `value` into the field.
    ///
    /// Returns [`ErrorCode::INVAL`] without touching the hardware if `value`
    /// does not fit in the field.
    pub fn write(&self, window: &dyn RegisterWindow, value: u32) -> Result<(), ErrorCode> {
        if !self.fits(value) {
            return Err(ErrorCode::INVAL);
        }
        let mut word = LocalRegisterCopy::<u32, ()>::new(window.read_word(self.offset));
        word.modify(self.field().val(value));
        window.write_word(self.offset, word.get());
        Ok(())
    }

    /// Write a signed value in two's complement, truncated to the field width.
    ///
    /// Returns [`ErrorCode::INVAL`] if `value` is outside the signed range of
    /// the field.
    pub fn write_signed(&self, window: &dyn RegisterWindow, value: i32) -> Result<(), ErrorCode> {
        if !self.fits_signed(value) {
            return Err(ErrorCode::INVAL);
        }
        self.write(window, (value as u32) & self.max_value())
    }

    /// Read the field as a two's complement signed value. An empty field
    /// reads as zero.
    pub fn read_signed(&self, window: &dyn RegisterWindow) -> i32 {
        if self.width == 0 {
            return 0;
        }
        let raw = self.read(window);
        let sign = 1u32 << (self.width.min(32) - 1);
        if raw & sign != 0 {
            (raw | !self.max_value()) as i32
        } else {
            raw as i32
        }
    }
}
