// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Named fields in the system configuration register block.
//!
//! Several clocks are gated or muxed by bits living outside the clockgen
//! banks, in the SoC's sysconf registers. A driver claims each such field once
//! during initialization, by name, and then reads and writes it through the
//! returned [`SysconfField`]. Two claims may not share a bit.

use core::cell::Cell;

use crate::utilities::bitfield::{BitField, RegisterWindow};
use crate::ErrorCode;

#[derive(Clone, Copy)]
struct Claim {
    name: &'static str,
    field: BitField,
}

/// Fixed-capacity table of field claims over one sysconf window.
pub struct Sysconf<'a, const N: usize> {
    window: &'a dyn RegisterWindow,
    claims: [Cell<Option<Claim>>; N],
}

impl<'a, const N: usize> Sysconf<'a, N> {
    pub fn new(window: &'a dyn RegisterWindow) -> Self {
        Sysconf {
            window,
            claims: core::array::from_fn(|_| Cell::new(None)),
        }
    }

    /// Reserve `field` under `name`.
    ///
    /// Fails with [`ErrorCode::INVAL`] if the field does not fit the window,
    /// overlaps an earlier claim, or `name` is taken, and with
    /// [`ErrorCode::SIZE`] when the table is full.
    pub fn claim(
        &self,
        name: &'static str,
        field: BitField,
    ) -> Result<SysconfField<'a>, ErrorCode> {
        field.check(self.window)?;
        let mut free = None;
        for (index, slot) in self.claims.iter().enumerate() {
            match slot.get() {
                Some(claim) => {
                    if claim.name == name || claim.field.overlaps(&field) {
                        return Err(ErrorCode::INVAL);
                    }
                }
                None => {
                    if free.is_none() {
                        free = Some(index);
                    }
                }
            }
        }
        let index = free.ok_or(ErrorCode::SIZE)?;
        self.claims[index].set(Some(Claim { name, field }));
        Ok(SysconfField {
            window: self.window,
            field,
        })
    }

    /// Look up a field claimed earlier.
    pub fn field(&self, name: &str) -> Option<SysconfField<'a>> {
        self.claims
            .iter()
            .filter_map(Cell::get)
            .find(|claim| claim.name == name)
            .map(|claim| SysconfField {
                window: self.window,
                field: claim.field,
            })
    }
}

/// A claimed sysconf field.
#[derive(Clone, Copy)]
pub struct SysconfField<'a> {
    window: &'a dyn RegisterWindow,
    field: BitField,
}

impl SysconfField<'_> {
    pub fn read(&self) -> u32 {
        self.field.read(self.window)
    }

    pub fn write(&self, value: u32) -> Result<(), ErrorCode> {
        self.field.write(self.window, value)
    }

    pub fn bit_field(&self) -> BitField {
        self.field
    }
}
