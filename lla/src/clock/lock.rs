// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Exclusion of concurrent register sequences on one bank.
//!
//! Reprogramming a PLL or a synthesizer touches several registers in a fixed
//! order. A bank holds its lock for the whole sequence so that a second
//! request arriving in between (from a callback, or from a consumer reacting
//! to a rate change) is refused with [`ErrorCode::BUSY`] instead of
//! interleaving writes.
//!
//! The lock is a `Cell`, so banks are `!Sync` and cannot be shared between
//! threads in the first place.

use core::cell::Cell;

use crate::ErrorCode;

pub struct BankLock {
    held: Cell<bool>,
}

impl BankLock {
    pub const fn new() -> Self {
        BankLock {
            held: Cell::new(false),
        }
    }

    pub fn is_held(&self) -> bool {
        self.held.get()
    }

    /// Take the lock until the returned guard is dropped.
    pub fn acquire(&self) -> Result<BankGuard<'_>, ErrorCode> {
        if self.held.replace(true) {
            return Err(ErrorCode::BUSY);
        }
        Ok(BankGuard { lock: self })
    }
}

pub struct BankGuard<'a> {
    lock: &'a BankLock,
}

impl Drop for BankGuard<'_> {
    fn drop(&mut self) {
        self.lock.held.set(false);
    }
}

#[cfg(test)]
mod tests {
    use super::BankLock;
    use crate::ErrorCode;

    #[test]
    fn second_acquire_is_busy_until_release() {
        let lock = BankLock::new();
        {
            let _guard = lock.acquire().unwrap();
            assert!(lock.is_held());
            assert!(matches!(lock.acquire(), Err(ErrorCode::BUSY)));
        }
        assert!(!lock.is_held());
        assert!(lock.acquire().is_ok());
    }
}
