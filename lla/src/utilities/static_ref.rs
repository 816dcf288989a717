// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Reference to a register block at a fixed physical address.

use core::ops::Deref;
use core::ptr::NonNull;

/// A `&'static T` built from the base address of a clockgen or sysconf
/// register block.
///
/// Unlike a plain reference it can be created in a `const` or `static`
/// initializer, where the address is only known as an integer.
#[derive(Debug)]
pub struct StaticRef<T> {
    ptr: NonNull<T>,
}

impl<T> StaticRef<T> {
    /// ## Safety
    ///
    /// `ptr` must be non-null, aligned for `T`, and point to a `T` that stays
    /// valid for the program duration.
    pub const unsafe fn new(ptr: *const T) -> StaticRef<T> {
        StaticRef {
            ptr: unsafe { NonNull::new_unchecked(ptr.cast_mut()) },
        }
    }
}

impl<T> Deref for StaticRef<T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: guaranteed by the caller of `StaticRef::new`.
        unsafe { self.ptr.as_ref() }
    }
}
