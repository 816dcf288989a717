// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Support for in-kernel debugging of clock operations.
//!
//! The [`debug!`](crate::debug!) macro formats a line, prefixes it with the
//! file and line of the call site, and hands it to the [`DebugSink`] installed
//! by the board. Boards install a sink once during bring-up:
//!
//! ```rust,ignore
//! struct Console;
//! impl lla::debug::DebugSink for Console {
//!     fn write_line(&self, file: &'static str, line: u32, args: core::fmt::Arguments) {
//!         /* push to the board UART */
//!     }
//! }
//! static CONSOLE: Console = Console;
//! lla::debug::set_debug_sink(&CONSOLE).ok();
//! lla::debug!("clockgen A ready, PLL0 at {} Hz", rate);
//! ```
//!
//! Until a sink is installed every message is silently dropped, so drivers can
//! log unconditionally.

use core::cell::UnsafeCell;
use core::fmt::Arguments;
use core::sync::atomic::{AtomicU8, Ordering};

use crate::ErrorCode;

/// Destination of debug output.
pub trait DebugSink: Sync {
    /// Write one formatted line. `file` and `line` identify the call site.
    fn write_line(&self, file: &'static str, line: u32, args: Arguments);
}

const SINK_EMPTY: u8 = 0;
const SINK_WRITING: u8 = 1;
const SINK_READY: u8 = 2;

/// Write-once holder of the board's sink.
struct SinkSlot {
    state: AtomicU8,
    sink: UnsafeCell<Option<&'static dyn DebugSink>>,
}

// The sink reference is written exactly once, before `state` is published as
// `SINK_READY` with release ordering; readers only dereference it after an
// acquire load observes `SINK_READY`.
unsafe impl Sync for SinkSlot {}

impl SinkSlot {
    const fn new() -> Self {
        SinkSlot {
            state: AtomicU8::new(SINK_EMPTY),
            sink: UnsafeCell::new(None),
        }
    }

    fn set(&self, sink: &'static dyn DebugSink) -> Result<(), ErrorCode> {
        self.state
            .compare_exchange(SINK_EMPTY, SINK_WRITING, Ordering::Acquire, Ordering::Relaxed)
            .map_err(|_| ErrorCode::ALREADY)?;
        // SAFETY: the compare-exchange above grants this thread the only
        // write access, and no reader dereferences before `SINK_READY`.
        unsafe {
            *self.sink.get() = Some(sink);
        }
        self.state.store(SINK_READY, Ordering::Release);
        Ok(())
    }

    fn get(&self) -> Option<&'static dyn DebugSink> {
        if self.state.load(Ordering::Acquire) == SINK_READY {
            // SAFETY: the slot is never written again once ready.
            unsafe { *self.sink.get() }
        } else {
            None
        }
    }
}

static DEBUG_SINK: SinkSlot = SinkSlot::new();

/// Install the process-wide debug sink.
///
/// Returns [`ErrorCode::ALREADY`] if a sink was installed before.
pub fn set_debug_sink(sink: &'static dyn DebugSink) -> Result<(), ErrorCode> {
    DEBUG_SINK.set(sink)
}

#[doc(hidden)]
pub fn debug_fmt(args: Arguments, file_line: &(&'static str, u32)) {
    if let Some(sink) = DEBUG_SINK.get() {
        let (file, line) = *file_line;
        sink.write_line(file, line, args);
    }
}

/// In-kernel `println()` debugging.
#[macro_export]
macro_rules! debug {
    () => ({
        // Allow an empty debug!() to print the location when hit
        $crate::debug!("")
    });
    ($msg:expr $(,)?) => ({
        $crate::debug::debug_fmt(format_args!("{}", $msg), {
            static _FILE_LINE: (&'static str, u32) = (file!(), line!());
            &_FILE_LINE
        })
    });
    ($fmt:expr, $($arg:tt)+) => ({
        $crate::debug::debug_fmt(format_args!($fmt, $($arg)+), {
            static _FILE_LINE: (&'static str, u32) = (file!(), line!());
            &_FILE_LINE
        })
    });
}
