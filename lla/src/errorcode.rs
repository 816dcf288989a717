// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Standard error enum for clock operations.

/// Errors returned by solvers, register helpers and clock operations.
///
/// Every operation in the LLA returns `Result<_, ErrorCode>`; nothing is
/// signalled through panics. The numeric values are stable so that they can be
/// handed across an OS boundary as a plain integer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(usize)]
pub enum ErrorCode {
    /// Internal failure: a precondition the caller should have guaranteed
    /// does not hold (e.g. `set_rate` on a node without a parent).
    FAIL = 0,
    /// The clock bank is in the middle of another register sequence.
    BUSY = 1,
    /// The requested state is already set.
    ALREADY = 2,
    /// An invalid parameter was passed, or no register combination satisfies
    /// the hardware constraints for the requested rate.
    INVAL = 5,
    /// A fixed-size table has no room left.
    SIZE = 6,
    /// The operation is not applicable to this clock.
    NOSUPPORT = 9,
    /// A bounded hardware poll ran out of iterations.
    TIMEOUT = 13,
}

impl From<ErrorCode> for usize {
    fn from(err: ErrorCode) -> usize {
        err as usize
    }
}

#[cfg(test)]
mod tests {
    use super::ErrorCode;

    #[test]
    fn numeric_values_are_stable() {
        assert_eq!(usize::from(ErrorCode::FAIL), 0);
        assert_eq!(usize::from(ErrorCode::INVAL), 5);
        assert_eq!(usize::from(ErrorCode::NOSUPPORT), 9);
        assert_eq!(usize::from(ErrorCode::TIMEOUT), 13);
    }
}
