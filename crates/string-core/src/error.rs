// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types for the string storage engine.

use core::fmt;

/// Result type for string engine operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Error codes returned by string engine operations.
///
/// Every fallible operation returns one of these instead of panicking;
/// accessors never fail and instead return a sentinel (empty slice, zero
/// length, `true` for `is_empty`) for an invalid id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The pool has no room for the request, even after a collection pass.
    OutOfMemory,

    /// A string (or the sum of two strings being concatenated) exceeds 255 bytes.
    StringTooLong,

    /// The id does not address a slot in the descriptor table.
    InvalidId,

    /// A caller-supplied pointer was null (FFI boundary only).
    NullPointer,

    /// Reserved for future pool integrity checks; never returned today.
    PoolCorrupted,
}

/// Human-readable string for an error code.
///
/// Equivalent to the abstract `error_string` operation.
pub const fn error_string(e: Error) -> &'static str {
    match e {
        Error::OutOfMemory => "out of string space",
        Error::StringTooLong => "string too long",
        Error::InvalidId => "invalid string id",
        Error::NullPointer => "null pointer",
        Error::PoolCorrupted => "string pool corrupted",
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(error_string(*self))
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
