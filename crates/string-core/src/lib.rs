// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # bstr-engine
//!
//! A `no_std` string storage manager for a compiled BASIC runtime: a
//! fixed-capacity descriptor table plus a bump-allocated character pool,
//! with substring sharing (`LEFT$`/`RIGHT$`/`MID$`) and a compacting
//! garbage collector, for embedded hosts with no dynamic heap.
//!
//! ## Design Constraints
//!
//! - **No heap allocations** in the core engine (const generics for fixed
//!   buffers; descriptor count `N` and pool capacity `C` are compile-time
//!   parameters).
//! - **Strings are bytes, capped at 255** — no Unicode awareness, no
//!   growth beyond what fits in a single byte length.
//! - **`no_std` compatible**, single-threaded, synchronous.
//!
//! ## Architecture
//!
//! ```text
//! +-----------------------------------------+
//! |  Compiler-emitted BASIC program          |
//! +-----------------------------------------+
//!           v                    ^
//! +-----------------------------------------+
//! |  StringEngine  (alloc / copy / concat /  |
//! |  substrings / mid_assign / GC)           |
//! +-----------------------------------------+
//!           v                    ^
//! +-----------------------------------------+
//! |  Descriptor Table   |   Pool (bump arena)|
//! +-----------------------------------------+
//! ```
//!
//! ## Feature Flags
//!
//! - `alloc` -- enable the optional null-terminated host-printing adapter
//! - `std` -- enable std (for host testing and `std::error::Error`)
//! - `defmt` -- log allocation/collection counters via `defmt` on target

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

#[cfg(feature = "alloc")]
extern crate alloc;

mod descriptor;

/// Error types for string engine operations.
pub mod error;

/// The character pool: a contiguous byte buffer with a bump cursor.
mod pool;

/// The string engine: all descriptor-and-pool operations.
pub mod engine;

/// The compacting collector.
mod gc;

pub use crate::engine::{Id, Stats, StringEngine};
pub use crate::error::{error_string, Error, Result};

/// Maximum length of any single string, in bytes.
pub const MAX_STRING_LEN: usize = 255;

/// Version of `bstr-engine`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
