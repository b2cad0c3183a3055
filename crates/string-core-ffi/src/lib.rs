// SPDX-License-Identifier: Apache-2.0 OR MIT

//! # bstr-engine C FFI bindings
//!
//! C-compatible bindings for [`bstr_engine`], for BASIC runtimes whose
//! interpreter loop is written in C or whose compiler emits C.
//!
//! # Usage
//!
//! ```c
//! #include "bstr_engine.h"
//!
//! BstrEngine *e = bstr_engine_create();
//! bstr_alloc_init(e, 0, (const uint8_t *)"hello", 5);
//! bstr_concat(e, 1, 0, 0);
//!
//! uint8_t out[256];
//! size_t len = 0;
//! bstr_get_data(e, 1, out, sizeof(out), &len);
//!
//! bstr_engine_destroy(e);
//! ```

#![allow(clippy::missing_safety_doc)]

use std::ffi::CString;
use std::os::raw::{c_char, c_void};
use std::ptr;
use std::slice;

use bstr_engine::{Error, Id, StringEngine};

/// Descriptor slots per engine instance. Chosen generously for a host
/// binding; embedded callers that need a tighter table should link
/// `bstr-engine` directly and pick their own `N`/`C`.
const SLOTS: usize = 256;
/// Pool capacity in bytes for the FFI engine instance.
const POOL_BYTES: usize = 4096;

type Engine = StringEngine<SLOTS, POOL_BYTES>;

// =============================================================================
// ERROR CODES
// =============================================================================

/// Error codes returned by `bstr_*` functions.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BstrError {
    /// Success (no error).
    Ok = 0,
    /// The pool has no room for the request, even after a collection.
    OutOfMemory = 1,
    /// A string (or a concatenation) exceeds 255 bytes.
    StringTooLong = 2,
    /// The id does not address a slot in the descriptor table.
    InvalidId = 3,
    /// A caller-supplied pointer was null.
    NullPointer = 4,
    /// The caller's output buffer was too small for the result.
    BufferTooSmall = 5,
    /// Unknown error.
    Unknown = 255,
}

impl From<Error> for BstrError {
    fn from(e: Error) -> Self {
        match e {
            Error::OutOfMemory => BstrError::OutOfMemory,
            Error::StringTooLong => BstrError::StringTooLong,
            Error::InvalidId => BstrError::InvalidId,
            Error::NullPointer => BstrError::NullPointer,
            Error::PoolCorrupted => BstrError::Unknown,
        }
    }
}

fn err(e: Error) -> BstrError {
    e.into()
}

// =============================================================================
// OPAQUE HANDLE
// =============================================================================

/// Opaque handle to a string engine instance.
#[repr(C)]
pub struct BstrEngine {
    _private: [u8; 0],
}

// =============================================================================
// LIFECYCLE
// =============================================================================

/// Create a fresh engine with `SLOTS` descriptor slots and `POOL_BYTES`
/// bytes of pool space. Returns null only if the crate's internal floor
/// on pool capacity is somehow unmet (never the case for these constants).
#[no_mangle]
pub extern "C" fn bstr_engine_create() -> *mut BstrEngine {
    match Engine::new() {
        Ok(engine) => Box::into_raw(Box::new(engine)) as *mut BstrEngine,
        Err(_) => ptr::null_mut(),
    }
}

/// Destroy a handle created by [`bstr_engine_create`]. Passing null is a
/// no-op; passing a pointer not returned by that function is undefined
/// behavior, as with any FFI ownership boundary.
#[no_mangle]
pub unsafe extern "C" fn bstr_engine_destroy(engine: *mut BstrEngine) {
    if !engine.is_null() {
        drop(Box::from_raw(engine as *mut Engine));
    }
}

/// Reset an engine to its pristine state: every slot cleared, pool and
/// counters zeroed.
#[no_mangle]
pub unsafe extern "C" fn bstr_engine_reset(engine: *mut BstrEngine) -> BstrError {
    let Some(e) = (engine as *mut Engine).as_mut() else {
        return BstrError::NullPointer;
    };
    e.reset();
    BstrError::Ok
}

// =============================================================================
// ALLOCATION
// =============================================================================

/// Bind `id` to `bytes[0..len]` without copying — a program literal. The
/// caller must keep the memory behind `bytes` valid for as long as `engine`
/// (and anything descended from `id` via `LEFT$`/`RIGHT$`/`MID$`) exists, the
/// same contract a C string literal already satisfies for the life of the
/// process.
#[no_mangle]
pub unsafe extern "C" fn bstr_alloc_const(
    engine: *mut BstrEngine,
    id: Id,
    bytes: *const u8,
    len: usize,
) -> BstrError {
    let Some(e) = (engine as *mut Engine).as_mut() else {
        return BstrError::NullPointer;
    };
    if bytes.is_null() && len != 0 {
        return BstrError::NullPointer;
    }
    let src: &'static [u8] = if len == 0 { &[] } else { slice::from_raw_parts(bytes, len) };
    match e.alloc_const(id, src) {
        Ok(()) => BstrError::Ok,
        Err(e) => err(e),
    }
}

/// Reserve `size` fresh, zeroed pool bytes for `id` without writing to them.
#[no_mangle]
pub unsafe extern "C" fn bstr_alloc(engine: *mut BstrEngine, id: Id, size: u8) -> BstrError {
    let Some(e) = (engine as *mut Engine).as_mut() else {
        return BstrError::NullPointer;
    };
    match e.alloc(id, size) {
        Ok(()) => BstrError::Ok,
        Err(e) => err(e),
    }
}

/// Bind `id` to a copy of `bytes[0..len]`, allocated fresh in the pool.
#[no_mangle]
pub unsafe extern "C" fn bstr_alloc_init(
    engine: *mut BstrEngine,
    id: Id,
    bytes: *const u8,
    len: usize,
) -> BstrError {
    let Some(e) = (engine as *mut Engine).as_mut() else {
        return BstrError::NullPointer;
    };
    if bytes.is_null() && len != 0 {
        return BstrError::NullPointer;
    }
    let src = if len == 0 { &[][..] } else { slice::from_raw_parts(bytes, len) };
    match e.alloc_init(id, src) {
        Ok(()) => BstrError::Ok,
        Err(e) => err(e),
    }
}

/// Clear a slot. Pool bytes are only reclaimed on the next collection.
#[no_mangle]
pub unsafe extern "C" fn bstr_free(engine: *mut BstrEngine, id: Id) -> BstrError {
    let Some(e) = (engine as *mut Engine).as_mut() else {
        return BstrError::NullPointer;
    };
    match e.free(id) {
        Ok(()) => BstrError::Ok,
        Err(e) => err(e),
    }
}

// =============================================================================
// ASSIGNMENT
// =============================================================================

/// `dst = src`, by value semantics (const-alias, in-place overwrite, or
/// share, per the engine's copy rules).
#[no_mangle]
pub unsafe extern "C" fn bstr_copy(engine: *mut BstrEngine, dst: Id, src: Id) -> BstrError {
    let Some(e) = (engine as *mut Engine).as_mut() else {
        return BstrError::NullPointer;
    };
    match e.copy(dst, src) {
        Ok(()) => BstrError::Ok,
        Err(e) => err(e),
    }
}

/// Overwrite `dst` with `bytes[0..len]`.
#[no_mangle]
pub unsafe extern "C" fn bstr_assign(
    engine: *mut BstrEngine,
    dst: Id,
    bytes: *const u8,
    len: usize,
) -> BstrError {
    let Some(e) = (engine as *mut Engine).as_mut() else {
        return BstrError::NullPointer;
    };
    if bytes.is_null() && len != 0 {
        return BstrError::NullPointer;
    }
    let src = if len == 0 { &[][..] } else { slice::from_raw_parts(bytes, len) };
    match e.assign(dst, src) {
        Ok(()) => BstrError::Ok,
        Err(e) => err(e),
    }
}

/// Trim trailing spaces from a fixed-width field buffer, then assign.
#[no_mangle]
pub unsafe extern "C" fn bstr_set_from_buf(
    engine: *mut BstrEngine,
    dst: Id,
    buf: *const u8,
    buf_len: usize,
    width: usize,
) -> BstrError {
    let Some(e) = (engine as *mut Engine).as_mut() else {
        return BstrError::NullPointer;
    };
    if buf.is_null() && buf_len != 0 {
        return BstrError::NullPointer;
    }
    let src = if buf_len == 0 { &[][..] } else { slice::from_raw_parts(buf, buf_len) };
    match e.set_from_buf(dst, src, width) {
        Ok(()) => BstrError::Ok,
        Err(e) => err(e),
    }
}

/// `dst = a + b`, into a freshly allocated writable slot.
#[no_mangle]
pub unsafe extern "C" fn bstr_concat(engine: *mut BstrEngine, dst: Id, a: Id, b: Id) -> BstrError {
    let Some(e) = (engine as *mut Engine).as_mut() else {
        return BstrError::NullPointer;
    };
    match e.concat(dst, a, b) {
        Ok(()) => BstrError::Ok,
        Err(e) => err(e),
    }
}

/// Lexicographic comparison, written to `*out` as -1, 0, or 1.
#[no_mangle]
pub unsafe extern "C" fn bstr_compare(
    engine: *const BstrEngine,
    a: Id,
    b: Id,
    out: *mut i32,
) -> BstrError {
    let Some(e) = (engine as *const Engine).as_ref() else {
        return BstrError::NullPointer;
    };
    if out.is_null() {
        return BstrError::NullPointer;
    }
    match e.compare(a, b) {
        Ok(ord) => {
            *out = ord as i32;
            BstrError::Ok
        }
        Err(e) => err(e),
    }
}

// =============================================================================
// SUBSTRING VIEWS
// =============================================================================

/// `LEFT$(src, n)`.
#[no_mangle]
pub unsafe extern "C" fn bstr_left(engine: *mut BstrEngine, dst: Id, src: Id, n: u8) -> BstrError {
    let Some(e) = (engine as *mut Engine).as_mut() else {
        return BstrError::NullPointer;
    };
    match e.left(dst, src, n) {
        Ok(()) => BstrError::Ok,
        Err(e) => err(e),
    }
}

/// `RIGHT$(src, n)`.
#[no_mangle]
pub unsafe extern "C" fn bstr_right(engine: *mut BstrEngine, dst: Id, src: Id, n: u8) -> BstrError {
    let Some(e) = (engine as *mut Engine).as_mut() else {
        return BstrError::NullPointer;
    };
    match e.right(dst, src, n) {
        Ok(()) => BstrError::Ok,
        Err(e) => err(e),
    }
}

/// `MID$(src, start, len)`.
#[no_mangle]
pub unsafe extern "C" fn bstr_mid(
    engine: *mut BstrEngine,
    dst: Id,
    src: Id,
    start: u8,
    len: u8,
) -> BstrError {
    let Some(e) = (engine as *mut Engine).as_mut() else {
        return BstrError::NullPointer;
    };
    match e.mid(dst, src, start, len) {
        Ok(()) => BstrError::Ok,
        Err(e) => err(e),
    }
}

/// `MID$(d, start) = bytes[0..len]` statement assignment.
#[no_mangle]
pub unsafe extern "C" fn bstr_mid_assign(
    engine: *mut BstrEngine,
    d: Id,
    start: u8,
    bytes: *const u8,
    len: usize,
) -> BstrError {
    let Some(e) = (engine as *mut Engine).as_mut() else {
        return BstrError::NullPointer;
    };
    if bytes.is_null() && len != 0 {
        return BstrError::NullPointer;
    }
    let src = if len == 0 { &[][..] } else { slice::from_raw_parts(bytes, len) };
    match e.mid_assign(d, start, src) {
        Ok(()) => BstrError::Ok,
        Err(e) => err(e),
    }
}

// =============================================================================
// ACCESSORS
// =============================================================================

/// Copy `id`'s current bytes into `out[0..out_cap]` and write the actual
/// length to `*out_len`. Returns `BufferTooSmall` without writing if the
/// caller's buffer is too small; `*out_len` is still set to the required
/// size so the caller can retry.
#[no_mangle]
pub unsafe extern "C" fn bstr_get_data(
    engine: *const BstrEngine,
    id: Id,
    out: *mut u8,
    out_cap: usize,
    out_len: *mut usize,
) -> BstrError {
    let Some(e) = (engine as *const Engine).as_ref() else {
        return BstrError::NullPointer;
    };
    if out_len.is_null() {
        return BstrError::NullPointer;
    }
    let data = e.get_data(id);
    *out_len = data.len();
    if data.len() > out_cap {
        return BstrError::BufferTooSmall;
    }
    if !data.is_empty() {
        if out.is_null() {
            return BstrError::NullPointer;
        }
        ptr::copy_nonoverlapping(data.as_ptr(), out, data.len());
    }
    BstrError::Ok
}

/// Current byte length of `id`, or 0 for an invalid id.
#[no_mangle]
pub unsafe extern "C" fn bstr_get_length(engine: *const BstrEngine, id: Id) -> u8 {
    match (engine as *const Engine).as_ref() {
        Some(e) => e.get_length(id),
        None => 0,
    }
}

/// True if `id`'s slot holds no string.
#[no_mangle]
pub unsafe extern "C" fn bstr_is_empty(engine: *const BstrEngine, id: Id) -> bool {
    match (engine as *const Engine).as_ref() {
        Some(e) => e.is_empty(id),
        None => true,
    }
}

/// True if `id`'s bytes live outside the pool (a literal).
#[no_mangle]
pub unsafe extern "C" fn bstr_is_const(engine: *const BstrEngine, id: Id) -> bool {
    match (engine as *const Engine).as_ref() {
        Some(e) => e.is_const(id),
        None => false,
    }
}

/// True if `id` may be mutated in place.
#[no_mangle]
pub unsafe extern "C" fn bstr_is_writable(engine: *const BstrEngine, id: Id) -> bool {
    match (engine as *const Engine).as_ref() {
        Some(e) => e.is_writable(id),
        None => false,
    }
}

// =============================================================================
// HOST PRINTING ADAPTERS
// =============================================================================

/// Byte-at-a-time print callback: `callback(byte, user_data)`.
pub type BstrPrintFn = unsafe extern "C" fn(u8, *mut c_void);

/// Walk `id`'s bytes one at a time through `callback`, with no allocation —
/// the direct host-printing adapter for targets with no heap.
#[no_mangle]
pub unsafe extern "C" fn bstr_print_direct(
    engine: *const BstrEngine,
    id: Id,
    callback: BstrPrintFn,
    user_data: *mut c_void,
) -> BstrError {
    let Some(e) = (engine as *const Engine).as_ref() else {
        return BstrError::NullPointer;
    };
    e.print_direct(id, |b| unsafe { callback(b, user_data) });
    BstrError::Ok
}

/// Null-terminated heap copy of `id`'s bytes, for hosts with a heap that
/// want an owned `char *`. Returns null if `id`'s bytes contain an embedded
/// NUL, which a C string cannot represent. Pair with [`bstr_free_cstring`]
/// exactly once per successful call.
#[cfg(feature = "std")]
#[no_mangle]
pub unsafe extern "C" fn bstr_to_cstring(engine: *const BstrEngine, id: Id) -> *mut c_char {
    let Some(e) = (engine as *const Engine).as_ref() else {
        return ptr::null_mut();
    };
    let terminated = e.to_terminated(id);
    match CString::new(&terminated[..terminated.len() - 1]) {
        Ok(s) => s.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Free a string returned by [`bstr_to_cstring`]. Passing null is a no-op.
#[cfg(feature = "std")]
#[no_mangle]
pub unsafe extern "C" fn bstr_free_cstring(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

// =============================================================================
// GARBAGE COLLECTION
// =============================================================================

/// Run one collection pass explicitly. The engine also runs one
/// automatically whenever an allocation would otherwise fail.
#[no_mangle]
pub unsafe extern "C" fn bstr_garbage_collect(engine: *mut BstrEngine) -> BstrError {
    let Some(e) = (engine as *mut Engine).as_mut() else {
        return BstrError::NullPointer;
    };
    e.garbage_collect();
    BstrError::Ok
}

/// Advisory fragmentation heuristic; never consulted internally.
#[no_mangle]
pub unsafe extern "C" fn bstr_gc_needed(engine: *const BstrEngine) -> bool {
    match (engine as *const Engine).as_ref() {
        Some(e) => e.gc_needed(),
        None => false,
    }
}

/// Bytes currently in use in the pool.
#[no_mangle]
pub unsafe extern "C" fn bstr_pool_used(engine: *const BstrEngine) -> u16 {
    match (engine as *const Engine).as_ref() {
        Some(e) => e.pool_used(),
        None => 0,
    }
}

// =============================================================================
// DIAGNOSTICS
// =============================================================================

/// Human-readable description of an error code.
#[no_mangle]
pub extern "C" fn bstr_error_string(code: BstrError) -> *const c_char {
    let msg: &'static str = match code {
        BstrError::Ok => "success\0",
        BstrError::OutOfMemory => "out of string space\0",
        BstrError::StringTooLong => "string too long\0",
        BstrError::InvalidId => "invalid string id\0",
        BstrError::NullPointer => "null pointer\0",
        BstrError::BufferTooSmall => "buffer too small\0",
        BstrError::Unknown => "unknown error\0",
    };
    msg.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_destroy_roundtrip() {
        let e = bstr_engine_create();
        assert!(!e.is_null());
        unsafe { bstr_engine_destroy(e) };
    }

    #[test]
    fn alloc_and_read_back() {
        unsafe {
            let e = bstr_engine_create();
            let src = b"hello";
            assert_eq!(
                bstr_alloc_init(e, 0, src.as_ptr(), src.len()),
                BstrError::Ok
            );

            let mut out = [0u8; 8];
            let mut out_len = 0usize;
            assert_eq!(
                bstr_get_data(e, 0, out.as_mut_ptr(), out.len(), &mut out_len),
                BstrError::Ok
            );
            assert_eq!(out_len, 5);
            assert_eq!(&out[..5], b"hello");

            bstr_engine_destroy(e);
        }
    }

    #[test]
    fn get_data_reports_buffer_too_small() {
        unsafe {
            let e = bstr_engine_create();
            let src = b"0123456789";
            bstr_alloc_init(e, 0, src.as_ptr(), src.len());

            let mut out = [0u8; 4];
            let mut out_len = 0usize;
            assert_eq!(
                bstr_get_data(e, 0, out.as_mut_ptr(), out.len(), &mut out_len),
                BstrError::BufferTooSmall
            );
            assert_eq!(out_len, 10);

            bstr_engine_destroy(e);
        }
    }

    #[test]
    fn null_engine_is_rejected_not_dereferenced() {
        unsafe {
            assert_eq!(bstr_free(ptr::null_mut(), 0), BstrError::NullPointer);
            assert_eq!(bstr_get_length(ptr::null(), 0), 0);
            assert!(bstr_is_empty(ptr::null(), 0));
        }
    }

    #[test]
    fn alloc_const_rejects_null_bytes() {
        unsafe {
            let e = bstr_engine_create();
            assert_eq!(
                bstr_alloc_const(e, 0, ptr::null(), 10),
                BstrError::NullPointer
            );
            bstr_engine_destroy(e);
        }
    }

    #[test]
    fn alloc_const_then_concat_and_view() {
        unsafe {
            let e = bstr_engine_create();
            let a = b"Hello, ";
            let b = b"World!";
            assert_eq!(
                bstr_alloc_const(e, 0, a.as_ptr(), a.len()),
                BstrError::Ok
            );
            assert_eq!(
                bstr_alloc_const(e, 1, b.as_ptr(), b.len()),
                BstrError::Ok
            );
            assert_eq!(bstr_concat(e, 2, 0, 1), BstrError::Ok);

            let mut out = [0u8; 32];
            let mut out_len = 0usize;
            bstr_get_data(e, 2, out.as_mut_ptr(), out.len(), &mut out_len);
            assert_eq!(&out[..out_len], b"Hello, World!");

            bstr_engine_destroy(e);
        }
    }

    #[test]
    fn print_direct_walks_every_byte() {
        unsafe extern "C" fn collect(byte: u8, user_data: *mut c_void) {
            let buf = &mut *(user_data as *mut Vec<u8>);
            buf.push(byte);
        }

        unsafe {
            let e = bstr_engine_create();
            let src = b"abc";
            bstr_alloc_init(e, 0, src.as_ptr(), src.len());

            let mut collected: Vec<u8> = Vec::new();
            bstr_print_direct(e, 0, collect, &mut collected as *mut _ as *mut c_void);
            assert_eq!(collected, b"abc");

            bstr_engine_destroy(e);
        }
    }

    #[test]
    fn to_cstring_round_trips() {
        unsafe {
            let e = bstr_engine_create();
            let src = b"hello";
            bstr_alloc_init(e, 0, src.as_ptr(), src.len());

            let c_str = bstr_to_cstring(e, 0);
            assert!(!c_str.is_null());
            let recovered = std::ffi::CStr::from_ptr(c_str).to_bytes();
            assert_eq!(recovered, b"hello");

            bstr_free_cstring(c_str);
            bstr_engine_destroy(e);
        }
    }
}
