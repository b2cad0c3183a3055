// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end scenarios and laws from SPEC_FULL.md §8, run against the
//! public no_std API. Run with `--features std` (the test harness itself
//! needs std; the crate under test does not).

use bstr_engine::{Error, StringEngine};

type Engine = StringEngine<16, 256>;

fn bytes(e: &Engine, id: u16) -> &[u8] {
    e.get_data(id)
}

// Scenario 1: const + concat + view.
#[test]
fn scenario_const_concat_view() {
    let mut e = Engine::new().unwrap();
    e.alloc_const(0, b"Hello, ").unwrap();
    e.alloc_const(1, b"World!").unwrap();
    e.concat(2, 0, 1).unwrap();
    e.left(3, 2, 5).unwrap();

    assert_eq!(bytes(&e, 2), b"Hello, World!");
    assert_eq!(bytes(&e, 3), b"Hello");
    assert!(!e.is_writable(2));
    assert!(!e.is_writable(3));
    assert!(!e.is_const(3));
}

// Scenario 2: MID$ statement on a shared string.
#[test]
fn scenario_mid_assign_on_shared() {
    let mut e = Engine::new().unwrap();
    e.alloc_init(0, b"12345678").unwrap();
    e.left(1, 0, 8).unwrap();
    assert_eq!(e.get_data(0).as_ptr(), e.get_data(1).as_ptr());

    e.mid_assign(1, 4, b"ZZ").unwrap();
    assert_eq!(bytes(&e, 0), b"12345678");
    assert_eq!(bytes(&e, 1), b"123ZZ678");
    assert_ne!(e.get_data(0).as_ptr(), e.get_data(1).as_ptr());
}

// Scenario 3: MID$ statement on a literal.
#[test]
fn scenario_mid_assign_on_literal() {
    let mut e = Engine::new().unwrap();
    e.alloc_const(0, b"CONSTANT").unwrap();
    e.mid_assign(0, 2, b"YY").unwrap();

    assert_eq!(bytes(&e, 0), b"CYYSTANT");
    assert!(!e.is_const(0));
    assert!(e.is_writable(0));
}

// Scenario 4: GC preserves sharing.
#[test]
fn scenario_gc_preserves_sharing() {
    let mut e = Engine::new().unwrap();
    e.alloc_init(0, b"ABCDEFGHIJKLMNOP").unwrap();
    e.left(1, 0, 4).unwrap();
    e.mid(2, 0, 5, 4).unwrap();
    e.right(3, 0, 4).unwrap();
    e.alloc_init(4, b"XYZ").unwrap();
    e.alloc_init(5, b"111").unwrap();
    e.alloc_init(6, b"222").unwrap();
    e.free(5).unwrap();

    let cursor_before = e.pool_used();
    e.garbage_collect();

    assert_eq!(bytes(&e, 0), b"ABCDEFGHIJKLMNOP");
    assert_eq!(bytes(&e, 1), b"ABCD");
    assert_eq!(bytes(&e, 2), b"EFGH");
    assert_eq!(bytes(&e, 3), b"MNOP");
    assert_eq!(bytes(&e, 4), b"XYZ");
    assert_eq!(bytes(&e, 6), b"222");
    assert_eq!(e.get_data(0).as_ptr(), e.get_data(1).as_ptr());
    assert_eq!(ptr_offset(&e, 2), ptr_offset(&e, 0) + 4);
    assert_eq!(ptr_offset(&e, 3), ptr_offset(&e, 0) + 12);
    // The freed 3-byte slot ("111") is reclaimed.
    assert_eq!(e.pool_used(), cursor_before - 3);
}

// Scenario 5: GC-on-OOM retry, transparent to the caller.
#[test]
fn scenario_gc_on_oom_retry() {
    let mut e: StringEngine<8, 260> = StringEngine::new().unwrap();
    // Fill the pool close to capacity with many small strings.
    for i in 0..4u16 {
        e.alloc_init(i, &[b'a'; 60]).unwrap();
    }
    // Free one to create reclaimable space, then ask for a similarly sized
    // region; this only fits after an internal collection.
    e.free(1).unwrap();
    let result = e.alloc_init(5, &[b'b'; 60]);
    assert!(result.is_ok());
    assert_eq!(e.get_data(5), &[b'b'; 60][..]);
}

// Scenario 6: substring-of-substring survives a collection.
#[test]
fn scenario_nested_substring_across_gc() {
    let mut e = Engine::new().unwrap();
    e.alloc_init(0, b"ABCDEFGHIJKLMNOP").unwrap();
    e.left(1, 0, 4).unwrap();
    e.left(2, 1, 2).unwrap();
    e.alloc_init(3, b"filler-one").unwrap();
    e.alloc_init(4, b"filler-two").unwrap();
    e.free(3).unwrap();

    e.garbage_collect();

    assert_eq!(e.get_data(2).as_ptr(), e.get_data(0).as_ptr());
    assert_eq!(e.get_length(2), 2);
    assert_eq!(bytes(&e, 2), b"AB");
}

// L1: round-trip.
#[test]
fn law_round_trip() {
    let mut e = Engine::new().unwrap();
    e.alloc_init(0, b"hello").unwrap();
    assert_eq!(bytes(&e, 0), b"hello");
}

// L2: concat identity.
#[test]
fn law_concat_identity() {
    let mut e = Engine::new().unwrap();
    e.alloc_init(0, b"value").unwrap();
    e.alloc_const(1, b"").unwrap();
    e.concat(2, 0, 1).unwrap();
    assert_eq!(bytes(&e, 2), b"value");

    e.concat(3, 1, 0).unwrap();
    assert_eq!(bytes(&e, 3), b"value");
}

// L3: substring composition.
#[test]
fn law_substring_composition() {
    let mut e = Engine::new().unwrap();
    e.alloc_init(0, b"abcdef").unwrap();
    e.left(1, 0, 4).unwrap();
    assert_eq!(bytes(&e, 1), &b"abcdef"[..4]);

    // n larger than the source clamps to the full string.
    e.left(2, 0, 99).unwrap();
    assert_eq!(bytes(&e, 2), b"abcdef");
}

// L4: copy-on-write isolation.
#[test]
fn law_cow_isolation() {
    let mut e = Engine::new().unwrap();
    e.alloc_init(0, b"ABCDEFGH").unwrap();
    e.left(1, 0, 8).unwrap();
    e.mid_assign(1, 4, b"ZZ").unwrap();

    assert_eq!(bytes(&e, 0), b"ABCDEFGH");
    assert_eq!(bytes(&e, 1), b"ABCZZFGH");
    assert_ne!(e.get_data(0).as_ptr(), e.get_data(1).as_ptr());
}

// L5: idempotent GC.
#[test]
fn law_idempotent_gc() {
    let mut e = Engine::new().unwrap();
    e.alloc_init(0, b"one").unwrap();
    e.alloc_init(1, b"two").unwrap();
    e.free(0).unwrap();
    e.garbage_collect();
    let first = (bytes(&e, 1).to_vec(), e.get_length(1));
    e.garbage_collect();
    let second = (bytes(&e, 1).to_vec(), e.get_length(1));
    assert_eq!(first, second);
}

fn ptr_offset(e: &Engine, id: u16) -> usize {
    e.get_data(id).as_ptr() as usize
}

// Error paths: spec.md §7's contract that invalid operations report a
// specific code rather than panicking.

const TOO_LONG: &[u8] = &[b'x'; 256];

#[test]
fn error_string_too_long_on_oversized_const() {
    let mut e = Engine::new().unwrap();
    assert_eq!(e.alloc_const(0, TOO_LONG), Err(Error::StringTooLong));
}

#[test]
fn error_string_too_long_on_oversized_concat() {
    let mut e = Engine::new().unwrap();
    e.alloc_init(0, &[b'a'; 200]).unwrap();
    e.alloc_init(1, &[b'b'; 100]).unwrap();
    assert_eq!(e.concat(2, 0, 1), Err(Error::StringTooLong));
}

#[test]
fn error_invalid_id_out_of_range() {
    let mut e = Engine::new().unwrap();
    // Engine is StringEngine<16, _>, so ids 0..16 are valid and 16 is not.
    assert_eq!(e.alloc_init(16, b"x"), Err(Error::InvalidId));
    assert_eq!(e.alloc_const(16, b"x"), Err(Error::InvalidId));
    assert_eq!(e.free(16), Err(Error::InvalidId));
    assert_eq!(e.copy(16, 0), Err(Error::InvalidId));

    // Accessors are infallible and report sentinel values instead.
    assert_eq!(e.get_length(16), 0);
    assert!(e.is_empty(16));
    assert!(e.get_data(16).is_empty());
}
