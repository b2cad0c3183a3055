// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The compacting collector.
//!
//! Three conceptual phases collapse to two here because descriptors never
//! move in the table (§3/§9 of SPEC_FULL.md): there is no "sort back by id"
//! pass, since position was never disturbed. What remains is:
//!
//! 1. Build a scratch list of ids for pool-resident (non-empty, non-const)
//!    descriptors and shell-sort it by pool address, ties broken so the
//!    longer string sorts first (a parent always precedes any child whose
//!    window starts at the same address).
//! 2. Walk the sorted list once, compacting live regions toward the pool
//!    base and rewriting any descriptor whose window lies inside the most
//!    recently relocated parent's old window, instead of moving its bytes
//!    a second time.

use crate::descriptor::Location;
use crate::engine::StringEngine;

impl<const N: usize, const C: usize> StringEngine<N, C> {
    /// Run one collection pass: sort descriptors by pool address, compact
    /// live regions toward the pool base, and fix up aliasing. Safe to call
    /// at any time; it is also invoked automatically by `alloc` on OOM.
    pub fn garbage_collect(&mut self) {
        let mut order = [0u16; N];
        let mut count = 0usize;
        for (i, d) in self.descriptors.iter().enumerate() {
            if matches!(d.location, Location::Pool { .. }) {
                order[count] = i as u16;
                count += 1;
            }
        }
        let order = &mut order[..count];

        shell_sort_by(order, |&a, &b| {
            let (off_a, len_a) = self.pool_window(a);
            let (off_b, len_b) = self.pool_window(b);
            off_a.cmp(&off_b).then(len_b.cmp(&len_a))
        });

        let mut new_cursor: u16 = 0;
        let mut have_parent = false;
        let mut last_old_start: u16 = 0;
        let mut last_old_end: u16 = 0;
        let mut last_new_start: u16 = 0;

        for &id in order.iter() {
            let idx = id as usize;
            let (old_start, len) = self.pool_window(id);
            let old_end = old_start + len as u16;

            if have_parent && old_start >= last_old_start && old_end <= last_old_end {
                let delta = old_start - last_old_start;
                self.descriptors[idx].location = Location::Pool {
                    offset: last_new_start + delta,
                };
            } else {
                self.pool.compact_move(old_start, new_cursor, len);
                self.descriptors[idx].location = Location::Pool { offset: new_cursor };
                last_old_start = old_start;
                last_old_end = old_end;
                last_new_start = new_cursor;
                have_parent = true;
                new_cursor += len as u16;
            }
        }

        self.pool.set_cursor(new_cursor);
        self.stats.collections += 1;
        #[cfg(feature = "defmt")]
        defmt::debug!(
            "bstr-engine: collection #{} reclaimed, new cursor={}",
            self.stats.collections,
            new_cursor
        );
    }

    /// Advisory-only fragmentation heuristic. Not consulted by `alloc`,
    /// which always retries unconditionally after a collection.
    pub fn gc_needed(&self) -> bool {
        self.pool.cursor() as u32 * 2 > self.pool.capacity() as u32
    }

    fn pool_window(&self, id: u16) -> (u16, u8) {
        match self.descriptors[id as usize].location {
            Location::Pool { offset } => (offset, self.descriptors[id as usize].len),
            _ => (0, 0),
        }
    }
}

/// In-place shell sort with the classic N/2-halving gap sequence. Chosen,
/// as in the source design, for code size rather than asymptotic elegance;
/// any in-place O(N log N) sort would satisfy the same contract.
fn shell_sort_by<T, F>(slice: &mut [T], cmp: F)
where
    F: Fn(&T, &T) -> core::cmp::Ordering,
{
    let len = slice.len();
    let mut gap = len / 2;
    while gap > 0 {
        for i in gap..len {
            let mut j = i;
            while j >= gap && cmp(&slice[j - gap], &slice[j]) == core::cmp::Ordering::Greater {
                slice.swap(j - gap, j);
                j -= gap;
            }
        }
        gap /= 2;
    }
}
