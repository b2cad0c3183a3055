// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The string engine: allocation, assignment, substring views, concatenation,
//! comparison, and copy-on-write `MID$` assignment.
//!
//! This is the component that owns both the descriptor table and the pool
//! and enforces the invariants between them (SPEC_FULL.md §3). Nothing
//! outside this module touches pool bytes or descriptor fields directly.

use crate::descriptor::{Descriptor, Location};
use crate::error::{Error, Result};
use crate::pool::Pool;

/// A string slot id, stable for the lifetime of the engine.
pub type Id = u16;

/// Allocation and collection counters, exposed for host diagnostics.
#[derive(Debug, Clone, Copy, Default)]
pub struct Stats {
    /// Number of successful `alloc`/`alloc_init`/`concat` reservations.
    pub allocations: u32,
    /// Number of `garbage_collect` passes run (manual or OOM-triggered).
    pub collections: u32,
    /// High-water mark of the pool cursor.
    pub peak_cursor: u16,
}

/// A fixed-capacity descriptor table plus bump-allocated character pool.
///
/// `N` is the number of descriptor slots, `C` the pool capacity in bytes.
/// Both are chosen at compile time so the engine never allocates from a
/// heap; this is the const-generic rendition of the abstract spec's
/// `init(buffer, capacity)` call.
pub struct StringEngine<const N: usize, const C: usize> {
    pub(crate) descriptors: [Descriptor; N],
    pub(crate) pool: Pool<C>,
    pub(crate) stats: Stats,
}

impl<const N: usize, const C: usize> StringEngine<N, C> {
    /// Create a fresh engine. Fails if the pool capacity is below the 256
    /// byte floor the abstract interface requires.
    pub fn new() -> Result<Self> {
        if C < 256 {
            return Err(Error::OutOfMemory);
        }
        Ok(Self {
            descriptors: [Descriptor::empty(); N],
            pool: Pool::new(),
            stats: Stats::default(),
        })
    }

    /// Restore pristine state: every descriptor cleared, pool cursor and
    /// counters reset to zero. Backing storage itself is not released —
    /// there is no teardown, matching SPEC_FULL.md §5.
    pub fn reset(&mut self) {
        self.descriptors = [Descriptor::empty(); N];
        self.pool.reset();
        self.stats = Stats::default();
    }

    /// Read-only allocation/collection counters.
    pub const fn stats(&self) -> Stats {
        self.stats
    }

    /// Bytes currently in use in the pool (the bump cursor's position).
    pub const fn pool_used(&self) -> u16 {
        self.pool.cursor()
    }

    fn idx(&self, id: Id) -> Option<usize> {
        let i = id as usize;
        if i < N {
            Some(i)
        } else {
            None
        }
    }

    fn check(&self, id: Id) -> Result<usize> {
        self.idx(id).ok_or(Error::InvalidId)
    }

    fn bytes_of(&self, idx: usize) -> &[u8] {
        let d = &self.descriptors[idx];
        match d.location {
            Location::Empty => &[],
            Location::External { bytes, offset } => {
                &bytes[offset as usize..offset as usize + d.len as usize]
            }
            Location::Pool { offset } => self.pool.read(offset, d.len),
        }
    }

    // -- Accessors (infallible; sentinel values for an invalid id) ----------

    /// Raw bytes currently addressed by `id`, or an empty slice if `id` is
    /// invalid or the slot is empty.
    pub fn get_data(&self, id: Id) -> &[u8] {
        match self.idx(id) {
            Some(i) => self.bytes_of(i),
            None => &[],
        }
    }

    /// Current byte length, or 0 for an invalid id.
    pub fn get_length(&self, id: Id) -> u8 {
        self.idx(id).map(|i| self.descriptors[i].len).unwrap_or(0)
    }

    /// True if the slot holds no string, or if `id` is invalid.
    pub fn is_empty(&self, id: Id) -> bool {
        self.idx(id)
            .map(|i| self.descriptors[i].is_empty())
            .unwrap_or(true)
    }

    /// True if the slot's bytes live outside the pool (a literal).
    pub fn is_const(&self, id: Id) -> bool {
        self.idx(id).map(|i| self.descriptors[i].const_).unwrap_or(false)
    }

    /// True if the slot may be mutated in place.
    pub fn is_writable(&self, id: Id) -> bool {
        self.idx(id)
            .map(|i| self.descriptors[i].writable)
            .unwrap_or(false)
    }

    /// Walk `id`'s bytes one at a time with no allocation — the direct
    /// host-printing adapter.
    pub fn print_direct<F: FnMut(u8)>(&self, id: Id, mut emit: F) {
        for &b in self.get_data(id) {
            emit(b);
        }
    }

    // -- Allocation -----------------------------------------------------

    /// Bind `id` to caller-owned static bytes (a program literal).
    pub fn alloc_const(&mut self, id: Id, bytes: &'static [u8]) -> Result<()> {
        let idx = self.check(id)?;
        if bytes.len() > 255 {
            return Err(Error::StringTooLong);
        }
        self.descriptors[idx] = Descriptor {
            location: Location::External { bytes, offset: 0 },
            len: bytes.len() as u8,
            const_: true,
            writable: false,
        };
        Ok(())
    }

    /// Reserve `size` fresh pool bytes for `id`, running one collection
    /// pass and retrying once on exhaustion.
    pub fn alloc(&mut self, id: Id, size: u8) -> Result<()> {
        let idx = self.check(id)?;
        let offset = self.reserve_with_gc(size)?;
        self.descriptors[idx] = Descriptor {
            location: Location::Pool { offset },
            len: 0,
            const_: false,
            writable: true,
        };
        self.stats.allocations += 1;
        self.stats.peak_cursor = self.stats.peak_cursor.max(self.pool.cursor());
        #[cfg(feature = "defmt")]
        defmt::trace!("bstr-engine: alloc id={} size={} cursor={}", id, size, self.pool.cursor());
        Ok(())
    }

    fn reserve_with_gc(&mut self, n: u8) -> Result<u16> {
        match self.pool.reserve(n) {
            Ok(off) => Ok(off),
            Err(_) => {
                #[cfg(feature = "defmt")]
                defmt::debug!("bstr-engine: pool exhausted, running collection");
                self.garbage_collect();
                self.pool.reserve(n)
            }
        }
    }

    /// `alloc` followed by a copy of `bytes` into the new region.
    pub fn alloc_init(&mut self, id: Id, bytes: &[u8]) -> Result<()> {
        if bytes.len() > 255 {
            return Err(Error::StringTooLong);
        }
        self.alloc(id, bytes.len() as u8)?;
        let idx = self.check(id)?;
        if let Location::Pool { offset } = self.descriptors[idx].location {
            self.pool.write(offset, bytes);
            self.descriptors[idx].len = bytes.len() as u8;
        }
        Ok(())
    }

    /// Clear a slot. Does not reclaim pool bytes; that only happens on the
    /// next collection.
    pub fn free(&mut self, id: Id) -> Result<()> {
        let idx = self.check(id)?;
        self.descriptors[idx] = Descriptor::empty();
        Ok(())
    }

    /// Alias of [`StringEngine::free`] (the spec names both `free` and
    /// `clear` for the same operation).
    pub fn clear(&mut self, id: Id) -> Result<()> {
        self.free(id)
    }

    // -- Assignment -------------------------------------------------------

    /// Copy `src`'s value semantics into `dst`: const-alias, in-place
    /// overwrite, or share, per SPEC_FULL.md §4.
    pub fn copy(&mut self, dst: Id, src: Id) -> Result<()> {
        let di = self.check(dst)?;
        let si = self.check(src)?;
        let src_d = self.descriptors[si];

        if src_d.is_empty() {
            self.descriptors[di] = Descriptor::empty();
            return Ok(());
        }

        if src_d.const_ {
            if let Location::External { bytes, offset } = src_d.location {
                self.descriptors[di] = Descriptor {
                    location: Location::External { bytes, offset },
                    len: src_d.len,
                    const_: true,
                    writable: false,
                };
            }
            return Ok(());
        }

        // src is pool-resident and non-const. Snapshot its bytes before
        // touching dst, since dst may equal src.
        let mut buf = [0u8; 255];
        let src_len = src_d.len as usize;
        buf[..src_len].copy_from_slice(self.bytes_of(si));
        let dst_d = self.descriptors[di];

        if dst_d.writable
            && matches!(dst_d.location, Location::Pool { .. })
            && src_d.len <= dst_d.len
        {
            if let Location::Pool { offset } = dst_d.location {
                self.pool.write(offset, &buf[..src_len]);
                self.descriptors[di].len = src_d.len;
            }
            return Ok(());
        }

        // Share: both descriptors alias src's pool region, both become
        // non-writable. dst.const is not propagated — the source took the
        // const branch above, so reaching here means it is pool-owned.
        if let Location::Pool { offset } = src_d.location {
            self.descriptors[si].writable = false;
            self.descriptors[di] = Descriptor {
                location: Location::Pool { offset },
                len: src_d.len,
                const_: false,
                writable: false,
            };
        }
        Ok(())
    }

    /// Overwrite `dst` with `bytes`, in place if possible, else via a fresh
    /// pool allocation.
    pub fn assign(&mut self, dst: Id, bytes: &[u8]) -> Result<()> {
        let di = self.check(dst)?;
        if bytes.len() > 255 {
            return Err(Error::StringTooLong);
        }
        let new_len = bytes.len() as u8;
        let dst_d = self.descriptors[di];

        if dst_d.writable && matches!(dst_d.location, Location::Pool { .. }) && new_len <= dst_d.len
        {
            if let Location::Pool { offset } = dst_d.location {
                self.pool.write(offset, bytes);
                self.descriptors[di].len = new_len;
            }
            return Ok(());
        }

        self.alloc(dst, new_len)?;
        let idx = self.check(dst)?;
        if let Location::Pool { offset } = self.descriptors[idx].location {
            self.pool.write(offset, bytes);
            self.descriptors[idx].len = new_len;
        }
        Ok(())
    }

    /// Trim trailing ASCII spaces from a fixed-width field (as read by a
    /// random-access `FIELD` statement), then behave as [`Self::assign`].
    pub fn set_from_buf(&mut self, dst: Id, buf: &[u8], width: usize) -> Result<()> {
        let w = width.min(buf.len());
        let mut end = w;
        while end > 0 && buf[end - 1] == b' ' {
            end -= 1;
        }
        self.assign(dst, &buf[..end])
    }

    /// Concatenate `a` and `b` into a freshly allocated, writable `dst`.
    pub fn concat(&mut self, dst: Id, a: Id, b: Id) -> Result<()> {
        let ai = self.check(a)?;
        let bi = self.check(b)?;
        self.check(dst)?;

        let a_len = self.descriptors[ai].len as usize;
        let b_len = self.descriptors[bi].len as usize;
        let total = a_len + b_len;
        if total > 255 {
            return Err(Error::StringTooLong);
        }

        let mut buf = [0u8; 255];
        buf[..a_len].copy_from_slice(self.bytes_of(ai));
        buf[a_len..total].copy_from_slice(self.bytes_of(bi));

        self.alloc(dst, total as u8)?;
        let di = self.check(dst)?;
        if let Location::Pool { offset } = self.descriptors[di].location {
            self.pool.write(offset, &buf[..total]);
            self.descriptors[di].len = total as u8;
        }
        Ok(())
    }

    /// Lexicographic byte comparison. Empty strings order before non-empty
    /// and ties are broken by length — both properties already fall out of
    /// `[u8]`'s `Ord` implementation.
    pub fn compare(&self, a: Id, b: Id) -> Result<core::cmp::Ordering> {
        let ai = self.check(a)?;
        let bi = self.check(b)?;
        Ok(self.bytes_of(ai).cmp(self.bytes_of(bi)))
    }

    // -- Substring views ----------------------------------------------------

    /// `LEFT$(src, n)`: a view of the first `n` bytes of `src`.
    pub fn left(&mut self, dst: Id, src: Id, n: u8) -> Result<()> {
        let di = self.check(dst)?;
        let si = self.check(src)?;
        self.make_view(di, si, 0, n as usize)
    }

    /// `RIGHT$(src, n)`: a view of the last `n` bytes of `src`.
    pub fn right(&mut self, dst: Id, src: Id, n: u8) -> Result<()> {
        let di = self.check(dst)?;
        let si = self.check(src)?;
        let src_len = self.descriptors[si].len as usize;
        let n = n as usize;
        let start = src_len.saturating_sub(n);
        self.make_view(di, si, start, n)
    }

    /// `MID$(src, start, len)`: a view of `src` starting at 1-based `start`.
    pub fn mid(&mut self, dst: Id, src: Id, start: u8, len: u8) -> Result<()> {
        let di = self.check(dst)?;
        let si = self.check(src)?;
        let start0 = if start == 0 { 0 } else { (start - 1) as usize };
        self.make_view(di, si, start0, len as usize)
    }

    fn make_view(&mut self, di: usize, si: usize, start0: usize, want_len: usize) -> Result<()> {
        let src_d = self.descriptors[si];
        let src_len = src_d.len as usize;

        if src_d.is_empty() || want_len == 0 || start0 >= src_len {
            self.descriptors[di] = Descriptor::empty();
            return Ok(());
        }

        let view_len = want_len.min(src_len - start0) as u8;

        match src_d.location {
            Location::External { bytes, offset } => {
                self.descriptors[di] = Descriptor {
                    location: Location::External {
                        bytes,
                        offset: offset + start0 as u16,
                    },
                    len: view_len,
                    const_: true,
                    writable: false,
                };
            }
            Location::Pool { offset } => {
                // Demote the source: it is no longer exclusively owned.
                self.descriptors[si].writable = false;
                self.descriptors[di] = Descriptor {
                    location: Location::Pool {
                        offset: offset + start0 as u16,
                    },
                    len: view_len,
                    const_: false,
                    writable: false,
                };
            }
            Location::Empty => unreachable!("checked above"),
        }
        Ok(())
    }

    /// `MID$(d, start) = bytes` — copy-on-write statement assignment.
    ///
    /// Writes never extend `d`: only `min(bytes.len(), d.len - start)` bytes
    /// are replaced. If `d` is not writable (const or a shared view), a
    /// private copy is materialized first, breaking the aliasing.
    pub fn mid_assign(&mut self, d: Id, start: u8, bytes: &[u8]) -> Result<()> {
        let idx = self.check(d)?;
        let desc = self.descriptors[idx];
        let dlen = desc.len as usize;
        let start0 = if start == 0 { 0 } else { (start - 1) as usize };

        if start0 >= dlen {
            return Ok(());
        }
        let replace_len = bytes.len().min(dlen - start0);
        if replace_len == 0 {
            return Ok(());
        }

        if !desc.writable {
            let mut tmp = [0u8; 255];
            tmp[..dlen].copy_from_slice(self.bytes_of(idx));
            self.alloc(d, dlen as u8)?;
            let idx2 = self.check(d)?;
            if let Location::Pool { offset } = self.descriptors[idx2].location {
                self.pool.write(offset, &tmp[..dlen]);
                self.descriptors[idx2].len = dlen as u8;
            }
        }

        let idx = self.check(d)?;
        if let Location::Pool { offset } = self.descriptors[idx].location {
            self.pool.write(offset + start0 as u16, &bytes[..replace_len]);
        }
        Ok(())
    }
}

#[cfg(feature = "alloc")]
impl<const N: usize, const C: usize> StringEngine<N, C> {
    /// Null-terminated copy of `id`'s bytes, for hosts with a heap. The
    /// direct byte-walking printer ([`StringEngine::print_direct`]) is the
    /// one required path on heap-free targets; this is the optional sibling.
    pub fn to_terminated(&self, id: Id) -> alloc::vec::Vec<u8> {
        let data = self.get_data(id);
        let mut out = alloc::vec::Vec::with_capacity(data.len() + 1);
        out.extend_from_slice(data);
        out.push(0);
        out
    }
}
