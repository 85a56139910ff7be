//! # Range Allocator
//!
//! Index-range allocator over a fixed-capacity buffer: a bump pointer for
//! fresh space plus a sorted free list of released ranges.

use std::ops::Range;

/// Allocates half-open index ranges inside a buffer of fixed length.
///
/// New ranges come from the best-fitting released range if one exists,
/// otherwise from the bump tail. Released ranges are coalesced with their
/// neighbours, and a released range that touches the tail pulls the tail
/// back. Nothing is ever compacted.
///
/// # Thread Safety
///
/// Not thread-safe. The registry mutates it single-threaded.
///
/// # Example
///
/// ```rust,ignore
/// let mut ranges = RangeAllocator::new(1024);
/// let a = ranges.allocate(16).unwrap(); // 0..16
/// ranges.free(a);
/// let b = ranges.allocate(8).unwrap();  // 0..8, reused
/// ```
#[derive(Clone, Debug)]
pub struct RangeAllocator {
    /// Released ranges, sorted by start, never adjacent to each other.
    free: Vec<Range<usize>>,
    /// Bump offset; everything at or past it is unused.
    top: usize,
    /// Total capacity in elements.
    capacity: usize,
    /// Elements currently handed out.
    allocated: usize,
}

impl RangeAllocator {
    /// Creates an allocator over `capacity` elements.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            free: Vec::new(),
            top: 0,
            capacity,
            allocated: 0,
        }
    }

    /// Returns the total capacity in elements.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of elements currently allocated.
    #[inline]
    #[must_use]
    pub const fn used(&self) -> usize {
        self.allocated
    }

    /// Returns the number of unallocated elements, fragmented or not.
    #[inline]
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.capacity - self.allocated
    }

    /// Returns the bump offset (one past the highest element ever in use
    /// that has not been released back to the tail).
    #[inline]
    #[must_use]
    pub const fn high_water(&self) -> usize {
        self.top
    }

    /// Returns the released ranges waiting for reuse.
    #[inline]
    #[must_use]
    pub fn free_ranges(&self) -> &[Range<usize>] {
        &self.free
    }

    /// Allocates `len` contiguous elements.
    ///
    /// # Returns
    ///
    /// The allocated range, or None if `len` is zero or nothing fits.
    pub fn allocate(&mut self, len: usize) -> Option<Range<usize>> {
        if len == 0 {
            return None;
        }

        let best = self
            .free
            .iter()
            .enumerate()
            .filter(|(_, r)| r.len() >= len)
            .min_by_key(|(_, r)| r.len())
            .map(|(i, _)| i);

        let start = if let Some(i) = best {
            let start = self.free[i].start;
            if self.free[i].len() == len {
                self.free.remove(i);
            } else {
                self.free[i].start += len;
            }
            start
        } else {
            let end = self.top.checked_add(len)?;
            if end > self.capacity {
                return None;
            }
            let start = self.top;
            self.top = end;
            start
        };

        self.allocated += len;
        Some(start..start + len)
    }

    /// Releases a range previously returned by [`allocate`](Self::allocate).
    pub fn free(&mut self, range: Range<usize>) {
        if range.is_empty() {
            return;
        }
        debug_assert!(range.end <= self.top, "Freed range past the tail");
        self.allocated -= range.len();

        let pos = self
            .free
            .binary_search_by_key(&range.start, |r| r.start)
            .unwrap_or_else(|pos| pos);
        debug_assert!(
            pos == self.free.len() || self.free[pos].start >= range.end,
            "Double free"
        );
        self.free.insert(pos, range);

        // Merge with the following range.
        if pos + 1 < self.free.len() && self.free[pos].end == self.free[pos + 1].start {
            self.free[pos].end = self.free[pos + 1].end;
            self.free.remove(pos + 1);
        }
        // Merge with the preceding range.
        if pos > 0 && self.free[pos - 1].end == self.free[pos].start {
            self.free[pos - 1].end = self.free[pos].end;
            self.free.remove(pos);
        }
        // Retract the tail.
        if self.free.last().is_some_and(|last| last.end == self.top) {
            if let Some(last) = self.free.pop() {
                self.top = last.start;
            }
        }
    }

    /// Extends `range` to `new_len` without moving it, using the free space
    /// directly after it.
    ///
    /// # Returns
    ///
    /// `true` if the range now covers `range.start..range.start + new_len`.
    pub fn grow_in_place(&mut self, range: &Range<usize>, new_len: usize) -> bool {
        if new_len <= range.len() {
            return true;
        }
        let extra = new_len - range.len();
        let Some(new_end) = range.start.checked_add(new_len) else {
            return false;
        };

        if range.end == self.top {
            if new_end > self.capacity {
                return false;
            }
            self.top = new_end;
            self.allocated += extra;
            return true;
        }

        let Ok(i) = self.free.binary_search_by_key(&range.end, |r| r.start) else {
            return false;
        };
        if self.free[i].len() < extra {
            return false;
        }
        if self.free[i].len() == extra {
            self.free.remove(i);
        } else {
            self.free[i].start += extra;
        }
        self.allocated += extra;
        true
    }

    /// Shrinks `range` to `new_len`, releasing its tail.
    pub fn shrink_in_place(&mut self, range: &Range<usize>, new_len: usize) {
        if new_len < range.len() {
            self.free(range.start + new_len..range.end);
        }
    }

    /// Takes back exactly `range`, which must be entirely unallocated.
    ///
    /// Used to undo a [`free`](Self::free) when the follow-up allocation
    /// failed.
    ///
    /// # Returns
    ///
    /// `false` (and nothing changes) if any part of `range` is in use or
    /// past the capacity.
    pub fn reserve(&mut self, range: Range<usize>) -> bool {
        if range.is_empty() {
            return true;
        }
        if range.end > self.capacity {
            return false;
        }

        if range.start >= self.top {
            // Free blocks never touch the tail, so the gap cannot merge.
            if range.start > self.top {
                self.free.push(self.top..range.start);
            }
            self.top = range.end;
        } else {
            let Some(i) = self
                .free
                .iter()
                .position(|r| r.start <= range.start && range.end <= r.end)
            else {
                return false;
            };
            let block = self.free.remove(i);
            if range.end < block.end {
                self.free.insert(i, range.end..block.end);
            }
            if block.start < range.start {
                self.free.insert(i, block.start..range.start);
            }
        }

        self.allocated += range.len();
        true
    }
}
