//! The reallocation engine: shrink in place when possible, then try (in
//! order) absorbing both physical neighbors, the next neighbor alone, the
//! previous neighbor alone, growing the tail of the heap, and finally a
//! fresh allocate-copy-free as the fallback.

use crate::allocator::Allocator;
use crate::block;
use crate::config::{MIN_BLOCK_SIZE, WORD_SIZE};
use crate::placement::needed_size;
use crate::provider::MemoryProvider;

/// `memmove`-equivalent copy of a block's user payload; source and
/// destination may overlap in the sandwich and backward-neighbor paths.
unsafe fn copy_payload(src_user: usize, dst_user: usize, n: usize) {
    unsafe { core::ptr::copy(src_user as *const u8, dst_user as *mut u8, n) };
}

impl<P: MemoryProvider> Allocator<P> {
    /// Resizes the allocation at `u` to hold `s` bytes, preserving its
    /// existing contents up to the smaller of the old and new sizes.
    /// `u == 0` behaves like `allocate(s)`.
    pub fn reallocate(&mut self, u: usize, s: usize) -> Option<usize> {
        if u == 0 {
            return self.allocate(s);
        }
        let need = needed_size(s);
        let b = u - WORD_SIZE;
        let cur = block::size(b);

        if need <= cur {
            Some(self.shrink(b, cur, need))
        } else {
            self.grow(u, b, cur, need, s)
        }
    }

    /// Shrinks `b` in place, splitting off a free tail only when the
    /// residue strictly exceeds the minimum block size.
    fn shrink(&mut self, b: usize, cur: usize, need: usize) -> usize {
        if cur - need > MIN_BLOCK_SIZE {
            block::set_header_footer(b, need, true);
            let tail = b + need;
            block::set_header_footer(tail, cur - need, false);
            self.release_block(tail);
        }
        b + WORD_SIZE
    }

    /// Grows `b` to `need` bytes, trying each faster path before falling
    /// back to a fresh allocation.
    fn grow(&mut self, u: usize, b: usize, cur: usize, need: usize, s: usize) -> Option<usize> {
        let prev = self.prev_if_free(b);
        let next = self.next_if_free(b);

        // 1. Sandwich: both neighbors free and, combined, big enough.
        if let (Some(p), Some(n)) = (prev, next) {
            let sum = block::size(p) + cur + block::size(n);
            if sum >= need {
                self.freelist.unlink(p);
                self.freelist.unlink(n);
                let slack = sum - need;
                return Some(if slack < MIN_BLOCK_SIZE {
                    block::set_header_footer(p, sum, true);
                    unsafe { copy_payload(u, p + WORD_SIZE, cur - 2 * WORD_SIZE) };
                    p + WORD_SIZE
                } else {
                    // Place the allocation at the highest address within
                    // the combined range; the low prefix becomes free.
                    let base = p + slack;
                    unsafe { copy_payload(u, base + WORD_SIZE, cur - 2 * WORD_SIZE) };
                    block::set_header_footer(base, need, true);
                    block::set_header_footer(p, slack, false);
                    self.freelist.insert(p);
                    base + WORD_SIZE
                });
            }
        }

        // 2. Forward-only: the next block alone is enough, grow in place.
        if let Some(n) = next {
            let sum = cur + block::size(n);
            if sum >= need {
                self.freelist.unlink(n);
                let residue = sum - need;
                if residue < MIN_BLOCK_SIZE {
                    block::set_header_footer(b, sum, true);
                } else {
                    block::set_header_footer(b, need, true);
                    let tail = b + need;
                    block::set_header_footer(tail, residue, false);
                    self.release_block(tail);
                }
                return Some(u);
            }
        }

        // 3. Backward-only: the previous block alone is enough.
        if let Some(p) = prev {
            let sum = block::size(p) + cur;
            if sum >= need {
                self.freelist.unlink(p);
                let residue = sum - need;
                return Some(if residue < MIN_BLOCK_SIZE {
                    block::set_header_footer(p, sum, true);
                    unsafe { copy_payload(u, p + WORD_SIZE, cur - 2 * WORD_SIZE) };
                    p + WORD_SIZE
                } else {
                    let base = b + cur - need;
                    unsafe { copy_payload(u, base + WORD_SIZE, cur - 2 * WORD_SIZE) };
                    block::set_header_footer(base, need, true);
                    block::set_header_footer(p, residue, false);
                    self.freelist.insert(p);
                    base + WORD_SIZE
                });
            }
        }

        // 4. b is the last block in the heap: grow the tail.
        if self.is_last(b) {
            return if let Some(p) = prev {
                let combined = block::size(p) + cur;
                let extra = need.saturating_sub(combined);
                if extra > 0 {
                    self.provider.extend_heap(extra)?;
                }
                self.freelist.unlink(p);
                unsafe { copy_payload(u, p + WORD_SIZE, cur - 2 * WORD_SIZE) };
                block::set_header_footer(p, need, true);
                Some(p + WORD_SIZE)
            } else {
                let extra = need - cur;
                self.provider.extend_heap(extra)?;
                block::set_header_footer(b, need, true);
                Some(u)
            };
        }

        // 5. Fallback: fresh allocation, copy, free the old block.
        let new_user = self.allocate(s)?;
        unsafe { copy_payload(u, new_user, cur - 2 * WORD_SIZE) };
        self.free(u);
        Some(new_user)
    }
}
