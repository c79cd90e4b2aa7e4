//! `allocate`'s placement policy: first-fit search over the segregated
//! buckets, falling back to heap growth with the "small blocks clustered"
//! rule when no free block is big enough.

use crate::allocator::Allocator;
use crate::block;
use crate::config::{LAST_BLOCK_GROWTH_THRESHOLD_WORDS, MIN_BLOCK_SIZE, NUM_BUCKETS, WORD_SIZE};
use crate::provider::MemoryProvider;
use crate::sizeclass;

/// Converts a user byte count into the actual block size needed: room for
/// header, footer, and payload, rounded up to a word and never below the
/// minimum block size.
pub(crate) fn needed_size(s: usize) -> usize {
    crate::config::align_up(s + 2 * WORD_SIZE, WORD_SIZE).max(MIN_BLOCK_SIZE)
}

impl<P: MemoryProvider> Allocator<P> {
    /// Returns an 8-byte-aligned pointer to `s` usable bytes, or `None` if
    /// `s == 0` or the provider cannot grow the heap enough to satisfy the
    /// request.
    pub fn allocate(&mut self, s: usize) -> Option<usize> {
        if s == 0 {
            return None;
        }
        let need = needed_size(s);

        if let Some(p) = self.find_fit(need) {
            self.freelist.unlink(p);
            let old = block::size(p);
            if old - need >= MIN_BLOCK_SIZE {
                block::set_header_footer(p, need, true);
                let remainder = p + need;
                block::set_header_footer(remainder, old - need, false);
                self.freelist.insert(remainder);
            } else {
                block::set_header_footer(p, old, true);
            }
            return Some(p + WORD_SIZE);
        }

        self.grow_and_place(need)
    }

    /// First-fit: starting at the smallest bucket that could hold `need`,
    /// scan head to tail for the first block large enough, advancing to the
    /// next non-empty bucket on a miss.
    fn find_fit(&self, need: usize) -> Option<usize> {
        let start = sizeclass::index(need);
        for i in start..NUM_BUCKETS {
            let mut cur = self.freelist.head(i);
            while cur != 0 {
                if block::size(cur) >= need {
                    return Some(cur);
                }
                cur = block::link_next(cur);
            }
        }
        None
    }

    /// No free block fit; grow the heap. Inspects the current last block
    /// (if any) to decide between absorbing it, leaving it alone, or
    /// proactively carving out a spare small free block.
    fn grow_and_place(&mut self, need: usize) -> Option<usize> {
        let threshold = LAST_BLOCK_GROWTH_THRESHOLD_WORDS * WORD_SIZE;

        match self.last_block() {
            Some(last) if !block::is_allocated(last) => {
                let last_size = block::size(last);
                if last_size > threshold {
                    // Grow only what's needed; a large free tail stays a
                    // large free tail rather than an allocated overshoot.
                    let extra = need - last_size;
                    self.provider.extend_heap(extra)?;
                    self.freelist.unlink(last);
                    block::set_header_footer(last, need, true);
                    Some(last + WORD_SIZE)
                } else {
                    // The small free tail may still be claimed by a later
                    // small request; leave it and grow fresh instead.
                    let base = self.provider.extend_heap(need)?;
                    block::set_header_footer(base, need, true);
                    Some(base + WORD_SIZE)
                }
            }
            _ => {
                if need > threshold {
                    let base = self.provider.extend_heap(need)?;
                    block::set_header_footer(base, need, true);
                    Some(base + WORD_SIZE)
                } else {
                    // Proactively reserve adjacent small-block space.
                    let base = self.provider.extend_heap(2 * need)?;
                    block::set_header_footer(base, need, true);
                    let spare = base + need;
                    block::set_header_footer(spare, need, false);
                    self.freelist.insert(spare);
                    Some(base + WORD_SIZE)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::VecProvider;

    fn fresh_heap() -> Allocator<VecProvider> {
        Allocator::init(VecProvider::with_capacity(1 << 20)).unwrap()
    }

    #[test]
    fn allocate_zero_returns_none() {
        let mut heap = fresh_heap();
        assert!(heap.allocate(0).is_none());
    }

    #[test]
    fn first_allocation_grows_the_heap() {
        let mut heap = fresh_heap();
        let before = heap.heap_size();
        let p = heap.allocate(1).unwrap();
        assert!(p > 0);
        assert!(heap.heap_size() > before);
    }

    #[test]
    fn small_request_reserves_a_spare_free_block() {
        let mut heap = fresh_heap();
        let need = needed_size(1);
        heap.allocate(1).unwrap();
        // The spare half should be visible as a free block in its bucket.
        let i = sizeclass::index(need);
        assert_ne!(heap.freelist.head(i), 0);
    }

    #[test]
    fn allocate_one_byte_grows_the_heap_by_two_minimum_blocks() {
        let mut heap = fresh_heap();
        let prefix = heap.heap_size();
        let p = heap.allocate(1).unwrap();
        // needed_size(1) == 32 (the 4-word minimum); placement doubles that
        // for a small first request, reserving a spare block alongside it.
        assert_eq!(needed_size(1), MIN_BLOCK_SIZE);
        assert_eq!(heap.heap_size() - prefix, 64);
        assert_eq!(p, heap.heap_start() + WORD_SIZE);

        let i = sizeclass::index(32);
        let spare = heap.freelist.head(i);
        assert_eq!(spare, heap.heap_start() + 32);
        assert_eq!(block::size(spare), 32);
    }

    #[test]
    fn freeing_a_large_allocation_lands_in_the_expected_bucket() {
        let mut heap = fresh_heap();
        let need = needed_size(1000);
        assert_eq!(need, 1016);
        assert_eq!(sizeclass::index(need), 4);

        let p = heap.allocate(1000).unwrap();
        heap.free(p);
        assert_eq!(heap.freelist.head(4), p - WORD_SIZE);
    }

    #[test]
    fn freed_block_is_reused_by_a_later_allocation_of_the_same_size() {
        let mut heap = fresh_heap();
        let a = heap.allocate(100).unwrap();
        let b = heap.allocate(100).unwrap();
        heap.free(a);
        let before = heap.heap_size();
        let c = heap.allocate(100).unwrap();
        assert_eq!(c, a);
        assert_eq!(heap.heap_size(), before);
        heap.free(b);
        heap.free(c);
    }

    #[test]
    fn splitting_leaves_behind_a_correctly_sized_free_block() {
        let mut heap = fresh_heap();
        // A big block, then request a tiny chunk that should carve a
        // splinter instead of consuming the whole thing.
        let big = heap.allocate(4096).unwrap();
        heap.free(big);
        let small = heap.allocate(16).unwrap();
        assert_eq!(small, big);
        // Leftover free space should still satisfy a large future request
        // without growing the heap further.
        let before = heap.heap_size();
        let reused = heap.allocate(3000);
        assert!(reused.is_some());
        assert_eq!(heap.heap_size(), before);
    }
}
