//! Per-bucket doubly linked free lists, stored in-band in the free blocks
//! themselves. `NUM_BUCKETS` bucket-head words live at the base of the
//! managed heap region (the "prefix" from the heap layout) rather than as a
//! plain Rust array, so the whole free-list state lives in the one region
//! the allocator owns.

use crate::block::{self, read_word, write_word};
use crate::config::{NUM_BUCKETS, WORD_SIZE};
use crate::sizeclass;

pub(crate) struct FreeList {
    bucket_base: usize,
}

impl FreeList {
    pub(crate) fn new(bucket_base: usize) -> Self {
        Self { bucket_base }
    }

    fn head_slot(&self, i: usize) -> usize {
        self.bucket_base + i * WORD_SIZE
    }

    pub(crate) fn head(&self, i: usize) -> usize {
        debug_assert!(i < NUM_BUCKETS);
        unsafe { read_word(self.head_slot(i)) }
    }

    fn set_head(&self, i: usize, value: usize) {
        unsafe { write_word(self.head_slot(i), value) }
    }

    /// Inserts `b` into its size-class bucket, splicing it before the first
    /// entry whose size is `>= size(b)` so the list stays non-decreasing.
    pub(crate) fn insert(&self, b: usize) {
        let i = sizeclass::index(block::size(b));
        let mut prev = 0usize;
        let mut cur = self.head(i);
        while cur != 0 && block::size(cur) < block::size(b) {
            prev = cur;
            cur = block::link_next(cur);
        }
        block::set_link_prev(b, prev);
        block::set_link_next(b, cur);
        if cur != 0 {
            block::set_link_prev(cur, b);
        }
        if prev != 0 {
            block::set_link_next(prev, b);
        } else {
            self.set_head(i, b);
        }
    }

    /// Removes `b` from whichever bucket it currently occupies.
    pub(crate) fn unlink(&self, b: usize) {
        let i = sizeclass::index(block::size(b));
        let prev = block::link_prev(b);
        let next = block::link_next(b);
        if prev != 0 {
            block::set_link_next(prev, next);
        } else {
            self.set_head(i, next);
        }
        if next != 0 {
            block::set_link_prev(next, prev);
        }
    }
}
