//! An optional, diagnostic-only walk over every block and every free-list
//! bucket, checking the invariants the rest of the crate is designed to
//! maintain. Never called from `allocate`/`free`/`reallocate`, and never
//! mutates allocator state — purely observational, kept separate from the
//! allocation hot path.

use std::collections::HashSet;

use crate::allocator::Allocator;
use crate::block;
use crate::config::{NUM_BUCKETS, WORD_SIZE};
use crate::provider::MemoryProvider;
use crate::sizeclass;

/// A detected violation of one of the allocator's invariants.
#[derive(Debug, PartialEq, Eq)]
pub enum ConsistencyError {
    /// (P1) A block's header and footer words disagree.
    HeaderFooterMismatch { block: usize },
    /// (P6) A block's address or size is not a multiple of the word size.
    Misaligned { block: usize },
    /// (P4) Two physically adjacent blocks are both free.
    AdjacentFreeBlocks { first: usize, second: usize },
    /// (P2) A block marked allocated was found in a free-list bucket.
    AllocatedBlockInFreeList { block: usize },
    /// (P3) A free block sits in a bucket other than `index(size(block))`.
    WrongBucket { block: usize, expected: usize, actual: usize },
    /// (P7) Sizes within a bucket are not non-decreasing along `next`.
    BucketNotSorted { bucket: usize, block: usize },
    /// (P5) A free block found by the block walk never appears in any
    /// bucket's list.
    MissingFromFreeList { block: usize },
    /// A block appears in a bucket's list but was not seen (as free) during
    /// the block walk — a stale or duplicate free-list entry.
    ExtraFreeListEntry { block: usize },
}

impl<P: MemoryProvider> Allocator<P> {
    /// Walks every block from `heap_start` to `heap_high`, then every
    /// bucket, checking invariants P1-P7. Returns the first violation
    /// found, if any.
    pub fn check_integrity(&self) -> Result<(), ConsistencyError> {
        let heap_high = self.provider.heap_high();
        let mut free_blocks_seen = HashSet::new();
        let mut prev_was_free: Option<usize> = None;
        let mut b = self.heap_start();

        while b <= heap_high {
            if b % WORD_SIZE != 0 {
                return Err(ConsistencyError::Misaligned { block: b });
            }
            let size = block::size(b);
            if size % WORD_SIZE != 0 {
                return Err(ConsistencyError::Misaligned { block: b });
            }
            let header = unsafe { block::read_word(b) };
            let footer = unsafe { block::read_word(block::footer_of(b)) };
            if header != footer {
                return Err(ConsistencyError::HeaderFooterMismatch { block: b });
            }

            let allocated = block::is_allocated(b);
            if !allocated {
                if let Some(prev_free) = prev_was_free {
                    return Err(ConsistencyError::AdjacentFreeBlocks {
                        first: prev_free,
                        second: b,
                    });
                }
                free_blocks_seen.insert(b);
                prev_was_free = Some(b);
            } else {
                prev_was_free = None;
            }

            b = block::next_physical(b);
        }

        for i in 0..NUM_BUCKETS {
            let mut cur = self.freelist.head(i);
            let mut last_size = 0usize;
            while cur != 0 {
                if block::is_allocated(cur) {
                    return Err(ConsistencyError::AllocatedBlockInFreeList { block: cur });
                }
                let size = block::size(cur);
                let expected = sizeclass::index(size);
                if expected != i {
                    return Err(ConsistencyError::WrongBucket {
                        block: cur,
                        expected,
                        actual: i,
                    });
                }
                if size < last_size {
                    return Err(ConsistencyError::BucketNotSorted { bucket: i, block: cur });
                }
                last_size = size;
                if !free_blocks_seen.remove(&cur) {
                    return Err(ConsistencyError::ExtraFreeListEntry { block: cur });
                }
                cur = block::link_next(cur);
            }
        }

        if let Some(&missing) = free_blocks_seen.iter().next() {
            return Err(ConsistencyError::MissingFromFreeList { block: missing });
        }

        Ok(())
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
    fn empty_heap_is_consistent() {
        let heap = fresh_heap();
        assert_eq!(heap.check_integrity(), Ok(()));
    }

    #[test]
    fn heap_stays_consistent_through_alloc_free_cycles() {
        let mut heap = fresh_heap();
        let mut ptrs = Vec::new();
        for size in [16usize, 100, 4096, 1, 8000, 64] {
            ptrs.push(heap.allocate(size));
            heap.check_integrity().unwrap();
        }
        for p in ptrs.into_iter().flatten() {
            heap.free(p);
            heap.check_integrity().unwrap();
        }
    }

    #[test]
    fn heap_stays_consistent_through_reallocation() {
        let mut heap = fresh_heap();
        let a = heap.allocate(64).unwrap();
        let b = heap.allocate(64).unwrap();
        let c = heap.allocate(64).unwrap();
        heap.free(a);
        heap.free(c);
        let grown = heap.reallocate(b, 160).unwrap();
        heap.check_integrity().unwrap();
        heap.free(grown);
        heap.check_integrity().unwrap();
    }
}
