//! The public `Allocator<P>` type: owns the bucket-head array and the heap
//! region, and ties the block, free-list, placement, coalescer, and
//! realloc modules into the four client-facing operations.

use crate::block;
use crate::config::{align_up, NUM_BUCKETS, WORD_SIZE};
use crate::freelist::FreeList;
use crate::provider::MemoryProvider;

/// Why [`Allocator::init`] failed.
#[derive(Debug, PartialEq, Eq)]
pub enum InitError {
    /// The provider refused the initial `align(K*W)`-byte extension needed
    /// to host the bucket-head prefix.
    ProviderRefused,
}

/// A heap allocator over a provider-owned, monotonically growable byte
/// region. Single-threaded; embedders providing multi-threaded access must
/// serialize externally.
pub struct Allocator<P: MemoryProvider> {
    pub(crate) provider: P,
    pub(crate) heap_low: usize,
    pub(crate) heap_start: usize,
    pub(crate) freelist: FreeList,
}

impl<P: MemoryProvider> Allocator<P> {
    /// Claims the initial `K` bucket-head words from `provider` and returns
    /// a ready-to-use, empty allocator.
    pub fn init(mut provider: P) -> Result<Self, InitError> {
        let prefix_size = align_up(NUM_BUCKETS * WORD_SIZE, WORD_SIZE);
        let base = provider
            .extend_heap(prefix_size)
            .ok_or(InitError::ProviderRefused)?;
        for i in 0..NUM_BUCKETS {
            unsafe { block::write_word(base + i * WORD_SIZE, 0) };
        }
        let heap_start = base + prefix_size;
        Ok(Self {
            provider,
            heap_low: base,
            heap_start,
            freelist: FreeList::new(base),
        })
    }

    /// The base address of the first possible block (just past the bucket
    /// prefix). There may be no blocks there yet if the heap is empty.
    pub(crate) fn heap_start(&self) -> usize {
        self.heap_start
    }

    /// The base address of the heap's last block, read from its footer —
    /// `None` if no block has ever been carved out of the heap yet.
    pub(crate) fn last_block(&self) -> Option<usize> {
        let high = self.provider.heap_high();
        if high < self.heap_start {
            return None;
        }
        let footer_addr = high + 1 - WORD_SIZE;
        let tag = unsafe { block::read_word(footer_addr) };
        let size = tag & !1usize;
        Some(high + 1 - size)
    }

    /// Whether `b` is the physically last block in the heap (no successor).
    pub(crate) fn is_last(&self, b: usize) -> bool {
        block::next_physical(b) > self.provider.heap_high()
    }

    /// `b`'s predecessor, if one exists and is free.
    pub(crate) fn prev_if_free(&self, b: usize) -> Option<usize> {
        if b > self.heap_start {
            let p = block::prev_physical(b);
            if !block::is_allocated(p) {
                return Some(p);
            }
        }
        None
    }

    /// `b`'s successor, if one exists within the heap and is free.
    pub(crate) fn next_if_free(&self, b: usize) -> Option<usize> {
        let n = block::next_physical(b);
        if n <= self.provider.heap_high() && !block::is_allocated(n) {
            return Some(n);
        }
        None
    }

    /// Number of bytes the underlying provider currently manages.
    pub fn heap_size(&self) -> usize {
        self.provider.heap_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::VecProvider;

    #[test]
    fn init_reserves_the_bucket_prefix() {
        let provider = VecProvider::with_capacity(1 << 16);
        let heap = Allocator::init(provider).unwrap();
        assert_eq!(heap.heap_start(), heap.heap_low + NUM_BUCKETS * WORD_SIZE);
        assert!(heap.last_block().is_none());
    }

    #[test]
    fn init_fails_when_provider_refuses_the_prefix() {
        let provider = VecProvider::with_capacity(4);
        assert_eq!(Allocator::init(provider).unwrap_err(), InitError::ProviderRefused);
    }
}
