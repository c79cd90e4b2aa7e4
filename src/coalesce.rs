//! Merges a block with any free physical neighbor(s), and the `free`
//! operation built on top of it.

use crate::allocator::Allocator;
use crate::block;
use crate::config::WORD_SIZE;
use crate::provider::MemoryProvider;

impl<P: MemoryProvider> Allocator<P> {
    /// Merges `b` with its free physical neighbors, if any. May return an
    /// address below `b` if the previous block absorbed it. Neither
    /// neighbor of the returned block is free afterward; the result is not
    /// yet reinserted into any free list — callers do that themselves.
    pub(crate) fn coalesce(&mut self, mut b: usize) -> usize {
        if let Some(next) = self.next_if_free(b) {
            self.freelist.unlink(next);
            let merged = block::size(b) + block::size(next);
            block::set_header_footer(b, merged, false);
        }
        if let Some(prev) = self.prev_if_free(b) {
            self.freelist.unlink(prev);
            let merged = block::size(prev) + block::size(b);
            block::set_header_footer(prev, merged, false);
            b = prev;
        }
        b
    }

    /// Coalesces `b` and reinserts the (possibly larger, possibly relocated)
    /// result into its free-list bucket, leaving it marked free. Shared by
    /// `free` and `reallocate`'s shrink and forward-growth paths.
    pub(crate) fn release_block(&mut self, b: usize) -> usize {
        let merged = self.coalesce(b);
        self.freelist.insert(merged);
        block::set_header_footer(merged, block::size(merged), false);
        merged
    }

    /// Frees a previously allocated block. Double-frees are reported and
    /// ignored rather than left to corrupt the heap; freeing `0` (null) is
    /// a no-op.
    pub fn free(&mut self, u: usize) {
        if u == 0 {
            return;
        }
        let b = u - WORD_SIZE;
        if !block::is_allocated(b) {
            eprintln!("rallocator: double free at {u:#x}, ignoring");
            return;
        }
        self.release_block(b);
    }
}

#[cfg(test)]
mod tests {
    use crate::allocator::Allocator;
    use crate::provider::VecProvider;

    fn fresh_heap() -> Allocator<VecProvider> {
        Allocator::init(VecProvider::with_capacity(1 << 20)).unwrap()
    }

    #[test]
    fn free_null_is_a_noop() {
        let mut heap = fresh_heap();
        heap.free(0);
    }

    #[test]
    fn freeing_adjacent_blocks_coalesces_them() {
        let mut heap = fresh_heap();
        let a = heap.allocate(64).unwrap();
        let b = heap.allocate(64).unwrap();
        let c = heap.allocate(64).unwrap();
        heap.free(a);
        heap.free(b);
        heap.free(c);
        // Reallocating something that needs all three blocks combined
        // should succeed without growing the heap.
        let before = heap.heap_size();
        let big = heap.allocate(64 * 3 + 64).unwrap();
        assert!(big > 0);
        assert_eq!(heap.heap_size(), before);
    }

    #[test]
    fn double_free_does_not_corrupt_the_heap() {
        let mut heap = fresh_heap();
        let p = heap.allocate(64).unwrap();
        heap.free(p);
        heap.free(p); // reported, ignored
        let q = heap.allocate(64).unwrap();
        assert_eq!(q, p);
    }
}
