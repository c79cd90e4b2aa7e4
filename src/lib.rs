//! # rallocator - a segregated free-list heap allocator
//!
//! A general-purpose heap allocator over a contiguous, monotonically
//! growable byte region. It exposes the classical triad:
//!
//! - `allocate(size) -> address`
//! - `free(address)`
//! - `reallocate(address, new_size) -> address`
//!
//! Single-threaded, no concurrent mutators. Correctness rests entirely on
//! invariants over raw byte offsets: every block carries a duplicated
//! header/footer word encoding its size and allocated bit, free blocks are
//! segregated into `K` size-class buckets and linked in-band, and
//! neighboring free blocks are always coalesced.
//!
//! ## Crate structure
//!
//! ```text
//!   rallocator
//!   ├── config      - tunable constants (word size, bucket count, knobs)
//!   ├── provider     - the memory-provider collaborator
//!   │                  (sbrk-backed, plus an in-memory fake for tests)
//!   ├── block        - boundary-tagged block layout and navigation
//!   ├── sizeclass    - size -> bucket index mapping
//!   ├── freelist     - segregated, size-ordered doubly linked free lists
//!   ├── placement    - allocate()'s first-fit search and growth policy
//!   ├── coalesce     - neighbor merging and free()
//!   ├── realloc      - the tiered reallocate() engine
//!   ├── integrity    - optional, diagnostic-only invariant checker
//!   └── allocator    - the public Allocator<P> type tying it together
//! ```
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use rallocator::{Allocator, VecProvider};
//!
//! let provider = VecProvider::with_capacity(1 << 20);
//! let mut heap = Allocator::init(provider).unwrap();
//!
//! let p = heap.allocate(100).unwrap();
//! unsafe { (p as *mut u8).write(42) };
//!
//! let p = heap.reallocate(p, 400).unwrap();
//! heap.free(p);
//! ```
//!
//! ## Safety
//!
//! The block, free-list, placement, coalescing, and realloc code all
//! operate on raw byte offsets into a provider-owned memory region; every
//! unsafe memory access is isolated behind the `block` module's
//! `read_word`/`write_word` and the accessors built on them. Everything
//! above that layer is ordinary safe Rust preserving the invariants
//! [`Allocator::check_integrity`] can verify.
//!
//! ## Limitations
//!
//! - **Single-threaded only**: no synchronization primitives; embedders
//!   providing multi-threaded access must serialize externally.
//! - **8-byte alignment only**: the allocator does not support arbitrary
//!   alignment requests.
//! - **The heap never shrinks**: freed memory is reused in place but never
//!   returned to the provider.

mod allocator;
mod block;
mod coalesce;
mod config;
mod freelist;
mod integrity;
mod placement;
mod provider;
mod realloc;
mod sizeclass;

pub use allocator::{Allocator, InitError};
pub use integrity::ConsistencyError;
pub use provider::{MemoryProvider, SbrkProvider, VecProvider};
