//! tagheap: a fixed-capacity explicit allocator.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the tagheap sub-crates. For most users, adding `tagheap` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use tagheap::prelude::*;
//!
//! let mut heap = Heap::new(HeapConfig::new(64)).unwrap();
//!
//! // 4 payload bytes + 9 header bytes, split off the front of the arena.
//! let p = heap.allocate(4).unwrap();
//! assert_eq!(p, PayloadOffset(10));
//! heap.payload_mut(p).unwrap().copy_from_slice(b"abcd");
//!
//! heap.free(p).unwrap();
//! assert_eq!(heap.free(p), Err(HeapError::DoubleFree { payload: p }));
//!
//! // Freed space coalesced back into one chunk.
//! assert_eq!(heap.stats().chunks, 1);
//! heap.check().unwrap();
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `tagheap-core` | Offsets, chunk header codec, errors, `HeapAllocator` |
//! | [`arena`] | `tagheap-arena` | `Heap`, `Arena`, free list, inspection, config |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, traits, and errors (`tagheap-core`).
///
/// Contains the offset newtypes, the 9-byte [`types::ChunkHeader`] codec,
/// and the [`types::HeapAllocator`] trait.
pub use tagheap_core as types;

/// The allocator and its byte store (`tagheap-arena`).
///
/// Most users only need [`arena::Heap`] and [`arena::HeapConfig`]; both
/// are also available in the [`prelude`].
pub use tagheap_arena as arena;

/// Common imports for typical tagheap usage.
///
/// ```rust
/// use tagheap::prelude::*;
/// ```
pub mod prelude {
    // Allocator
    pub use tagheap_arena::{FreeValidation, Heap, HeapConfig, HeapStats};

    // Core types and traits
    pub use tagheap_core::{ChunkOffset, HeapAllocator, PayloadOffset, Vacancy};

    // Errors
    pub use tagheap_core::{ConfigError, HeapError, InvalidFreeReason};
    pub use tagheap_arena::InvariantViolation;
}
