//! First-fit boundary-tag allocator over a fixed-capacity byte arena.
//!
//! A [`Heap`] owns one byte buffer and hands out payload offsets into it.
//! No operating-system heap is consulted after construction.
//!
//! # Architecture
//!
//! ```text
//! Heap (allocate / free orchestration)
//! ├── Arena      bounds-checked byte store, offset <-> location mapping,
//! │              header reads and writes
//! ├── FreeList   intrusive doubly linked list threaded through the
//! │              next/prev fields of free chunk headers (LIFO insertion)
//! └── Coalescer  merges a freed chunk with free address neighbours
//! ```
//!
//! # Arena layout
//!
//! ```text
//! offset 0   1                14                                    C
//!        ┌───┬────────────────┬─────────────────────────────────────┐
//!        │ ∅ │ hdr │ payload  │ hdr │ payload ...                   │
//!        └───┴────────────────┴─────────────────────────────────────┘
//!          ▲   └─ chunk (size 13, occupied)
//!          └── null byte: offset 0 never starts a chunk
//! ```
//!
//! Chunks partition `[1, C-1]` exactly. Each header records its own size
//! and its left neighbour's size (the boundary tag), so both neighbours of
//! any chunk are reachable in O(1).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod arena;
mod check;
mod coalesce;
pub mod config;
pub mod error;
pub mod free_list;
pub mod heap;
pub mod inspect;

// Public re-exports for the primary API surface.
pub use arena::Arena;
pub use config::{FreeValidation, HeapConfig};
pub use error::InvariantViolation;
pub use free_list::FreeList;
pub use heap::Heap;
pub use inspect::{ChunkView, Chunks, FreeChunks, HeapStats};
