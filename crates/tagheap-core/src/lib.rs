//! Core types and traits for the tagheap allocator.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the fundamental abstractions used throughout the tagheap workspace:
//! offset types, the on-arena chunk header format, error types, and the
//! [`HeapAllocator`] trait.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod header;
pub mod id;
pub mod traits;

pub use error::{AddressError, ConfigError, HeaderError, HeapError, InvalidFreeReason};
pub use header::{ChunkHeader, Vacancy, HEADER_SIZE, MIN_CHUNK_SIZE};
pub use id::{ChunkOffset, PayloadOffset};
pub use traits::HeapAllocator;

/// Smallest arena capacity: the reserved null byte plus one viable chunk.
pub const MIN_CAPACITY: usize = 1 + MIN_CHUNK_SIZE;

/// Largest arena capacity addressable by 16-bit offsets.
///
/// The last offset (`C - 1`) and the initial chunk size (`C - 1`) must
/// both fit in a `u16`.
pub const MAX_CAPACITY: usize = u16::MAX as usize + 1;

/// Default arena capacity (64 KiB).
pub const DEFAULT_CAPACITY: usize = MAX_CAPACITY;
