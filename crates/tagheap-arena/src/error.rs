//! Invariant violations reported by [`Heap::check`](crate::Heap::check).

use std::error::Error;
use std::fmt;

use tagheap_core::{ChunkOffset, HeapError};

/// A broken structural invariant of the arena or free list.
///
/// None of these can arise through the public `allocate`/`free` API; they
/// indicate external corruption of the arena bytes or an allocator bug.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantViolation {
    /// A header reached during a walk could not be read.
    UnreadableHeader {
        /// Offset of the header.
        offset: ChunkOffset,
        /// Why it could not be read.
        source: HeapError,
    },
    /// A chunk smaller than a header plus one byte.
    ChunkTooSmall {
        /// Offset of the chunk.
        offset: ChunkOffset,
        /// Its recorded size.
        size: usize,
    },
    /// A chunk extends past the end of the arena.
    Overrun {
        /// Offset of the chunk.
        offset: ChunkOffset,
        /// First offset past the chunk.
        end: usize,
        /// Arena capacity.
        capacity: usize,
    },
    /// Chunk sizes do not sum to `capacity - 1`.
    SizeMismatch {
        /// Sum of all chunk sizes.
        total: usize,
        /// Expected sum.
        expected: usize,
    },
    /// A chunk's boundary tag disagrees with its left neighbour's size.
    LeftSizeMismatch {
        /// Offset of the chunk.
        offset: ChunkOffset,
        /// The `left_size` it records.
        recorded: u16,
        /// The left neighbour's actual size (`0` for the first chunk).
        actual: u16,
    },
    /// Two address-adjacent chunks are both free.
    AdjacentFree {
        /// The left chunk.
        left: ChunkOffset,
        /// The right chunk.
        right: ChunkOffset,
    },
    /// An occupied chunk still carries free-list links.
    OccupiedWithLinks {
        /// Offset of the chunk.
        offset: ChunkOffset,
    },
    /// The free list reaches a chunk that is not a free chunk of the
    /// partition.
    NotFreeChunk {
        /// Offset reached through the list.
        offset: ChunkOffset,
    },
    /// The free list visits a chunk twice.
    Cycle {
        /// The chunk visited again.
        offset: ChunkOffset,
    },
    /// A node's `prev` does not name the node that links to it.
    BrokenLink {
        /// The node with the wrong `prev`.
        offset: ChunkOffset,
        /// The node that precedes it in list order.
        expected_prev: Option<ChunkOffset>,
        /// What its header records.
        found_prev: Option<ChunkOffset>,
    },
    /// A free chunk of the partition is not on the free list.
    MissingFromFreeList {
        /// The unlisted free chunk.
        offset: ChunkOffset,
    },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnreadableHeader { offset, source } => {
                write!(f, "unreadable header at {offset}: {source}")
            }
            Self::ChunkTooSmall { offset, size } => {
                write!(f, "chunk at {offset} has size {size}, below the minimum")
            }
            Self::Overrun {
                offset,
                end,
                capacity,
            } => {
                write!(
                    f,
                    "chunk at {offset} ends at {end}, past arena capacity {capacity}"
                )
            }
            Self::SizeMismatch { total, expected } => {
                write!(f, "chunk sizes sum to {total}, expected {expected}")
            }
            Self::LeftSizeMismatch {
                offset,
                recorded,
                actual,
            } => {
                write!(
                    f,
                    "chunk at {offset} records left size {recorded}, neighbour has {actual}"
                )
            }
            Self::AdjacentFree { left, right } => {
                write!(f, "adjacent free chunks at {left} and {right}")
            }
            Self::OccupiedWithLinks { offset } => {
                write!(f, "occupied chunk at {offset} carries free-list links")
            }
            Self::NotFreeChunk { offset } => {
                write!(f, "free list reaches {offset}, which is not a free chunk")
            }
            Self::Cycle { offset } => write!(f, "free list revisits {offset}"),
            Self::BrokenLink {
                offset,
                expected_prev,
                found_prev,
            } => {
                write!(
                    f,
                    "free list node {offset} has prev {found_prev:?}, expected {expected_prev:?}"
                )
            }
            Self::MissingFromFreeList { offset } => {
                write!(f, "free chunk at {offset} is not on the free list")
            }
        }
    }
}

impl Error for InvariantViolation {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::UnreadableHeader { source, .. } => Some(source),
            _ => None,
        }
    }
}
