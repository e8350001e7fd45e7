//! Error types for the tagheap allocator.
//!
//! Organized by concern: addressing (bounds of the byte store), header
//! decoding, heap operations (`allocate`/`free`), and configuration.
//! `AllocationFailed` and `DoubleFree` are ordinary outcomes the caller is
//! expected to handle; none of these errors leave the arena modified.

use std::error::Error;
use std::fmt;

use crate::id::{ChunkOffset, PayloadOffset};

/// A location or offset outside the arena's byte range.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AddressError {
    /// A memory location that does not point into the arena.
    InvalidAddress {
        /// The rejected address.
        address: usize,
    },
    /// An offset (or the header span starting at it) past the arena end.
    InvalidIndex {
        /// The rejected offset.
        offset: usize,
        /// Arena capacity in bytes.
        capacity: usize,
    },
}

impl fmt::Display for AddressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidAddress { address } => {
                write!(f, "address {address:#x} is outside the arena")
            }
            Self::InvalidIndex { offset, capacity } => {
                write!(f, "offset {offset} is outside arena of {capacity} bytes")
            }
        }
    }
}

impl Error for AddressError {}

/// A byte sequence that is not a valid chunk header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HeaderError {
    /// Fewer than [`HEADER_SIZE`](crate::HEADER_SIZE) bytes were available.
    Truncated {
        /// Bytes actually available.
        len: usize,
    },
    /// The vacancy byte was neither 0 nor 1.
    InvalidVacancy {
        /// The byte found.
        byte: u8,
    },
}

impl fmt::Display for HeaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated { len } => {
                write!(f, "truncated header: {len} bytes available")
            }
            Self::InvalidVacancy { byte } => {
                write!(f, "invalid vacancy byte {byte:#04x}")
            }
        }
    }
}

impl Error for HeaderError {}

/// Which check rejected a `free` (or payload access) of an offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvalidFreeReason {
    /// The recovered chunk offset is null or its header runs past the arena.
    OutOfBounds,
    /// The header at the recovered offset does not describe a chunk
    /// (undecodable, undersized, or running past the arena end).
    NotAChunk,
    /// The left neighbour does not agree with the recorded `left_size`.
    LeftBoundaryMismatch,
    /// The right neighbour does not agree with the chunk's `size`.
    RightBoundaryMismatch,
    /// A full partition walk found no chunk starting at the recovered offset.
    UnknownChunk,
    /// The chunk exists but is free, so it has no payload to hand out.
    Vacant,
}

impl fmt::Display for InvalidFreeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::OutOfBounds => "chunk offset out of bounds",
            Self::NotAChunk => "no chunk header at offset",
            Self::LeftBoundaryMismatch => "left boundary tag mismatch",
            Self::RightBoundaryMismatch => "right boundary tag mismatch",
            Self::UnknownChunk => "offset is not a chunk start",
            Self::Vacant => "chunk is not allocated",
        };
        f.write_str(text)
    }
}

/// Errors from heap operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HeapError {
    /// No free chunk is large enough for the request.
    AllocationFailed {
        /// Payload bytes requested.
        requested: usize,
        /// Largest payload any free chunk could have supplied.
        largest_free: usize,
    },
    /// The chunk behind this payload is already free.
    DoubleFree {
        /// The payload passed to `free`.
        payload: PayloadOffset,
    },
    /// The payload does not belong to a live chunk.
    InvalidFree {
        /// The payload passed in.
        payload: PayloadOffset,
        /// The check that rejected it.
        reason: InvalidFreeReason,
    },
    /// A header reached through the free list or the partition walk could
    /// not be decoded. Indicates arena corruption.
    CorruptHeader {
        /// Offset of the unreadable header.
        offset: ChunkOffset,
        /// Decoding failure.
        source: HeaderError,
    },
    /// A bounds violation in the addressing layer.
    Address(AddressError),
}

impl fmt::Display for HeapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllocationFailed {
                requested,
                largest_free,
            } => {
                write!(
                    f,
                    "allocation failed: requested {requested} bytes, largest free payload {largest_free} bytes"
                )
            }
            Self::DoubleFree { payload } => {
                write!(f, "double free of payload {payload}")
            }
            Self::InvalidFree { payload, reason } => {
                write!(f, "invalid free of payload {payload}: {reason}")
            }
            Self::CorruptHeader { offset, source } => {
                write!(f, "corrupt header at offset {offset}: {source}")
            }
            Self::Address(e) => write!(f, "{e}"),
        }
    }
}

impl Error for HeapError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CorruptHeader { source, .. } => Some(source),
            Self::Address(e) => Some(e),
            _ => None,
        }
    }
}

impl From<AddressError> for HeapError {
    fn from(e: AddressError) -> Self {
        Self::Address(e)
    }
}

/// Invalid heap configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The capacity cannot be addressed by 16-bit offsets, or is too small
    /// to hold a single chunk.
    CapacityOutOfRange {
        /// The capacity requested.
        requested: usize,
        /// Smallest accepted capacity.
        min: usize,
        /// Largest accepted capacity.
        max: usize,
    },
    /// The initial chunk could not be written into a freshly built arena.
    Initialisation {
        /// The write that failed.
        source: HeapError,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityOutOfRange {
                requested,
                min,
                max,
            } => {
                write!(
                    f,
                    "capacity {requested} out of range: must be within [{min}, {max}]"
                )
            }
            Self::Initialisation { source } => {
                write!(f, "failed to initialise heap: {source}")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Initialisation { source } => Some(source),
            Self::CapacityOutOfRange { .. } => None,
        }
    }
}
