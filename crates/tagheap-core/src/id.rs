//! Strongly-typed arena offsets.
//!
//! Every persistent reference inside the arena is a byte offset. Offset `0`
//! is reserved as the null value of the on-arena encoding, so a chunk
//! position is a [`ChunkOffset`] (never zero) and "no chunk" is spelled
//! `Option::None` in code.

use std::fmt;
use std::num::NonZeroU16;

use crate::header::HEADER_SIZE;

/// Position of a chunk header within the arena.
///
/// Never zero: offset `0` is the null sentinel of the binary format and
/// never starts a chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkOffset(NonZeroU16);

impl ChunkOffset {
    /// The first chunk of every arena starts right after the null byte.
    pub const FIRST: ChunkOffset = ChunkOffset(NonZeroU16::MIN);

    /// Wrap a raw offset. Returns `None` for the null offset `0`.
    pub fn new(raw: u16) -> Option<Self> {
        NonZeroU16::new(raw).map(Self)
    }

    /// Wrap a `usize` offset. Returns `None` for `0` or values beyond `u16`.
    pub fn from_usize(raw: usize) -> Option<Self> {
        u16::try_from(raw).ok().and_then(Self::new)
    }

    /// The raw offset.
    pub fn get(self) -> u16 {
        self.0.get()
    }

    /// The raw offset widened to `usize` for indexing.
    pub fn index(self) -> usize {
        self.0.get() as usize
    }

    /// Decode an on-arena link field (`0` means no link).
    pub fn decode_link(raw: u16) -> Option<Self> {
        Self::new(raw)
    }

    /// Encode an optional link into its on-arena form (`None` becomes `0`).
    pub fn encode_link(link: Option<Self>) -> u16 {
        link.map_or(0, Self::get)
    }

    /// Offset of the payload that follows this chunk's header.
    ///
    /// Returns `None` if the payload would start past the offset range.
    pub fn payload(self) -> Option<PayloadOffset> {
        let raw = self.index() + HEADER_SIZE;
        u16::try_from(raw).ok().map(PayloadOffset)
    }
}

impl fmt::Display for ChunkOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Offset of a payload handed out by `allocate` and accepted by `free`.
///
/// The payload starts immediately after its chunk's header.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PayloadOffset(pub u16);

impl PayloadOffset {
    /// The raw offset.
    pub fn get(self) -> u16 {
        self.0
    }

    /// The raw offset widened to `usize` for indexing.
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Recover the chunk whose header precedes this payload.
    ///
    /// Returns `None` if the recovered position would be the null offset or
    /// underflow, which no genuine payload can produce.
    pub fn chunk(self) -> Option<ChunkOffset> {
        self.0
            .checked_sub(HEADER_SIZE as u16)
            .and_then(ChunkOffset::new)
    }
}

impl fmt::Display for PayloadOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for PayloadOffset {
    fn from(v: u16) -> Self {
        Self(v)
    }
}
