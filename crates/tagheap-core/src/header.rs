//! The on-arena chunk header format.
//!
//! Every chunk, free or occupied, begins with a 9-byte header. The layout is
//! a binary contract that external inspection tools rely on, so it is
//! encoded field by field rather than by reinterpreting a struct:
//!
//! ```text
//! byte  0..2   size       u16 LE   total chunk bytes, header included
//! byte  2..4   left_size  u16 LE   size of the chunk to the left (0 = first)
//! byte  4      vacancy    u8       0 = occupied, 1 = free
//! byte  5..7   next       u16 LE   next free chunk (0 = none)
//! byte  7..9   prev       u16 LE   previous free chunk (0 = none)
//! ```

use crate::error::HeaderError;
use crate::id::ChunkOffset;

/// Size of an encoded [`ChunkHeader`] in bytes.
pub const HEADER_SIZE: usize = 9;

/// Smallest chunk that can stand on its own: a header plus one payload byte.
pub const MIN_CHUNK_SIZE: usize = HEADER_SIZE + 1;

/// Whether a chunk is on the free list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Vacancy {
    /// Handed out by `allocate`; links are unused.
    Occupied = 0,
    /// Threaded onto the free list.
    Free = 1,
}

impl Vacancy {
    /// Whether this is [`Vacancy::Free`].
    pub fn is_free(self) -> bool {
        self == Vacancy::Free
    }
}

impl TryFrom<u8> for Vacancy {
    type Error = HeaderError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            0 => Ok(Vacancy::Occupied),
            1 => Ok(Vacancy::Free),
            other => Err(HeaderError::InvalidVacancy { byte: other }),
        }
    }
}

/// Decoded chunk metadata.
///
/// This is a value copy of the bytes in the arena: mutating it does nothing
/// until it is written back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkHeader {
    /// Total bytes occupied by the chunk, header included.
    pub size: u16,
    /// Size of the chunk immediately to the left, `0` for the first chunk.
    pub left_size: u16,
    /// Free or occupied.
    pub vacancy: Vacancy,
    /// Next chunk on the free list.
    pub next: Option<ChunkOffset>,
    /// Previous chunk on the free list.
    pub prev: Option<ChunkOffset>,
}

impl ChunkHeader {
    /// A free, unlinked header.
    pub fn free(size: u16, left_size: u16) -> Self {
        Self {
            size,
            left_size,
            vacancy: Vacancy::Free,
            next: None,
            prev: None,
        }
    }

    /// An occupied header. Occupied chunks never carry links.
    pub fn occupied(size: u16, left_size: u16) -> Self {
        Self {
            size,
            left_size,
            vacancy: Vacancy::Occupied,
            next: None,
            prev: None,
        }
    }

    /// Payload bytes available after the header.
    pub fn payload_len(&self) -> usize {
        (self.size as usize).saturating_sub(HEADER_SIZE)
    }

    /// Encode into the 9-byte on-arena form.
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..2].copy_from_slice(&self.size.to_le_bytes());
        buf[2..4].copy_from_slice(&self.left_size.to_le_bytes());
        buf[4] = self.vacancy as u8;
        buf[5..7].copy_from_slice(&ChunkOffset::encode_link(self.next).to_le_bytes());
        buf[7..9].copy_from_slice(&ChunkOffset::encode_link(self.prev).to_le_bytes());
        buf
    }

    /// Decode the 9-byte on-arena form.
    pub fn decode(buf: &[u8; HEADER_SIZE]) -> Result<Self, HeaderError> {
        let word = |at: usize| u16::from_le_bytes([buf[at], buf[at + 1]]);
        Ok(Self {
            size: word(0),
            left_size: word(2),
            vacancy: Vacancy::try_from(buf[4])?,
            next: ChunkOffset::decode_link(word(5)),
            prev: ChunkOffset::decode_link(word(7)),
        })
    }

    /// Decode a header from the start of `bytes`.
    pub fn read_from(bytes: &[u8]) -> Result<Self, HeaderError> {
        let buf: &[u8; HEADER_SIZE] = bytes
            .get(..HEADER_SIZE)
            .and_then(|s| s.try_into().ok())
            .ok_or(HeaderError::Truncated { len: bytes.len() })?;
        Self::decode(buf)
    }

    /// Encode this header into the start of `bytes`.
    pub fn write_to(&self, bytes: &mut [u8]) -> Result<(), HeaderError> {
        let len = bytes.len();
        let dst = bytes
            .get_mut(..HEADER_SIZE)
            .ok_or(HeaderError::Truncated { len })?;
        dst.copy_from_slice(&self.encode());
        Ok(())
    }
}
