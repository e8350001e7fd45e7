//! The fixed-capacity byte store and its addressing layer.
//!
//! An [`Arena`] is the only memory the allocator ever touches. Chunks are
//! named by offsets into it; every header read or write goes through a
//! bounds-checked accessor that decodes or encodes the 9-byte format, so no
//! typed reference into the buffer ever outlives a single step.

use std::ops::Range;

use tagheap_core::{AddressError, ChunkHeader, ChunkOffset, HeapError, HEADER_SIZE};

/// A single owned byte buffer of fixed capacity.
///
/// Offset `0` is the null byte and is never the start of a chunk, but it is
/// still addressable (it is what [`Arena::location`] materialises for the
/// null link).
pub struct Arena {
    bytes: Box<[u8]>,
}

impl Arena {
    /// Create a zero-filled arena of `capacity` bytes.
    ///
    /// The caller is responsible for validating the capacity range; see
    /// [`HeapConfig::validate`](crate::HeapConfig::validate).
    pub fn new(capacity: usize) -> Self {
        Self {
            bytes: vec![0u8; capacity].into_boxed_slice(),
        }
    }

    /// Total capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    /// The raw arena contents, for dumps and external inspection tools.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Map an offset to its memory location.
    ///
    /// Fails with [`AddressError::InvalidIndex`] outside `[0, C-1]`. Offset
    /// `0` is accepted.
    pub fn location(&self, offset: usize) -> Result<*const u8, AddressError> {
        self.bytes
            .get(offset..)
            .filter(|rest| !rest.is_empty())
            .map(<[u8]>::as_ptr)
            .ok_or(AddressError::InvalidIndex {
                offset,
                capacity: self.capacity(),
            })
    }

    /// Map a memory location back to its offset.
    ///
    /// Fails with [`AddressError::InvalidAddress`] if `location` does not
    /// point into the arena.
    pub fn offset_of(&self, location: *const u8) -> Result<usize, AddressError> {
        let base = self.bytes.as_ptr() as usize;
        let address = location as usize;
        address
            .checked_sub(base)
            .filter(|&offset| offset < self.capacity())
            .ok_or(AddressError::InvalidAddress { address })
    }

    /// Read a byte range.
    pub fn bytes(&self, start: usize, len: usize) -> Result<&[u8], AddressError> {
        let range = self.span(start, len)?;
        Ok(&self.bytes[range])
    }

    /// Mutably borrow a byte range.
    pub fn bytes_mut(&mut self, start: usize, len: usize) -> Result<&mut [u8], AddressError> {
        let range = self.span(start, len)?;
        Ok(&mut self.bytes[range])
    }

    /// Decode the header of the chunk at `at`.
    pub fn header(&self, at: ChunkOffset) -> Result<ChunkHeader, HeapError> {
        let bytes = self.bytes(at.index(), HEADER_SIZE)?;
        ChunkHeader::read_from(bytes).map_err(|source| HeapError::CorruptHeader {
            offset: at,
            source,
        })
    }

    /// Encode `header` at `at`.
    pub fn write_header(&mut self, at: ChunkOffset, header: &ChunkHeader) -> Result<(), HeapError> {
        let bytes = self.bytes_mut(at.index(), HEADER_SIZE)?;
        bytes.copy_from_slice(&header.encode());
        Ok(())
    }

    /// Read-modify-write the header at `at`, returning the new value.
    pub fn update<F>(&mut self, at: ChunkOffset, f: F) -> Result<ChunkHeader, HeapError>
    where
        F: FnOnce(&mut ChunkHeader),
    {
        let mut header = self.header(at)?;
        f(&mut header);
        self.write_header(at, &header)?;
        Ok(header)
    }

    /// The chunk starting at `offset`, if `offset` lies strictly inside the
    /// arena. Used to step to a right neighbour.
    pub(crate) fn chunk_at(&self, offset: usize) -> Option<ChunkOffset> {
        if offset < self.capacity() {
            ChunkOffset::from_usize(offset)
        } else {
            None
        }
    }

    fn span(&self, start: usize, len: usize) -> Result<Range<usize>, AddressError> {
        match start.checked_add(len) {
            Some(end) if end <= self.capacity() => Ok(start..end),
            _ => Err(AddressError::InvalidIndex {
                offset: start,
                capacity: self.capacity(),
            }),
        }
    }
}
