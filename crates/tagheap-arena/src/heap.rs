//! The allocator: first-fit search, split-on-allocate, merge-on-free.
//!
//! [`Heap`] owns the [`Arena`] and the [`FreeList`] head and is the only
//! thing that mutates them. Every public operation leaves the arena a valid
//! partition with maximal coalescing; [`Heap::check`] verifies this.

use tagheap_core::{
    AddressError, ChunkHeader, ChunkOffset, ConfigError, HeapAllocator, HeapError,
    InvalidFreeReason, PayloadOffset, HEADER_SIZE, MIN_CHUNK_SIZE,
};
use tracing::{debug, trace, warn};

use crate::arena::Arena;
use crate::check;
use crate::coalesce::{end_of, Coalescer};
use crate::config::{FreeValidation, HeapConfig};
use crate::error::InvariantViolation;
use crate::free_list::FreeList;
use crate::inspect::{Chunks, FreeChunks, HeapStats};

/// A fixed-capacity explicit allocator.
///
/// Construction writes one free chunk spanning `[1, C-1]`. After that,
/// [`allocate`](Heap::allocate) and [`free`](Heap::free) reshape the
/// partition without ever growing the arena.
///
/// # Example
///
/// ```
/// use tagheap_arena::{Heap, HeapConfig};
///
/// let mut heap = Heap::new(HeapConfig::new(64)).unwrap();
/// let p = heap.allocate(4).unwrap();
/// heap.payload_mut(p).unwrap()[..4].copy_from_slice(&[1, 2, 3, 4]);
/// heap.free(p).unwrap();
/// assert_eq!(heap.stats().free_chunks, 1);
/// ```
pub struct Heap {
    arena: Arena,
    free_list: FreeList,
    config: HeapConfig,
}

impl Heap {
    /// Build a heap from a validated config.
    ///
    /// Fails if the capacity cannot be addressed by 16-bit offsets or is too
    /// small to hold one chunk.
    pub fn new(config: HeapConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut arena = Arena::new(config.capacity);
        let mut free_list = FreeList::new();

        // validate() bounds capacity to [MIN_CAPACITY, 65536], so the
        // initial size C-1 fits in u16 and the header fits in the arena.
        let initial_size = (config.capacity - 1) as u16;
        let first = ChunkOffset::FIRST;
        let initialised = arena
            .write_header(first, &ChunkHeader::free(initial_size, 0))
            .and_then(|()| free_list.insert_front(&mut arena, first));
        if let Err(source) = initialised {
            // Unreachable with a validated capacity.
            warn!(capacity = config.capacity, error = %source, "failed to write initial chunk");
            return Err(ConfigError::Initialisation { source });
        }

        debug!(capacity = config.capacity, "heap initialised");
        Ok(Self {
            arena,
            free_list,
            config,
        })
    }

    /// Build a heap of `capacity` bytes with default settings.
    pub fn with_capacity(capacity: usize) -> Result<Self, ConfigError> {
        Self::new(HeapConfig::new(capacity))
    }

    /// Reserve at least `size` payload bytes, first fit.
    ///
    /// Walks the free list from the head and takes the first chunk with
    /// `size >= HEADER_SIZE + size`. If the leftover would itself be a
    /// viable chunk, the found chunk is split and the leftover takes its
    /// place on the list; otherwise the whole chunk is handed out.
    /// Zero-byte requests are treated as one byte.
    pub fn allocate(&mut self, size: usize) -> Result<PayloadOffset, HeapError> {
        let requested = size.max(1);
        let Some(needed) = requested
            .checked_add(HEADER_SIZE)
            .and_then(|n| u16::try_from(n).ok())
        else {
            return Err(self.allocation_failed(size));
        };

        let mut cursor = self.free_list.head();
        while let Some(at) = cursor {
            let header = self.arena.header(at)?;
            if header.size >= needed {
                if header.size as usize >= needed as usize + MIN_CHUNK_SIZE {
                    self.split(at, header, needed)?;
                } else {
                    self.free_list.remove(&mut self.arena, at)?;
                }
                let payload = at.payload().ok_or(AddressError::InvalidIndex {
                    offset: at.index() + HEADER_SIZE,
                    capacity: self.capacity(),
                })?;
                if self.config.zero_on_allocate {
                    let len = self.arena.header(at)?.payload_len();
                    self.arena.bytes_mut(payload.index(), len)?.fill(0);
                }
                debug!(requested = size, chunk = %at, payload = %payload, "allocated");
                return Ok(payload);
            }
            cursor = header.next;
        }

        Err(self.allocation_failed(size))
    }

    /// Return a payload to the heap and coalesce it with free neighbours.
    ///
    /// The payload is validated according to
    /// [`HeapConfig::free_validation`] before anything is written. Freeing
    /// a payload whose chunk is already free, or has been merged into a
    /// free neighbour, reports [`HeapError::DoubleFree`] and changes
    /// nothing.
    pub fn free(&mut self, payload: PayloadOffset) -> Result<(), HeapError> {
        let (at, header) = match self.resolve(payload) {
            Ok(found) => found,
            Err(e) => {
                let e = self.classify_rejected_free(payload, e);
                warn!(payload = %payload, error = %e, "rejected free");
                return Err(e);
            }
        };
        if header.vacancy.is_free() {
            warn!(payload = %payload, chunk = %at, "double free");
            return Err(HeapError::DoubleFree { payload });
        }

        self.free_list.insert_front(&mut self.arena, at)?;
        let merged = Coalescer::new(&mut self.arena, &mut self.free_list).run(at)?;
        debug!(payload = %payload, chunk = %at, merged = %merged, "freed");
        Ok(())
    }

    /// Read the whole payload of an allocated chunk.
    ///
    /// The slice may be longer than the original request when the chunk was
    /// handed out without splitting.
    pub fn payload(&self, payload: PayloadOffset) -> Result<&[u8], HeapError> {
        let len = self.occupied_payload_len(payload)?;
        Ok(self.arena.bytes(payload.index(), len)?)
    }

    /// Mutably borrow the whole payload of an allocated chunk.
    pub fn payload_mut(&mut self, payload: PayloadOffset) -> Result<&mut [u8], HeapError> {
        let len = self.occupied_payload_len(payload)?;
        Ok(self.arena.bytes_mut(payload.index(), len)?)
    }

    /// Payload bytes actually available behind an allocated payload.
    pub fn usable_size(&self, payload: PayloadOffset) -> Result<usize, HeapError> {
        self.occupied_payload_len(payload)
    }

    /// Recover the payload offset of a pointer into the arena.
    ///
    /// This is the inverse of taking `payload(p)?.as_ptr()`. The result is
    /// not validated; `free` and the payload accessors do that.
    pub fn payload_offset_of(&self, location: *const u8) -> Result<PayloadOffset, HeapError> {
        let offset = self.arena.offset_of(location)?;
        let raw = u16::try_from(offset).map_err(|_| AddressError::InvalidAddress {
            address: location as usize,
        })?;
        Ok(PayloadOffset(raw))
    }

    /// Total arena capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.arena.capacity()
    }

    /// The config this heap was built with.
    pub fn config(&self) -> &HeapConfig {
        &self.config
    }

    /// Read-only view of the arena.
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Head of the free list.
    pub fn free_list_head(&self) -> Option<ChunkOffset> {
        self.free_list.head()
    }

    /// Every chunk in address order.
    pub fn chunks(&self) -> Chunks<'_> {
        Chunks::new(&self.arena)
    }

    /// Free chunks in list order (most recently freed first).
    pub fn free_chunks(&self) -> FreeChunks<'_> {
        FreeChunks::new(&self.arena, self.free_list.head())
    }

    /// Occupancy and fragmentation summary.
    pub fn stats(&self) -> HeapStats {
        HeapStats::collect(self)
    }

    /// Verify every structural invariant of the arena and free list.
    pub fn check(&self) -> Result<(), InvariantViolation> {
        check::check(&self.arena, &self.free_list)
    }

    /// Shrink `at` to `needed` bytes and put the leftover in its list slot.
    fn split(&mut self, at: ChunkOffset, header: ChunkHeader, needed: u16) -> Result<(), HeapError> {
        let remainder_at = at.index() + needed as usize;
        let remainder = ChunkOffset::from_usize(remainder_at).ok_or(AddressError::InvalidIndex {
            offset: remainder_at,
            capacity: self.capacity(),
        })?;
        let remainder_size = header.size - needed;

        self.arena
            .write_header(remainder, &ChunkHeader::free(remainder_size, needed))?;
        self.free_list.replace(&mut self.arena, at, remainder)?;
        self.arena
            .write_header(at, &ChunkHeader::occupied(needed, header.left_size))?;

        let right_at = remainder.index() + remainder_size as usize;
        if let Some(right) = self.arena.chunk_at(right_at) {
            self.arena.update(right, |h| h.left_size = remainder_size)?;
        }
        trace!(chunk = %at, size = needed, remainder = %remainder, remainder_size, "split");
        Ok(())
    }

    /// Validate a caller-supplied payload and return its chunk.
    fn resolve(&self, payload: PayloadOffset) -> Result<(ChunkOffset, ChunkHeader), HeapError> {
        let invalid = |reason| HeapError::InvalidFree { payload, reason };
        let capacity = self.capacity();

        let at = payload
            .chunk()
            .filter(|at| at.index() + HEADER_SIZE <= capacity)
            .ok_or(invalid(InvalidFreeReason::OutOfBounds))?;
        let header = self
            .arena
            .header(at)
            .map_err(|_| invalid(InvalidFreeReason::NotAChunk))?;
        let end = end_of(at, &header);
        if (header.size as usize) < MIN_CHUNK_SIZE || end > capacity {
            return Err(invalid(InvalidFreeReason::NotAChunk));
        }

        let left_ok = match header.left_size {
            0 => at == ChunkOffset::FIRST,
            left_size => at
                .index()
                .checked_sub(left_size as usize)
                .and_then(ChunkOffset::from_usize)
                .and_then(|left| self.arena.header(left).ok())
                .is_some_and(|left| left.size == left_size),
        };
        if !left_ok {
            return Err(invalid(InvalidFreeReason::LeftBoundaryMismatch));
        }

        if let Some(right) = self.arena.chunk_at(end) {
            let right_ok = self
                .arena
                .header(right)
                .is_ok_and(|right| right.left_size == header.size);
            if !right_ok {
                return Err(invalid(InvalidFreeReason::RightBoundaryMismatch));
            }
        }

        if self.config.free_validation == FreeValidation::Strict
            && !self.chunks().any(|chunk| chunk.offset == at)
        {
            return Err(invalid(InvalidFreeReason::UnknownChunk));
        }

        Ok((at, header))
    }

    /// A header whose boundary tags disagree with its neighbours is stale
    /// when it sits inside a free chunk: its chunk was freed and absorbed
    /// by a left merge, so freeing it again is a double free.
    fn classify_rejected_free(&self, payload: PayloadOffset, err: HeapError) -> HeapError {
        let HeapError::InvalidFree {
            reason:
                InvalidFreeReason::LeftBoundaryMismatch | InvalidFreeReason::RightBoundaryMismatch,
            ..
        } = err
        else {
            return err;
        };
        let Some(at) = payload.chunk() else {
            return err;
        };
        let inside_free = self
            .chunks()
            .find(|chunk| chunk.offset <= at && at.index() < chunk.end())
            .is_some_and(|chunk| chunk.is_free());
        if inside_free {
            HeapError::DoubleFree { payload }
        } else {
            err
        }
    }

    fn occupied_payload_len(&self, payload: PayloadOffset) -> Result<usize, HeapError> {
        let (_, header) = self.resolve(payload)?;
        if header.vacancy.is_free() {
            return Err(HeapError::InvalidFree {
                payload,
                reason: InvalidFreeReason::Vacant,
            });
        }
        Ok(header.payload_len())
    }

    fn allocation_failed(&self, requested: usize) -> HeapError {
        let largest_free = self
            .free_chunks()
            .map(|chunk| chunk.header.payload_len())
            .max()
            .unwrap_or(0);
        warn!(requested, largest_free, "allocation failed");
        HeapError::AllocationFailed {
            requested,
            largest_free,
        }
    }
}

impl HeapAllocator for Heap {
    fn allocate(&mut self, size: usize) -> Result<PayloadOffset, HeapError> {
        Heap::allocate(self, size)
    }

    fn free(&mut self, payload: PayloadOffset) -> Result<(), HeapError> {
        Heap::free(self, payload)
    }

    fn capacity(&self) -> usize {
        Heap::capacity(self)
    }
}
