//! Read-only views of the heap for debuggers, tests, and benchmarks.
//!
//! Both walks are bounded: they stop at the first header that cannot be
//! read or that would not advance, and never visit more chunks than the
//! arena could hold. [`Heap::check`](crate::Heap::check) reports the
//! corruption such a walk silently stops at.

use tagheap_core::{ChunkHeader, ChunkOffset, PayloadOffset, HEADER_SIZE, MIN_CHUNK_SIZE};

use crate::arena::Arena;
use crate::heap::Heap;

/// A chunk and its decoded header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkView {
    /// Where the chunk's header starts.
    pub offset: ChunkOffset,
    /// The decoded header.
    pub header: ChunkHeader,
}

impl ChunkView {
    /// Total size in bytes, header included.
    pub fn size(&self) -> usize {
        self.header.size as usize
    }

    /// Whether the chunk is on the free list.
    pub fn is_free(&self) -> bool {
        self.header.vacancy.is_free()
    }

    /// First offset past this chunk.
    pub fn end(&self) -> usize {
        self.offset.index() + self.size()
    }

    /// The payload offset `allocate` would return for this chunk.
    pub fn payload(&self) -> Option<PayloadOffset> {
        self.offset.payload()
    }
}

fn max_chunks(arena: &Arena) -> usize {
    arena.capacity() / MIN_CHUNK_SIZE + 1
}

/// Iterator over every chunk in address order, starting at offset 1.
pub struct Chunks<'a> {
    arena: &'a Arena,
    cursor: usize,
    remaining: usize,
}

impl<'a> Chunks<'a> {
    pub(crate) fn new(arena: &'a Arena) -> Self {
        Self {
            arena,
            cursor: ChunkOffset::FIRST.index(),
            remaining: max_chunks(arena),
        }
    }
}

impl Iterator for Chunks<'_> {
    type Item = ChunkView;

    fn next(&mut self) -> Option<ChunkView> {
        if self.remaining == 0 {
            return None;
        }
        let offset = self.arena.chunk_at(self.cursor)?;
        let header = self.arena.header(offset).ok()?;
        if (header.size as usize) < HEADER_SIZE {
            self.remaining = 0;
            return None;
        }
        self.remaining -= 1;
        self.cursor = offset.index() + header.size as usize;
        Some(ChunkView { offset, header })
    }
}

/// Iterator over the free list, head first.
pub struct FreeChunks<'a> {
    arena: &'a Arena,
    cursor: Option<ChunkOffset>,
    remaining: usize,
}

impl<'a> FreeChunks<'a> {
    pub(crate) fn new(arena: &'a Arena, head: Option<ChunkOffset>) -> Self {
        Self {
            arena,
            cursor: head,
            remaining: max_chunks(arena),
        }
    }
}

impl Iterator for FreeChunks<'_> {
    type Item = ChunkView;

    fn next(&mut self) -> Option<ChunkView> {
        if self.remaining == 0 {
            return None;
        }
        let offset = self.cursor?;
        let header = self.arena.header(offset).ok()?;
        self.remaining -= 1;
        self.cursor = header.next;
        Some(ChunkView { offset, header })
    }
}

/// Occupancy summary of a heap.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HeapStats {
    /// Arena capacity in bytes.
    pub capacity: usize,
    /// Number of chunks in the partition.
    pub chunks: usize,
    /// Number of free chunks.
    pub free_chunks: usize,
    /// Number of occupied chunks.
    pub occupied_chunks: usize,
    /// Bytes held by free chunks, headers included.
    pub free_bytes: usize,
    /// Bytes held by occupied chunks, headers included.
    pub occupied_bytes: usize,
    /// Size of the largest free chunk, header included.
    pub largest_free_chunk: usize,
}

impl HeapStats {
    pub(crate) fn collect(heap: &Heap) -> Self {
        let mut stats = HeapStats {
            capacity: heap.capacity(),
            ..Default::default()
        };
        for chunk in heap.chunks() {
            stats.chunks += 1;
            if chunk.is_free() {
                stats.free_chunks += 1;
                stats.free_bytes += chunk.size();
                stats.largest_free_chunk = stats.largest_free_chunk.max(chunk.size());
            } else {
                stats.occupied_chunks += 1;
                stats.occupied_bytes += chunk.size();
            }
        }
        stats
    }

    /// Largest request that would currently succeed.
    pub fn largest_allocatable(&self) -> usize {
        self.largest_free_chunk.saturating_sub(HEADER_SIZE)
    }

    /// External fragmentation: `1 - largest_free / total_free`.
    ///
    /// `0.0` when all free space is one chunk (or there is none).
    pub fn fragmentation(&self) -> f64 {
        if self.free_bytes == 0 {
            return 0.0;
        }
        1.0 - self.largest_free_chunk as f64 / self.free_bytes as f64
    }
}
