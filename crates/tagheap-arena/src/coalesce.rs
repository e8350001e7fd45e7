//! Merging a freshly freed chunk with its free address neighbours.
//!
//! Before a free, no two adjacent chunks are free. So after the freed chunk
//! is put back on the list, at most one free neighbour can exist on each
//! side: one left merge followed by one right merge restores the invariant.

use tagheap_core::{AddressError, ChunkHeader, ChunkOffset, HeapError};
use tracing::trace;

use crate::arena::Arena;
use crate::free_list::FreeList;

/// Borrows the arena and free list for the duration of one coalesce.
pub(crate) struct Coalescer<'a> {
    arena: &'a mut Arena,
    free_list: &'a mut FreeList,
}

impl<'a> Coalescer<'a> {
    pub(crate) fn new(arena: &'a mut Arena, free_list: &'a mut FreeList) -> Self {
        Self { arena, free_list }
    }

    /// Merge `chunk` (already free and on the list) with any free
    /// neighbours. Returns the offset of the resulting chunk, which is the
    /// left neighbour's offset if a left merge happened.
    pub(crate) fn run(mut self, chunk: ChunkOffset) -> Result<ChunkOffset, HeapError> {
        let chunk = self.merge_left(chunk)?;
        let chunk = self.merge_right(chunk)?;
        self.retag_right_neighbour(chunk)?;
        Ok(chunk)
    }

    fn merge_left(&mut self, chunk: ChunkOffset) -> Result<ChunkOffset, HeapError> {
        let header = self.arena.header(chunk)?;
        if header.left_size == 0 {
            return Ok(chunk);
        }
        let Some(left) = chunk
            .index()
            .checked_sub(header.left_size as usize)
            .and_then(ChunkOffset::from_usize)
        else {
            return Ok(chunk);
        };
        let left_header = self.arena.header(left)?;
        if !left_header.vacancy.is_free() {
            return Ok(chunk);
        }

        let merged = left_header.size + header.size;
        self.arena.update(left, |h| h.size = merged)?;
        self.free_list.remove(self.arena, chunk)?;
        self.free_list.remove(self.arena, left)?;
        self.free_list.insert_front(self.arena, left)?;
        trace!(left = %left, absorbed = %chunk, size = merged, "merged with left neighbour");
        Ok(left)
    }

    fn merge_right(&mut self, chunk: ChunkOffset) -> Result<ChunkOffset, HeapError> {
        let header = self.arena.header(chunk)?;
        let Some(right) = self.arena.chunk_at(end_of(chunk, &header)) else {
            return Ok(chunk);
        };
        let right_header = self.arena.header(right)?;
        if !right_header.vacancy.is_free() {
            return Ok(chunk);
        }

        let merged = header.size + right_header.size;
        self.arena.update(chunk, |h| h.size = merged)?;
        self.free_list.remove(self.arena, right)?;
        self.free_list.remove(self.arena, chunk)?;
        self.free_list.insert_front(self.arena, chunk)?;
        trace!(chunk = %chunk, absorbed = %right, size = merged, "merged with right neighbour");
        Ok(chunk)
    }

    fn retag_right_neighbour(&mut self, chunk: ChunkOffset) -> Result<(), HeapError> {
        let header = self.arena.header(chunk)?;
        let end = end_of(chunk, &header);
        if let Some(right) = self.arena.chunk_at(end) {
            self.arena.update(right, |h| h.left_size = header.size)?;
        } else if end > self.arena.capacity() {
            return Err(AddressError::InvalidIndex {
                offset: end,
                capacity: self.arena.capacity(),
            }
            .into());
        }
        Ok(())
    }
}

/// First offset past `chunk`.
pub(crate) fn end_of(chunk: ChunkOffset, header: &ChunkHeader) -> usize {
    chunk.index() + header.size as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagheap_core::Vacancy;

    /// Lay out `(size, free)` chunks from offset 1 with correct boundary
    /// tags, listing the free ones in address order.
    fn build(capacity: usize, chunks: &[(u16, bool)]) -> (Arena, FreeList, Vec<ChunkOffset>) {
        let mut arena = Arena::new(capacity);
        let mut list = FreeList::new();
        let mut offsets = Vec::new();
        let mut at = 1usize;
        let mut left = 0u16;
        for &(size, _) in chunks {
            let offset = ChunkOffset::from_usize(at).unwrap();
            arena
                .write_header(offset, &ChunkHeader::occupied(size, left))
                .unwrap();
            offsets.push(offset);
            at += size as usize;
            left = size;
        }
        for (&offset, &(_, free)) in offsets.iter().zip(chunks).rev() {
            if free {
                list.insert_front(&mut arena, offset).unwrap();
            }
        }
        (arena, list, offsets)
    }

    fn sizes(arena: &Arena, offsets: &[ChunkOffset]) -> Vec<(u16, u16, Vacancy)> {
        offsets
            .iter()
            .map(|&o| {
                let h = arena.header(o).unwrap();
                (h.size, h.left_size, h.vacancy)
            })
            .collect()
    }

    #[test]
    fn isolated_chunk_is_left_alone() {
        let (mut arena, mut list, o) = build(64, &[(13, false), (13, false), (37, false)]);
        list.insert_front(&mut arena, o[1]).unwrap();
        let merged = Coalescer::new(&mut arena, &mut list).run(o[1]).unwrap();
        assert_eq!(merged, o[1]);
        assert_eq!(list.head(), Some(o[1]));
        assert_eq!(arena.header(o[2]).unwrap().left_size, 13);
    }

    #[test]
    fn left_merge_keeps_left_offset() {
        let (mut arena, mut list, o) = build(64, &[(13, true), (13, false), (37, false)]);
        list.insert_front(&mut arena, o[1]).unwrap();
        let merged = Coalescer::new(&mut arena, &mut list).run(o[1]).unwrap();
        assert_eq!(merged, o[0]);
        assert_eq!(list.head(), Some(o[0]));
        assert_eq!(
            sizes(&arena, &[o[0], o[2]]),
            vec![(26, 0, Vacancy::Free), (37, 26, Vacancy::Occupied)]
        );
    }

    #[test]
    fn right_merge_at_arena_end() {
        let (mut arena, mut list, o) = build(64, &[(13, false), (13, false), (37, true)]);
        list.insert_front(&mut arena, o[1]).unwrap();
        let merged = Coalescer::new(&mut arena, &mut list).run(o[1]).unwrap();
        assert_eq!(merged, o[1]);
        assert_eq!(sizes(&arena, &[o[1]]), vec![(50, 13, Vacancy::Free)]);
        let head = arena.header(o[1]).unwrap();
        assert_eq!((head.next, head.prev), (None, None));
    }

    #[test]
    fn both_sides_merge_and_retag_right_neighbour() {
        let (mut arena, mut list, o) = build(
            64,
            &[(10, true), (10, false), (10, true), (33, false)],
        );
        list.insert_front(&mut arena, o[1]).unwrap();
        let merged = Coalescer::new(&mut arena, &mut list).run(o[1]).unwrap();
        assert_eq!(merged, o[0]);
        assert_eq!(
            sizes(&arena, &[o[0], o[3]]),
            vec![(30, 0, Vacancy::Free), (33, 30, Vacancy::Occupied)]
        );
        assert_eq!(list.head(), Some(o[0]));
        assert_eq!(arena.header(o[0]).unwrap().next, None);
    }

    #[test]
    fn merge_preserves_unrelated_list_nodes() {
        // Free chunks at o[0] and o[4]; freeing o[3] merges with o[4] only.
        let (mut arena, mut list, o) = build(
            128,
            &[(20, true), (20, false), (20, false), (20, false), (47, true)],
        );
        list.insert_front(&mut arena, o[3]).unwrap();
        Coalescer::new(&mut arena, &mut list).run(o[3]).unwrap();
        let mut order = Vec::new();
        let mut cursor = list.head();
        while let Some(at) = cursor {
            order.push(at);
            cursor = arena.header(at).unwrap().next;
        }
        assert_eq!(order, vec![o[3], o[0]]);
        assert_eq!(arena.header(o[3]).unwrap().size, 67);
    }

    #[cfg(not(miri))]
    mod proptests {
        use crate::{Heap, HeapConfig};
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn any_free_order_fully_coalesces(
                sizes in proptest::collection::vec(0usize..40, 1..30),
                order in proptest::collection::vec(any::<usize>(), 30),
            ) {
                let mut heap = Heap::new(HeapConfig::new(2048)).unwrap();
                let mut live: Vec<_> = sizes.iter().map(|&s| heap.allocate(s).unwrap()).collect();
                for pick in order {
                    if live.is_empty() {
                        break;
                    }
                    let p = live.swap_remove(pick % live.len());
                    heap.free(p).unwrap();
                    prop_assert_eq!(heap.check(), Ok(()));
                }
                for p in live {
                    heap.free(p).unwrap();
                }
                prop_assert_eq!(heap.stats().chunks, 1);
                prop_assert_eq!(heap.free_list_head(), tagheap_core::ChunkOffset::new(1));
            }
        }
    }
}
