//! Intrusive doubly linked list of free chunks.
//!
//! The list owns no storage: its nodes are the `next`/`prev` fields of the
//! free chunks' own headers, and the only state held outside the arena is
//! the head offset. Insertion is always at the front, so the most recently
//! freed chunk is found first.

use tagheap_core::{ChunkOffset, HeapError, Vacancy};
use tracing::trace;

use crate::arena::Arena;

/// Head of the free list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FreeList {
    head: Option<ChunkOffset>,
}

impl FreeList {
    /// An empty list.
    pub fn new() -> Self {
        Self { head: None }
    }

    /// The most recently inserted free chunk.
    pub fn head(&self) -> Option<ChunkOffset> {
        self.head
    }

    /// Whether no chunk is free.
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Push `chunk` onto the front of the list and mark it free. O(1).
    ///
    /// `chunk` must not already be on the list.
    pub fn insert_front(&mut self, arena: &mut Arena, chunk: ChunkOffset) -> Result<(), HeapError> {
        let old_head = self.head;
        arena.update(chunk, |h| {
            h.vacancy = Vacancy::Free;
            h.prev = None;
            h.next = old_head;
        })?;
        if let Some(old) = old_head {
            arena.update(old, |h| h.prev = Some(chunk))?;
        }
        self.head = Some(chunk);
        trace!(chunk = %chunk, "free list insert");
        Ok(())
    }

    /// Splice `chunk` out of the list, mark it occupied, and clear its
    /// links. O(1). Returns the detached chunk.
    pub fn remove(&mut self, arena: &mut Arena, chunk: ChunkOffset) -> Result<ChunkOffset, HeapError> {
        let header = arena.header(chunk)?;
        if let Some(next) = header.next {
            arena.update(next, |h| h.prev = header.prev)?;
        }
        if let Some(prev) = header.prev {
            arena.update(prev, |h| h.next = header.next)?;
        }
        if self.head == Some(chunk) {
            self.head = header.next;
        }
        arena.update(chunk, |h| {
            h.vacancy = Vacancy::Occupied;
            h.next = None;
            h.prev = None;
        })?;
        trace!(chunk = %chunk, "free list remove");
        Ok(chunk)
    }

    /// Put `new` in the exact list position `old` occupies.
    ///
    /// Copies `old`'s links into `new`, repoints both neighbours at `new`,
    /// and moves the head if `old` was the head. `old`'s own header is left
    /// for the caller to overwrite.
    pub fn replace(
        &mut self,
        arena: &mut Arena,
        old: ChunkOffset,
        new: ChunkOffset,
    ) -> Result<(), HeapError> {
        let links = arena.header(old)?;
        arena.update(new, |h| {
            h.next = links.next;
            h.prev = links.prev;
        })?;
        if let Some(next) = links.next {
            arena.update(next, |h| h.prev = Some(new))?;
        }
        if let Some(prev) = links.prev {
            arena.update(prev, |h| h.next = Some(new))?;
        }
        if self.head == Some(old) {
            self.head = Some(new);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagheap_core::ChunkHeader;

    /// Lay out free, unlinked chunks of the given sizes starting at offset 1.
    fn arena_with_chunks(capacity: usize, sizes: &[u16]) -> (Arena, Vec<ChunkOffset>) {
        let mut arena = Arena::new(capacity);
        let mut offsets = Vec::new();
        let mut at = 1usize;
        let mut left = 0u16;
        for &size in sizes {
            let chunk = ChunkOffset::from_usize(at).unwrap();
            arena.write_header(chunk, &ChunkHeader::free(size, left)).unwrap();
            offsets.push(chunk);
            at += size as usize;
            left = size;
        }
        (arena, offsets)
    }

    fn walk(list: &FreeList, arena: &Arena) -> Vec<u16> {
        let mut out = Vec::new();
        let mut cursor = list.head();
        while let Some(at) = cursor {
            out.push(at.get());
            cursor = arena.header(at).unwrap().next;
        }
        out
    }

    #[test]
    fn insert_front_is_lifo() {
        let (mut arena, c) = arena_with_chunks(64, &[20, 20, 20]);
        let mut list = FreeList::new();
        for &chunk in &c {
            list.insert_front(&mut arena, chunk).unwrap();
        }
        assert_eq!(walk(&list, &arena), vec![41, 21, 1]);
        assert_eq!(arena.header(c[2]).unwrap().prev, None);
        assert_eq!(arena.header(c[1]).unwrap().prev, Some(c[2]));
        assert_eq!(arena.header(c[0]).unwrap().prev, Some(c[1]));
    }

    #[test]
    fn insert_marks_free() {
        let (mut arena, c) = arena_with_chunks(64, &[63]);
        arena.update(c[0], |h| h.vacancy = Vacancy::Occupied).unwrap();
        let mut list = FreeList::new();
        list.insert_front(&mut arena, c[0]).unwrap();
        assert_eq!(arena.header(c[0]).unwrap().vacancy, Vacancy::Free);
    }

    #[test]
    fn remove_middle_splices_neighbours() {
        let (mut arena, c) = arena_with_chunks(64, &[20, 20, 20]);
        let mut list = FreeList::new();
        for &chunk in &c {
            list.insert_front(&mut arena, chunk).unwrap();
        }
        let removed = list.remove(&mut arena, c[1]).unwrap();
        assert_eq!(removed, c[1]);
        assert_eq!(walk(&list, &arena), vec![41, 1]);
        assert_eq!(arena.header(c[0]).unwrap().prev, Some(c[2]));
        let detached = arena.header(c[1]).unwrap();
        assert_eq!(detached.vacancy, Vacancy::Occupied);
        assert_eq!((detached.next, detached.prev), (None, None));
    }

    #[test]
    fn remove_head_advances_head() {
        let (mut arena, c) = arena_with_chunks(64, &[20, 20, 20]);
        let mut list = FreeList::new();
        for &chunk in &c {
            list.insert_front(&mut arena, chunk).unwrap();
        }
        list.remove(&mut arena, c[2]).unwrap();
        assert_eq!(list.head(), Some(c[1]));
        assert_eq!(arena.header(c[1]).unwrap().prev, None);
    }

    #[test]
    fn remove_last_empties_list() {
        let (mut arena, c) = arena_with_chunks(64, &[63]);
        let mut list = FreeList::new();
        list.insert_front(&mut arena, c[0]).unwrap();
        list.remove(&mut arena, c[0]).unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn replace_keeps_list_position() {
        let (mut arena, c) = arena_with_chunks(64, &[20, 20, 20]);
        let mut list = FreeList::new();
        for &chunk in &c {
            list.insert_front(&mut arena, chunk).unwrap();
        }
        // Carve a new free chunk inside c[1] and swap it in.
        let carved = ChunkOffset::new(31).unwrap();
        arena.write_header(carved, &ChunkHeader::free(10, 10)).unwrap();
        list.replace(&mut arena, c[1], carved).unwrap();
        assert_eq!(walk(&list, &arena), vec![41, 31, 1]);
        assert_eq!(arena.header(c[0]).unwrap().prev, Some(carved));
        assert_eq!(arena.header(carved).unwrap().prev, Some(c[2]));
    }

    #[test]
    fn replace_head_moves_head() {
        let (mut arena, c) = arena_with_chunks(64, &[63]);
        let mut list = FreeList::new();
        list.insert_front(&mut arena, c[0]).unwrap();
        let carved = ChunkOffset::new(14).unwrap();
        arena.write_header(carved, &ChunkHeader::free(50, 13)).unwrap();
        list.replace(&mut arena, c[0], carved).unwrap();
        assert_eq!(list.head(), Some(carved));
        let header = arena.header(carved).unwrap();
        assert_eq!((header.next, header.prev), (None, None));
    }
}
