//! Full structural verification of the arena and free list.

use std::collections::BTreeSet;

use tagheap_core::{ChunkOffset, MIN_CHUNK_SIZE};

use crate::arena::Arena;
use crate::error::InvariantViolation;
use crate::free_list::FreeList;

/// Walk the partition, then the free list, checking every invariant.
pub(crate) fn check(arena: &Arena, free_list: &FreeList) -> Result<(), InvariantViolation> {
    let free = check_partition(arena)?;
    check_free_list(arena, free_list, &free)
}

/// Returns the set of free chunk offsets.
fn check_partition(arena: &Arena) -> Result<BTreeSet<ChunkOffset>, InvariantViolation> {
    let capacity = arena.capacity();
    let mut free = BTreeSet::new();
    let mut total = 0usize;
    let mut left: Option<(ChunkOffset, u16, bool)> = None;
    let mut cursor = arena.chunk_at(ChunkOffset::FIRST.index());

    while let Some(offset) = cursor {
        let header = arena
            .header(offset)
            .map_err(|source| InvariantViolation::UnreadableHeader { offset, source })?;
        let size = header.size as usize;
        if size < MIN_CHUNK_SIZE {
            return Err(InvariantViolation::ChunkTooSmall { offset, size });
        }
        let end = offset.index() + size;
        if end > capacity {
            return Err(InvariantViolation::Overrun {
                offset,
                end,
                capacity,
            });
        }

        let actual_left = left.map_or(0, |(_, size, _)| size);
        if header.left_size != actual_left {
            return Err(InvariantViolation::LeftSizeMismatch {
                offset,
                recorded: header.left_size,
                actual: actual_left,
            });
        }

        let is_free = header.vacancy.is_free();
        if let Some((left_offset, _, true)) = left {
            if is_free {
                return Err(InvariantViolation::AdjacentFree {
                    left: left_offset,
                    right: offset,
                });
            }
        }
        if is_free {
            free.insert(offset);
        } else if header.next.is_some() || header.prev.is_some() {
            return Err(InvariantViolation::OccupiedWithLinks { offset });
        }

        total += size;
        left = Some((offset, header.size, is_free));
        cursor = arena.chunk_at(end);
    }

    let expected = capacity - 1;
    if total != expected {
        return Err(InvariantViolation::SizeMismatch { total, expected });
    }
    Ok(free)
}

fn check_free_list(
    arena: &Arena,
    free_list: &FreeList,
    free: &BTreeSet<ChunkOffset>,
) -> Result<(), InvariantViolation> {
    let mut visited = BTreeSet::new();
    let mut prev = None;
    let mut cursor = free_list.head();

    while let Some(offset) = cursor {
        if !free.contains(&offset) {
            return Err(InvariantViolation::NotFreeChunk { offset });
        }
        if !visited.insert(offset) {
            return Err(InvariantViolation::Cycle { offset });
        }
        let header = arena
            .header(offset)
            .map_err(|source| InvariantViolation::UnreadableHeader { offset, source })?;
        if header.prev != prev {
            return Err(InvariantViolation::BrokenLink {
                offset,
                expected_prev: prev,
                found_prev: header.prev,
            });
        }
        prev = Some(offset);
        cursor = header.next;
    }

    if let Some(&offset) = free.difference(&visited).next() {
        return Err(InvariantViolation::MissingFromFreeList { offset });
    }
    Ok(())
}
