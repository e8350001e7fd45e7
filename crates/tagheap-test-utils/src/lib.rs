//! Test utilities for tagheap development.
//!
//! Provides layout snapshots and an invariant assertion for [`Heap`], plus
//! the operation-script fixtures in [`fixtures`] used by the property tests
//! and benchmarks.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use tagheap_arena::Heap;
use tagheap_core::Vacancy;

/// `(offset, size, vacancy)` of one chunk.
pub type ChunkSummary = (u16, u16, Vacancy);

/// Every chunk of `heap` in address order.
pub fn layout(heap: &Heap) -> Vec<ChunkSummary> {
    heap.chunks()
        .map(|c| (c.offset.get(), c.header.size, c.header.vacancy))
        .collect()
}

/// Offsets of the free chunks in list order.
pub fn free_order(heap: &Heap) -> Vec<u16> {
    heap.free_chunks().map(|c| c.offset.get()).collect()
}

/// The layout of a freshly built heap of `capacity` bytes.
pub fn initial_layout(capacity: usize) -> Vec<ChunkSummary> {
    vec![(1, (capacity - 1) as u16, Vacancy::Free)]
}

/// Panic with the violated invariant if `heap` is not well formed.
///
/// Beyond [`Heap::check`], also confirms that the chunk walk and the
/// summary statistics agree on where every byte went.
#[track_caller]
pub fn assert_heap_valid(heap: &Heap) {
    if let Err(violation) = heap.check() {
        panic!("heap invariant violated: {violation}");
    }
    let stats = heap.stats();
    assert_eq!(
        stats.free_bytes + stats.occupied_bytes,
        heap.capacity() - 1,
        "chunk sizes do not cover the arena"
    );
    assert_eq!(
        heap.free_chunks().count(),
        stats.free_chunks,
        "free list length differs from free chunk count"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_heap_matches_initial_layout() {
        let heap = Heap::with_capacity(64).unwrap();
        assert_eq!(layout(&heap), initial_layout(64));
        assert_eq!(free_order(&heap), vec![1]);
        assert_heap_valid(&heap);
    }
}
