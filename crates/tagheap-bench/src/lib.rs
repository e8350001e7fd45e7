//! Benchmark workloads for the tagheap allocator.
//!
//! Everything here is deterministic for a given seed:
//!
//! - [`churn_workload`]: a mixed allocate/free script drawn from ChaCha8
//! - [`fragmented_heap`]: a heap whose free list holds many small holes
//! - [`comb_heap`]: a heap of equal chunks for coalescing measurements

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tagheap_arena::{Heap, HeapConfig};
use tagheap_core::{ConfigError, HeapError, PayloadOffset};
use tagheap_test_utils::fixtures::Op;

/// Generate `steps` ops: roughly 60% allocations of `1..=max_request`
/// bytes, the rest frees of a random live slot.
pub fn churn_workload(seed: u64, steps: usize, max_request: usize) -> Vec<Op> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let max_request = max_request.max(1) as u64;
    (0..steps)
        .map(|_| {
            if rng.next_u32() % 10 < 6 {
                Op::Allocate((rng.next_u64() % max_request) as usize + 1)
            } else {
                Op::Free(rng.next_u32() as usize)
            }
        })
        .collect()
}

/// Fill a heap with `hole_size`-byte allocations, then free every other one.
///
/// The result has `holes` free chunks on the list ahead of the tail, none
/// of which can satisfy a request larger than `hole_size`. Returns the heap
/// and the payloads still allocated.
pub fn fragmented_heap(
    capacity: usize,
    hole_size: usize,
    holes: usize,
) -> Result<(Heap, Vec<PayloadOffset>), FixtureError> {
    let mut heap = Heap::new(HeapConfig::new(capacity))?;
    let mut kept = Vec::with_capacity(holes);
    let mut freed = Vec::with_capacity(holes);
    for _ in 0..holes {
        freed.push(heap.allocate(hole_size)?);
        kept.push(heap.allocate(hole_size)?);
    }
    for p in freed {
        heap.free(p)?;
    }
    Ok((heap, kept))
}

/// A heap carved into `count` equal `size`-byte allocations.
pub fn comb_heap(
    capacity: usize,
    size: usize,
    count: usize,
) -> Result<(Heap, Vec<PayloadOffset>), FixtureError> {
    let mut heap = Heap::new(HeapConfig::new(capacity))?;
    let payloads = (0..count)
        .map(|_| heap.allocate(size))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((heap, payloads))
}

/// Why a benchmark fixture could not be built.
#[derive(Debug)]
pub enum FixtureError {
    /// The capacity was rejected.
    Config(ConfigError),
    /// The heap could not hold the requested layout.
    Heap(HeapError),
}

impl std::fmt::Display for FixtureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(e) => write!(f, "fixture config: {e}"),
            Self::Heap(e) => write!(f, "fixture heap: {e}"),
        }
    }
}

impl std::error::Error for FixtureError {}

impl From<ConfigError> for FixtureError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<HeapError> for FixtureError {
    fn from(e: HeapError) -> Self {
        Self::Heap(e)
    }
}
