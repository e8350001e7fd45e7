//! Operation scripts for driving any [`HeapAllocator`].
//!
//! A script is a list of [`Op`]s. `Free` names a live allocation by index
//! (modulo the number of live allocations), so every generated script is
//! meaningful regardless of which allocations succeeded.

use tagheap_core::{HeapAllocator, HeapError, PayloadOffset};

/// One step of a script.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    /// Request this many payload bytes.
    Allocate(usize),
    /// Free the live allocation at this index (wrapped). No-op when
    /// nothing is live.
    Free(usize),
}

/// A payload handed out during a script and not yet freed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Allocation {
    pub payload: PayloadOffset,
    pub requested: usize,
}

/// What a script run left behind.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Outcome {
    /// Allocations still live, in the order they were made (modulo
    /// `swap_remove` on free).
    pub live: Vec<Allocation>,
    /// Requests that failed with `AllocationFailed`.
    pub failed: usize,
    /// Successful frees.
    pub freed: usize,
}

/// Run `ops` against `allocator`.
///
/// `AllocationFailed` is counted, not returned. Any other error aborts the
/// run, since a correct allocator never produces one for a script-driven
/// free.
pub fn run_ops<A>(allocator: &mut A, ops: &[Op]) -> Result<Outcome, HeapError>
where
    A: HeapAllocator + ?Sized,
{
    let mut outcome = Outcome::default();
    for op in ops {
        apply(allocator, &mut outcome, *op)?;
    }
    Ok(outcome)
}

/// Apply a single op, updating `outcome`.
pub fn apply<A>(allocator: &mut A, outcome: &mut Outcome, op: Op) -> Result<(), HeapError>
where
    A: HeapAllocator + ?Sized,
{
    match op {
        Op::Allocate(size) => match allocator.allocate(size) {
            Ok(payload) => outcome.live.push(Allocation {
                payload,
                requested: size,
            }),
            Err(HeapError::AllocationFailed { .. }) => outcome.failed += 1,
            Err(e) => return Err(e),
        },
        Op::Free(index) => {
            if !outcome.live.is_empty() {
                let victim = outcome.live.swap_remove(index % outcome.live.len());
                allocator.free(victim.payload)?;
                outcome.freed += 1;
            }
        }
    }
    Ok(())
}

/// Free every live allocation in `outcome`, from the back of the list.
pub fn free_all<A>(allocator: &mut A, outcome: &mut Outcome) -> Result<(), HeapError>
where
    A: HeapAllocator + ?Sized,
{
    while let Some(victim) = outcome.live.pop() {
        allocator.free(victim.payload)?;
        outcome.freed += 1;
    }
    Ok(())
}

/// Panic if any two live allocations' requested ranges overlap.
#[track_caller]
pub fn assert_disjoint(live: &[Allocation]) {
    let mut ranges: Vec<(usize, usize)> = live
        .iter()
        .map(|a| (a.payload.index(), a.payload.index() + a.requested.max(1)))
        .collect();
    ranges.sort_unstable();
    for pair in ranges.windows(2) {
        assert!(
            pair[0].1 <= pair[1].0,
            "payload ranges {:?} and {:?} overlap",
            pair[0],
            pair[1]
        );
    }
}
