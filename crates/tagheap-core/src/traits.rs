//! The allocation contract seen by callers.

use crate::error::HeapError;
use crate::id::PayloadOffset;

/// An explicit allocator over a fixed-capacity arena.
///
/// Callers only need this contract: request bytes, get back a payload
/// offset, hand the offset back when done. Implementations are used by a
/// single logical owner calling sequentially (`&mut self`).
pub trait HeapAllocator {
    /// Reserve at least `size` payload bytes.
    ///
    /// Returns [`HeapError::AllocationFailed`] when no free chunk fits; the
    /// arena is left unchanged in that case.
    fn allocate(&mut self, size: usize) -> Result<PayloadOffset, HeapError>;

    /// Return a payload previously obtained from [`allocate`](Self::allocate).
    ///
    /// Returns [`HeapError::DoubleFree`] if it is already free and
    /// [`HeapError::InvalidFree`] if it does not name a live chunk; neither
    /// mutates the arena.
    fn free(&mut self, payload: PayloadOffset) -> Result<(), HeapError>;

    /// Total arena capacity in bytes, including the reserved null byte.
    fn capacity(&self) -> usize;
}
