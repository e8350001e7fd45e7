//! Heap configuration parameters.

use tagheap_core::{ConfigError, DEFAULT_CAPACITY, MAX_CAPACITY, MIN_CAPACITY};

/// How thoroughly `free` and payload access validate a caller's offset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FreeValidation {
    /// O(1) boundary-tag checks: the header must decode, fit the arena,
    /// and agree with both address neighbours.
    #[default]
    Structural,
    /// Structural checks plus a walk of the whole partition confirming the
    /// offset is a real chunk start. O(number of chunks).
    Strict,
}

/// Configuration for a [`Heap`](crate::Heap).
///
/// Validated at construction; all values are immutable after creation.
#[derive(Clone, Debug)]
pub struct HeapConfig {
    /// Arena size in bytes, including the reserved null byte at offset 0.
    ///
    /// Default: 65_536. Must lie within
    /// [`MIN_CAPACITY`]..=[`MAX_CAPACITY`] so that every offset and the
    /// initial chunk size fit in 16 bits.
    pub capacity: usize,

    /// Offset validation applied by `free`, `payload`, and `payload_mut`.
    ///
    /// Default: [`FreeValidation::Structural`].
    pub free_validation: FreeValidation,

    /// Zero the payload of every chunk before `allocate` returns it.
    ///
    /// Default: `false` (payloads keep whatever bytes the chunk held).
    pub zero_on_allocate: bool,
}

impl HeapConfig {
    /// Default arena capacity in bytes.
    pub const DEFAULT_CAPACITY: usize = DEFAULT_CAPACITY;

    /// Create a config for the given capacity with defaults for the rest.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            free_validation: FreeValidation::default(),
            zero_on_allocate: false,
        }
    }

    /// Set the free validation level.
    pub fn with_free_validation(mut self, level: FreeValidation) -> Self {
        self.free_validation = level;
        self
    }

    /// Enable or disable payload zeroing on allocation.
    pub fn with_zero_on_allocate(mut self, zero: bool) -> Self {
        self.zero_on_allocate = zero;
        self
    }

    /// Check that the capacity is addressable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_CAPACITY..=MAX_CAPACITY).contains(&self.capacity) {
            return Err(ConfigError::CapacityOutOfRange {
                requested: self.capacity,
                min: MIN_CAPACITY,
                max: MAX_CAPACITY,
            });
        }
        Ok(())
    }
}

impl Default for HeapConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_capacity_is_64k() {
        let config = HeapConfig::default();
        assert_eq!(config.capacity, 65_536);
        assert_eq!(config.free_validation, FreeValidation::Structural);
        assert!(!config.zero_on_allocate);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn capacity_bounds_are_inclusive() {
        assert!(HeapConfig::new(MIN_CAPACITY).validate().is_ok());
        assert!(HeapConfig::new(MAX_CAPACITY).validate().is_ok());
    }

    #[test]
    fn capacity_past_16_bits_rejected() {
        let err = HeapConfig::new(MAX_CAPACITY + 1).validate().unwrap_err();
        assert_eq!(
            err,
            ConfigError::CapacityOutOfRange {
                requested: 65_537,
                min: 11,
                max: 65_536,
            }
        );
    }

    #[test]
    fn capacity_too_small_for_a_chunk_rejected() {
        assert!(HeapConfig::new(MIN_CAPACITY - 1).validate().is_err());
        assert!(HeapConfig::new(0).validate().is_err());
    }

    #[test]
    fn builder_methods_set_fields() {
        let config = HeapConfig::new(64)
            .with_free_validation(FreeValidation::Strict)
            .with_zero_on_allocate(true);
        assert_eq!(config.capacity, 64);
        assert_eq!(config.free_validation, FreeValidation::Strict);
        assert!(config.zero_on_allocate);
    }
}
