//! Default constants for heap configuration.

/// Allocations between automatic collections.
pub const DEFAULT_GC_THRESHOLD: usize = 4096;

/// Longest vector the heap will allocate.
pub const DEFAULT_MAX_VECTOR_LEN: usize = 1 << 28;

/// Seed used when none is configured, so runs are reproducible by default.
pub const DEFAULT_SEED: u64 = 1954;
