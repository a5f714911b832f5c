//! Heap configuration

use crate::defaults::{DEFAULT_GC_THRESHOLD, DEFAULT_MAX_VECTOR_LEN, DEFAULT_SEED};

/// Configuration for a [`Heap`](crate::Heap)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeapConfig {
    /// Allocations between automatic collections
    pub gc_threshold: usize,

    /// Collect before every allocation.
    ///
    /// Any handle that is not protected when an allocation happens is
    /// reclaimed immediately, so protection bugs show up as stale-handle
    /// errors instead of silent corruption.
    pub gc_torture: bool,

    /// Longest vector `alloc_vector` accepts; longer requests raise a
    /// runtime error
    pub max_vector_len: usize,

    /// Random generator seed
    pub seed: u64,
}

impl HeapConfig {
    /// Default configuration with torture mode on
    pub fn torture() -> Self {
        Self {
            gc_torture: true,
            ..Self::default()
        }
    }

    /// Replace the seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

impl Default for HeapConfig {
    fn default() -> Self {
        Self {
            gc_threshold: DEFAULT_GC_THRESHOLD,
            gc_torture: false,
            max_vector_len: DEFAULT_MAX_VECTOR_LEN,
            seed: DEFAULT_SEED,
        }
    }
}
