//! Vector configuration: growth and out-of-bounds policies

use crate::error::{Error, Result};
use crate::kind::ElementKind;

/// Default growth factor for writable vectors.
pub const DEFAULT_GROWTH_FACTOR: f64 = 2.0;

/// Default capacity of the first allocation of an empty writable vector.
pub const DEFAULT_MIN_CAPACITY: usize = 1;

/// Smallest growth factor that still keeps appends amortized O(1)
/// with reasonable constants.
pub const MIN_GROWTH_FACTOR: f64 = 1.25;

/// Geometric growth policy for writable vectors
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrowthPolicy {
    factor: f64,
    min_capacity: usize,
}

impl GrowthPolicy {
    /// Create a policy; `factor` must be at least [`MIN_GROWTH_FACTOR`]
    pub fn new(factor: f64, min_capacity: usize) -> Result<Self> {
        if !factor.is_finite() || factor < MIN_GROWTH_FACTOR {
            return Err(Error::Config(format!(
                "growth factor must be a finite value >= {}, got {}",
                MIN_GROWTH_FACTOR, factor
            )));
        }
        Ok(Self {
            factor,
            min_capacity: min_capacity.max(1),
        })
    }

    /// Growth factor
    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Capacity of the first allocation
    pub fn min_capacity(&self) -> usize {
        self.min_capacity
    }

    /// Capacity to grow to from `current`; always greater than `current`
    pub fn next_capacity(&self, current: usize) -> usize {
        let scaled = (current as f64 * self.factor).ceil() as usize;
        scaled.max(current + 1).max(self.min_capacity)
    }
}

impl Default for GrowthPolicy {
    fn default() -> Self {
        Self {
            factor: DEFAULT_GROWTH_FACTOR,
            min_capacity: DEFAULT_MIN_CAPACITY,
        }
    }
}

/// What an indexed read past the end returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutOfBounds {
    /// Fail with [`Error::OutOfBounds`]
    Fail,
    /// Return the element kind's missing value
    Missing,
}

impl OutOfBounds {
    /// Default policy for `kind`: lists read nil past the end, everything
    /// else fails
    pub const fn default_for(kind: ElementKind) -> Self {
        match kind {
            ElementKind::Generic => OutOfBounds::Missing,
            _ => OutOfBounds::Fail,
        }
    }
}

/// Per-vector configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VectorConfig {
    /// Growth policy for writable vectors
    pub growth: GrowthPolicy,
    /// Out-of-bounds read policy; `None` uses the kind's default
    pub oob: Option<OutOfBounds>,
}

impl Default for VectorConfig {
    fn default() -> Self {
        Self {
            growth: GrowthPolicy::default(),
            oob: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_doubles_from_one() {
        let policy = GrowthPolicy::default();
        assert_eq!(policy.next_capacity(0), 1);
        assert_eq!(policy.next_capacity(1), 2);
        assert_eq!(policy.next_capacity(2), 4);
        assert_eq!(policy.next_capacity(1000), 2000);
    }

    #[test]
    fn test_small_factor_still_grows() {
        let policy = GrowthPolicy::new(1.25, 1).unwrap();
        assert_eq!(policy.next_capacity(1), 2);
        assert_eq!(policy.next_capacity(2), 3);
        assert_eq!(policy.next_capacity(8), 10);
    }

    #[test]
    fn test_min_capacity() {
        let policy = GrowthPolicy::new(1.5, 16).unwrap();
        assert_eq!(policy.next_capacity(0), 16);
        assert_eq!(policy.next_capacity(16), 24);
    }

    #[test]
    fn test_rejects_slow_factors() {
        assert!(matches!(GrowthPolicy::new(1.1, 1), Err(Error::Config(_))));
        assert!(GrowthPolicy::new(f64::NAN, 1).is_err());
        assert!(GrowthPolicy::new(f64::INFINITY, 1).is_err());
    }

    #[test]
    fn test_oob_defaults() {
        assert_eq!(
            OutOfBounds::default_for(ElementKind::Generic),
            OutOfBounds::Missing
        );
        assert_eq!(OutOfBounds::default_for(ElementKind::Real), OutOfBounds::Fail);
        assert_eq!(
            OutOfBounds::default_for(ElementKind::String),
            OutOfBounds::Fail
        );
    }
}
