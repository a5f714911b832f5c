//! Rejection sampling from a truncated normal distribution
//!
//! The number of candidates needed is unknown up front, so accepted values
//! are pushed onto a growable vector. The acceptance probability comes from
//! the runtime's normal distribution function.

use serde::Serialize;
use tether_sdk::{rng, Doubles, Error, Result};

use crate::deviates::Deviates;

/// Truncated normal parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RejectionParams {
    /// Mean of the untruncated distribution
    pub mu: f64,
    /// Standard deviation of the untruncated distribution
    pub sigma: f64,
    /// Lower truncation bound (inclusive)
    pub lower: f64,
    /// Upper truncation bound (inclusive)
    pub upper: f64,
}

impl Default for RejectionParams {
    fn default() -> Self {
        Self {
            mu: 0.0,
            sigma: 1.0,
            lower: -2.0,
            upper: 2.0,
        }
    }
}

impl RejectionParams {
    /// Check that the parameters describe a proper interval and distribution
    pub fn validate(&self) -> Result<()> {
        if !self.mu.is_finite() {
            return Err(Error::Argument(format!("mu must be finite, got {}", self.mu)));
        }
        if !(self.sigma.is_finite() && self.sigma > 0.0) {
            return Err(Error::Argument(format!(
                "sigma must be positive and finite, got {}",
                self.sigma
            )));
        }
        if self.lower.is_nan() || self.upper.is_nan() || self.lower > self.upper {
            return Err(Error::Argument(format!(
                "invalid truncation interval [{}, {}]",
                self.lower, self.upper
            )));
        }
        Ok(())
    }

    /// True if `x` falls inside the truncation interval
    pub fn accepts(&self, x: f64) -> bool {
        x >= self.lower && x <= self.upper
    }
}

/// Probability that a single candidate is accepted
pub fn acceptance_probability(params: &RejectionParams) -> Result<f64> {
    let upper = rng::pnorm(params.upper, params.mu, params.sigma)?;
    let lower = rng::pnorm(params.lower, params.mu, params.sigma)?;
    Ok(upper - lower)
}

/// Draw `n` values from the normal distribution truncated to
/// `[lower, upper]`.
///
/// Candidates come from `deviates` in order; the result holds the accepted
/// ones in the order they were drawn.
pub fn rejection_sampling(
    n: usize,
    params: RejectionParams,
    deviates: &mut impl Deviates,
) -> Result<Doubles> {
    params.validate()?;

    let acceptance = acceptance_probability(&params)?;
    if acceptance <= 0.0 {
        return Err(Error::Argument(format!(
            "truncation interval [{}, {}] has zero probability",
            params.lower, params.upper
        )));
    }
    tracing::debug!(
        n,
        acceptance,
        expected_draws = n as f64 / acceptance,
        "rejection sampling"
    );

    let mut accepted = Doubles::new();
    accepted.reserve(n)?;

    let mut draws = 0usize;
    while accepted.len() < n {
        let candidate = deviates.normal(params.mu, params.sigma)?;
        draws += 1;
        if params.accepts(candidate) {
            accepted.push(candidate)?;
        }
    }

    tracing::debug!(draws, accepted = accepted.len(), "rejection sampling done");
    Ok(accepted)
}
