//! Random deviates from the runtime's generator

use std::rc::Rc;

use crate::error::Result;
use crate::runtime::Runtime;
use crate::session;
use crate::unwind::safe;

/// Holds the runtime RNG state loaded for the current scope.
///
/// Acquired on construction, released on drop (including on error paths),
/// so the runtime's seed advances exactly as far as the deviates drawn.
pub struct RngScope {
    runtime: Rc<dyn Runtime>,
}

impl RngScope {
    /// Load the RNG state
    pub fn new() -> Result<Self> {
        safe(|rt| rt.rng_acquire())?;
        Ok(Self {
            runtime: session::runtime()?,
        })
    }
}

impl Drop for RngScope {
    fn drop(&mut self) {
        self.runtime.rng_release();
    }
}

/// Uniform deviate on [0, 1)
pub fn unif_rand() -> Result<f64> {
    safe(|rt| rt.unif_rand())
}

/// Normal deviate with mean `mu` and standard deviation `sigma`
pub fn norm_rand(mu: f64, sigma: f64) -> Result<f64> {
    safe(|rt| mu + sigma * rt.norm_rand())
}

/// Normal cumulative distribution function at `q`
pub fn pnorm(q: f64, mu: f64, sigma: f64) -> Result<f64> {
    safe(|rt| rt.pnorm((q - mu) / sigma))
}
