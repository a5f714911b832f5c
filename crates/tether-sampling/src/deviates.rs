//! Sources of random deviates

use std::collections::VecDeque;

use tether_sdk::{rng, Error, Result, RngScope};

/// Source of random deviates
pub trait Deviates {
    /// Normal deviate with mean `mu` and standard deviation `sigma`
    fn normal(&mut self, mu: f64, sigma: f64) -> Result<f64>;

    /// Uniform deviate on [0, 1)
    fn uniform(&mut self) -> Result<f64>;
}

/// Deviates drawn from the runtime's generator.
///
/// Holds the RNG state for as long as it lives.
pub struct RuntimeDeviates {
    _scope: RngScope,
}

impl RuntimeDeviates {
    /// Load the runtime RNG state
    pub fn new() -> Result<Self> {
        Ok(Self {
            _scope: RngScope::new()?,
        })
    }
}

impl Deviates for RuntimeDeviates {
    fn normal(&mut self, mu: f64, sigma: f64) -> Result<f64> {
        rng::norm_rand(mu, sigma)
    }

    fn uniform(&mut self) -> Result<f64> {
        rng::unif_rand()
    }
}

/// Deterministic deviates replayed from fixed sequences.
///
/// `normal` scales the next scripted standard deviate by `sigma` and shifts
/// it by `mu`. Running out of script is an error.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDeviates {
    normals: VecDeque<f64>,
    uniforms: VecDeque<f64>,
}

impl ScriptedDeviates {
    /// Script standard normal and uniform deviates
    pub fn new(
        normals: impl IntoIterator<Item = f64>,
        uniforms: impl IntoIterator<Item = f64>,
    ) -> Self {
        Self {
            normals: normals.into_iter().collect(),
            uniforms: uniforms.into_iter().collect(),
        }
    }

    /// Script only standard normal deviates
    pub fn normals(normals: impl IntoIterator<Item = f64>) -> Self {
        Self::new(normals, [])
    }

    /// Script only uniform deviates
    pub fn uniforms(uniforms: impl IntoIterator<Item = f64>) -> Self {
        Self::new([], uniforms)
    }

    /// Deviates not yet consumed, as (normals, uniforms)
    pub fn remaining(&self) -> (usize, usize) {
        (self.normals.len(), self.uniforms.len())
    }
}

impl Deviates for ScriptedDeviates {
    fn normal(&mut self, mu: f64, sigma: f64) -> Result<f64> {
        let z = self
            .normals
            .pop_front()
            .ok_or_else(|| Error::Argument("scripted normal deviates exhausted".to_string()))?;
        Ok(mu + sigma * z)
    }

    fn uniform(&mut self) -> Result<f64> {
        self.uniforms
            .pop_front()
            .ok_or_else(|| Error::Argument("scripted uniform deviates exhausted".to_string()))
    }
}
