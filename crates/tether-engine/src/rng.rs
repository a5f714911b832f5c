//! Random deviates and the normal distribution function

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seeded generator with acquire/release bracketing.
///
/// Deviates may only be drawn while the state is acquired.
pub(crate) struct RngState {
    rng: StdRng,
    acquired: usize,
    spare_normal: Option<f64>,
}

impl RngState {
    pub(crate) fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            acquired: 0,
            spare_normal: None,
        }
    }

    pub(crate) fn acquire(&mut self) {
        self.acquired += 1;
    }

    /// Returns false if the state was not acquired
    pub(crate) fn release(&mut self) -> bool {
        if self.acquired == 0 {
            return false;
        }
        self.acquired -= 1;
        true
    }

    pub(crate) fn is_acquired(&self) -> bool {
        self.acquired > 0
    }

    /// Uniform deviate on [0, 1)
    pub(crate) fn uniform(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    /// Standard normal deviate (polar Box-Muller, caching the second value)
    pub(crate) fn normal(&mut self) -> f64 {
        if let Some(z) = self.spare_normal.take() {
            return z;
        }
        loop {
            let u = 2.0 * self.uniform() - 1.0;
            let v = 2.0 * self.uniform() - 1.0;
            let s = u * u + v * v;
            if s > 0.0 && s < 1.0 {
                let factor = (-2.0 * s.ln() / s).sqrt();
                self.spare_normal = Some(v * factor);
                return u * factor;
            }
        }
    }
}

/// Standard normal cumulative distribution function
pub(crate) fn pnorm(q: f64) -> f64 {
    if q.is_nan() {
        return q;
    }
    0.5 * erfc(-q / std::f64::consts::SQRT_2)
}

/// Complementary error function (Chebyshev fit, relative error < 1.2e-7)
fn erfc(x: f64) -> f64 {
    let z = x.abs();
    let t = 1.0 / (1.0 + 0.5 * z);
    let poly = -z * z - 1.265_512_23
        + t * (1.000_023_68
            + t * (0.374_091_96
                + t * (0.096_784_18
                    + t * (-0.186_288_06
                        + t * (0.278_868_07
                            + t * (-1.135_203_98
                                + t * (1.488_515_87
                                    + t * (-0.822_152_23 + t * 0.170_872_77))))))));
    let r = t * poly.exp();
    if x >= 0.0 {
        r
    } else {
        2.0 - r
    }
}
