//! Bootstrap resampling with variable sample sizes

use tether_sdk::{Doubles, Error, List, Result, Sexp};

use crate::deviates::Deviates;

/// Draw `n_bootstrap` resamples of `data`, each of a random size in
/// `[min_size, max_size]`.
///
/// Each resample's size is `min_size + floor(u * (max_size - min_size + 1))`
/// and each element is `data[floor(u * len)]`, with one uniform deviate per
/// draw. Returns a list of real vectors.
pub fn bootstrap_variable(
    data: &Doubles,
    min_size: usize,
    max_size: usize,
    n_bootstrap: usize,
    deviates: &mut impl Deviates,
) -> Result<List> {
    if min_size > max_size {
        return Err(Error::Argument(format!(
            "min_size {} exceeds max_size {}",
            min_size, max_size
        )));
    }
    let len = data.len();
    if len == 0 && max_size > 0 {
        return Err(Error::Argument("cannot resample empty data".to_string()));
    }

    let span = max_size - min_size + 1;
    let mut samples = List::with_len(n_bootstrap)?;
    for b in 0..n_bootstrap {
        let size = min_size + scale(deviates.uniform()?, span);

        let mut sample = Doubles::new();
        for _ in 0..size {
            let idx = scale(deviates.uniform()?, len);
            sample.push(data.get(idx)?)?;
        }

        let h = sample.materialize()?;
        samples.set(b, Sexp::new(h)?)?;
    }

    tracing::debug!(n_bootstrap, min_size, max_size, "bootstrap resampling done");
    Ok(samples)
}

/// `floor(u * n)`, kept below `n` even if `u` rounds up to 1
fn scale(u: f64, n: usize) -> usize {
    ((u * n as f64) as usize).min(n.saturating_sub(1))
}
