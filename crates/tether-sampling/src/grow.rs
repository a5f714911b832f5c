//! Growth workloads: push `0..n` with no size hint

use tether_sdk::{Complex, Complexes, Doubles, Result};

/// `[0, 1, ..., n - 1]` built one push at a time
pub fn grow(n: usize) -> Result<Doubles> {
    let mut x = Doubles::new();
    for i in 0..n {
        x.push(i as f64)?;
    }
    Ok(x)
}

/// `[0+0i, 1+1i, ...]` built one push at a time
pub fn grow_complex(n: usize) -> Result<Complexes> {
    let mut x = Complexes::new();
    for i in 0..n {
        x.push(Complex::new(i as f64, i as f64))?;
    }
    Ok(x)
}
