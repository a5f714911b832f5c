//! Tether Sampling - sampling routines that build results incrementally
//!
//! Each routine grows its output with [`tether_sdk::Vector::push`] because
//! the final size is not known in advance:
//!
//! - [`rejection_sampling`]: truncated normal draws
//! - [`bootstrap_variable`]: resamples of random size
//! - [`grow`] / [`grow_complex`]: plain growth workloads
//!
//! Sampling draws and materialization need an active runtime session.

#![warn(missing_docs)]

pub mod bootstrap;
pub mod deviates;
pub mod grow;
pub mod rejection;

pub use bootstrap::bootstrap_variable;
pub use deviates::{Deviates, RuntimeDeviates, ScriptedDeviates};
pub use grow::{grow, grow_complex};
pub use rejection::{acceptance_probability, rejection_sampling, RejectionParams};
