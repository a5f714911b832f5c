//! Tether SDK - GC-safe handles for native code driving a garbage-collected runtime
//!
//! Native code sees runtime objects as [`Handle`]s: copyable, weak, and only
//! safe to dereference while something keeps the object reachable. This crate
//! provides the pieces that do that:
//!
//! - [`safe`] routes every runtime primitive through one boundary that turns
//!   runtime errors into [`Error::Runtime`] after native destructors have run
//! - [`Protect`] protects handles for a lexical scope
//! - [`registry`] preserves handles indefinitely under independent keys
//! - [`Sexp`] ties one registration to a value with clone/move/drop semantics
//! - [`Vector`] reads runtime vectors in place or builds new ones natively
//! - [`FromHandle`] / [`IntoHandle`] convert scalars, sequences and maps
//!
//! A runtime is installed per thread with [`session::enter`].
//!
//! # Example
//!
//! ```ignore
//! use std::rc::Rc;
//! use tether_sdk::{session, Doubles, IntoHandle, Sexp};
//!
//! let _session = session::enter(Rc::new(runtime))?;
//!
//! let mut out = Doubles::new();
//! for x in [1.0, 2.0, 3.0] {
//!     out.push(x)?;
//! }
//! let result = Sexp::new(out.into_handle()?)?;
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod convert;
pub mod error;
pub mod handle;
pub mod kind;
pub mod protect;
pub mod registry;
pub mod rng;
pub mod runtime;
pub mod session;
pub mod sexp;
pub mod unwind;
pub mod vector;

pub use config::{GrowthPolicy, OutOfBounds, VectorConfig};
pub use convert::{from_handle, into_handle, FromHandle, IntoHandle};
pub use error::{Error, Result};
pub use handle::Handle;
pub use kind::{is_na_real, Complex, ElementKind, Logical, NA_INTEGER, NA_LOGICAL, NA_REAL};
pub use protect::{with_protected, Protect};
pub use registry::RegistryKey;
pub use rng::RngScope;
pub use runtime::Runtime;
pub use session::{SessionGuard, SessionId};
pub use sexp::Sexp;
pub use unwind::{catch, raise, safe, RuntimeUnwind};
pub use vector::{
    Complexes, Doubles, Element, GrowthStats, Integers, List, Logicals, Strings, Vector,
};
