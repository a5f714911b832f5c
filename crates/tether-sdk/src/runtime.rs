//! Runtime trait: the foreign primitives the SDK is allowed to call
//!
//! The host runtime implements this trait. Everything else in the SDK is
//! written against it and never touches runtime internals directly.
//!
//! # Unwinding
//!
//! Allocation, element, attribute and RNG primitives may signal a runtime
//! error by unwinding with a [`RuntimeUnwind`](crate::RuntimeUnwind) payload
//! (see [`raise`](crate::raise)). The SDK only invokes them through
//! [`safe`](crate::safe), which turns that unwind into [`Error::Runtime`](crate::Error::Runtime).
//!
//! The protection group (`protect`, `unprotect`, `preserve`, `release`,
//! `protect_depth`) must not unwind when used correctly. Guards call it from
//! `Drop`.

use crate::handle::Handle;
use crate::kind::{Complex, ElementKind};

/// Foreign runtime primitives.
///
/// Single-threaded: a runtime is installed on one thread through
/// [`session::enter`](crate::session::enter) and only used from there.
pub trait Runtime {
    // ========================================================================
    // Object Model
    // ========================================================================

    /// The runtime's nil object (permanently reachable)
    fn nil(&self) -> Handle;

    /// Vector kind of an object, `None` for nil and non-vector objects
    fn kind_of(&self, h: Handle) -> Option<ElementKind>;

    /// Number of elements (0 for nil)
    fn length(&self, h: Handle) -> usize;

    /// True if the object is a lazy/compact representation with no
    /// materialized element buffer
    fn is_compact(&self, h: Handle) -> bool;

    // ========================================================================
    // Allocation
    // ========================================================================

    /// Allocate a vector of `len` blank elements. May trigger collection.
    fn alloc_vector(&self, kind: ElementKind, len: usize) -> Handle;

    // ========================================================================
    // Element Access
    // ========================================================================

    /// Read an integer element
    fn integer_elt(&self, h: Handle, i: usize) -> i32;

    /// Write an integer element
    fn set_integer_elt(&self, h: Handle, i: usize, v: i32);

    /// Read a real element
    fn real_elt(&self, h: Handle, i: usize) -> f64;

    /// Write a real element
    fn set_real_elt(&self, h: Handle, i: usize, v: f64);

    /// Read a logical element in raw i32 storage
    fn logical_elt(&self, h: Handle, i: usize) -> i32;

    /// Write a logical element in raw i32 storage
    fn set_logical_elt(&self, h: Handle, i: usize, v: i32);

    /// Read a complex element
    fn complex_elt(&self, h: Handle, i: usize) -> Complex;

    /// Write a complex element
    fn set_complex_elt(&self, h: Handle, i: usize, v: Complex);

    /// Read a string element (`None` is the missing string)
    fn string_elt(&self, h: Handle, i: usize) -> Option<String>;

    /// Write a string element
    fn set_string_elt(&self, h: Handle, i: usize, v: Option<&str>);

    /// Read a list element
    fn list_elt(&self, h: Handle, i: usize) -> Handle;

    /// Write a list element
    fn set_list_elt(&self, h: Handle, i: usize, v: Handle);

    // ========================================================================
    // Region Reads
    // ========================================================================

    /// Copy up to `buf.len()` integers starting at `start`; returns the count
    fn integer_region(&self, h: Handle, start: usize, buf: &mut [i32]) -> usize;

    /// Copy up to `buf.len()` reals starting at `start`; returns the count
    fn real_region(&self, h: Handle, start: usize, buf: &mut [f64]) -> usize;

    /// Copy up to `buf.len()` raw logicals starting at `start`; returns the count
    fn logical_region(&self, h: Handle, start: usize, buf: &mut [i32]) -> usize;

    /// Copy up to `buf.len()` complexes starting at `start`; returns the count
    fn complex_region(&self, h: Handle, start: usize, buf: &mut [Complex]) -> usize;

    // ========================================================================
    // Attributes
    // ========================================================================

    /// Get a named attribute (nil when absent)
    fn get_attr(&self, h: Handle, name: &str) -> Handle;

    /// Set a named attribute
    fn set_attr(&self, h: Handle, name: &str, value: Handle);

    // ========================================================================
    // Protection
    // ========================================================================

    /// Push a handle on the protection stack
    fn protect(&self, h: Handle);

    /// Pop `n` handles from the protection stack
    fn unprotect(&self, n: usize);

    /// Current depth of the protection stack
    fn protect_depth(&self) -> usize;

    /// Add one long-lived protection for `h` (counted per call)
    fn preserve(&self, h: Handle);

    /// Remove one long-lived protection for `h`
    fn release(&self, h: Handle);

    // ========================================================================
    // Random Deviates
    // ========================================================================

    /// Load the RNG state before drawing deviates
    fn rng_acquire(&self);

    /// Store the RNG state after drawing deviates
    fn rng_release(&self);

    /// Uniform deviate on [0, 1)
    fn unif_rand(&self) -> f64;

    /// Standard normal deviate
    fn norm_rand(&self) -> f64;

    /// Standard normal cumulative distribution function
    fn pnorm(&self, q: f64) -> f64;
}
