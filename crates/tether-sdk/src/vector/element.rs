//! Element types a [`Vector`](super::Vector) can hold
//!
//! Each implementation maps one native type onto one runtime element kind.
//! The read/write functions are raw primitive calls and must only run
//! inside [`safe`](crate::safe).

use crate::handle::Handle;
use crate::kind::{Complex, ElementKind, Logical, NA_INTEGER, NA_REAL};
use crate::runtime::Runtime;
use crate::sexp::Sexp;

/// Native element type of a runtime vector
pub trait Element: Clone {
    /// Runtime kind this element type is stored as
    const KIND: ElementKind;

    /// Read element `i` of `h`
    fn read(rt: &dyn Runtime, h: Handle, i: usize) -> Self;

    /// Write element `i` of `h`
    fn write(rt: &dyn Runtime, h: Handle, i: usize, value: &Self);

    /// Copy a contiguous run starting at `start` into `buf`; returns the count.
    ///
    /// Kinds without region support read element by element.
    fn read_region(rt: &dyn Runtime, h: Handle, start: usize, buf: &mut [Self]) -> usize {
        let n = buf.len().min(rt.length(h).saturating_sub(start));
        for (offset, slot) in buf.iter_mut().take(n).enumerate() {
            *slot = Self::read(rt, h, start + offset);
        }
        n
    }

    /// The kind's missing value
    fn missing(rt: &dyn Runtime) -> Self;

    /// Value a freshly sized vector is filled with
    fn blank(rt: &dyn Runtime) -> Self;
}

impl Element for i32 {
    const KIND: ElementKind = ElementKind::Integer;

    fn read(rt: &dyn Runtime, h: Handle, i: usize) -> Self {
        rt.integer_elt(h, i)
    }

    fn write(rt: &dyn Runtime, h: Handle, i: usize, value: &Self) {
        rt.set_integer_elt(h, i, *value)
    }

    fn read_region(rt: &dyn Runtime, h: Handle, start: usize, buf: &mut [Self]) -> usize {
        rt.integer_region(h, start, buf)
    }

    fn missing(_rt: &dyn Runtime) -> Self {
        NA_INTEGER
    }

    fn blank(_rt: &dyn Runtime) -> Self {
        0
    }
}

impl Element for f64 {
    const KIND: ElementKind = ElementKind::Real;

    fn read(rt: &dyn Runtime, h: Handle, i: usize) -> Self {
        rt.real_elt(h, i)
    }

    fn write(rt: &dyn Runtime, h: Handle, i: usize, value: &Self) {
        rt.set_real_elt(h, i, *value)
    }

    fn read_region(rt: &dyn Runtime, h: Handle, start: usize, buf: &mut [Self]) -> usize {
        rt.real_region(h, start, buf)
    }

    fn missing(_rt: &dyn Runtime) -> Self {
        NA_REAL
    }

    fn blank(_rt: &dyn Runtime) -> Self {
        0.0
    }
}

impl Element for Logical {
    const KIND: ElementKind = ElementKind::Logical;

    fn read(rt: &dyn Runtime, h: Handle, i: usize) -> Self {
        Logical::from_raw(rt.logical_elt(h, i))
    }

    fn write(rt: &dyn Runtime, h: Handle, i: usize, value: &Self) {
        rt.set_logical_elt(h, i, value.to_raw())
    }

    fn read_region(rt: &dyn Runtime, h: Handle, start: usize, buf: &mut [Self]) -> usize {
        let mut raw = vec![0i32; buf.len()];
        let n = rt.logical_region(h, start, &mut raw);
        for (slot, r) in buf.iter_mut().zip(&raw[..n]) {
            *slot = Logical::from_raw(*r);
        }
        n
    }

    fn missing(_rt: &dyn Runtime) -> Self {
        Logical::Na
    }

    fn blank(_rt: &dyn Runtime) -> Self {
        Logical::False
    }
}

impl Element for Complex {
    const KIND: ElementKind = ElementKind::Complex;

    fn read(rt: &dyn Runtime, h: Handle, i: usize) -> Self {
        rt.complex_elt(h, i)
    }

    fn write(rt: &dyn Runtime, h: Handle, i: usize, value: &Self) {
        rt.set_complex_elt(h, i, *value)
    }

    fn read_region(rt: &dyn Runtime, h: Handle, start: usize, buf: &mut [Self]) -> usize {
        rt.complex_region(h, start, buf)
    }

    fn missing(_rt: &dyn Runtime) -> Self {
        Complex::NA
    }

    fn blank(_rt: &dyn Runtime) -> Self {
        Complex::default()
    }
}

impl Element for Option<String> {
    const KIND: ElementKind = ElementKind::String;

    fn read(rt: &dyn Runtime, h: Handle, i: usize) -> Self {
        rt.string_elt(h, i)
    }

    fn write(rt: &dyn Runtime, h: Handle, i: usize, value: &Self) {
        rt.set_string_elt(h, i, value.as_deref())
    }

    fn missing(_rt: &dyn Runtime) -> Self {
        None
    }

    fn blank(_rt: &dyn Runtime) -> Self {
        Some(String::new())
    }
}

/// List elements are owning wrappers: anything read out of a list, or
/// buffered natively before materialization, stays preserved on its own.
impl Element for Sexp {
    const KIND: ElementKind = ElementKind::Generic;

    fn read(rt: &dyn Runtime, h: Handle, i: usize) -> Self {
        let elt = rt.list_elt(h, i);
        match Sexp::new(elt) {
            Ok(sexp) => sexp,
            // Only reachable with no session, and `read` always runs inside one.
            Err(err) => crate::unwind::raise(err.to_string()),
        }
    }

    fn write(rt: &dyn Runtime, h: Handle, i: usize, value: &Self) {
        rt.set_list_elt(h, i, value.handle())
    }

    fn missing(rt: &dyn Runtime) -> Self {
        nil_sexp(rt)
    }

    fn blank(rt: &dyn Runtime) -> Self {
        nil_sexp(rt)
    }
}

fn nil_sexp(rt: &dyn Runtime) -> Sexp {
    Sexp::from_nil_handle(rt.nil())
}
