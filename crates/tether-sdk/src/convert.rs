//! Conversion dispatch between native values and runtime handles
//!
//! [`FromHandle`] and [`IntoHandle`] are resolved at compile time by the
//! native type. Scalars require a length-1 runtime vector of a compatible
//! kind:
//!
//! | Target | Accepts |
//! |---|---|
//! | `i32` and other integers | integer; real if integral or missing; missing logical |
//! | `f64`, `f32` | real; integer (missing stays missing); missing logical |
//! | `bool` | logical only; missing reads as `false` |
//! | `String` | character only; missing reads as `"NA"` |
//! | `Complex` | complex; real and integer widen |
//!
//! Anything else fails with [`Error::Shape`]. Sequences convert element-wise
//! through [`Vector`].
//!
//! Conversions never decide protection. A handle passed to `from_handle` must
//! already be protected, and a handle returned by `into_handle` is
//! unprotected until the caller wraps it.

use std::collections::{BTreeMap, HashMap};

use crate::error::{Error, Result};
use crate::handle::Handle;
use crate::kind::{is_na_real, Complex, ElementKind, Logical, NA_INTEGER, NA_LOGICAL, NA_REAL};
use crate::runtime::Runtime;
use crate::sexp::Sexp;
use crate::unwind::safe;
use crate::vector::{Element, List, Vector};

/// Convert a runtime handle into a native value
pub trait FromHandle: Sized {
    /// Convert, failing if the handle has the wrong kind or shape
    fn from_handle(h: Handle) -> Result<Self>;
}

/// Convert a native value into a runtime handle
pub trait IntoHandle {
    /// Allocate a runtime object holding this value
    fn into_handle(self) -> Result<Handle>;
}

/// Convert `h` into `T`
pub fn from_handle<T: FromHandle>(h: Handle) -> Result<T> {
    T::from_handle(h)
}

/// Convert `value` into a fresh, unprotected runtime handle
pub fn into_handle<T: IntoHandle>(value: T) -> Result<Handle> {
    value.into_handle()
}

// ============================================================================
// Helpers
// ============================================================================

const EXPECTED_INTEGER: &str = "Expected single integer value";
const EXPECTED_DOUBLE: &str = "Expected single double value";
const EXPECTED_LOGICAL: &str = "Expected single logical value";
const EXPECTED_STRING: &str = "Expected string vector of length 1";
const EXPECTED_COMPLEX: &str = "Expected single complex value";
const EXPECTED_CHAR: &str = "Expected string vector of length 1 with a non-empty value";

fn describe(h: Handle) -> Result<(Option<ElementKind>, usize)> {
    safe(|rt| (rt.kind_of(h), rt.length(h)))
}

fn shape(expected: &'static str, kind: Option<ElementKind>, len: usize) -> Error {
    Error::Shape {
        expected,
        kind,
        len,
    }
}

/// Allocate a length-1 vector of `kind` and fill its only element
fn scalar(kind: ElementKind, fill: impl FnOnce(&dyn Runtime, Handle)) -> Result<Handle> {
    safe(|rt| {
        let h = rt.alloc_vector(kind, 1);
        fill(rt, h);
        h
    })
}

/// Integer reading rules shared by every integer target; `None` is missing
fn integral(h: Handle) -> Result<Option<i64>> {
    let (kind, len) = describe(h)?;
    if len != 1 {
        return Err(shape(EXPECTED_INTEGER, kind, len));
    }
    match kind {
        Some(ElementKind::Integer) => {
            let v = safe(|rt| rt.integer_elt(h, 0))?;
            Ok((v != NA_INTEGER).then_some(v as i64))
        }
        Some(ElementKind::Real) => {
            let x = safe(|rt| rt.real_elt(h, 0))?;
            if is_na_real(x) {
                return Ok(None);
            }
            if !x.is_finite() || x.fract() != 0.0 {
                return Err(shape(EXPECTED_INTEGER, kind, len));
            }
            if x < i64::MIN as f64 || x >= i64::MAX as f64 {
                return Err(Error::OutOfRange {
                    target: "integer",
                    value: x.to_string(),
                });
            }
            Ok(Some(x as i64))
        }
        Some(ElementKind::Logical) => {
            let raw = safe(|rt| rt.logical_elt(h, 0))?;
            if raw == NA_LOGICAL {
                Ok(None)
            } else {
                Err(shape(EXPECTED_INTEGER, kind, len))
            }
        }
        _ => Err(shape(EXPECTED_INTEGER, kind, len)),
    }
}

/// Integer value of an integer-kind handle, as enums require
#[doc(hidden)]
pub fn enum_value(h: Handle, target: &'static str) -> Result<i32> {
    let (kind, len) = describe(h)?;
    if kind != Some(ElementKind::Integer) || len != 1 {
        return Err(shape(EXPECTED_INTEGER, kind, len));
    }
    let raw = safe(|rt| rt.integer_elt(h, 0))?;
    if raw == NA_INTEGER {
        return Err(Error::OutOfRange {
            target,
            value: "NA".to_string(),
        });
    }
    Ok(raw)
}

// ============================================================================
// Integers
// ============================================================================

impl FromHandle for i32 {
    fn from_handle(h: Handle) -> Result<Self> {
        match integral(h)? {
            None => Ok(NA_INTEGER),
            Some(v) => i32::try_from(v)
                .ok()
                .filter(|v| *v != NA_INTEGER)
                .ok_or_else(|| Error::OutOfRange {
                    target: "i32",
                    value: v.to_string(),
                }),
        }
    }
}

impl IntoHandle for i32 {
    fn into_handle(self) -> Result<Handle> {
        scalar(ElementKind::Integer, |rt, h| rt.set_integer_elt(h, 0, self))
    }
}

macro_rules! impl_integer {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl FromHandle for $ty {
                fn from_handle(h: Handle) -> Result<Self> {
                    let target = stringify!($ty);
                    let v = integral(h)?.ok_or_else(|| Error::OutOfRange {
                        target,
                        value: "NA".to_string(),
                    })?;
                    <$ty>::try_from(v).map_err(|_| Error::OutOfRange {
                        target,
                        value: v.to_string(),
                    })
                }
            }

            impl IntoHandle for $ty {
                fn into_handle(self) -> Result<Handle> {
                    let v = i32::try_from(self)
                        .ok()
                        .filter(|v| *v != NA_INTEGER)
                        .ok_or_else(|| Error::OutOfRange {
                            target: "integer",
                            value: self.to_string(),
                        })?;
                    v.into_handle()
                }
            }
        )+
    };
}

impl_integer!(i8, i16, i64, isize, u8, u16, u32, u64, usize);

// ============================================================================
// Reals
// ============================================================================

impl FromHandle for f64 {
    fn from_handle(h: Handle) -> Result<Self> {
        let (kind, len) = describe(h)?;
        if len != 1 {
            return Err(shape(EXPECTED_DOUBLE, kind, len));
        }
        match kind {
            Some(ElementKind::Real) => safe(|rt| rt.real_elt(h, 0)),
            Some(ElementKind::Integer) => {
                let v = safe(|rt| rt.integer_elt(h, 0))?;
                Ok(if v == NA_INTEGER { NA_REAL } else { v as f64 })
            }
            Some(ElementKind::Logical) => {
                let raw = safe(|rt| rt.logical_elt(h, 0))?;
                if raw == NA_LOGICAL {
                    Ok(NA_REAL)
                } else {
                    Err(shape(EXPECTED_DOUBLE, kind, len))
                }
            }
            _ => Err(shape(EXPECTED_DOUBLE, kind, len)),
        }
    }
}

impl IntoHandle for f64 {
    fn into_handle(self) -> Result<Handle> {
        scalar(ElementKind::Real, |rt, h| rt.set_real_elt(h, 0, self))
    }
}

impl FromHandle for f32 {
    fn from_handle(h: Handle) -> Result<Self> {
        f64::from_handle(h).map(|x| x as f32)
    }
}

impl IntoHandle for f32 {
    fn into_handle(self) -> Result<Handle> {
        (self as f64).into_handle()
    }
}

// ============================================================================
// Logicals
// ============================================================================

impl FromHandle for Logical {
    fn from_handle(h: Handle) -> Result<Self> {
        let (kind, len) = describe(h)?;
        if kind != Some(ElementKind::Logical) || len != 1 {
            return Err(shape(EXPECTED_LOGICAL, kind, len));
        }
        safe(|rt| Logical::from_raw(rt.logical_elt(h, 0)))
    }
}

impl IntoHandle for Logical {
    fn into_handle(self) -> Result<Handle> {
        scalar(ElementKind::Logical, |rt, h| {
            rt.set_logical_elt(h, 0, self.to_raw())
        })
    }
}

impl FromHandle for bool {
    fn from_handle(h: Handle) -> Result<Self> {
        Ok(Logical::from_handle(h)? == Logical::True)
    }
}

impl IntoHandle for bool {
    fn into_handle(self) -> Result<Handle> {
        Logical::from(self).into_handle()
    }
}

// ============================================================================
// Strings
// ============================================================================

impl FromHandle for Option<String> {
    fn from_handle(h: Handle) -> Result<Self> {
        let (kind, len) = describe(h)?;
        if kind != Some(ElementKind::String) || len != 1 {
            return Err(shape(EXPECTED_STRING, kind, len));
        }
        safe(|rt| rt.string_elt(h, 0))
    }
}

impl IntoHandle for Option<String> {
    fn into_handle(self) -> Result<Handle> {
        scalar(ElementKind::String, |rt, h| {
            rt.set_string_elt(h, 0, self.as_deref())
        })
    }
}

impl FromHandle for String {
    fn from_handle(h: Handle) -> Result<Self> {
        Ok(Option::<String>::from_handle(h)?.unwrap_or_else(|| "NA".to_string()))
    }
}

impl IntoHandle for String {
    fn into_handle(self) -> Result<Handle> {
        self.as_str().into_handle()
    }
}

impl IntoHandle for &str {
    fn into_handle(self) -> Result<Handle> {
        scalar(ElementKind::String, |rt, h| rt.set_string_elt(h, 0, Some(self)))
    }
}

impl FromHandle for char {
    fn from_handle(h: Handle) -> Result<Self> {
        let s = Option::<String>::from_handle(h)?;
        s.and_then(|s| s.chars().next())
            .ok_or_else(|| shape(EXPECTED_CHAR, Some(ElementKind::String), 1))
    }
}

impl IntoHandle for char {
    fn into_handle(self) -> Result<Handle> {
        let mut buf = [0u8; 4];
        (&*self.encode_utf8(&mut buf)).into_handle()
    }
}

// ============================================================================
// Complex
// ============================================================================

impl FromHandle for Complex {
    fn from_handle(h: Handle) -> Result<Self> {
        let (kind, len) = describe(h)?;
        if len != 1 {
            return Err(shape(EXPECTED_COMPLEX, kind, len));
        }
        match kind {
            Some(ElementKind::Complex) => safe(|rt| rt.complex_elt(h, 0)),
            Some(ElementKind::Real) | Some(ElementKind::Integer) => {
                let re = f64::from_handle(h)?;
                Ok(if is_na_real(re) {
                    Complex::NA
                } else {
                    Complex::new(re, 0.0)
                })
            }
            _ => Err(shape(EXPECTED_COMPLEX, kind, len)),
        }
    }
}

impl IntoHandle for Complex {
    fn into_handle(self) -> Result<Handle> {
        scalar(ElementKind::Complex, |rt, h| rt.set_complex_elt(h, 0, self))
    }
}

// ============================================================================
// Handles and wrappers
// ============================================================================

impl FromHandle for Handle {
    fn from_handle(h: Handle) -> Result<Self> {
        Ok(h)
    }
}

impl IntoHandle for Handle {
    fn into_handle(self) -> Result<Handle> {
        Ok(self)
    }
}

impl FromHandle for Sexp {
    fn from_handle(h: Handle) -> Result<Self> {
        Sexp::new(h)
    }
}

impl IntoHandle for Sexp {
    fn into_handle(self) -> Result<Handle> {
        Ok(Sexp::into_handle(self))
    }
}

impl<T: Element> FromHandle for Vector<T> {
    fn from_handle(h: Handle) -> Result<Self> {
        Vector::<T>::from_handle(h)
    }
}

impl<T: Element> IntoHandle for Vector<T> {
    fn into_handle(mut self) -> Result<Handle> {
        self.materialize()
    }
}

// ============================================================================
// Sequences
// ============================================================================

macro_rules! impl_element_vec {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl FromHandle for Vec<$ty> {
                fn from_handle(h: Handle) -> Result<Self> {
                    Vector::<$ty>::from_handle(h)?.to_vec()
                }
            }

            impl IntoHandle for Vec<$ty> {
                fn into_handle(self) -> Result<Handle> {
                    Vector::from(self).materialize()
                }
            }
        )+
    };
}

impl_element_vec!(i32, f64, Logical, Option<String>, Complex, Sexp);

impl FromHandle for Vec<bool> {
    fn from_handle(h: Handle) -> Result<Self> {
        let view = Vector::<Logical>::from_handle(h)?;
        view.iter().map(|v| v.map(|l| l == Logical::True)).collect()
    }
}

impl IntoHandle for Vec<bool> {
    fn into_handle(self) -> Result<Handle> {
        self.into_iter()
            .map(Logical::from)
            .collect::<Vector<Logical>>()
            .materialize()
    }
}

impl FromHandle for Vec<String> {
    fn from_handle(h: Handle) -> Result<Self> {
        let view = Vector::<Option<String>>::from_handle(h)?;
        view.iter()
            .map(|s| s.map(|s| s.unwrap_or_else(|| "NA".to_string())))
            .collect()
    }
}

impl IntoHandle for Vec<String> {
    fn into_handle(self) -> Result<Handle> {
        self.into_iter()
            .map(Some)
            .collect::<Vector<Option<String>>>()
            .materialize()
    }
}

// ============================================================================
// Named lists
// ============================================================================

fn named_entries(h: Handle) -> Result<Vec<(String, Sexp)>> {
    let list = List::from_handle(h)?;
    let names = list.names()?.unwrap_or_default();
    let values = list.to_vec()?;
    Ok(values
        .into_iter()
        .enumerate()
        .map(|(i, value)| {
            let name = names.get(i).cloned().flatten().unwrap_or_default();
            (name, value)
        })
        .collect())
}

fn named_list(entries: impl ExactSizeIterator<Item = (String, Sexp)>) -> Result<Handle> {
    let mut list = List::with_capacity(entries.len());
    for (name, value) in entries {
        list.push_named(&name, value)?;
    }
    list.materialize()
}

impl FromHandle for BTreeMap<String, Sexp> {
    fn from_handle(h: Handle) -> Result<Self> {
        Ok(named_entries(h)?.into_iter().collect())
    }
}

impl IntoHandle for BTreeMap<String, Sexp> {
    fn into_handle(self) -> Result<Handle> {
        named_list(self.into_iter())
    }
}

impl FromHandle for HashMap<String, Sexp> {
    fn from_handle(h: Handle) -> Result<Self> {
        Ok(named_entries(h)?.into_iter().collect())
    }
}

impl IntoHandle for HashMap<String, Sexp> {
    fn into_handle(self) -> Result<Handle> {
        named_list(self.into_iter())
    }
}

// ============================================================================
// Enumerations
// ============================================================================

/// Declare an integer-backed enum convertible to and from runtime handles.
///
/// The enum derives `Debug`, `Clone`, `Copy`, `PartialEq` and `Eq`. Reading
/// requires a length-1 integer vector whose value names a variant.
///
/// ```ignore
/// tether_sdk::handle_enum! {
///     pub enum Tail { Lower = 0, Upper = 1 }
/// }
/// ```
#[macro_export]
macro_rules! handle_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($variant:ident = $value:expr),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        #[repr(i32)]
        $vis enum $name {
            $($variant = $value),+
        }

        impl $crate::FromHandle for $name {
            fn from_handle(h: $crate::Handle) -> $crate::Result<Self> {
                let raw = $crate::convert::enum_value(h, stringify!($name))?;
                $(
                    if raw == $name::$variant as i32 {
                        return Ok($name::$variant);
                    }
                )+
                Err($crate::Error::OutOfRange {
                    target: stringify!($name),
                    value: raw.to_string(),
                })
            }
        }

        impl $crate::IntoHandle for $name {
            fn into_handle(self) -> $crate::Result<$crate::Handle> {
                $crate::IntoHandle::into_handle(self as i32)
            }
        }
    };
}
