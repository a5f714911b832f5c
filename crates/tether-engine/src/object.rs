//! Heap objects
//!
//! An object is a payload (one of the vector kinds, nil, or a compact
//! sequence) plus a list of named attributes. Compact sequences store only
//! their parameters; they are expanded into a dense buffer the first time an
//! element is written.

use tether_sdk::{Complex, ElementKind, Handle};

/// Object payload
#[derive(Debug, Clone)]
pub(crate) enum Payload {
    Nil,
    Integer(Vec<i32>),
    Real(Vec<f64>),
    Logical(Vec<i32>),
    Str(Vec<Option<String>>),
    Complex(Vec<Complex>),
    List(Vec<Handle>),
    /// `start, start + 1, ..., start + len - 1`
    IntSeq {
        start: i32,
        len: usize,
    },
    /// `start, start + step, ...`
    RealSeq {
        start: f64,
        step: f64,
        len: usize,
    },
}

impl Payload {
    /// Freshly allocated vector of `len` blank elements
    pub(crate) fn blank(kind: ElementKind, len: usize, nil: Handle) -> Self {
        match kind {
            ElementKind::Integer => Payload::Integer(vec![0; len]),
            ElementKind::Real => Payload::Real(vec![0.0; len]),
            ElementKind::Logical => Payload::Logical(vec![0; len]),
            ElementKind::String => Payload::Str(vec![Some(String::new()); len]),
            ElementKind::Complex => Payload::Complex(vec![Complex::default(); len]),
            ElementKind::Generic => Payload::List(vec![nil; len]),
        }
    }

    pub(crate) fn kind(&self) -> Option<ElementKind> {
        match self {
            Payload::Nil => None,
            Payload::Integer(_) | Payload::IntSeq { .. } => Some(ElementKind::Integer),
            Payload::Real(_) | Payload::RealSeq { .. } => Some(ElementKind::Real),
            Payload::Logical(_) => Some(ElementKind::Logical),
            Payload::Str(_) => Some(ElementKind::String),
            Payload::Complex(_) => Some(ElementKind::Complex),
            Payload::List(_) => Some(ElementKind::Generic),
        }
    }

    pub(crate) fn len(&self) -> usize {
        match self {
            Payload::Nil => 0,
            Payload::Integer(v) | Payload::Logical(v) => v.len(),
            Payload::Real(v) => v.len(),
            Payload::Str(v) => v.len(),
            Payload::Complex(v) => v.len(),
            Payload::List(v) => v.len(),
            Payload::IntSeq { len, .. } | Payload::RealSeq { len, .. } => *len,
        }
    }

    pub(crate) fn is_compact(&self) -> bool {
        matches!(self, Payload::IntSeq { .. } | Payload::RealSeq { .. })
    }

    /// Replace a compact sequence with its dense equivalent.
    ///
    /// Returns true if anything was expanded.
    pub(crate) fn expand(&mut self) -> bool {
        let dense = match *self {
            Payload::IntSeq { start, len } => {
                Payload::Integer((0..len).map(|i| start + i as i32).collect())
            }
            Payload::RealSeq { start, step, len } => {
                Payload::Real((0..len).map(|i| start + step * i as f64).collect())
            }
            _ => return false,
        };
        *self = dense;
        true
    }
}

/// A heap object
#[derive(Debug)]
pub(crate) struct Object {
    pub(crate) payload: Payload,
    pub(crate) attrs: Vec<(String, Handle)>,
    pub(crate) marked: bool,
}

impl Object {
    pub(crate) fn new(payload: Payload) -> Self {
        Self {
            payload,
            attrs: Vec::new(),
            marked: false,
        }
    }

    /// Handles this object keeps reachable
    pub(crate) fn children(&self) -> impl Iterator<Item = Handle> + '_ {
        let elements: &[Handle] = match &self.payload {
            Payload::List(items) => items,
            _ => &[],
        };
        elements
            .iter()
            .copied()
            .chain(self.attrs.iter().map(|(_, h)| *h))
    }

    pub(crate) fn attr(&self, name: &str) -> Option<Handle> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, h)| *h)
    }

    /// Set or, with `None`, remove an attribute
    pub(crate) fn set_attr(&mut self, name: &str, value: Option<Handle>) {
        let position = self.attrs.iter().position(|(n, _)| n == name);
        match (position, value) {
            (Some(i), Some(h)) => self.attrs[i].1 = h,
            (Some(i), None) => {
                self.attrs.remove(i);
            }
            (None, Some(h)) => self.attrs.push((name.to_string(), h)),
            (None, None) => {}
        }
    }
}
