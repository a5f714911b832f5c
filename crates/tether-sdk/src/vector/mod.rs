//! Typed vectors over runtime sequences
//!
//! A [`Vector<T>`] has two representations behind one API:
//!
//! - **View** wraps an existing runtime vector. Reads go to the runtime
//!   (in buffered region reads where the kind supports them, so a compact
//!   representation is never expanded). Views are read-only.
//! - **Owned** keeps elements in a native buffer with explicit capacity and
//!   geometric growth. A runtime copy is synthesized by [`Vector::materialize`]
//!   and cached until the next mutation.
//!
//! ```text
//! writable:  Empty --push--> Growing --materialize--> Materialized
//!                              ^  |                        |
//!                              +--+ push                   | push (drops cache)
//!                              +---------------------------+
//! ```

mod element;
mod iter;

pub use element::Element;
pub use iter::Iter;

use crate::config::{GrowthPolicy, OutOfBounds, VectorConfig};
use crate::error::{Error, Result};
use crate::handle::Handle;
use crate::kind::{Complex, ElementKind, Logical};
use crate::protect::Protect;
use crate::sexp::Sexp;
use crate::unwind::safe;

/// Integer vector
pub type Integers = Vector<i32>;
/// Real vector
pub type Doubles = Vector<f64>;
/// Logical vector
pub type Logicals = Vector<Logical>;
/// String vector
pub type Strings = Vector<Option<String>>;
/// Complex vector
pub type Complexes = Vector<Complex>;
/// Generic list
pub type List = Vector<Sexp>;

/// Buffer bookkeeping for writable vectors
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GrowthStats {
    /// Buffer growths triggered by `push`
    pub reallocations: usize,
    /// Explicit `reserve` calls that enlarged the buffer
    pub reserves: usize,
    /// Elements moved by growths and reserves
    pub elements_copied: usize,
    /// Runtime copies synthesized by `materialize`
    pub materializations: usize,
}

enum Backing<T> {
    View {
        data: Sexp,
        len: usize,
        compact: bool,
    },
    Owned {
        buf: Vec<T>,
        capacity: usize,
        names: Option<Vec<Option<String>>>,
        cache: Option<Sexp>,
    },
}

/// Sequence of runtime elements of one kind
pub struct Vector<T> {
    backing: Backing<T>,
    config: VectorConfig,
    stats: GrowthStats,
}

impl<T: Element> Vector<T> {
    // ========================================================================
    // Construction
    // ========================================================================

    /// Empty writable vector
    pub fn new() -> Self {
        Self::owned(Vec::new(), 0)
    }

    /// Empty writable vector with room for `capacity` elements
    pub fn with_capacity(capacity: usize) -> Self {
        let mut v = Self::owned(Vec::with_capacity(capacity), capacity);
        if capacity > 0 {
            v.stats.reserves = 1;
        }
        v
    }

    /// Writable vector of `len` blank elements
    pub fn with_len(len: usize) -> Result<Self> {
        let blank = safe(|rt| T::blank(rt))?;
        Ok(Self::owned(vec![blank; len], len))
    }

    /// Read-only view of an existing runtime vector of kind `T::KIND`
    pub fn from_handle(h: Handle) -> Result<Self> {
        let (kind, len, compact) = safe(|rt| (rt.kind_of(h), rt.length(h), rt.is_compact(h)))?;
        if kind != Some(T::KIND) {
            return Err(Error::mismatch(
                T::KIND.name(),
                kind.map_or("NULL", ElementKind::name),
            ));
        }
        Ok(Self {
            backing: Backing::View {
                data: Sexp::new(h)?,
                len,
                compact,
            },
            config: VectorConfig::default(),
            stats: GrowthStats::default(),
        })
    }

    /// Writable copy of an existing runtime vector
    pub fn writable_from(h: Handle) -> Result<Self> {
        Self::from_handle(h)?.to_writable()
    }

    /// Writable copy of this vector (names included)
    pub fn to_writable(&self) -> Result<Self> {
        let buf = self.to_vec()?;
        let names = self.names()?;
        let capacity = buf.len();
        let mut copy = Self::owned(buf, capacity);
        if let Backing::Owned { names: slot, .. } = &mut copy.backing {
            *slot = names;
        }
        copy.config = self.config;
        Ok(copy)
    }

    /// Replace the configuration
    pub fn with_config(mut self, config: VectorConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the growth policy
    pub fn with_growth(mut self, growth: GrowthPolicy) -> Self {
        self.config.growth = growth;
        self
    }

    /// Replace the out-of-bounds read policy
    pub fn with_oob_policy(mut self, policy: OutOfBounds) -> Self {
        self.config.oob = Some(policy);
        self
    }

    fn owned(buf: Vec<T>, capacity: usize) -> Self {
        Self {
            backing: Backing::Owned {
                buf,
                capacity,
                names: None,
                cache: None,
            },
            config: VectorConfig::default(),
            stats: GrowthStats::default(),
        }
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    /// Element kind
    pub const fn kind(&self) -> ElementKind {
        T::KIND
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        match &self.backing {
            Backing::View { len, .. } => *len,
            Backing::Owned { buf, .. } => buf.len(),
        }
    }

    /// Check if the vector has no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Allocated buffer slots; `None` for views
    pub fn capacity(&self) -> Option<usize> {
        match &self.backing {
            Backing::View { .. } => None,
            Backing::Owned { capacity, .. } => Some(*capacity),
        }
    }

    /// True for the owned/growable representation
    pub fn is_writable(&self) -> bool {
        matches!(self.backing, Backing::Owned { .. })
    }

    /// True for a view over a compact runtime representation
    pub fn is_compact(&self) -> bool {
        matches!(self.backing, Backing::View { compact: true, .. })
    }

    /// True if an owned vector has an up-to-date runtime copy
    pub fn is_materialized(&self) -> bool {
        match &self.backing {
            Backing::View { .. } => true,
            Backing::Owned { cache, .. } => cache.is_some(),
        }
    }

    /// Effective out-of-bounds read policy
    pub fn oob_policy(&self) -> OutOfBounds {
        self.config
            .oob
            .unwrap_or_else(|| OutOfBounds::default_for(T::KIND))
    }

    /// Buffer bookkeeping
    pub fn stats(&self) -> GrowthStats {
        self.stats
    }

    /// Native buffer of an owned vector
    pub fn as_slice(&self) -> Option<&[T]> {
        match &self.backing {
            Backing::View { .. } => None,
            Backing::Owned { buf, .. } => Some(buf),
        }
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Element `i`.
    ///
    /// Past the end, fails or returns the missing value according to
    /// [`oob_policy`](Self::oob_policy).
    pub fn get(&self, i: usize) -> Result<T> {
        let len = self.len();
        if i >= len {
            return match self.oob_policy() {
                OutOfBounds::Fail => Err(Error::OutOfBounds { index: i, len }),
                OutOfBounds::Missing => safe(|rt| T::missing(rt)),
            };
        }
        match &self.backing {
            Backing::View { data, .. } => {
                let h = data.handle();
                safe(|rt| T::read(rt, h, i))
            }
            Backing::Owned { buf, .. } => Ok(buf[i].clone()),
        }
    }

    /// Element whose name is `name`; the missing value if there is none
    pub fn get_by_name(&self, name: &str) -> Result<T> {
        let position = self.names()?.and_then(|names| {
            names
                .iter()
                .position(|n| n.as_deref() == Some(name))
        });
        match position {
            Some(i) => self.get(i),
            None => safe(|rt| T::missing(rt)),
        }
    }

    /// Element names, if the vector has any
    pub fn names(&self) -> Result<Option<Vec<Option<String>>>> {
        match &self.backing {
            Backing::Owned { names, .. } => Ok(names.clone()),
            Backing::View { data, .. } => {
                let h = data.handle();
                safe(|rt| {
                    let names = rt.get_attr(h, "names");
                    if rt.kind_of(names) != Some(ElementKind::String) {
                        return None;
                    }
                    Some(
                        (0..rt.length(names))
                            .map(|i| rt.string_elt(names, i))
                            .collect(),
                    )
                })
            }
        }
    }

    /// Iterate over elements
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self)
    }

    /// Collect all elements natively
    pub fn to_vec(&self) -> Result<Vec<T>> {
        match &self.backing {
            Backing::Owned { buf, .. } => Ok(buf.clone()),
            Backing::View { .. } => self.iter().collect(),
        }
    }

    // ========================================================================
    // Writes (owned only)
    // ========================================================================

    /// Append `value`, growing the buffer geometrically when full
    pub fn push(&mut self, value: T) -> Result<()> {
        self.push_entry(None, value)
    }

    /// Append `value` under `name`
    pub fn push_named(&mut self, name: &str, value: T) -> Result<()> {
        self.push_entry(Some(name), value)
    }

    fn push_entry(&mut self, name: Option<&str>, value: T) -> Result<()> {
        let Vector {
            backing,
            config,
            stats,
        } = self;
        let Backing::Owned {
            buf,
            capacity,
            names,
            cache,
        } = backing
        else {
            return Err(Error::ReadOnly);
        };

        if buf.len() == *capacity {
            let len = buf.len();
            let new_capacity = config.growth.next_capacity(*capacity);
            buf.reserve_exact(new_capacity - len);
            if let Some(names) = names.as_mut() {
                names.reserve_exact(new_capacity - len);
            }
            *capacity = new_capacity;
            stats.reallocations += 1;
            stats.elements_copied += len;
            tracing::trace!(len, new_capacity, "grew writable vector");
        }

        if name.is_some() && names.is_none() {
            let mut filled = Vec::with_capacity(*capacity);
            filled.resize(buf.len(), Some(String::new()));
            *names = Some(filled);
        }
        if let Some(names) = names.as_mut() {
            names.push(Some(name.unwrap_or_default().to_string()));
        }
        buf.push(value);
        *cache = None;
        Ok(())
    }

    /// Overwrite element `i`
    pub fn set(&mut self, i: usize, value: T) -> Result<()> {
        let Backing::Owned { buf, cache, .. } = &mut self.backing else {
            return Err(Error::ReadOnly);
        };
        let len = buf.len();
        let slot = buf
            .get_mut(i)
            .ok_or(Error::OutOfBounds { index: i, len })?;
        *slot = value;
        *cache = None;
        Ok(())
    }

    /// Make room for at least `capacity` elements without changing the length.
    ///
    /// Purely an optimization: skipping it changes nothing observable except
    /// the number of reallocations.
    pub fn reserve(&mut self, capacity: usize) -> Result<()> {
        let Vector { backing, stats, .. } = self;
        let Backing::Owned {
            buf,
            capacity: current,
            names,
            ..
        } = backing
        else {
            return Err(Error::ReadOnly);
        };
        if capacity <= *current {
            return Ok(());
        }
        let len = buf.len();
        buf.reserve_exact(capacity - len);
        if let Some(names) = names.as_mut() {
            names.reserve_exact(capacity - len);
        }
        *current = capacity;
        stats.reserves += 1;
        stats.elements_copied += len;
        Ok(())
    }

    // ========================================================================
    // Materialization
    // ========================================================================

    /// Handle to a runtime vector with this vector's contents.
    ///
    /// Views return their own handle. Owned vectors allocate one runtime
    /// vector of exactly `len()` elements on the first call after a mutation
    /// and return the cached handle on later calls.
    pub fn materialize(&mut self) -> Result<Handle> {
        let Vector { backing, stats, .. } = self;
        let (buf, names, cache) = match backing {
            Backing::View { data, .. } => return Ok(data.handle()),
            Backing::Owned {
                buf, names, cache, ..
            } => (buf, names, cache),
        };
        if let Some(cached) = cache {
            return Ok(cached.handle());
        }

        let len = buf.len();
        let h = safe(|rt| rt.alloc_vector(T::KIND, len))?;
        let mut guard = Protect::new()?;
        guard.protect(h);

        safe(|rt| {
            for (i, value) in buf.iter().enumerate() {
                T::write(rt, h, i, value);
            }
        })?;

        if let Some(names) = names {
            let names_h = safe(|rt| rt.alloc_vector(ElementKind::String, len))?;
            guard.protect(names_h);
            safe(|rt| {
                for (i, name) in names.iter().enumerate() {
                    rt.set_string_elt(names_h, i, name.as_deref());
                }
                rt.set_attr(h, "names", names_h);
            })?;
        }

        let preserved = Sexp::new(h)?;
        drop(guard);
        *cache = Some(preserved);
        stats.materializations += 1;
        tracing::debug!(kind = %T::KIND, len, "materialized writable vector");
        Ok(h)
    }

    pub(crate) fn view_handle(&self) -> Option<Handle> {
        match &self.backing {
            Backing::View { data, .. } => Some(data.handle()),
            Backing::Owned { .. } => None,
        }
    }
}

impl<T: Element> Default for Vector<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Element> From<Vec<T>> for Vector<T> {
    fn from(buf: Vec<T>) -> Self {
        let capacity = buf.len();
        Self::owned(buf, capacity)
    }
}

impl<T: Element> FromIterator<T> for Vector<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}

impl<T: Element> std::fmt::Debug for Vector<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vector")
            .field("kind", &T::KIND)
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("materialized", &self.is_materialized())
            .finish()
    }
}
