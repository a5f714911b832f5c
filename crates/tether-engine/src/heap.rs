//! Garbage-collected object space
//!
//! Objects live in a slot table. A handle encodes the slot index in its low
//! 32 bits and the slot's generation in its high 32 bits; freeing a slot
//! bumps the generation, so any handle kept across a collection that
//! reclaimed its object is detected instead of aliasing a new object.
//!
//! Collections run on allocation: every `gc_threshold` allocations, or before
//! every allocation in torture mode.

use std::cell::RefCell;

use tether_sdk::{raise, Complex, ElementKind, Handle, Runtime};

use crate::collector::{self, GcStats};
use crate::config::HeapConfig;
use crate::object::{Object, Payload};
use crate::rng::{self, RngState};
use crate::roots::RootSet;

/// One entry of the slot table
#[derive(Debug)]
pub(crate) struct Slot {
    pub(crate) generation: u32,
    pub(crate) object: Option<Object>,
}

pub(crate) fn encode(index: usize, generation: u32) -> Handle {
    Handle::from_bits((u64::from(generation) << 32) | index as u64)
}

pub(crate) fn decode(h: Handle) -> (usize, u32) {
    let bits = h.to_bits();
    ((bits & 0xFFFF_FFFF) as usize, (bits >> 32) as u32)
}

/// Access counters, for checking how the SDK uses the heap
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeapStats {
    /// Objects allocated
    pub allocations: usize,
    /// Single-element reads
    pub element_reads: usize,
    /// Single-element writes
    pub element_writes: usize,
    /// Region read calls
    pub region_reads: usize,
    /// Elements delivered by region reads
    pub region_elements: usize,
    /// Compact sequences expanded into dense buffers
    pub compact_expansions: usize,
}

struct HeapState {
    slots: Vec<Slot>,
    free: Vec<u32>,
    roots: RootSet,
    allocs_since_gc: usize,
    gc: GcStats,
    stats: HeapStats,
    rng: RngState,
}

fn resolve(slots: &[Slot], h: Handle) -> &Object {
    let (index, generation) = decode(h);
    match slots.get(index) {
        Some(Slot {
            generation: g,
            object: Some(object),
        }) if *g == generation => object,
        _ => stale(h),
    }
}

fn resolve_mut(slots: &mut [Slot], h: Handle) -> &mut Object {
    let (index, generation) = decode(h);
    match slots.get_mut(index) {
        Some(Slot {
            generation: g,
            object: Some(object),
        }) if *g == generation => object,
        _ => stale(h),
    }
}

fn stale(h: Handle) -> ! {
    raise(format!("invalid handle {:?}: object is not live", h))
}

fn out_of_bounds(i: usize, len: usize) -> ! {
    raise(format!("subscript out of bounds: index {} of length {}", i, len))
}

fn wrong_kind(expected: &str, payload: &Payload) -> ! {
    let got = payload.kind().map_or("NULL", ElementKind::name);
    raise(format!("type mismatch: expected {} vector, got {}", expected, got))
}

fn element<T: Clone>(v: &[T], i: usize) -> T {
    match v.get(i) {
        Some(x) => x.clone(),
        None => out_of_bounds(i, v.len()),
    }
}

fn slot_mut<T>(v: &mut [T], i: usize) -> &mut T {
    let len = v.len();
    match v.get_mut(i) {
        Some(x) => x,
        None => out_of_bounds(i, len),
    }
}

fn copy_region<T: Copy>(src: &[T], start: usize, buf: &mut [T]) -> usize {
    if start > src.len() {
        out_of_bounds(start, src.len());
    }
    let n = buf.len().min(src.len() - start);
    buf[..n].copy_from_slice(&src[start..start + n]);
    n
}

fn region_len(len: usize, start: usize, want: usize) -> usize {
    if start > len {
        out_of_bounds(start, len);
    }
    want.min(len - start)
}

/// Single-threaded garbage-collected heap implementing [`Runtime`]
pub struct Heap {
    config: HeapConfig,
    nil: Handle,
    state: RefCell<HeapState>,
}

impl Heap {
    /// Create a heap holding only the nil object
    pub fn new(config: HeapConfig) -> Self {
        let nil = encode(0, 1);
        let state = HeapState {
            slots: vec![Slot {
                generation: 1,
                object: Some(Object::new(Payload::Nil)),
            }],
            free: Vec::new(),
            roots: RootSet::new(),
            allocs_since_gc: 0,
            gc: GcStats::default(),
            stats: HeapStats::default(),
            rng: RngState::new(config.seed),
        };
        tracing::debug!(
            gc_threshold = config.gc_threshold,
            gc_torture = config.gc_torture,
            seed = config.seed,
            "heap created"
        );
        Self {
            config,
            nil,
            state: RefCell::new(state),
        }
    }

    /// Heap configuration
    pub fn config(&self) -> &HeapConfig {
        &self.config
    }

    // ========================================================================
    // Compact sequences
    // ========================================================================

    /// Allocate the compact integer sequence `start, start + 1, ...` of
    /// length `len`.
    ///
    /// Like any primitive, raises a runtime error on failure; call it
    /// through [`tether_sdk::catch`].
    pub fn compact_integer_sequence(&self, start: i32, len: usize) -> Handle {
        let last = i64::from(start) + len as i64 - 1;
        if len > 0 && (last > i64::from(i32::MAX) || start == i32::MIN) {
            raise(format!(
                "integer sequence from {} of length {} overflows",
                start, len
            ));
        }
        self.allocate(Payload::IntSeq { start, len })
    }

    /// Allocate the compact real sequence `start, start + step, ...` of
    /// length `len`.
    pub fn compact_real_sequence(&self, start: f64, step: f64, len: usize) -> Handle {
        self.allocate(Payload::RealSeq { start, step, len })
    }

    // ========================================================================
    // Collection
    // ========================================================================

    /// Run a full collection now; returns the number of objects freed
    pub fn collect(&self) -> usize {
        let mut state = self.state.borrow_mut();
        let st = &mut *state;
        let roots: Vec<Handle> = std::iter::once(self.nil).chain(st.roots.iter()).collect();
        let freed = collector::collect(&mut st.slots, &mut st.free, roots.into_iter(), &mut st.gc);
        st.allocs_since_gc = 0;
        freed
    }

    /// Collector statistics
    pub fn gc_stats(&self) -> GcStats {
        self.state.borrow().gc.clone()
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    /// True if `h` refers to a live object
    pub fn is_live(&self, h: Handle) -> bool {
        let st = self.state.borrow();
        let (index, generation) = decode(h);
        matches!(
            st.slots.get(index),
            Some(Slot { generation: g, object: Some(_) }) if *g == generation
        )
    }

    /// Number of live objects, nil included
    pub fn live_objects(&self) -> usize {
        self.state
            .borrow()
            .slots
            .iter()
            .filter(|s| s.object.is_some())
            .count()
    }

    /// How many times `h` is currently preserved
    pub fn preserved_count(&self, h: Handle) -> usize {
        self.state.borrow().roots.preserved(h)
    }

    /// Number of distinct preserved handles
    pub fn precious_len(&self) -> usize {
        self.state.borrow().roots.precious_len()
    }

    /// True while the RNG state is loaded
    pub fn rng_acquired(&self) -> bool {
        self.state.borrow().rng.is_acquired()
    }

    /// Access counters
    pub fn stats(&self) -> HeapStats {
        self.state.borrow().stats
    }

    /// Zero the access counters
    pub fn reset_stats(&self) {
        self.state.borrow_mut().stats = HeapStats::default();
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn maybe_collect(&self) {
        let due = self.config.gc_torture
            || self.state.borrow().allocs_since_gc >= self.config.gc_threshold;
        if due {
            self.collect();
        }
    }

    fn allocate(&self, payload: Payload) -> Handle {
        self.maybe_collect();

        let mut state = self.state.borrow_mut();
        let st = &mut *state;
        st.stats.allocations += 1;
        st.allocs_since_gc += 1;

        let object = Object::new(payload);
        match st.free.pop() {
            Some(index) => {
                let slot = &mut st.slots[index as usize];
                slot.object = Some(object);
                encode(index as usize, slot.generation)
            }
            None => {
                st.slots.push(Slot {
                    generation: 1,
                    object: Some(object),
                });
                encode(st.slots.len() - 1, 1)
            }
        }
    }

    /// Inspect an object without counting an element access
    fn inspect<R>(&self, h: Handle, f: impl FnOnce(&Object) -> R) -> R {
        let st = self.state.borrow();
        f(resolve(&st.slots, h))
    }

    fn read<R>(&self, h: Handle, f: impl FnOnce(&Payload) -> R) -> R {
        let mut state = self.state.borrow_mut();
        let st = &mut *state;
        st.stats.element_reads += 1;
        f(&resolve(&st.slots, h).payload)
    }

    fn read_region(&self, h: Handle, f: impl FnOnce(&Payload) -> usize) -> usize {
        let mut state = self.state.borrow_mut();
        let st = &mut *state;
        let n = f(&resolve(&st.slots, h).payload);
        st.stats.region_reads += 1;
        st.stats.region_elements += n;
        n
    }

    /// Write access; expands a compact sequence first
    fn write<R>(&self, h: Handle, f: impl FnOnce(&mut Payload) -> R) -> R {
        let mut state = self.state.borrow_mut();
        let st = &mut *state;
        let object = resolve_mut(&mut st.slots, h);
        if object.payload.expand() {
            st.stats.compact_expansions += 1;
            tracing::trace!(handle = ?h, "expanded compact sequence");
        }
        st.stats.element_writes += 1;
        f(&mut object.payload)
    }

    fn check_live(&self, h: Handle) {
        if !self.is_live(h) {
            stale(h);
        }
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new(HeapConfig::default())
    }
}

impl std::fmt::Debug for Heap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Heap")
            .field("config", &self.config)
            .field("live_objects", &self.live_objects())
            .finish()
    }
}

impl Runtime for Heap {
    fn nil(&self) -> Handle {
        self.nil
    }

    fn kind_of(&self, h: Handle) -> Option<ElementKind> {
        self.inspect(h, |o| o.payload.kind())
    }

    fn length(&self, h: Handle) -> usize {
        self.inspect(h, |o| o.payload.len())
    }

    fn is_compact(&self, h: Handle) -> bool {
        self.inspect(h, |o| o.payload.is_compact())
    }

    fn alloc_vector(&self, kind: ElementKind, len: usize) -> Handle {
        if len > self.config.max_vector_len {
            raise(format!("cannot allocate vector of length {}", len));
        }
        self.allocate(Payload::blank(kind, len, self.nil))
    }

    fn integer_elt(&self, h: Handle, i: usize) -> i32 {
        self.read(h, |p| match p {
            Payload::Integer(v) => element(v, i),
            Payload::IntSeq { start, len } if i < *len => start + i as i32,
            Payload::IntSeq { len, .. } => out_of_bounds(i, *len),
            other => wrong_kind("integer", other),
        })
    }

    fn set_integer_elt(&self, h: Handle, i: usize, v: i32) {
        self.write(h, |p| match p {
            Payload::Integer(xs) => *slot_mut(xs, i) = v,
            other => wrong_kind("integer", other),
        })
    }

    fn real_elt(&self, h: Handle, i: usize) -> f64 {
        self.read(h, |p| match p {
            Payload::Real(v) => element(v, i),
            Payload::RealSeq { start, step, len } if i < *len => start + step * i as f64,
            Payload::RealSeq { len, .. } => out_of_bounds(i, *len),
            other => wrong_kind("double", other),
        })
    }

    fn set_real_elt(&self, h: Handle, i: usize, v: f64) {
        self.write(h, |p| match p {
            Payload::Real(xs) => *slot_mut(xs, i) = v,
            other => wrong_kind("double", other),
        })
    }

    fn logical_elt(&self, h: Handle, i: usize) -> i32 {
        self.read(h, |p| match p {
            Payload::Logical(v) => element(v, i),
            other => wrong_kind("logical", other),
        })
    }

    fn set_logical_elt(&self, h: Handle, i: usize, v: i32) {
        self.write(h, |p| match p {
            Payload::Logical(xs) => *slot_mut(xs, i) = v,
            other => wrong_kind("logical", other),
        })
    }

    fn complex_elt(&self, h: Handle, i: usize) -> Complex {
        self.read(h, |p| match p {
            Payload::Complex(v) => element(v, i),
            other => wrong_kind("complex", other),
        })
    }

    fn set_complex_elt(&self, h: Handle, i: usize, v: Complex) {
        self.write(h, |p| match p {
            Payload::Complex(xs) => *slot_mut(xs, i) = v,
            other => wrong_kind("complex", other),
        })
    }

    fn string_elt(&self, h: Handle, i: usize) -> Option<String> {
        self.read(h, |p| match p {
            Payload::Str(v) => element(v, i),
            other => wrong_kind("character", other),
        })
    }

    fn set_string_elt(&self, h: Handle, i: usize, v: Option<&str>) {
        self.write(h, |p| match p {
            Payload::Str(xs) => *slot_mut(xs, i) = v.map(str::to_string),
            other => wrong_kind("character", other),
        })
    }

    fn list_elt(&self, h: Handle, i: usize) -> Handle {
        self.read(h, |p| match p {
            Payload::List(v) => element(v, i),
            other => wrong_kind("list", other),
        })
    }

    fn set_list_elt(&self, h: Handle, i: usize, v: Handle) {
        self.check_live(v);
        self.write(h, |p| match p {
            Payload::List(xs) => *slot_mut(xs, i) = v,
            other => wrong_kind("list", other),
        })
    }

    fn integer_region(&self, h: Handle, start: usize, buf: &mut [i32]) -> usize {
        self.read_region(h, |p| match p {
            Payload::Integer(v) => copy_region(v, start, buf),
            Payload::IntSeq { start: first, len } => {
                let n = region_len(*len, start, buf.len());
                for (k, slot) in buf[..n].iter_mut().enumerate() {
                    *slot = first + (start + k) as i32;
                }
                n
            }
            other => wrong_kind("integer", other),
        })
    }

    fn real_region(&self, h: Handle, start: usize, buf: &mut [f64]) -> usize {
        self.read_region(h, |p| match p {
            Payload::Real(v) => copy_region(v, start, buf),
            Payload::RealSeq {
                start: first,
                step,
                len,
            } => {
                let n = region_len(*len, start, buf.len());
                for (k, slot) in buf[..n].iter_mut().enumerate() {
                    *slot = first + step * (start + k) as f64;
                }
                n
            }
            other => wrong_kind("double", other),
        })
    }

    fn logical_region(&self, h: Handle, start: usize, buf: &mut [i32]) -> usize {
        self.read_region(h, |p| match p {
            Payload::Logical(v) => copy_region(v, start, buf),
            other => wrong_kind("logical", other),
        })
    }

    fn complex_region(&self, h: Handle, start: usize, buf: &mut [Complex]) -> usize {
        self.read_region(h, |p| match p {
            Payload::Complex(v) => copy_region(v, start, buf),
            other => wrong_kind("complex", other),
        })
    }

    fn get_attr(&self, h: Handle, name: &str) -> Handle {
        self.inspect(h, |o| o.attr(name)).unwrap_or(self.nil)
    }

    fn set_attr(&self, h: Handle, name: &str, value: Handle) {
        self.check_live(value);
        let value = (value != self.nil).then_some(value);
        let mut state = self.state.borrow_mut();
        resolve_mut(&mut state.slots, h).set_attr(name, value);
    }

    fn protect(&self, h: Handle) {
        self.state.borrow_mut().roots.push(h);
    }

    fn unprotect(&self, n: usize) {
        let popped = self.state.borrow_mut().roots.pop(n);
        if popped < n {
            tracing::error!(
                requested = n,
                popped,
                "unprotect: protection stack underflow"
            );
        }
    }

    fn protect_depth(&self) -> usize {
        self.state.borrow().roots.depth()
    }

    fn preserve(&self, h: Handle) {
        self.state.borrow_mut().roots.preserve(h);
    }

    fn release(&self, h: Handle) {
        if !self.state.borrow_mut().roots.release(h) {
            tracing::warn!(handle = ?h, "release of a handle that is not preserved");
        }
    }

    fn rng_acquire(&self) {
        self.state.borrow_mut().rng.acquire();
    }

    fn rng_release(&self) {
        if !self.state.borrow_mut().rng.release() {
            tracing::warn!("random number generator state released without acquire");
        }
    }

    fn unif_rand(&self) -> f64 {
        let mut state = self.state.borrow_mut();
        if !state.rng.is_acquired() {
            drop(state);
            raise("random number generator state is not loaded");
        }
        state.rng.uniform()
    }

    fn norm_rand(&self) -> f64 {
        let mut state = self.state.borrow_mut();
        if !state.rng.is_acquired() {
            drop(state);
            raise("random number generator state is not loaded");
        }
        state.rng.normal()
    }

    fn pnorm(&self, q: f64) -> f64 {
        rng::pnorm(q)
    }
}
