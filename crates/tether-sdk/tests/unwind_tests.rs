//! Safe-call boundary tests against a live heap
//!
//! Runtime errors raised inside primitives must come back as
//! `Error::Runtime`, with every native destructor on the way out having run.

use std::rc::Rc;

use tether_engine::{Heap, HeapConfig};
use tether_sdk::{
    catch, rng, safe, session, Doubles, ElementKind, Error, Protect, RngScope, Runtime,
    SessionGuard, Sexp,
};

/// Helper to start a session on a fresh heap
fn heap_session(config: HeapConfig) -> (Rc<Heap>, SessionGuard) {
    let heap = Rc::new(Heap::new(config));
    let guard = session::enter(heap.clone()).unwrap();
    (heap, guard)
}

fn small_heap() -> HeapConfig {
    HeapConfig {
        max_vector_len: 100,
        ..HeapConfig::default()
    }
}

// ===== Runtime Errors =====

#[test]
fn test_allocation_failure_is_an_error() {
    let (_heap, _session) = heap_session(small_heap());

    let err = safe(|rt| rt.alloc_vector(ElementKind::Integer, 101)).unwrap_err();
    assert_eq!(
        err,
        Error::Runtime("cannot allocate vector of length 101".to_string())
    );
    // The session is still usable afterwards
    assert!(safe(|rt| rt.alloc_vector(ElementKind::Integer, 100)).is_ok());
}

#[test]
fn test_stale_handle_is_an_error() {
    let (heap, _session) = heap_session(HeapConfig::default());

    let h = safe(|rt| rt.alloc_vector(ElementKind::Real, 1)).unwrap();
    heap.collect();
    match safe(|rt| rt.real_elt(h, 0)) {
        Err(Error::Runtime(msg)) => assert!(msg.contains("not live"), "{}", msg),
        other => panic!("expected runtime error, got {:?}", other),
    }
}

#[test]
fn test_element_index_checked_by_runtime() {
    let (_heap, _session) = heap_session(HeapConfig::default());

    let result = safe(|rt| {
        let h = rt.alloc_vector(ElementKind::Integer, 2);
        rt.integer_elt(h, 2)
    });
    assert!(matches!(result, Err(Error::Runtime(msg)) if msg.contains("subscript out of bounds")));
}

#[test]
fn test_error_raise_is_caught() {
    let (_heap, _session) = heap_session(HeapConfig::default());

    let result: Result<(), Error> = catch(|| Error::Argument("bad n".to_string()).raise());
    assert_eq!(
        result,
        Err(Error::Runtime("Argument error: bad n".to_string()))
    );
}

// ===== Cleanup On Failure =====

fn build_then_fail(limit: usize) -> tether_sdk::Result<Sexp> {
    let mut partial = Doubles::new();
    for i in 0..10 {
        partial.push(i as f64)?;
    }
    let kept = Sexp::new(partial.materialize()?)?;
    let _scratch = safe(|rt| rt.alloc_vector(ElementKind::Real, limit + 1))?;
    Ok(kept)
}

#[test]
fn test_failure_releases_everything() {
    let (heap, _session) = heap_session(small_heap());

    assert!(build_then_fail(100).is_err());
    assert_eq!(heap.precious_len(), 0);
    assert_eq!(heap.protect_depth(), 0);
    heap.collect();
    assert_eq!(heap.live_objects(), 1);
}

#[test]
fn test_nested_failure_unwinds_inner_guard_only() {
    let (heap, _session) = heap_session(small_heap());

    let h = safe(|rt| rt.alloc_vector(ElementKind::Integer, 1)).unwrap();
    let mut outer = Protect::new().unwrap();
    outer.protect(h);

    let inner: tether_sdk::Result<()> = (|| {
        let mut guard = Protect::new()?;
        guard.protect(h);
        safe(|rt| rt.alloc_vector(ElementKind::Real, 1000))?;
        Ok(())
    })();
    assert!(inner.is_err());
    assert_eq!(heap.protect_depth(), 1);
    drop(outer);
    assert_eq!(heap.protect_depth(), 0);
}

// ===== Random Numbers =====

#[test]
fn test_rng_scope_acquires_and_releases() {
    let (heap, _session) = heap_session(HeapConfig::default());

    assert!(!heap.rng_acquired());
    {
        let _scope = RngScope::new().unwrap();
        assert!(heap.rng_acquired());
        let u = rng::unif_rand().unwrap();
        assert!((0.0..1.0).contains(&u));
        assert!(rng::norm_rand(0.0, 1.0).unwrap().is_finite());
    }
    assert!(!heap.rng_acquired());
}

#[test]
fn test_deviates_need_a_scope() {
    let (_heap, _session) = heap_session(HeapConfig::default());

    match rng::unif_rand() {
        Err(Error::Runtime(msg)) => assert!(msg.contains("not loaded"), "{}", msg),
        other => panic!("expected runtime error, got {:?}", other),
    }
}

#[test]
fn test_scope_released_on_error_path() {
    let (heap, _session) = heap_session(small_heap());

    let result: tether_sdk::Result<f64> = (|| {
        let _scope = RngScope::new()?;
        let u = rng::unif_rand()?;
        safe(|rt| rt.alloc_vector(ElementKind::Real, 1000))?;
        Ok(u)
    })();
    assert!(result.is_err());
    assert!(!heap.rng_acquired());
}

#[test]
fn test_same_seed_same_draws() {
    let draws = |seed: u64| {
        let (_heap, _session) = heap_session(HeapConfig::default().with_seed(seed));
        let _scope = RngScope::new().unwrap();
        (0..5)
            .map(|_| rng::norm_rand(10.0, 2.0).unwrap())
            .collect::<Vec<_>>()
    };
    assert_eq!(draws(7), draws(7));
    assert_ne!(draws(7), draws(8));
}

#[test]
fn test_pnorm() {
    let (_heap, _session) = heap_session(HeapConfig::default());

    assert!((rng::pnorm(0.0, 0.0, 1.0).unwrap() - 0.5).abs() < 1e-7);
    assert!((rng::pnorm(1.96, 0.0, 1.0).unwrap() - 0.975).abs() < 1e-4);
    assert!((rng::pnorm(12.0, 10.0, 2.0).unwrap() - 0.841_344_7).abs() < 1e-6);
}

#[test]
fn test_rng_scope_needs_a_session() {
    assert!(matches!(RngScope::new(), Err(Error::NoSession)));
}
