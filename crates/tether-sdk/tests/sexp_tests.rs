//! Owning handle wrapper tests

use std::rc::Rc;

use tether_engine::{Heap, HeapConfig};
use tether_sdk::{
    into_handle, registry, safe, session, ElementKind, Error, FromHandle, Handle,
    SessionGuard, Sexp,
};

/// Helper to start a session on a fresh heap
fn heap_session(config: HeapConfig) -> (Rc<Heap>, SessionGuard) {
    let heap = Rc::new(Heap::new(config));
    let guard = session::enter(heap.clone()).unwrap();
    (heap, guard)
}

fn alloc(kind: ElementKind, len: usize) -> Handle {
    safe(|rt| rt.alloc_vector(kind, len)).unwrap()
}

// ===== Ownership =====

#[test]
fn test_new_and_drop() {
    let (heap, session) = heap_session(HeapConfig::default());
    let h = alloc(ElementKind::Integer, 2);

    let x = Sexp::new(h).unwrap();
    assert!(x.is_preserved());
    assert_eq!(x.handle(), h);
    assert_eq!(heap.preserved_count(h), 1);

    drop(x);
    assert_eq!(heap.preserved_count(h), 0);
    assert_eq!(registry::active(session.id()), 0);
}

#[test]
fn test_clone_registers_again() {
    let (heap, _session) = heap_session(HeapConfig::default());
    let h = alloc(ElementKind::Real, 1);

    let a = Sexp::new(h).unwrap();
    let b = a.clone();
    assert_eq!(a, b);
    assert_eq!(heap.preserved_count(h), 2);

    drop(a);
    heap.collect();
    assert!(heap.is_live(h));
    assert_eq!(heap.preserved_count(h), 1);

    drop(b);
    heap.collect();
    assert!(!heap.is_live(h));
}

#[test]
fn test_take_leaves_source_empty() {
    let (heap, _session) = heap_session(HeapConfig::default());
    let h = alloc(ElementKind::String, 1);

    let mut a = Sexp::new(h).unwrap();
    let b = a.take();
    assert!(!a.is_preserved());
    assert!(b.is_preserved());
    assert_eq!(heap.preserved_count(h), 1);

    // Dropping the emptied source releases nothing
    drop(a);
    assert_eq!(heap.preserved_count(h), 1);
    drop(b);
    assert_eq!(heap.preserved_count(h), 0);
}

#[test]
fn test_move_transfers_registration() {
    let (heap, _session) = heap_session(HeapConfig::default());
    let h = alloc(ElementKind::Logical, 1);

    let a = Sexp::new(h).unwrap();
    let moved = vec![a];
    assert_eq!(heap.preserved_count(h), 1);
    drop(moved);
    assert_eq!(heap.preserved_count(h), 0);
}

#[test]
fn test_into_handle_releases() {
    let (heap, _session) = heap_session(HeapConfig::default());
    let h = alloc(ElementKind::Integer, 1);

    let x = Sexp::new(h).unwrap();
    assert_eq!(x.into_handle(), h);
    assert_eq!(heap.preserved_count(h), 0);
    assert!(heap.is_live(h));
}

#[test]
fn test_nil_is_not_registered() {
    let (heap, session) = heap_session(HeapConfig::default());

    let nil = Sexp::nil().unwrap();
    assert!(nil.is_nil().unwrap());
    assert!(!nil.is_preserved());
    let copy = nil.clone();
    assert!(!copy.is_preserved());
    assert_eq!(registry::active(session.id()), 0);
    assert_eq!(heap.precious_len(), 0);
}

// ===== Collection =====

#[test]
fn test_sexp_survives_torture() {
    let (heap, _session) = heap_session(HeapConfig::torture());
    let x = Sexp::new(into_handle(vec![1.5f64, 2.5]).unwrap()).unwrap();

    for _ in 0..20 {
        alloc(ElementKind::Complex, 4);
    }
    assert!(heap.is_live(x.handle()));
    assert_eq!(Vec::<f64>::from_handle(x.handle()).unwrap(), vec![1.5, 2.5]);
}

#[test]
fn test_release_churn() {
    let (heap, session) = heap_session(HeapConfig::default());
    let h = alloc(ElementKind::Real, 1);

    let mut held: Vec<Sexp> = (0..1000).map(|_| Sexp::new(h).unwrap()).collect();
    assert_eq!(heap.preserved_count(h), 1000);
    assert_eq!(registry::registrations(session.id(), h), 1000);

    // Release from the middle outwards
    while !held.is_empty() {
        held.swap_remove(held.len() / 2);
    }
    assert_eq!(heap.preserved_count(h), 0);
    assert_eq!(heap.precious_len(), 0);
}

// ===== Attributes =====

#[test]
fn test_attributes() {
    let (_heap, _session) = heap_session(HeapConfig::torture());
    let x = Sexp::new(alloc(ElementKind::Integer, 2)).unwrap();

    assert!(x.attr("class").unwrap().is_nil().unwrap());

    let class = Sexp::new(into_handle("counts").unwrap()).unwrap();
    x.set_attr("class", &class).unwrap();
    let got = x.attr("class").unwrap();
    assert_eq!(String::from_handle(got.handle()).unwrap(), "counts");

    x.set_attr("class", &Sexp::nil().unwrap()).unwrap();
    assert!(x.attr("class").unwrap().is_nil().unwrap());
}

// ===== Session End =====

#[test]
fn test_wrappers_outliving_their_session() {
    let heap = Rc::new(Heap::new(HeapConfig::default()));
    let guard = session::enter(heap.clone()).unwrap();
    let h = alloc(ElementKind::Real, 1);
    let x = Sexp::new(h).unwrap();

    drop(guard);
    assert_eq!(heap.precious_len(), 0);

    // Clone and drop after shutdown touch nothing
    let y = x.clone();
    assert!(!y.is_preserved());
    drop(y);
    drop(x);
    assert_eq!(heap.precious_len(), 0);
    assert_eq!(Sexp::new(h).unwrap_err(), Error::NoSession);
}
