//! Preservation registry and session tests

use std::rc::Rc;

use tether_engine::{Heap, HeapConfig};
use tether_sdk::{registry, safe, session, ElementKind, Error, Handle, SessionGuard};

/// Helper to start a session on a fresh heap
fn heap_session(config: HeapConfig) -> (Rc<Heap>, SessionGuard) {
    let heap = Rc::new(Heap::new(config));
    let guard = session::enter(heap.clone()).unwrap();
    (heap, guard)
}

fn alloc_real(len: usize) -> Handle {
    safe(|rt| rt.alloc_vector(ElementKind::Real, len)).unwrap()
}

// ===== Registrations =====

#[test]
fn test_insert_release_restores_preservation() {
    let (heap, session) = heap_session(HeapConfig::default());
    let h = alloc_real(3);

    let key = registry::insert(h).unwrap();
    assert_eq!(heap.preserved_count(h), 1);
    assert_eq!(registry::active(session.id()), 1);
    assert_eq!(key.session(), session.id());

    assert!(registry::release(key));
    assert_eq!(heap.preserved_count(h), 0);
    assert_eq!(registry::active(session.id()), 0);
}

#[test]
fn test_registrations_of_one_handle_are_independent() {
    let (heap, session) = heap_session(HeapConfig::default());
    let h = alloc_real(1);

    let first = registry::insert(h).unwrap();
    let second = registry::insert(h).unwrap();
    assert_ne!(first, second);
    assert_eq!(heap.preserved_count(h), 2);
    assert_eq!(registry::registrations(session.id(), h), 2);

    assert!(registry::release(first));
    heap.collect();
    assert!(heap.is_live(h));
    assert_eq!(heap.preserved_count(h), 1);

    assert!(registry::release(second));
    heap.collect();
    assert!(!heap.is_live(h));
}

#[test]
fn test_double_release_is_a_no_op() {
    let (heap, _session) = heap_session(HeapConfig::default());
    let h = alloc_real(1);
    let other = alloc_real(1);

    let key = registry::insert(h).unwrap();
    let _keep = registry::insert(other).unwrap();
    assert!(registry::release(key));
    assert!(!registry::release(key));
    assert_eq!(heap.preserved_count(h), 0);
    assert_eq!(heap.preserved_count(other), 1);
}

#[test]
fn test_preserved_handle_survives_torture() {
    let (heap, _session) = heap_session(HeapConfig::torture());
    let h = alloc_real(4);
    let key = registry::insert(h).unwrap();

    for _ in 0..10 {
        alloc_real(16);
    }
    assert!(heap.is_live(h));
    assert!(registry::release(key));
}

#[test]
fn test_insert_without_session() {
    assert_eq!(
        registry::insert(Handle::from_bits(1)).unwrap_err(),
        Error::NoSession
    );
}

// ===== Sessions =====

#[test]
fn test_session_shutdown_drains_registry() {
    let heap = Rc::new(Heap::new(HeapConfig::default()));
    let guard = session::enter(heap.clone()).unwrap();
    let id = guard.id();

    let h = alloc_real(2);
    let keys: Vec<_> = (0..3).map(|_| registry::insert(h).unwrap()).collect();
    assert_eq!(registry::active(id), 3);
    assert_eq!(heap.precious_len(), 1);

    drop(guard);
    assert!(!session::is_active());
    assert_eq!(registry::active(id), 0);
    assert_eq!(heap.precious_len(), 0);
    for key in keys {
        assert!(!registry::release(key));
    }
}

#[test]
fn test_second_session_is_rejected() {
    let (_heap, _session) = heap_session(HeapConfig::default());
    let other = Rc::new(Heap::new(HeapConfig::default()));
    assert!(matches!(session::enter(other), Err(Error::SessionActive)));
    assert!(session::is_active());
}

#[test]
fn test_sessions_have_distinct_ids() {
    let first = {
        let (_heap, session) = heap_session(HeapConfig::default());
        session.id()
    };
    let (_heap, session) = heap_session(HeapConfig::default());
    assert_ne!(first, session.id());
}

#[test]
fn test_sessions_are_per_thread() {
    let (_heap, session) = heap_session(HeapConfig::default());
    let id = session.id();

    let other = std::thread::spawn(move || {
        assert!(!session::is_active());
        let heap = Rc::new(Heap::new(HeapConfig::default()));
        let guard = session::enter(heap.clone()).unwrap();
        let h = safe(|rt| rt.alloc_vector(ElementKind::Integer, 1)).unwrap();
        let _key = registry::insert(h).unwrap();
        assert_eq!(registry::active(guard.id()), 1);
        guard.id()
    })
    .join()
    .unwrap();

    assert_ne!(id, other);
    assert_eq!(registry::active(other), 0);
    assert_eq!(registry::active(id), 0);
}

#[test]
fn test_release_from_another_thread_is_left_for_shutdown() {
    let (heap, session) = heap_session(HeapConfig::default());
    let id = session.id();
    let h = alloc_real(1);
    let key = registry::insert(h).unwrap();

    let released = std::thread::spawn(move || {
        let other = Rc::new(Heap::new(HeapConfig::default()));
        let _guard = session::enter(other).unwrap();
        registry::release(key)
    })
    .join()
    .unwrap();
    assert!(!released);
    assert!(!std::thread::spawn(move || registry::release(key)).join().unwrap());

    assert_eq!(registry::active(id), 1);
    assert_eq!(heap.preserved_count(h), 1);

    drop(session);
    assert_eq!(registry::active(id), 0);
    assert_eq!(heap.preserved_count(h), 0);
    heap.collect();
    assert!(!heap.is_live(h));
}
