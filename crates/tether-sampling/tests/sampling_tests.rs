//! Sampling routine tests
//!
//! Scripted deviates pin down exact outputs; the runtime generator checks
//! seeding and the truncation bounds.

use std::rc::Rc;

use tether_engine::{Heap, HeapConfig};
use tether_sampling::{
    acceptance_probability, bootstrap_variable, grow, rejection_sampling, RejectionParams,
    RuntimeDeviates, ScriptedDeviates,
};
use tether_sdk::{session, Doubles, Error, FromHandle, SessionGuard};

/// Helper to start a session on a fresh heap
fn heap_session(config: HeapConfig) -> (Rc<Heap>, SessionGuard) {
    let heap = Rc::new(Heap::new(config));
    let guard = session::enter(heap.clone()).unwrap();
    (heap, guard)
}

fn read_samples(samples: &tether_sdk::List) -> Vec<Vec<f64>> {
    samples
        .iter()
        .map(|s| Vec::<f64>::from_handle(s.unwrap().handle()).unwrap())
        .collect()
}

// ===== Rejection Sampling =====

#[test]
fn test_rejection_keeps_accepted_draws_in_order() {
    let (_heap, _session) = heap_session(HeapConfig::torture());

    let mut deviates = ScriptedDeviates::normals([0.5, 3.0, -1.0, -2.5, 1.9, 0.0]);
    let mut samples = rejection_sampling(3, RejectionParams::default(), &mut deviates).unwrap();
    assert_eq!(samples.to_vec().unwrap(), vec![0.5, -1.0, 1.9]);
    assert_eq!(deviates.remaining(), (1, 0));

    let h = samples.materialize().unwrap();
    assert_eq!(Vec::<f64>::from_handle(h).unwrap(), vec![0.5, -1.0, 1.9]);
    // Reserved up front, so accepted draws never reallocate
    assert_eq!(samples.stats().reallocations, 0);
}

#[test]
fn test_rejection_shifts_and_scales() {
    let (_heap, _session) = heap_session(HeapConfig::default());

    let params = RejectionParams {
        mu: 10.0,
        sigma: 2.0,
        lower: 9.0,
        upper: 12.0,
    };
    let mut deviates = ScriptedDeviates::normals([-1.0, 0.0, 1.5, 0.5]);
    let samples = rejection_sampling(2, params, &mut deviates).unwrap();
    assert_eq!(samples.to_vec().unwrap(), vec![10.0, 11.0]);
}

#[test]
fn test_rejection_with_runtime_generator() {
    let (heap, _session) = heap_session(HeapConfig::default());

    let params = RejectionParams::default();
    let samples = {
        let mut deviates = RuntimeDeviates::new().unwrap();
        rejection_sampling(500, params, &mut deviates).unwrap()
    };
    assert!(!heap.rng_acquired());
    assert_eq!(samples.len(), 500);
    assert!(samples.iter().all(|x| params.accepts(x.unwrap())));
}

#[test]
fn test_same_seed_same_samples() {
    let run = |seed: u64| {
        let (_heap, _session) = heap_session(HeapConfig::default().with_seed(seed));
        let mut deviates = RuntimeDeviates::new().unwrap();
        rejection_sampling(20, RejectionParams::default(), &mut deviates)
            .unwrap()
            .to_vec()
            .unwrap()
    };
    assert_eq!(run(42), run(42));
    assert_ne!(run(42), run(43));
}

#[test]
fn test_zero_acceptance_is_an_error() {
    let (_heap, _session) = heap_session(HeapConfig::default());

    let params = RejectionParams {
        lower: 50.0,
        upper: 60.0,
        ..RejectionParams::default()
    };
    assert_eq!(acceptance_probability(&params).unwrap(), 0.0);
    let mut deviates = ScriptedDeviates::default();
    assert!(matches!(
        rejection_sampling(1, params, &mut deviates),
        Err(Error::Argument(msg)) if msg.contains("zero probability")
    ));
}

#[test]
fn test_acceptance_probability() {
    let (_heap, _session) = heap_session(HeapConfig::default());

    let p = acceptance_probability(&RejectionParams::default()).unwrap();
    assert!((p - 0.954_499_7).abs() < 1e-6, "{}", p);
}

#[test]
fn test_rejection_needs_a_session() {
    let mut deviates = ScriptedDeviates::normals([0.0]);
    assert_eq!(
        rejection_sampling(1, RejectionParams::default(), &mut deviates).unwrap_err(),
        Error::NoSession
    );
}

// ===== Bootstrap =====

#[test]
fn test_bootstrap_replays_scripted_uniforms() {
    let (_heap, _session) = heap_session(HeapConfig::torture());

    let data = Doubles::from(vec![10.0, 20.0, 30.0, 40.0]);
    let mut deviates = ScriptedDeviates::uniforms([0.0, 0.6, 0.99, 0.0, 0.25, 0.99]);
    let samples = bootstrap_variable(&data, 1, 3, 2, &mut deviates).unwrap();

    assert_eq!(
        read_samples(&samples),
        vec![vec![30.0], vec![10.0, 20.0, 40.0]]
    );
    assert_eq!(deviates.remaining(), (0, 0));
}

#[test]
fn test_bootstrap_from_runtime_vector() {
    let (_heap, _session) = heap_session(HeapConfig::torture());

    let mut input: Doubles = (1..=5).map(f64::from).collect();
    let h = input.materialize().unwrap();
    let view = Doubles::from_handle(h).unwrap();
    let mut samples = {
        let mut deviates = RuntimeDeviates::new().unwrap();
        bootstrap_variable(&view, 5, 10, 4, &mut deviates).unwrap()
    };

    let list_h = samples.materialize().unwrap();
    let read_back = Vec::<tether_sdk::Sexp>::from_handle(list_h).unwrap();
    assert_eq!(read_back.len(), 4);
    for sample in read_back {
        let values = Vec::<f64>::from_handle(sample.handle()).unwrap();
        assert!((5..=10).contains(&values.len()));
        assert!(values.iter().all(|v| (1.0..=5.0).contains(v)));
    }
}

#[test]
fn test_bootstrap_argument_errors() {
    let (_heap, _session) = heap_session(HeapConfig::default());

    let data = Doubles::from(vec![1.0]);
    let mut deviates = ScriptedDeviates::default();
    assert!(matches!(
        bootstrap_variable(&data, 4, 2, 1, &mut deviates),
        Err(Error::Argument(_))
    ));
    let empty = Doubles::new();
    assert!(matches!(
        bootstrap_variable(&empty, 1, 2, 1, &mut deviates),
        Err(Error::Argument(_))
    ));
}

#[test]
fn test_bootstrap_zero_resamples() {
    let (_heap, _session) = heap_session(HeapConfig::default());

    let data = Doubles::from(vec![1.0, 2.0]);
    let mut deviates = ScriptedDeviates::default();
    let samples = bootstrap_variable(&data, 1, 2, 0, &mut deviates).unwrap();
    assert!(samples.is_empty());
}

// ===== Growth =====

#[test]
fn test_grow_round_trip_under_torture() {
    let (heap, _session) = heap_session(HeapConfig::torture());

    let mut x = grow(1000).unwrap();
    let h = x.materialize().unwrap();
    let values = Vec::<f64>::from_handle(h).unwrap();
    assert_eq!(values.len(), 1000);
    assert_eq!(values[999], 999.0);
    assert_eq!(x.stats().reallocations, 11);
    assert_eq!(heap.stats().allocations, 1);
}
