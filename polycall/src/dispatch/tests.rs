//! Tests for dispatch resolution.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::types::{TypeRef, TypeTable};
use crate::value::Value;

use super::candidate::CandidateDescriptor;
use super::classify::{Compatibility, Tier};
use super::index::CandidateIndex;
use super::resolver::{compare_specificity, dominates, Applicable, Dispatcher};
use super::result::{ResolutionOutcome, UnmatchedReason};

struct Types {
    object: TypeRef,
    double: TypeRef,
    int: TypeRef,
    element: TypeRef,
    beam: TypeRef,
    bar: TypeRef,
    panel: TypeRef,
}

fn types() -> Types {
    let table = TypeTable::new();
    let element = table.declare_interface("IElement2D", &[]).unwrap();
    let beam = table.declare_class("Beam", None, &[]).unwrap();
    Types {
        object: table.object(),
        double: table.declare_value("double", &[]).unwrap(),
        int: table.declare_value("int", &[]).unwrap(),
        bar: table.declare_class("Bar", Some(&beam), &[]).unwrap(),
        panel: table.declare_class("Panel", None, &[element.clone()]).unwrap(),
        element,
        beam,
    }
}

fn make_candidate(name: &str, subject: &TypeRef, params: &[&TypeRef]) -> CandidateDescriptor {
    CandidateDescriptor::builder(name, subject.clone())
        .params(params.iter().map(|t| (*t).clone()))
        .build(|s: &Value, _: &[Option<Value>]| Ok(s.clone()))
}

fn index_of(candidates: Vec<CandidateDescriptor>) -> CandidateIndex {
    let index = CandidateIndex::new();
    index.add_all(candidates.into_iter().map(Arc::new));
    index
}

fn applicable(positions: &[Compatibility], t: &Types) -> Applicable {
    Applicable {
        candidate: Arc::new(make_candidate("x", &t.object, &[])),
        positions: positions.to_vec(),
    }
}

#[test]
fn test_exact_match() {
    let t = types();
    let index = index_of(vec![
        make_candidate("add", &t.int, &[&t.int]),
        make_candidate("add", &t.double, &[&t.double]),
    ]);

    let result = Dispatcher::new(&index).resolve("add", Some(&t.int), &[Some(&t.int)]);
    assert_eq!(result.matched_signature().as_deref(), Some("add(int, int)"));
}

#[test]
fn test_no_match() {
    let t = types();
    let index = index_of(vec![make_candidate("add", &t.int, &[&t.int])]);

    let result = Dispatcher::new(&index).resolve("add", Some(&t.int), &[Some(&t.double)]);
    assert_eq!(result, ResolutionOutcome::Unmatched(UnmatchedReason::NoneApplicable));
}

#[test]
fn test_arity_mismatch() {
    let t = types();
    let index = index_of(vec![make_candidate("add", &t.int, &[&t.int])]);

    let result = Dispatcher::new(&index).resolve("add", Some(&t.int), &[]);
    assert_eq!(result, ResolutionOutcome::Unmatched(UnmatchedReason::NoCandidates));
}

#[test]
fn test_null_subject() {
    let t = types();
    let index = index_of(vec![make_candidate("add", &t.object, &[&t.object])]);

    let result = Dispatcher::new(&index).resolve("add", None, &[Some(&t.int)]);
    assert_eq!(result, ResolutionOutcome::Unmatched(UnmatchedReason::NullSubject));
}

#[test]
fn test_ambiguous_candidates() {
    let t = types();
    // Two methods with the same signature
    let index = index_of(vec![
        make_candidate("foo", &t.int, &[]),
        make_candidate("foo", &t.int, &[]),
    ]);

    match Dispatcher::new(&index).resolve("foo", Some(&t.int), &[]) {
        ResolutionOutcome::Ambiguous(candidates) => assert_eq!(candidates.len(), 2),
        other => panic!("Expected Ambiguous, got {:?}", other),
    }
}

#[test]
fn test_ancestor_beats_any() {
    let t = types();
    let index = index_of(vec![
        make_candidate("mass", &t.object, &[]),
        make_candidate("mass", &t.beam, &[]),
    ]);

    let result = Dispatcher::new(&index).resolve("mass", Some(&t.bar), &[]);
    assert_eq!(result.matched_signature().as_deref(), Some("mass(Beam)"));
}

#[test]
fn test_interface_beats_any() {
    let t = types();
    let index = index_of(vec![
        make_candidate("area", &t.object, &[]),
        make_candidate("area", &t.element, &[]),
    ]);

    let result = Dispatcher::new(&index).resolve("area", Some(&t.panel), &[]);
    assert_eq!(result.matched_signature().as_deref(), Some("area(IElement2D)"));
}

#[test]
fn test_crossed_specificity_is_ambiguous() {
    let t = types();
    let index = index_of(vec![
        make_candidate("join", &t.bar, &[&t.object]),
        make_candidate("join", &t.object, &[&t.bar]),
    ]);

    let result = Dispatcher::new(&index).resolve("join", Some(&t.bar), &[Some(&t.bar)]);
    match result {
        ResolutionOutcome::Ambiguous(candidates) => {
            let sigs: Vec<_> = candidates.iter().map(|c| c.signature()).collect();
            assert_eq!(sigs, vec!["join(Bar, object)", "join(object, Bar)"]);
        }
        other => panic!("Expected Ambiguous, got {:?}", other),
    }
}

#[test]
fn test_ambiguity_resolved_by_more_specific_third_candidate() {
    let t = types();
    let index = index_of(vec![
        make_candidate("join", &t.bar, &[&t.object]),
        make_candidate("join", &t.object, &[&t.bar]),
        make_candidate("join", &t.bar, &[&t.bar]),
    ]);

    let result = Dispatcher::new(&index).resolve("join", Some(&t.bar), &[Some(&t.bar)]);
    assert_eq!(result.matched_signature().as_deref(), Some("join(Bar, Bar)"));
}

#[test]
fn test_null_does_not_discriminate() {
    let t = types();
    let index = index_of(vec![
        make_candidate("attach", &t.bar, &[&t.object]),
        make_candidate("attach", &t.bar, &[&t.panel]),
    ]);

    let result = Dispatcher::new(&index).resolve("attach", Some(&t.bar), &[None]);
    assert!(result.is_ambiguous());

    let result = Dispatcher::new(&index).resolve("attach", Some(&t.bar), &[Some(&t.panel)]);
    assert_eq!(result.matched_signature().as_deref(), Some("attach(Bar, Panel)"));
}

#[test]
fn test_null_rejected_by_value_type() {
    let t = types();
    let index = index_of(vec![
        make_candidate("scale", &t.bar, &[&t.double]),
        make_candidate("scale", &t.bar, &[&t.object]),
    ]);

    let result = Dispatcher::new(&index).resolve("scale", Some(&t.bar), &[None]);
    assert_eq!(result.matched_signature().as_deref(), Some("scale(Bar, object)"));
}

#[test]
fn test_registration_order_does_not_matter() {
    let t = types();
    let a = vec![
        make_candidate("area", &t.object, &[&t.object]),
        make_candidate("area", &t.element, &[&t.double]),
    ];
    let b = vec![
        make_candidate("area", &t.element, &[&t.double]),
        make_candidate("area", &t.object, &[&t.object]),
    ];

    for candidates in [a, b] {
        let index = index_of(candidates);
        let result = Dispatcher::new(&index).resolve("area", Some(&t.panel), &[Some(&t.double)]);
        assert_eq!(result.matched_signature().as_deref(), Some("area(IElement2D, double)"));
    }
}

#[test]
fn test_applicability_positions() {
    let t = types();
    let index = CandidateIndex::new();
    let candidate = Arc::new(make_candidate("f", &t.beam, &[&t.element, &t.object, &t.object]));
    let dispatcher = Dispatcher::new(&index);

    let a = dispatcher
        .applicability(&candidate, &t.bar, &[Some(&t.panel), Some(&t.double), None])
        .unwrap();
    assert_eq!(
        a.positions,
        vec![
            Compatibility::Tier(Tier::Ancestor),
            Compatibility::Tier(Tier::Interface),
            Compatibility::Tier(Tier::Any),
            Compatibility::NullWildcard,
        ]
    );

    assert!(dispatcher
        .applicability(&candidate, &t.bar, &[Some(&t.bar), None, None])
        .is_none());
    assert!(dispatcher.applicability(&candidate, &t.bar, &[None]).is_none());
}

#[test]
fn test_compare_specificity() {
    use Compatibility::{NullWildcard as N, Tier as T};
    let t = types();

    let exact = applicable(&[T(Tier::Exact), T(Tier::Exact)], &t);
    let any = applicable(&[T(Tier::Exact), T(Tier::Any)], &t);
    let crossed = applicable(&[T(Tier::Any), T(Tier::Exact)], &t);
    let null_a = applicable(&[T(Tier::Exact), N], &t);
    let null_b = applicable(&[T(Tier::Exact), N], &t);

    assert_eq!(compare_specificity(&exact, &any), Some(Ordering::Less));
    assert_eq!(compare_specificity(&any, &exact), Some(Ordering::Greater));
    assert_eq!(compare_specificity(&any, &crossed), None);
    assert_eq!(compare_specificity(&null_a, &null_b), Some(Ordering::Equal));
    assert!(dominates(&exact, &any));
    assert!(!dominates(&exact, &exact));
    assert!(!dominates(&null_a, &null_b));
}
