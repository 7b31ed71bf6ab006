//! Rule installation and dispatch over a syntax tree.

mod common;

use common::{AddRule, Counter, Expr, Exprs, Kind, NumRule, TestReactor, arithmetic};
use kiln_core::Diagnostic;
use kiln_reactor::{Lookup, RuleSet, Tree};
use std::rc::Rc;

/// `(1 + 2) + -3`, built children first.
fn sample() -> Exprs {
    let mut exprs = Exprs::default();
    let one = exprs.push(Expr::Num(1));
    let two = exprs.push(Expr::Num(2));
    let sum = exprs.push(Expr::Add(one, two));
    let three = exprs.push(Expr::Num(3));
    let neg = exprs.push(Expr::Neg(three));
    exprs.push(Expr::Add(sum, neg));
    exprs
}

#[test]
fn test_install_creates_one_reaction_per_matching_node() {
    let mut reactor = TestReactor::new();
    let binding = reactor.bind(Rc::new(sample()));
    let created = reactor.install(&binding, &arithmetic());
    assert_eq!(created, 6);
    assert_eq!(reactor.node_count(), 6);
    assert_eq!(reactor.node(binding.node(4)).label(), "Neg");
}

#[test]
fn test_rules_evaluate_in_data_order() {
    let mut reactor = TestReactor::new();
    let binding = reactor.bind(Rc::new(sample()));
    reactor.install(&binding, &arithmetic());

    let mut counter = Counter::default();
    let outcome = reactor.run(&mut counter).unwrap();
    assert!(outcome.is_success());
    assert!(outcome.errors.is_empty());
    assert_eq!(counter.runs, 6);
    assert_eq!(reactor.attribute(binding.node(5), "value"), Lookup::Value(&0));
}

#[test]
fn test_rule_sets_interleave() {
    // Numbers and additions installed separately, additions first.
    let mut reactor = TestReactor::new();
    let binding = reactor.bind(Rc::new(sample()));
    reactor.install(&binding, &RuleSet::new("sums").with(AddRule));
    reactor.install(&binding, &RuleSet::new("numbers").with(NumRule));

    let outcome = reactor.run(&mut Counter::default()).unwrap();
    // Negation has no rule, so the outer sum can never run.
    assert_eq!(outcome.unresolved.len(), 1);
    assert_eq!(
        outcome.unresolved[0].attributes,
        vec![binding.attr(4, "value")]
    );
    assert_eq!(reactor.attribute(binding.node(2), "value"), Lookup::Value(&3));
}

#[test]
fn test_reported_error_leaves_result_absent() {
    let mut exprs = Exprs::default();
    let zero = exprs.push(Expr::Num(0));
    exprs.push(Expr::Neg(zero));
    assert_eq!(exprs.kind(1), Kind::Neg);

    let mut reactor = TestReactor::new();
    let binding = reactor.bind(Rc::new(exprs));
    reactor.install(&binding, &arithmetic());

    let outcome = reactor.run(&mut Counter::default()).unwrap();
    assert!(outcome.is_success());
    assert_eq!(
        outcome.errors,
        vec![Diagnostic::type_error(binding.node(1), "cannot negate zero")]
    );
    assert_eq!(reactor.attribute(binding.node(1), "value"), Lookup::Absent);
}

#[test]
fn test_binding_maps_nodes_back_to_indices() {
    let mut reactor = TestReactor::new();
    let before = reactor.new_node("other");
    let binding = reactor.bind(Rc::new(sample()));
    assert_eq!(binding.index(binding.node(3)), Some(3));
    assert_eq!(binding.index(before), None);
    assert_eq!(binding.index(kiln_core::NodeId::new(100)), None);
}
