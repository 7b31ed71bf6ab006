//! Resolver behaviour driven directly, without syntax trees.

mod common;

use common::{chain, count_ambiguous, resolver_with};
use kiln_core::{Attribute, Diagnostic, Error};
use kiln_java::classfile::MemberInfo;
use kiln_java::{
    Cached, ClassFile, ClassInfo, ClassKind, ClassLookup, JavaReactor, JavaType, LexicalScope,
    Member, MemberLookup, MemoryClassPath, Origin, Resolver, Value, derive_candidates,
};
use kiln_reactor::{Lookup, Reaction};
use kiln_utils::{Analysis, ConflictPolicy};

fn attached(resolver: &mut Resolver) -> JavaReactor {
    let mut reactor = JavaReactor::new();
    resolver.attach(&mut reactor);
    reactor
}

#[test]
fn test_candidates_go_from_packages_to_nesting() {
    assert_eq!(
        derive_candidates(&chain(&["a", "B", "C"])),
        ["a.B.C", "a.B$C", "a$B$C"]
    );
    assert_eq!(
        derive_candidates(&chain(&["java", "util", "Map", "Entry"])),
        [
            "java.util.Map.Entry",
            "java.util.Map$Entry",
            "java.util$Map$Entry",
            "java$util$Map$Entry",
        ]
    );
}

#[test]
fn test_load_from_classpath() {
    let mut resolver = resolver_with(&["p.A"]);
    let mut reactor = attached(&mut resolver);

    assert_eq!(resolver.klass(&mut reactor, "p.A"), ClassLookup::Pending);
    let outcome = reactor.run(&mut resolver).unwrap();
    assert!(outcome.is_success());
    assert!(outcome.errors.is_empty());

    let ClassLookup::Found(id) = resolver.klass(&mut reactor, "p.A") else {
        panic!("p.A should be loaded");
    };
    let class = resolver.class(id);
    assert_eq!(class.canonical_name(), "p.A");
    assert_eq!(class.origin(), Origin::Bytecode);
    assert_eq!(class.super_type(), Some("java.lang.Object"));

    let classes = resolver.classes_node(&mut reactor);
    assert_eq!(reactor.attribute(classes, "p.A"), Lookup::Value(&Value::Class(id)));
}

#[test]
fn test_misses_are_cached() {
    let mut resolver = resolver_with(&[]);
    let mut reactor = attached(&mut resolver);

    assert_eq!(resolver.klass(&mut reactor, "p.Missing"), ClassLookup::Pending);
    assert_eq!(resolver.klass(&mut reactor, "p.Missing"), ClassLookup::Pending);
    reactor.run(&mut resolver).unwrap();
    assert_eq!(resolver.klass(&mut reactor, "p.Missing"), ClassLookup::NotFound);

    assert_eq!(resolver.load_attempts(), 1);
    assert_eq!(resolver.cached("p.Missing"), Some(Cached::Miss));
    let classes = resolver.classes_node(&mut reactor);
    assert_eq!(reactor.attribute(classes, "p.Missing"), Lookup::None);
}

#[test]
fn test_mismatched_class_file_is_not_found() {
    let mut classpath = kiln_java::MemoryClassPath::new();
    classpath.insert("p.A", common::class_bytes("p.B"));
    classpath.insert("p.C", vec![0xCA, 0xFE]);
    let mut resolver = Resolver::new(classpath);
    let mut reactor = attached(&mut resolver);

    resolver.klass(&mut reactor, "p.A");
    resolver.klass(&mut reactor, "p.C");
    reactor.run(&mut resolver).unwrap();
    assert_eq!(resolver.cached("p.A"), Some(Cached::Miss));
    assert_eq!(resolver.cached("p.C"), Some(Cached::Miss));
}

#[test]
fn test_reflective_fallback_respects_prefixes() {
    let mut resolver = resolver_with(&[]);
    let mut reactor = attached(&mut resolver);
    let id = resolver.eagerly(&mut reactor, "java.lang.Integer").unwrap();
    assert_eq!(resolver.class(id).origin(), Origin::Reflection);

    let mut resolver = resolver_with(&[]).with_prefixes(Vec::new());
    let mut reactor = attached(&mut resolver);
    assert!(resolver.eagerly(&mut reactor, "java.lang.Integer").is_err());
}

#[test]
fn test_eager_load_failure_is_fatal() {
    let mut resolver = resolver_with(&[]);
    let mut reactor = attached(&mut resolver);
    match resolver.eagerly(&mut reactor, "p.Nowhere") {
        Err(Error::ClassLoad(name)) => assert_eq!(name, "p.Nowhere"),
        other => panic!("expected a class load error, got {other:?}"),
    }
}

#[test]
fn test_ambiguous_chain_prefers_nested_class() {
    let mut resolver = resolver_with(&["p.Outer.Inner", "p.Outer$Inner"]);
    let mut reactor = attached(&mut resolver);
    let inner = chain(&["p", "Outer", "Inner"]);

    assert_eq!(resolver.full_chain(&mut reactor, &inner), ClassLookup::Pending);
    let outcome = reactor.run(&mut resolver).unwrap();
    assert_eq!(count_ambiguous(&outcome.errors), 1);

    let ClassLookup::Found(id) = resolver.full_chain(&mut reactor, &inner) else {
        panic!("chain should resolve");
    };
    assert_eq!(resolver.class(id).canonical_name(), "p.Outer$Inner");
    let package_class = resolver.class_named("p.Outer.Inner").unwrap();
    assert!(resolver.class(id).ambiguous_chain());
    assert!(resolver.class(package_class).ambiguous_chain());
}

#[test]
fn test_unknown_chain_is_cached_as_miss() {
    let mut resolver = resolver_with(&[]);
    let mut reactor = attached(&mut resolver);
    let nowhere = chain(&["x", "Y"]);

    resolver.full_chain(&mut reactor, &nowhere);
    reactor.run(&mut resolver).unwrap();
    assert_eq!(resolver.full_chain(&mut reactor, &nowhere), ClassLookup::NotFound);
    assert_eq!(resolver.cached_chain(&nowhere), Some(Cached::Miss));
    let chains = resolver.chains_node(&mut reactor);
    assert_eq!(reactor.attribute(chains, "x.Y"), Lookup::None);
}

#[test]
fn test_source_class_supersedes_chain() {
    let mut resolver = resolver_with(&["p.Outer.Inner"]);
    let mut reactor = attached(&mut resolver);
    let inner_chain = chain(&["p", "Outer", "Inner"]);

    let user = reactor.new_node("user");
    let seen = Attribute::new(user, "seen");
    let user_reaction = reactor.register(
        Reaction::new(user, "user").provides([seen.clone()]).trigger({
            let seen = seen.clone();
            move |cx: &mut kiln_reactor::Cx<'_, Value, Resolver>| match cx.context.full_chain(cx.reactor, &inner_chain) {
                ClassLookup::Found(id) => cx.set(seen.clone(), Value::Class(id)),
                ClassLookup::NotFound => cx.set_none(seen.clone()),
                ClassLookup::Pending => Ok(()),
            }
        }),
    );

    let outcome = reactor.run(&mut resolver).unwrap();
    assert!(outcome.errors.is_empty());
    let bytecode = resolver.class_named("p.Outer.Inner").unwrap();
    assert_eq!(reactor.raw(&seen), Some(&Value::Class(bytecode)));
    assert_eq!(reactor.reaction(user_reaction).runs(), 2);

    let outer = resolver.declare_source_class(
        &mut reactor,
        ClassInfo::new("p.Outer", ClassKind::Class),
        None,
    );
    let source = resolver.declare_source_class(
        &mut reactor,
        ClassInfo::new("p.Outer$Inner", ClassKind::Class),
        Some(outer),
    );
    assert_eq!(count_ambiguous(reactor.errors()), 1);

    let outcome = reactor.run(&mut resolver).unwrap();
    assert!(outcome.is_success());
    assert_eq!(count_ambiguous(&outcome.errors), 1);
    assert_eq!(reactor.raw(&seen), Some(&Value::Class(source)));
    assert_eq!(reactor.reaction(user_reaction).runs(), 3);
    assert!(resolver.class(source).ambiguous_chain());
    assert!(resolver.class(bytecode).ambiguous_chain());
    assert_eq!(resolver.class(outer).nested_class("Inner"), Some(source));
}

#[test]
fn test_conflict_policies() {
    for (policy, source_wins) in [
        (ConflictPolicy::PreferFirst, false),
        (ConflictPolicy::PreferSource, true),
    ] {
        let mut resolver = resolver_with(&[]);
        let mut reactor = attached(&mut resolver);
        reactor.set_attachment(Analysis {
            conflict_policy: policy,
            ..Analysis::default()
        });

        let reflective = resolver.eagerly(&mut reactor, "java.lang.Integer").unwrap();
        let source = resolver.declare_source_class(
            &mut reactor,
            ClassInfo::new("java.lang.Integer", ClassKind::Class),
            None,
        );
        let expected = if source_wins { source } else { reflective };
        assert_eq!(resolver.class_named("java.lang.Integer"), Some(expected));

        // Already published attributes keep the first definition.
        let classes = resolver.classes_node(&mut reactor);
        assert_eq!(
            reactor.raw(&Attribute::new(classes, "java.lang.Integer")),
            Some(&Value::Class(reflective))
        );
        assert!(reactor.errors().is_empty());
    }
}

#[test]
fn test_source_class_replaces_miss() {
    let mut resolver = resolver_with(&[]);
    let mut reactor = attached(&mut resolver);

    resolver.klass(&mut reactor, "p.Late");
    reactor.run(&mut resolver).unwrap();
    assert_eq!(resolver.cached("p.Late"), Some(Cached::Miss));

    let id = resolver.declare_source_class(
        &mut reactor,
        ClassInfo::new("p.Late", ClassKind::Interface),
        None,
    );
    assert_eq!(resolver.klass(&mut reactor, "p.Late"), ClassLookup::Found(id));
    let classes = resolver.classes_node(&mut reactor);
    assert_eq!(reactor.raw(&Attribute::new(classes, "p.Late")), Some(&Value::Class(id)));
}

#[test]
fn test_klass_chain_through_source_scopes() {
    let mut resolver = resolver_with(&[]);
    let mut reactor = attached(&mut resolver);
    let outer = resolver.declare_source_class(
        &mut reactor,
        ClassInfo::new("p.Outer", ClassKind::Class),
        None,
    );
    let inner = resolver.declare_source_class(
        &mut reactor,
        ClassInfo::new("p.Outer$Inner", ClassKind::Class),
        Some(outer),
    );

    assert_eq!(
        resolver.klass_chain(&mut reactor, outer, &chain(&["Inner"])),
        ClassLookup::Found(inner)
    );
    assert_eq!(
        resolver.klass_chain(&mut reactor, inner, &chain(&["Outer", "Inner"])),
        ClassLookup::Found(inner)
    );
    assert_eq!(
        resolver.klass_chain(&mut reactor, inner, &chain(&["Inner", "Missing"])),
        ClassLookup::NotFound
    );

    let elsewhere = chain(&["Elsewhere"]);
    assert_eq!(
        resolver.klass_chain(&mut reactor, inner, &elsewhere),
        ClassLookup::Pending
    );
    reactor.run(&mut resolver).unwrap();
    assert_eq!(
        resolver.klass_chain(&mut reactor, inner, &elsewhere),
        ClassLookup::NotFound
    );
}

#[test]
fn test_klass_chain_loads_member_classes() {
    let mut resolver = resolver_with(&["p.A", "p.A$B"]);
    let mut reactor = attached(&mut resolver);
    let a = resolver.eagerly(&mut reactor, "p.A").unwrap();

    let members = chain(&["A", "B"]);
    assert_eq!(
        resolver.klass_chain(&mut reactor, a, &members),
        ClassLookup::Pending
    );
    reactor.run(&mut resolver).unwrap();

    let b = resolver.class_named("p.A$B").unwrap();
    assert_eq!(resolver.klass_chain(&mut reactor, a, &members), ClassLookup::Found(b));
    assert_eq!(resolver.class(a).nested_class("B"), Some(b));
    assert_eq!(resolver.class(b).outer(), Some(a));
    assert_eq!(
        reactor.attribute(resolver.class(a).classes().node(), "B"),
        Lookup::Value(&Value::Class(b))
    );
}

#[test]
fn test_resolve_members_waits_for_the_class() {
    let mut shape = ClassFile::new("p/Shape");
    shape.fields.push(MemberInfo::new("area", "D"));
    shape.methods.push(MemberInfo::new("scale", "(D)V"));
    let mut resolver = Resolver::new(MemoryClassPath::new().with("p.Shape", shape.to_bytes()));
    let mut reactor = attached(&mut resolver);
    let node = reactor.new_node("user");

    let user = reactor.register(Reaction::new(node, "members").trigger(|cx: &mut kiln_reactor::Cx<'_, Value, Resolver>| {
        let area = cx.context.resolve_members(cx.reactor, "p.Shape", "area");
        let missing = cx.context.resolve_members(cx.reactor, "p.Shape", "perimeter");
        let unknown = cx.context.resolve_members(cx.reactor, "q.Unknown", "x");
        if area != MemberLookup::Pending {
            assert_eq!(area, MemberLookup::Found(vec![Member::Field("area".to_string())]));
            assert_eq!(missing, MemberLookup::NotFound);
            assert_eq!(unknown, MemberLookup::NotFound);
        }
        Ok(())
    }));

    let outcome = reactor.run(&mut resolver).unwrap();
    assert!(outcome.is_success());
    assert_eq!(reactor.reaction(user).runs(), 2);
    assert_eq!(
        outcome.errors,
        [
            Diagnostic::MemberNotFound {
                class: "p.Shape".to_string(),
                member: "perimeter".to_string(),
            },
            Diagnostic::MemberNotFound {
                class: "q.Unknown".to_string(),
                member: "x".to_string(),
            },
        ]
    );

    assert_eq!(
        resolver.resolve_members(&mut reactor, "p.Shape", "scale"),
        MemberLookup::Found(vec![Member::Method("scale".to_string())])
    );
    // Already reported.
    assert_eq!(
        resolver.resolve_members(&mut reactor, "p.Shape", "perimeter"),
        MemberLookup::NotFound
    );
    assert_eq!(reactor.errors().len(), 2);
}
