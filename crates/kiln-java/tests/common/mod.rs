//! Shared fixtures for the Java front-end tests.
#![allow(dead_code)]

use kiln_core::Diagnostic;
use kiln_java::{Ast, ClassFile, MemoryClassPath, Resolver, Session};
use kiln_utils::Analysis;

pub fn chain(parts: &[&str]) -> Vec<String> {
    parts.iter().map(ToString::to_string).collect()
}

/// A class file declaring the class with the given canonical name.
pub fn class_bytes(canonical_name: &str) -> Vec<u8> {
    ClassFile::new(canonical_name.replace('.', "/")).to_bytes()
}

/// A resolver whose classpath holds one class file per canonical name.
pub fn resolver_with(classes: &[&str]) -> Resolver {
    let mut classpath = MemoryClassPath::new();
    for name in classes {
        classpath.insert(*name, class_bytes(name));
    }
    Resolver::new(classpath)
}

pub fn session(ast: Ast) -> Session {
    session_with(ast, &[])
}

pub fn session_with(ast: Ast, classes: &[&str]) -> Session {
    Session::new(ast, resolver_with(classes), Analysis::default()).expect("core classes load")
}

pub fn type_errors(errors: &[Diagnostic]) -> Vec<String> {
    errors
        .iter()
        .filter(|e| matches!(e, Diagnostic::Type { .. }))
        .map(ToString::to_string)
        .collect()
}

pub fn count_ambiguous(errors: &[Diagnostic]) -> usize {
    errors
        .iter()
        .filter(|e| matches!(e, Diagnostic::AmbiguousClass { .. }))
        .count()
}
