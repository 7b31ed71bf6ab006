//! Java front-end for the Kiln reactor.
//!
//! This crate provides the typing and class resolution rules for Java
//! syntax trees, together with the resolver they rely on: class scopes,
//! class file decoding, classpath access and the name caches.

pub mod ast;
pub mod classfile;
pub mod classpath;
pub mod resolution;
pub mod resolver;
pub mod scope;
pub mod types;
pub mod typing;

pub use ast::{Ast, BinaryOp, ClassDecl, Kind, Literal, Syntax, UnaryOp};
pub use classfile::ClassFile;
pub use classpath::{BuiltinClasses, ClassSource, DirectoryClassPath, MemoryClassPath, ReflectiveLoader};
pub use resolver::{Cached, ClassLookup, JavaReactor, MemberLookup, Resolver, derive_candidates};
pub use scope::{
    ClassId, ClassInfo, ClassKind, ClassMember, ClassScope, JavaType, LexicalScope, Member, Origin,
};
pub use types::{Primitive, Type, Value};

use kiln_core::Result;
use kiln_reactor::{Lookup, Outcome, TreeBinding};
use kiln_utils::Analysis;
use std::rc::Rc;

/// Prepares `reactor` for analysing `ast`.
///
/// The analysis settings become the reactor's attachment, the well-known
/// classes are loaded, and the typing and resolution rules are installed.
///
/// # Errors
/// Returns [`Error::ClassLoad`](kiln_core::Error::ClassLoad) if
/// `java.lang.Object` or `java.lang.String` cannot be loaded.
pub fn install_java_rules(
    reactor: &mut JavaReactor,
    resolver: &mut Resolver,
    analysis: Analysis,
    ast: Rc<Ast>,
) -> Result<TreeBinding<Ast>> {
    reactor.set_attachment(analysis);
    resolver.attach(reactor);
    resolver.eagerly(reactor, resolver::OBJECT)?;
    resolver.eagerly(reactor, resolver::STRING)?;

    let binding = reactor.bind(ast);
    reactor.install(&binding, &typing::rules());
    reactor.install(&binding, &resolution::rules());
    Ok(binding)
}

/// One analysis run over one syntax tree.
pub struct Session {
    pub reactor: JavaReactor,
    pub resolver: Resolver,
    pub binding: TreeBinding<Ast>,
}

impl Session {
    /// # Errors
    /// Fails like [`install_java_rules`].
    pub fn new(ast: Ast, mut resolver: Resolver, analysis: Analysis) -> Result<Self> {
        let mut reactor = JavaReactor::new();
        let binding = install_java_rules(&mut reactor, &mut resolver, analysis, Rc::new(ast))?;
        Ok(Self {
            reactor,
            resolver,
            binding,
        })
    }

    /// # Errors
    /// Returns the first fatal error raised by a rule.
    pub fn run(&mut self) -> Result<Outcome> {
        self.reactor.run(&mut self.resolver)
    }

    pub fn attribute(&self, index: usize, name: &str) -> Lookup<'_, Value> {
        self.reactor.attribute(self.binding.node(index), name)
    }

    /// The type computed for an expression.
    pub fn type_of(&self, index: usize) -> Option<Type> {
        self.attribute(index, typing::TYPE).value().and_then(Value::as_type)
    }

    /// The class a type reference resolved to.
    pub fn resolved(&self, index: usize) -> Option<ClassId> {
        self.attribute(index, resolution::RESOLVED)
            .value()
            .and_then(Value::as_class)
    }

    /// The class a declaration defines.
    pub fn scope(&self, index: usize) -> Option<ClassId> {
        self.attribute(index, resolution::SCOPE)
            .value()
            .and_then(Value::as_class)
    }

    pub fn class(&self, id: ClassId) -> &ClassScope {
        self.resolver.class(id)
    }
}
