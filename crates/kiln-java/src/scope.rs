//! Class scopes.
//!
//! A [`ClassScope`] is at once a type, a lexical scope and a member of its
//! outer class. Each facet is a separate trait ([`JavaType`],
//! [`LexicalScope`], [`ClassMember`]) implemented by the one struct.

use kiln_core::NodeId;
use std::collections::HashMap;
use std::fmt;

/// Index of a class in the resolver's class arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(u32);

impl ClassId {
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "class#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassKind {
    Class,
    Interface,
    Enum,
    Annotation,
}

impl fmt::Display for ClassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ClassKind::Class => "class",
            ClassKind::Interface => "interface",
            ClassKind::Enum => "enum",
            ClassKind::Annotation => "annotation",
        })
    }
}

/// Where a class definition came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    Bytecode,
    Reflection,
    Source,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Member {
    Field(String),
    Method(String),
    Class(ClassId),
    TypeParam(String),
}

/// A named sub-scope of a class: fields, methods, nested classes or type
/// parameters. It is also a graph node, so rules can hang attributes off it.
#[derive(Debug, Clone)]
pub struct Scope {
    node: NodeId,
    members: HashMap<String, Vec<Member>>,
}

impl Scope {
    pub fn new(node: NodeId) -> Self {
        Self {
            node,
            members: HashMap::new(),
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn declare(&mut self, name: impl Into<String>, member: Member) {
        self.members.entry(name.into()).or_default().push(member);
    }

    pub fn lookup(&self, name: &str) -> &[Member] {
        self.members.get(name).map_or(&[], Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.members.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// The type facet of a class.
pub trait JavaType {
    fn canonical_name(&self) -> &str;
    fn kind(&self) -> ClassKind;
    /// Canonical name of the superclass.
    fn super_type(&self) -> Option<&str>;
    fn interfaces(&self) -> &[String];
}

/// The scope facet of a class.
pub trait LexicalScope {
    /// The enclosing class, if this scope is nested.
    fn outer(&self) -> Option<ClassId>;
    fn nested_class(&self, name: &str) -> Option<ClassId>;
    fn field(&self, name: &str) -> bool;
    fn method(&self, name: &str) -> bool;
    fn type_param(&self, name: &str) -> bool;
}

/// The member facet of a class.
pub trait ClassMember {
    fn member_name(&self) -> &str;
    fn owner(&self) -> Option<ClassId>;
}

#[derive(Debug, Clone)]
pub struct ClassScope {
    id: ClassId,
    node: NodeId,
    canonical_name: String,
    kind: ClassKind,
    origin: Origin,
    pub(crate) super_type: Option<String>,
    interfaces: Vec<String>,
    outer: Option<ClassId>,
    pub(crate) fields: Scope,
    pub(crate) methods: Scope,
    pub(crate) classes: Scope,
    pub(crate) type_params: Scope,
    pub(crate) ambiguous_chain: bool,
}

/// Everything needed to create a class scope, whatever its origin.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassInfo {
    pub canonical_name: String,
    pub kind: ClassKind,
    pub super_type: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: Vec<String>,
    pub methods: Vec<String>,
    pub type_params: Vec<String>,
}

impl ClassInfo {
    pub fn new(canonical_name: impl Into<String>, kind: ClassKind) -> Self {
        Self {
            canonical_name: canonical_name.into(),
            kind,
            super_type: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            type_params: Vec::new(),
        }
    }

    #[must_use]
    pub fn extends(mut self, super_type: impl Into<String>) -> Self {
        self.super_type = Some(super_type.into());
        self
    }

    #[must_use]
    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }
}

/// Graph nodes allocated for a class: its own and its four sub-scopes.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ScopeNodes {
    pub(crate) class: NodeId,
    pub(crate) fields: NodeId,
    pub(crate) methods: NodeId,
    pub(crate) classes: NodeId,
    pub(crate) type_params: NodeId,
}

impl ClassScope {
    pub(crate) fn new(
        id: ClassId,
        nodes: ScopeNodes,
        info: ClassInfo,
        origin: Origin,
        outer: Option<ClassId>,
    ) -> Self {
        let mut fields = Scope::new(nodes.fields);
        for name in info.fields {
            fields.declare(name.clone(), Member::Field(name));
        }
        let mut methods = Scope::new(nodes.methods);
        for name in info.methods {
            methods.declare(name.clone(), Member::Method(name));
        }
        let mut type_params = Scope::new(nodes.type_params);
        for name in info.type_params {
            type_params.declare(name.clone(), Member::TypeParam(name));
        }

        Self {
            id,
            node: nodes.class,
            canonical_name: info.canonical_name,
            kind: info.kind,
            origin,
            super_type: info.super_type,
            interfaces: info.interfaces,
            outer,
            fields,
            methods,
            classes: Scope::new(nodes.classes),
            type_params,
            ambiguous_chain: false,
        }
    }

    pub fn id(&self) -> ClassId {
        self.id
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// Last component of the canonical name.
    pub fn simple_name(&self) -> &str {
        simple_name(&self.canonical_name)
    }

    pub fn is_nested(&self) -> bool {
        self.canonical_name.contains('$')
    }

    /// The chain naming this class in source: every package and class
    /// component.
    pub fn chain(&self) -> Vec<String> {
        self.canonical_name
            .split(['.', '$'])
            .map(str::to_string)
            .collect()
    }

    /// Set once an ambiguity involving this class was detected. Never
    /// cleared.
    pub fn ambiguous_chain(&self) -> bool {
        self.ambiguous_chain
    }

    pub fn fields(&self) -> &Scope {
        &self.fields
    }

    pub fn methods(&self) -> &Scope {
        &self.methods
    }

    pub fn classes(&self) -> &Scope {
        &self.classes
    }

    pub fn type_params(&self) -> &Scope {
        &self.type_params
    }

    /// Every field, method and member class named `name`.
    pub fn members(&self, name: &str) -> Vec<Member> {
        [&self.fields, &self.methods, &self.classes]
            .into_iter()
            .flat_map(|scope| scope.lookup(name).iter().cloned())
            .collect()
    }
}

impl JavaType for ClassScope {
    fn canonical_name(&self) -> &str {
        &self.canonical_name
    }

    fn kind(&self) -> ClassKind {
        self.kind
    }

    fn super_type(&self) -> Option<&str> {
        self.super_type.as_deref()
    }

    fn interfaces(&self) -> &[String] {
        &self.interfaces
    }
}

impl LexicalScope for ClassScope {
    fn outer(&self) -> Option<ClassId> {
        self.outer
    }

    fn nested_class(&self, name: &str) -> Option<ClassId> {
        self.classes.lookup(name).iter().find_map(|member| match member {
            Member::Class(id) => Some(*id),
            _ => None,
        })
    }

    fn field(&self, name: &str) -> bool {
        !self.fields.lookup(name).is_empty()
    }

    fn method(&self, name: &str) -> bool {
        !self.methods.lookup(name).is_empty()
    }

    fn type_param(&self, name: &str) -> bool {
        !self.type_params.lookup(name).is_empty()
    }
}

impl ClassMember for ClassScope {
    fn member_name(&self) -> &str {
        self.simple_name()
    }

    fn owner(&self) -> Option<ClassId> {
        self.outer
    }
}

/// Last `.` or `$` separated component of a canonical name.
pub fn simple_name(canonical_name: &str) -> &str {
    canonical_name
        .rsplit(['.', '$'])
        .next()
        .unwrap_or(canonical_name)
}

/// Canonical name of the class enclosing a nested class.
pub fn outer_name(canonical_name: &str) -> Option<&str> {
    canonical_name
        .rfind('$')
        .map(|i| &canonical_name[..i])
}
