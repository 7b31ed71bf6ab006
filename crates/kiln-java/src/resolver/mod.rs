//! Class resolution on top of the reactor.
//!
//! The resolver owns every class scope of one analysis run, the caches
//! mapping names to them, and the sources classes are loaded from. Lookups
//! never block: a class that is not cached yet is loaded by a reaction, and
//! the caller is resumed once the answer is published.
//!
//! Two nodes are created in the reactor for the resolver's use. The
//! *classes* node holds one attribute per requested canonical name; the
//! *chains* node holds one attribute per fully qualified chain, named by the
//! chain joined with dots. Both hold [`Value::Class`] or an explicit none.

mod chain;
mod loading;
mod members;
mod registration;

pub use chain::derive_candidates;
pub use members::MemberLookup;

use crate::classpath::{BuiltinClasses, ClassSource, DirectoryClassPath, ReflectiveLoader};
use crate::scope::{ClassId, ClassInfo, ClassKind, ClassScope, JavaType, Member, Origin, ScopeNodes, outer_name};
use crate::types::{Primitive, Type, Value};
use kiln_core::{Attribute, NodeId, ReactionId};
use kiln_reactor::Reactor;
use kiln_utils::Analysis;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;

/// The reactor the Java rules run in.
pub type JavaReactor = Reactor<Value, Resolver>;

pub(crate) const OBJECT: &str = "java.lang.Object";
pub(crate) const STRING: &str = "java.lang.String";

/// A cache entry: a class, or a remembered failure to load one.
///
/// A `Miss` only records that loading from bytecode or reflection failed; a
/// source definition may still replace it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cached {
    Class(ClassId),
    Miss,
}

/// Answer to a non-blocking class lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassLookup {
    Found(ClassId),
    NotFound,
    /// Not known yet. The running reaction will be re-run once it is.
    Pending,
}

impl ClassLookup {
    pub fn found(self) -> Option<ClassId> {
        match self {
            ClassLookup::Found(id) => Some(id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Roots {
    classes: NodeId,
    chains: NodeId,
}

pub struct Resolver {
    classes: Vec<ClassScope>,
    class_cache: HashMap<String, Cached>,
    chain_cache: HashMap<Vec<String>, Cached>,
    classpath: Box<dyn ClassSource>,
    reflective: Box<dyn ReflectiveLoader>,
    reflective_prefixes: Vec<String>,
    roots: Option<Roots>,
    /// Extra attributes to bind a class to once its pending load completes.
    deliveries: HashMap<String, Vec<Attribute>>,
    watchers: HashSet<(ReactionId, Attribute)>,
    /// Class and member pairs already reported as missing.
    member_misses: HashSet<(String, String)>,
    load_attempts: usize,
}

impl Resolver {
    /// A resolver loading class files from `classpath`, falling back to the
    /// builtin `java.lang` table for `java.` and `javax.` names.
    pub fn new(classpath: impl ClassSource + 'static) -> Self {
        Self {
            classes: Vec::new(),
            class_cache: HashMap::new(),
            chain_cache: HashMap::new(),
            classpath: Box::new(classpath),
            reflective: Box::new(BuiltinClasses::new()),
            reflective_prefixes: Analysis::default().reflective_prefixes,
            roots: None,
            deliveries: HashMap::new(),
            watchers: HashSet::new(),
            member_misses: HashSet::new(),
            load_attempts: 0,
        }
    }

    /// A resolver over the directories and prefixes of an analysis
    /// configuration, with relative classpath entries taken from `root`.
    pub fn from_analysis(analysis: &Analysis, root: &Path) -> Self {
        let roots = analysis
            .classpath
            .iter()
            .map(|entry| root.join(entry))
            .collect();
        Self::new(DirectoryClassPath::new(roots)).with_prefixes(analysis.reflective_prefixes.clone())
    }

    #[must_use]
    pub fn with_reflective(mut self, loader: impl ReflectiveLoader + 'static) -> Self {
        self.reflective = Box::new(loader);
        self
    }

    #[must_use]
    pub fn with_prefixes(mut self, prefixes: Vec<String>) -> Self {
        self.reflective_prefixes = prefixes;
        self
    }

    /// Creates the classes and chains nodes in `reactor`, if not done yet.
    pub fn attach(&mut self, reactor: &mut JavaReactor) {
        self.roots(reactor);
    }

    fn roots(&mut self, reactor: &mut JavaReactor) -> Roots {
        *self.roots.get_or_insert_with(|| {
            let classes = reactor.new_node("classes");
            let chains = reactor.new_node("chains");
            reactor.add_root(classes);
            reactor.add_root(chains);
            Roots { classes, chains }
        })
    }

    pub fn classes_node(&mut self, reactor: &mut JavaReactor) -> NodeId {
        self.roots(reactor).classes
    }

    pub fn chains_node(&mut self, reactor: &mut JavaReactor) -> NodeId {
        self.roots(reactor).chains
    }

    pub fn class(&self, id: ClassId) -> &ClassScope {
        &self.classes[id.index()]
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn cached(&self, canonical_name: &str) -> Option<Cached> {
        self.class_cache.get(canonical_name).copied()
    }

    pub fn cached_chain(&self, chain: &[String]) -> Option<Cached> {
        self.chain_cache.get(chain).copied()
    }

    /// The cached class for a canonical name, if loaded or declared.
    pub fn class_named(&self, canonical_name: &str) -> Option<ClassId> {
        match self.cached(canonical_name)? {
            Cached::Class(id) => Some(id),
            Cached::Miss => None,
        }
    }

    /// How many times a class was looked for on the classpath or
    /// reflectively.
    pub fn load_attempts(&self) -> usize {
        self.load_attempts
    }

    /// Allocates a class scope and its nodes. A nested class is declared in
    /// its outer class.
    pub(crate) fn new_class(
        &mut self,
        reactor: &mut JavaReactor,
        info: ClassInfo,
        origin: Origin,
        outer: Option<ClassId>,
    ) -> ClassId {
        let id = ClassId::new(self.classes.len() as u32);
        let name = info.canonical_name.clone();
        let nodes = ScopeNodes {
            class: reactor.new_node(format!("class {name}")),
            fields: reactor.new_node(format!("{name} fields")),
            methods: reactor.new_node(format!("{name} methods")),
            classes: reactor.new_node(format!("{name} classes")),
            type_params: reactor.new_node(format!("{name} type parameters")),
        };
        let scope = ClassScope::new(id, nodes, info, origin, outer);
        if let Some(outer) = outer {
            let simple = scope.simple_name().to_string();
            self.classes[outer.index()]
                .classes
                .declare(simple, Member::Class(id));
        }
        self.classes.push(scope);
        id
    }

    /// The loaded outer class of a nested canonical name.
    pub(crate) fn loaded_outer(&self, canonical_name: &str) -> Option<ClassId> {
        self.class_named(outer_name(canonical_name)?)
    }

    pub(crate) fn set_super_type(&mut self, id: ClassId, super_type: ClassId) {
        let name = self.classes[super_type.index()].canonical_name().to_string();
        self.classes[id.index()].super_type = Some(name);
    }

    // --- Types ----------------------------------------------------------------

    /// The primitive a type denotes, after unboxing wrapper classes.
    pub fn unboxed(&self, ty: Type) -> Option<Primitive> {
        match ty {
            Type::Primitive(p) => Some(p),
            Type::Class(id) => Primitive::unboxing(self.class(id).canonical_name()),
            Type::Null | Type::String => None,
        }
    }

    /// How a type is named in diagnostics.
    pub fn type_name(&self, ty: Type) -> String {
        match ty {
            Type::Class(id) => self.class(id).canonical_name().to_string(),
            other => other.to_string(),
        }
    }

    fn reference_name(&self, ty: Type) -> Option<&str> {
        match ty {
            Type::String => Some(STRING),
            Type::Class(id) => Some(self.class(id).canonical_name()),
            Type::Primitive(_) | Type::Null => None,
        }
    }

    /// Whether `sub` is `sup` or inherits from it, as far as the cached
    /// classes tell.
    pub fn is_subtype(&self, sub: &str, sup: &str) -> bool {
        if sup == OBJECT {
            return true;
        }
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([sub.to_string()]);
        while let Some(name) = queue.pop_front() {
            if name == sup {
                return true;
            }
            if !seen.insert(name.clone()) {
                continue;
            }
            if let Some(id) = self.class_named(&name) {
                let class = self.class(id);
                queue.extend(class.super_type().map(str::to_string));
                queue.extend(class.interfaces().iter().cloned());
            }
        }
        false
    }

    /// Whether a value of type `from` may be cast to `to` (both reference
    /// types). Interfaces are compatible with any class; classes must be
    /// related by inheritance.
    pub fn cast_compatible(&self, from: Type, to: Type) -> bool {
        if from == to || from == Type::Null || to == Type::Null {
            return from.is_reference() && to.is_reference();
        }
        let (Some(a), Some(b)) = (self.reference_name(from), self.reference_name(to)) else {
            return false;
        };
        let interface = |name: &str| {
            self.class_named(name)
                .is_some_and(|id| self.class(id).kind() == ClassKind::Interface)
        };
        interface(a) || interface(b) || self.is_subtype(a, b) || self.is_subtype(b, a)
    }
}

/// Binds `value` to `attr` unless something is already there.
pub(crate) fn bind_if_absent(reactor: &mut JavaReactor, attr: Attribute, value: Option<Value>) {
    if !reactor.get(&attr).is_available() {
        reactor.refine(attr, value);
    }
}
