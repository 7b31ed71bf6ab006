//! Registering classes defined outside the load path: source declarations
//! and eagerly loaded classes.

use super::{Cached, JavaReactor, Resolver};
use crate::scope::{ClassId, ClassInfo, JavaType, Origin};
use crate::types::Value;
use kiln_core::{Attribute, Diagnostic};
use kiln_utils::{Analysis, ConflictPolicy};
use tracing::debug;

/// Position of the first `$` in a canonical name. The earlier it comes, the
/// more nested the interpretation of the chain.
fn nesting(canonical_name: &str) -> usize {
    canonical_name.find('$').unwrap_or(usize::MAX)
}

impl Resolver {
    /// Creates and registers the scope of a class declared in source.
    pub fn declare_source_class(
        &mut self,
        reactor: &mut JavaReactor,
        info: ClassInfo,
        outer: Option<ClassId>,
    ) -> ClassId {
        let id = self.new_class(reactor, info, Origin::Source, outer);
        self.register_class(reactor, id);
        id
    }

    /// Publishes a class under its canonical name and, for nested classes,
    /// under its chain.
    ///
    /// A remembered load failure is superseded. A second definition of the
    /// same name is settled by the run's [`ConflictPolicy`]. When a nested
    /// class shares its chain with a class already published there, the
    /// more nested of the two takes the chain and the conflict is reported
    /// once.
    pub fn register_class(&mut self, reactor: &mut JavaReactor, id: ClassId) {
        let classes = self.classes_node(reactor);
        let chains = self.chains_node(reactor);
        let class = self.class(id);
        let name = class.canonical_name().to_string();

        match self.cached(&name) {
            None | Some(Cached::Miss) => {
                self.class_cache.insert(name.clone(), Cached::Class(id));
                reactor.refine(Attribute::new(classes, name.as_str()), Some(Value::Class(id)));
            }
            Some(Cached::Class(old)) if old == id => {}
            Some(Cached::Class(old)) => {
                let policy = reactor
                    .attachment::<Analysis>()
                    .map(|analysis| analysis.conflict_policy)
                    .unwrap_or_default();
                let replace = policy == ConflictPolicy::PreferSource
                    && class.origin() == Origin::Source
                    && self.class(old).origin() != Origin::Source;
                debug!(class = %name, ?policy, replace, "conflicting class definitions");
                if replace {
                    self.class_cache.insert(name.clone(), Cached::Class(id));
                }
            }
        }

        let class = self.class(id);
        if !class.is_nested() {
            return;
        }
        let chain = class.chain();
        let chain_name = chain.join(".");
        let attr = Attribute::new(chains, chain_name.as_str());

        match self.cached_chain(&chain) {
            None => {}
            Some(Cached::Class(old)) if old == id => {}
            Some(Cached::Miss) => {
                self.chain_cache.insert(chain, Cached::Class(id));
                reactor.refine(attr, Some(Value::Class(id)));
            }
            Some(Cached::Class(old)) => {
                if nesting(&name) < nesting(self.class(old).canonical_name()) {
                    debug!(chain = %chain_name, class = %name, "more nested class takes the chain");
                    self.chain_cache.insert(chain, Cached::Class(id));
                    reactor.refine(attr, Some(Value::Class(id)));
                }
                if !self.class(old).ambiguous_chain() {
                    self.classes[id.index()].ambiguous_chain = true;
                    self.classes[old.index()].ambiguous_chain = true;
                    reactor.report(Diagnostic::AmbiguousClass { chain: chain_name });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nesting_order() {
        assert!(nesting("p.Outer$Inner") < nesting("p.Outer.Inner"));
        assert!(nesting("p$Outer$Inner") < nesting("p.Outer$Inner"));
    }
}
