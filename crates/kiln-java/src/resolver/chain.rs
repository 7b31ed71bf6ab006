//! Resolving dotted chains of identifiers to classes.

use super::{Cached, ClassLookup, JavaReactor, Resolver};
use crate::scope::{ClassId, JavaType, LexicalScope, Origin};
use crate::types::Value;
use kiln_core::{Attribute, Diagnostic, ReactionId};
use kiln_reactor::{Lookup, Reaction};
use tracing::debug;

/// Every canonical name a fully qualified chain may denote, from the least
/// nested (all package components) to the most nested (a single package
/// component or none).
///
/// `["a", "B", "C"]` gives `["a.B.C", "a.B$C", "a$B$C"]`.
pub fn derive_candidates(chain: &[String]) -> Vec<String> {
    let size = chain.len();
    (0..size)
        .map(|nested| {
            let prefix = chain[..size - nested].join(".");
            if nested == 0 {
                prefix
            } else {
                format!("{prefix}${}", chain[size - nested..].join("$"))
            }
        })
        .collect()
}

fn snapshot(lookup: Lookup<'_, Value>) -> Option<Option<Value>> {
    match lookup {
        Lookup::Absent => None,
        Lookup::None => Some(None),
        Lookup::Value(value) => Some(Some(*value)),
    }
}

impl Resolver {
    /// Resolves a fully qualified chain.
    ///
    /// Called from a reaction, the reaction is re-run whenever the chain's
    /// published class changes, including when it first becomes known.
    pub fn full_chain(&mut self, reactor: &mut JavaReactor, chain: &[String]) -> ClassLookup {
        let chains = self.chains_node(reactor);
        let classes = self.classes_node(reactor);
        let chain_name = chain.join(".");
        let attr = Attribute::new(chains, chain_name.as_str());

        if let Some(requester) = reactor.current() {
            self.watch(reactor, requester, attr.clone());
        }

        match self.cached_chain(chain) {
            Some(Cached::Class(id)) => return ClassLookup::Found(id),
            Some(Cached::Miss) => return ClassLookup::NotFound,
            None => {}
        }

        if reactor.node(chains).suppliers(&chain_name).is_empty() {
            let candidates = derive_candidates(chain);
            for candidate in &candidates {
                self.klass(reactor, candidate);
            }
            debug!(chain = %chain_name, ?candidates, "resolving chain");

            let consumed: Vec<Attribute> = candidates
                .iter()
                .map(|candidate| Attribute::new(classes, candidate.as_str()))
                .collect();
            let chain = chain.to_vec();
            reactor.register(
                Reaction::new(chains, format!("chain {chain_name}"))
                    .consumes(consumed)
                    .provides([attr])
                    .optional(true)
                    .trigger(move |cx: &mut crate::typing::JavaCx<'_>| {
                        cx.context.complete_chain(cx.reactor, &chain, &candidates);
                        Ok(())
                    }),
            );
        }
        ClassLookup::Pending
    }

    /// Body of a chain reaction, run once every candidate was looked for.
    /// The most nested candidate that exists wins.
    fn complete_chain(&mut self, reactor: &mut JavaReactor, chain: &[String], candidates: &[String]) {
        let chains = self.chains_node(reactor);
        let chain_name = chain.join(".");
        let resolved: Vec<ClassId> = candidates
            .iter()
            .filter_map(|candidate| self.class_named(candidate))
            .collect();

        if resolved.len() > 1 && resolved.iter().any(|&id| !self.class(id).ambiguous_chain()) {
            for &id in &resolved {
                self.classes[id.index()].ambiguous_chain = true;
            }
            reactor.report(Diagnostic::AmbiguousClass {
                chain: chain_name.clone(),
            });
        }

        let picked = resolved.last().copied();
        self.chain_cache
            .insert(chain.to_vec(), picked.map_or(Cached::Miss, Cached::Class));
        reactor.refine(Attribute::new(chains, chain_name), picked.map(Value::Class));
    }

    /// Re-runs `requester` whenever `attr` changes from what it holds now.
    /// At most one watcher exists per requester and attribute.
    pub(super) fn watch(&mut self, reactor: &mut JavaReactor, requester: ReactionId, attr: Attribute) {
        if !self.watchers.insert((requester, attr.clone())) {
            return;
        }
        let mut seen = snapshot(reactor.get(&attr));
        reactor.register(
            Reaction::new(attr.node, format!("watch {attr}"))
                .consumes([attr.clone()])
                .continues(requester)
                .trigger(move |cx: &mut crate::typing::JavaCx<'_>| {
                    let now = snapshot(cx.reactor.get(&attr));
                    if now != seen {
                        seen = now;
                        cx.reactor.requeue(requester)?;
                    }
                    Ok(())
                }),
        );
    }

    /// Resolves a chain as written inside the class `scope`.
    ///
    /// The first component is looked up lexically, then each further
    /// component as a member class of the previous one. When the first
    /// component names no visible class the chain is taken as fully
    /// qualified. When only a prefix resolves the chain is not found.
    pub fn klass_chain(&mut self, reactor: &mut JavaReactor, scope: ClassId, chain: &[String]) -> ClassLookup {
        let Some((first, rest)) = chain.split_first() else {
            return ClassLookup::NotFound;
        };
        let Some(mut current) = self.lexical_class(scope, first) else {
            return self.full_chain(reactor, chain);
        };

        for name in rest {
            match self.member_class(reactor, current, name) {
                ClassLookup::Found(id) => current = id,
                ClassLookup::NotFound => {
                    debug!(chain = %chain.join("."), missing = %name, "chain resolves partially");
                    return ClassLookup::NotFound;
                }
                ClassLookup::Pending => return ClassLookup::Pending,
            }
        }
        ClassLookup::Found(current)
    }

    /// A class visible by simple name from `scope`: a member class of the
    /// scope or of an enclosing class, or one of those classes itself.
    fn lexical_class(&self, scope: ClassId, name: &str) -> Option<ClassId> {
        let mut next = Some(scope);
        while let Some(id) = next {
            let class = self.class(id);
            if let Some(nested) = class.nested_class(name) {
                return Some(nested);
            }
            if class.simple_name() == name {
                return Some(id);
            }
            next = class.outer();
        }
        None
    }

    /// A member class of `owner`. Member classes of loaded classes are
    /// loaded on demand.
    fn member_class(&mut self, reactor: &mut JavaReactor, owner: ClassId, name: &str) -> ClassLookup {
        let class = self.class(owner);
        if let Some(id) = class.nested_class(name) {
            return ClassLookup::Found(id);
        }
        if class.origin() == Origin::Source {
            return ClassLookup::NotFound;
        }

        let canonical_name = format!("{}${name}", class.canonical_name());
        let target = Attribute::new(class.classes().node(), name);
        let lookup = self.klass_into(reactor, &canonical_name, target);
        if lookup == ClassLookup::Pending {
            if let Some(requester) = reactor.current() {
                let classes = self.classes_node(reactor);
                self.watch(reactor, requester, Attribute::new(classes, canonical_name));
            }
        }
        lookup
    }
}
