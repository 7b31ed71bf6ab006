//! Loading classes from the classpath and the reflective loader.

use super::{Cached, ClassLookup, JavaReactor, Resolver, bind_if_absent};
use crate::classfile::ClassFile;
use crate::scope::{ClassId, ClassInfo, Origin};
use crate::types::Value;
use kiln_core::{Attribute, Error, Result};
use kiln_reactor::Reaction;
use tracing::{debug, warn};

impl Resolver {
    /// Looks a class up by canonical name, binding it on the classes node.
    ///
    /// A cached class is returned at once. Otherwise a reaction is scheduled
    /// to load it and the lookup is pending.
    pub fn klass(&mut self, reactor: &mut JavaReactor, canonical_name: &str) -> ClassLookup {
        let classes = self.classes_node(reactor);
        self.klass_into(reactor, canonical_name, Attribute::new(classes, canonical_name))
    }

    /// Like [`klass`](Self::klass), and also binds the class to `target`
    /// once it is known.
    pub fn klass_into(
        &mut self,
        reactor: &mut JavaReactor,
        canonical_name: &str,
        target: Attribute,
    ) -> ClassLookup {
        match self.cached(canonical_name) {
            Some(Cached::Miss) => return ClassLookup::NotFound,
            Some(Cached::Class(id)) => {
                bind_if_absent(reactor, target, Some(Value::Class(id)));
                return ClassLookup::Found(id);
            }
            None => {}
        }

        let classes = self.classes_node(reactor);
        let attr = Attribute::new(classes, canonical_name);
        if target != attr {
            self.deliveries
                .entry(canonical_name.to_string())
                .or_default()
                .push(target);
        }
        if reactor.node(classes).suppliers(canonical_name).is_empty() {
            debug!(class = canonical_name, "scheduling load");
            let name = canonical_name.to_string();
            reactor.register(
                Reaction::new(classes, format!("load {canonical_name}"))
                    .provides([attr])
                    .optional(true)
                    .trigger(move |cx: &mut crate::typing::JavaCx<'_>| {
                        cx.context.complete_load(cx.reactor, &name);
                        Ok(())
                    }),
            );
        }
        ClassLookup::Pending
    }

    /// Body of a load reaction: loads the class unless it got defined in the
    /// meantime, then publishes the result.
    pub(crate) fn complete_load(&mut self, reactor: &mut JavaReactor, canonical_name: &str) {
        let classes = self.classes_node(reactor);
        let value = match self.cached(canonical_name) {
            Some(Cached::Class(id)) => Some(id),
            Some(Cached::Miss) => None,
            None => {
                let loaded = self.load_class(canonical_name).map(|(info, origin)| {
                    let outer = self.loaded_outer(canonical_name);
                    self.new_class(reactor, info, origin, outer)
                });
                let entry = loaded.map_or(Cached::Miss, Cached::Class);
                debug!(class = canonical_name, ?entry, "load completed");
                self.class_cache.insert(canonical_name.to_string(), entry);
                loaded
            }
        };

        let value = value.map(Value::Class);
        bind_if_absent(reactor, Attribute::new(classes, canonical_name), value);
        for target in self.deliveries.remove(canonical_name).unwrap_or_default() {
            bind_if_absent(reactor, target, value);
        }
    }

    /// Loads a class synchronously, bypassing the queue.
    ///
    /// # Errors
    /// Returns [`Error::ClassLoad`] if the class cannot be found. This is
    /// for classes the analysis cannot do without, such as
    /// `java.lang.Object`.
    pub fn eagerly(&mut self, reactor: &mut JavaReactor, canonical_name: &str) -> Result<ClassId> {
        if let Some(id) = self.class_named(canonical_name) {
            return Ok(id);
        }
        let (info, origin) = self
            .load_class(canonical_name)
            .ok_or_else(|| Error::ClassLoad(canonical_name.to_string()))?;
        let outer = self.loaded_outer(canonical_name);
        let id = self.new_class(reactor, info, origin, outer);
        self.register_class(reactor, id);
        Ok(id)
    }

    /// Tries the classpath, then the reflective loader. Touches no cache.
    fn load_class(&mut self, canonical_name: &str) -> Option<(ClassInfo, Origin)> {
        self.load_attempts += 1;

        match self.classpath.read(canonical_name) {
            Ok(Some(bytes)) => match ClassFile::parse(&bytes) {
                Ok(file) if file.canonical_name() == canonical_name => {
                    return Some((file.info(), Origin::Bytecode));
                }
                Ok(file) => warn!(
                    class = canonical_name,
                    found = %file.canonical_name(),
                    "class file declares another class"
                ),
                Err(e) => warn!(class = canonical_name, error = %e, "ignoring class file"),
            },
            Ok(None) => {}
            Err(e) => warn!(class = canonical_name, error = %e, "could not read class file"),
        }

        if self
            .reflective_prefixes
            .iter()
            .any(|prefix| canonical_name.starts_with(prefix.as_str()))
        {
            return self
                .reflective
                .load(canonical_name)
                .map(|info| (info, Origin::Reflection));
        }
        None
    }
}
