//! The reactor: owner of the attribute graph and of the ready-queue.

use crate::node::{Lookup, Node, Slot};
use crate::reaction::Reaction;
use fixedbitset::FixedBitSet;
use kiln_core::{Attribute, Diagnostic, Error, NodeId, ReactionId, Result};
use std::any::Any;
use std::collections::VecDeque;
use std::fmt::Debug;
use std::rc::Rc;
use tracing::{debug, trace};

/// A reaction that never ran, with the attributes it was still waiting for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unresolved {
    pub reaction: ReactionId,
    pub attributes: Vec<Attribute>,
}

/// What a run left behind once the queue drained.
#[derive(Debug, Clone, Default)]
pub struct Outcome {
    /// Every diagnostic in report order, followed by one
    /// [`Diagnostic::UnresolvedDependency`] per entry of `unresolved`.
    pub errors: Vec<Diagnostic>,
    pub unresolved: Vec<Unresolved>,
}

impl Outcome {
    /// A run fails only when some reaction could never run.
    pub fn is_success(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Drives reactions to quiescence.
///
/// `V` is the type of attribute values. `C` is the context handed to every
/// trigger along with the reactor itself; it holds whatever state the rules
/// share (for the Java front-end, the resolver).
///
/// Execution is single-threaded: a trigger may enqueue further reactions,
/// which run before [`Reactor::run`] returns.
pub struct Reactor<V, C> {
    nodes: Vec<Node<V>>,
    reactions: Vec<Reaction<V, C>>,
    queue: VecDeque<ReactionId>,
    roots: Vec<NodeId>,
    errors: Vec<Diagnostic>,
    attachment: Option<Rc<dyn Any>>,
    current: Option<ReactionId>,
}

/// Handle given to a running trigger.
pub struct Cx<'a, V, C> {
    pub reactor: &'a mut Reactor<V, C>,
    pub context: &'a mut C,
    reaction: ReactionId,
}

impl<V, C> Cx<'_, V, C>
where
    V: Clone + PartialEq + Debug,
{
    /// The running reaction.
    pub fn reaction(&self) -> ReactionId {
        self.reaction
    }

    /// The node the running reaction is bound to.
    pub fn node(&self) -> NodeId {
        self.reactor.reactions[self.reaction.index()].node()
    }

    pub fn get(&self, node: NodeId, name: &str) -> Lookup<'_, V> {
        self.reactor.attribute(node, name)
    }

    /// The value of an attribute, `None` if absent or explicitly none.
    pub fn value(&self, node: NodeId, name: &str) -> Option<&V> {
        self.reactor.attribute(node, name).value()
    }

    pub fn set(&mut self, attr: Attribute, value: V) -> Result<()> {
        self.reactor.set(attr, value)
    }

    pub fn set_none(&mut self, attr: Attribute) -> Result<()> {
        self.reactor.set_none(attr)
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.reactor.report(diagnostic);
    }
}

impl<V, C> Reactor<V, C>
where
    V: Clone + PartialEq + Debug,
{
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            reactions: Vec::new(),
            queue: VecDeque::new(),
            roots: Vec::new(),
            errors: Vec::new(),
            attachment: None,
            current: None,
        }
    }

    // --- Nodes and attributes -------------------------------------------------

    /// Allocates a fresh node in the arena.
    pub fn new_node(&mut self, label: impl Into<String>) -> NodeId {
        let id = NodeId::new(self.nodes.len() as u32);
        self.nodes.push(Node::new(label.into()));
        id
    }

    pub fn node(&self, id: NodeId) -> &Node<V> {
        &self.nodes[id.index()]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Registers a whole-analysis entry point.
    pub fn add_root(&mut self, node: NodeId) {
        if !self.roots.contains(&node) {
            self.roots.push(node);
        }
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Looks an attribute up without side effects.
    pub fn attribute(&self, node: NodeId, name: &str) -> Lookup<'_, V> {
        self.nodes[node.index()].get(name)
    }

    pub fn get(&self, attr: &Attribute) -> Lookup<'_, V> {
        self.attribute(attr.node, &attr.name)
    }

    /// Peeks at a value, treating absent and none alike.
    pub fn raw(&self, attr: &Attribute) -> Option<&V> {
        self.get(attr).value()
    }

    /// Sets an attribute and notifies its consumers.
    ///
    /// Setting the same value twice is a no-op. Setting a different value is
    /// an error, unless the write comes from the reaction that supplied the
    /// value during a later run of that reaction, in which case the new
    /// value refines the old one. Two different writes within one run
    /// always conflict.
    pub fn set(&mut self, attr: Attribute, value: V) -> Result<()> {
        self.store(attr, Some(value))
    }

    /// Records that an attribute was computed and does not exist.
    pub fn set_none(&mut self, attr: Attribute) -> Result<()> {
        self.store(attr, None)
    }

    fn store(&mut self, attr: Attribute, value: Option<V>) -> Result<()> {
        let writer = self.writer();
        let node = &mut self.nodes[attr.node.index()];

        match node.values.get_mut(&attr.name) {
            None => {
                node.values.insert(
                    attr.name.clone(),
                    Slot {
                        value,
                        supplier: writer,
                    },
                );
                self.notify(&attr, false);
                Ok(())
            }
            Some(slot) if slot.value == value => Ok(()),
            Some(slot) if is_rerun(slot.supplier, writer) => {
                debug!(%attr, ?value, "supplier refined its own attribute");
                slot.value = value;
                slot.supplier = writer;
                self.notify(&attr, true);
                Ok(())
            }
            Some(slot) => Err(Error::AttributeConflict {
                attribute: attr,
                existing: format!("{:?}", slot.value),
                value: format!("{value:?}"),
            }),
        }
    }

    /// The running reaction and the run it is in.
    fn writer(&self) -> Option<(ReactionId, u32)> {
        self.current.map(|id| (id, self.reactions[id.index()].runs))
    }

    /// Replaces an attribute's value with a more specific one.
    ///
    /// Every consumer that is fully satisfied is enqueued again, including
    /// consumers that already ran.
    pub fn refine(&mut self, attr: Attribute, value: Option<V>) {
        let writer = self.writer();
        let node = &mut self.nodes[attr.node.index()];

        match node.values.get_mut(&attr.name) {
            None => {
                node.values.insert(
                    attr.name.clone(),
                    Slot {
                        value,
                        supplier: writer,
                    },
                );
                self.notify(&attr, false);
            }
            Some(slot) if slot.value == value => {}
            Some(slot) => {
                debug!(%attr, ?value, "attribute refined");
                slot.value = value;
                self.notify(&attr, true);
            }
        }
    }

    fn notify(&mut self, attr: &Attribute, refined: bool) {
        let consumers = self.nodes[attr.node.index()]
            .consumers
            .get(&attr.name)
            .cloned()
            .unwrap_or_default();

        for id in consumers {
            let reaction = &mut self.reactions[id.index()];
            let newly = reaction.satisfy(attr);
            if reaction.is_satisfied() && (newly || refined) {
                self.enqueue(id);
            }
        }
    }

    // --- Reactions ------------------------------------------------------------

    /// Wires a reaction into the graph and enqueues it if it is already
    /// runnable.
    pub fn register(&mut self, mut reaction: Reaction<V, C>) -> ReactionId {
        let id = ReactionId::new(self.reactions.len() as u32);

        for attr in &reaction.provided {
            self.nodes[attr.node.index()]
                .suppliers
                .entry(attr.name.clone())
                .or_default()
                .push(id);
        }

        reaction.satisfied = FixedBitSet::with_capacity(reaction.consumed.len());
        reaction.satisfied_count = 0;
        for (i, attr) in reaction.consumed.iter().enumerate() {
            let node = &mut self.nodes[attr.node.index()];
            node.consumers
                .entry(attr.name.clone())
                .or_default()
                .push(id);
            if node.is_available(&attr.name) {
                reaction.satisfied.insert(i);
                reaction.satisfied_count += 1;
            }
        }

        if let Some(from) = reaction.continued_from {
            let from = &mut self.reactions[from.index()];
            if from.continued_in.is_none() {
                from.continued_in = Some(id);
            }
        }

        let ready = reaction.is_satisfied();
        trace!(reaction = %id, "registered {reaction}");
        self.reactions.push(reaction);
        if ready {
            self.enqueue(id);
        }
        id
    }

    pub fn reaction(&self, id: ReactionId) -> &Reaction<V, C> {
        &self.reactions[id.index()]
    }

    pub fn reactions(&self) -> impl Iterator<Item = (ReactionId, &Reaction<V, C>)> {
        self.reactions
            .iter()
            .enumerate()
            .map(|(i, reaction)| (ReactionId::new(i as u32), reaction))
    }

    /// The reaction whose trigger is running, if any.
    pub fn current(&self) -> Option<ReactionId> {
        self.current
    }

    fn enqueue(&mut self, id: ReactionId) {
        let reaction = &mut self.reactions[id.index()];
        if !reaction.queued {
            reaction.queued = true;
            self.queue.push_back(id);
        }
    }

    /// Schedules a satisfied reaction to run again.
    ///
    /// # Errors
    /// Returns an error if the reaction does not belong to this reactor.
    pub fn requeue(&mut self, id: ReactionId) -> Result<()> {
        let reaction = self
            .reactions
            .get(id.index())
            .ok_or(Error::UnknownReaction(id.index() as u32))?;
        if reaction.is_satisfied() {
            debug!(reaction = %id, "requeued");
            self.enqueue(id);
        }
        Ok(())
    }

    // --- Errors and attachment ------------------------------------------------

    /// Records a diagnostic against the running reaction, if any.
    pub fn report(&mut self, diagnostic: Diagnostic) {
        if let Some(id) = self.current {
            self.reactions[id.index()].reported = true;
        }
        debug!(%diagnostic, "reported");
        self.errors.push(diagnostic);
    }

    /// Diagnostics reported so far.
    pub fn errors(&self) -> &[Diagnostic] {
        &self.errors
    }

    /// Installs the configuration object shared by every rule of this run.
    pub fn set_attachment<T: Any>(&mut self, attachment: T) {
        self.attachment = Some(Rc::new(attachment));
    }

    pub fn attachment<T: Any>(&self) -> Option<Rc<T>> {
        self.attachment.clone()?.downcast::<T>().ok()
    }

    // --- Running --------------------------------------------------------------

    /// Runs reactions until none is runnable.
    ///
    /// # Errors
    /// Returns the first fatal error raised by a trigger. Diagnostics do not
    /// stop the run.
    pub fn run(&mut self, context: &mut C) -> Result<Outcome> {
        while let Some(id) = self.queue.pop_front() {
            self.fire(id, context)?;
        }
        Ok(self.outcome())
    }

    fn fire(&mut self, id: ReactionId, context: &mut C) -> Result<()> {
        let reaction = &mut self.reactions[id.index()];
        reaction.queued = false;
        reaction.triggered = true;
        reaction.runs += 1;
        trace!(reaction = %id, runs = reaction.runs, "running {reaction}");

        let mut trigger = reaction.trigger.take();
        let previous = self.current.replace(id);
        let result = match trigger.as_mut() {
            Some(trigger) => {
                let mut cx = Cx {
                    reactor: self,
                    context,
                    reaction: id,
                };
                trigger(&mut cx)
            }
            None => Ok(()),
        };
        self.current = previous;
        self.reactions[id.index()].trigger = trigger;
        result
    }

    /// Reactions that never ran and what they were waiting for.
    pub fn unresolved(&self) -> Vec<Unresolved> {
        self.reactions()
            .filter(|(_, reaction)| !reaction.triggered)
            .map(|(id, reaction)| Unresolved {
                reaction: id,
                attributes: reaction.missing(),
            })
            .collect()
    }

    /// Triggered reactions that neither supplied everything they promised
    /// nor reported why.
    fn missing_provisions(&self) -> Vec<Diagnostic> {
        self.reactions()
            .filter(|(_, r)| r.triggered && !r.optional && !r.reported)
            .filter_map(|(id, r)| {
                let attributes: Vec<Attribute> = r
                    .provided
                    .iter()
                    .filter(|attr| !self.get(attr).is_available())
                    .cloned()
                    .collect();
                (!attributes.is_empty()).then_some(Diagnostic::MissingProvision {
                    reaction: id,
                    attributes,
                })
            })
            .collect()
    }

    fn outcome(&self) -> Outcome {
        let unresolved = self.unresolved();
        let mut errors = self.errors.clone();
        if cfg!(debug_assertions) {
            errors.extend(self.missing_provisions());
        }
        errors.extend(unresolved.iter().map(|u| Diagnostic::UnresolvedDependency {
            reaction: u.reaction,
            attributes: u.attributes.clone(),
        }));
        Outcome { errors, unresolved }
    }
}

/// Whether `writer` is a later run of the reaction that wrote `supplier`.
fn is_rerun(supplier: Option<(ReactionId, u32)>, writer: Option<(ReactionId, u32)>) -> bool {
    match (supplier, writer) {
        (Some((first, run)), Some((id, now))) => first == id && now > run,
        _ => false,
    }
}

impl<V, C> Default for Reactor<V, C>
where
    V: Clone + PartialEq + Debug,
{
    fn default() -> Self {
        Self::new()
    }
}
