//! Reactions: units of computation scheduled by data availability.

use crate::reactor::Cx;
use fixedbitset::FixedBitSet;
use kiln_core::{Attribute, NodeId, ReactionId, Result};
use std::fmt;

/// Body of a reaction. It is expected to set every provided attribute.
pub type Trigger<V, C> = Box<dyn FnMut(&mut Cx<'_, V, C>) -> Result<()>>;

/// A procedure that consumes some attributes in order to derive others.
///
/// A reaction is bound to the node it computes things for. It is built with
/// the builder methods and then handed to [`Reactor::register`], which wires
/// it into the graph.
///
/// [`Reactor::register`]: crate::Reactor::register
pub struct Reaction<V, C> {
    node: NodeId,
    label: String,
    pub(crate) consumed: Vec<Attribute>,
    pub(crate) provided: Vec<Attribute>,
    pub(crate) optional: bool,
    pub(crate) trigger: Option<Trigger<V, C>>,
    pub(crate) satisfied: FixedBitSet,
    pub(crate) satisfied_count: usize,
    /// Set before the trigger runs, so it stays set if the trigger fails.
    pub(crate) triggered: bool,
    pub(crate) runs: u32,
    pub(crate) queued: bool,
    pub(crate) reported: bool,
    pub(crate) continued_from: Option<ReactionId>,
    pub(crate) continued_in: Option<ReactionId>,
}

impl<V, C> Reaction<V, C> {
    pub fn new(node: NodeId, label: impl Into<String>) -> Self {
        Self {
            node,
            label: label.into(),
            consumed: Vec::new(),
            provided: Vec::new(),
            optional: false,
            trigger: None,
            satisfied: FixedBitSet::new(),
            satisfied_count: 0,
            triggered: false,
            runs: 0,
            queued: false,
            reported: false,
            continued_from: None,
            continued_in: None,
        }
    }

    #[must_use]
    pub fn consumes(mut self, attributes: impl IntoIterator<Item = Attribute>) -> Self {
        self.consumed.extend(attributes);
        self
    }

    #[must_use]
    pub fn provides(mut self, attributes: impl IntoIterator<Item = Attribute>) -> Self {
        self.provided.extend(attributes);
        self
    }

    /// Marks the reaction as allowed to finish without supplying its
    /// provided attributes.
    #[must_use]
    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    /// Makes this reaction the continuation of `from`, which will be resumed
    /// by it.
    #[must_use]
    pub fn continues(mut self, from: ReactionId) -> Self {
        self.continued_from = Some(from);
        self
    }

    #[must_use]
    pub fn trigger<F>(mut self, trigger: F) -> Self
    where
        F: FnMut(&mut Cx<'_, V, C>) -> Result<()> + 'static,
    {
        self.trigger = Some(Box::new(trigger));
        self
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn consumed(&self) -> &[Attribute] {
        &self.consumed
    }

    pub fn provided(&self) -> &[Attribute] {
        &self.provided
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn triggered(&self) -> bool {
        self.triggered
    }

    /// How many times the trigger ran.
    pub fn runs(&self) -> u32 {
        self.runs
    }

    pub fn continued_from(&self) -> Option<ReactionId> {
        self.continued_from
    }

    /// The first reaction registered as a continuation of this one. Later
    /// continuations resume it too but are not recorded here.
    pub fn continued_in(&self) -> Option<ReactionId> {
        self.continued_in
    }

    pub fn is_satisfied(&self) -> bool {
        self.satisfied_count == self.consumed.len()
    }

    /// Consumed attributes not yet available.
    pub fn missing(&self) -> Vec<Attribute> {
        self.consumed
            .iter()
            .enumerate()
            .filter(|(i, _)| !self.satisfied.contains(*i))
            .map(|(_, attr)| attr.clone())
            .collect()
    }

    /// Marks every slot for `attr` satisfied. Returns whether any slot changed.
    pub(crate) fn satisfy(&mut self, attr: &Attribute) -> bool {
        let mut changed = false;
        for (i, consumed) in self.consumed.iter().enumerate() {
            if consumed == attr && !self.satisfied.contains(i) {
                self.satisfied.insert(i);
                self.satisfied_count += 1;
                changed = true;
            }
        }
        changed
    }
}

impl<V, C> fmt::Debug for Reaction<V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reaction")
            .field("label", &self.label)
            .field("node", &self.node)
            .field("consumed", &self.consumed)
            .field("provided", &self.provided)
            .field("triggered", &self.triggered)
            .finish_non_exhaustive()
    }
}

impl<V, C> fmt::Display for Reaction<V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let list = |attributes: &[Attribute]| {
            attributes
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        };
        write!(
            f,
            "{}: [{}] -> [{}]",
            self.label,
            list(&self.consumed),
            list(&self.provided)
        )
    }
}
