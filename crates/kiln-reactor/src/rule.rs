//! Rules: reaction templates dispatched over syntax node variants.

use crate::reaction::Reaction;
use crate::reactor::{Cx, Reactor};
use kiln_core::{Attribute, NodeId, Result};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::rc::Rc;
use tracing::debug;

/// An immutable syntax tree stored in an arena.
///
/// Nodes are addressed by their index in `0..len()`.
pub trait Tree: 'static {
    /// The variant tag rule domains are expressed in.
    type Kind: Copy + Eq + Hash + Debug;

    fn len(&self) -> usize;

    fn kind(&self, index: usize) -> Self::Kind;

    fn label(&self, index: usize) -> String {
        format!("{:?}", self.kind(index))
    }
}

/// A tree whose nodes have been given graph nodes in a reactor.
///
/// The nodes of the tree are allocated contiguously, so the graph node of a
/// syntax node is found by offset.
pub struct TreeBinding<T> {
    tree: Rc<T>,
    base: u32,
}

impl<T> Clone for TreeBinding<T> {
    fn clone(&self) -> Self {
        Self {
            tree: Rc::clone(&self.tree),
            base: self.base,
        }
    }
}

impl<T: Tree> TreeBinding<T> {
    pub fn tree(&self) -> &T {
        &self.tree
    }

    /// Graph node of the syntax node at `index`.
    pub fn node(&self, index: usize) -> NodeId {
        NodeId::new(self.base + index as u32)
    }

    /// Syntax node index of a graph node, if it belongs to this tree.
    pub fn index(&self, node: NodeId) -> Option<usize> {
        let offset = node.index().checked_sub(self.base as usize)?;
        (offset < self.tree.len()).then_some(offset)
    }

    pub fn attr(&self, index: usize, name: &str) -> Attribute {
        Attribute::new(self.node(index), name)
    }
}

/// A template producing one reaction per syntax node in its domain.
pub trait Rule<T: Tree, V, C> {
    /// Name used to label the reactions built from this rule.
    fn name(&self) -> &'static str;

    /// Variants this rule applies to.
    fn domain(&self) -> Vec<T::Kind>;

    fn consumed(&self, _tree: &TreeBinding<T>, _index: usize) -> Vec<Attribute> {
        Vec::new()
    }

    fn provided(&self, tree: &TreeBinding<T>, index: usize) -> Vec<Attribute>;

    /// Whether the reactions may legitimately leave their attributes unset.
    fn optional(&self) -> bool {
        false
    }

    fn compute(&self, cx: &mut Cx<'_, V, C>, tree: &TreeBinding<T>, index: usize) -> Result<()>;
}

/// A named collection of rules installed together.
pub struct RuleSet<T: Tree, V, C> {
    name: &'static str,
    rules: Vec<Rc<dyn Rule<T, V, C>>>,
}

impl<T: Tree, V, C> RuleSet<T, V, C> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            rules: Vec::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, rule: impl Rule<T, V, C> + 'static) -> Self {
        self.rules.push(Rc::new(rule));
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<V, C> Reactor<V, C>
where
    V: Clone + PartialEq + Debug + 'static,
    C: 'static,
{
    /// Allocates one graph node per syntax node of `tree`.
    pub fn bind<T: Tree>(&mut self, tree: Rc<T>) -> TreeBinding<T> {
        let base = self.node_count() as u32;
        for index in 0..tree.len() {
            self.new_node(tree.label(index));
        }
        TreeBinding { tree, base }
    }

    /// Walks the tree once and instantiates a reaction for every node
    /// matching a rule of `rules`. Returns the number of reactions created.
    pub fn install<T: Tree>(&mut self, binding: &TreeBinding<T>, rules: &RuleSet<T, V, C>) -> usize {
        let mut registry: HashMap<T::Kind, Vec<Rc<dyn Rule<T, V, C>>>> = HashMap::new();
        for rule in &rules.rules {
            for kind in rule.domain() {
                registry.entry(kind).or_default().push(Rc::clone(rule));
            }
        }

        let mut created = 0;
        for index in 0..binding.tree().len() {
            let Some(matching) = registry.get(&binding.tree().kind(index)) else {
                continue;
            };
            for rule in matching {
                let reaction = Reaction::new(binding.node(index), rule.name())
                    .consumes(rule.consumed(binding, index))
                    .provides(rule.provided(binding, index))
                    .optional(rule.optional())
                    .trigger({
                        let rule = Rc::clone(rule);
                        let binding = binding.clone();
                        move |cx| rule.compute(cx, &binding, index)
                    });
                self.register(reaction);
                created += 1;
            }
        }

        debug!(rules = rules.name(), created, "installed rule set");
        created
    }
}
