//! Demand-driven attribute evaluation.
//!
//! A [`Reactor`] owns a graph of [`Node`]s holding named attributes, and a set
//! of [`Reaction`]s that consume some attributes to provide others. A reaction
//! becomes runnable as soon as everything it consumes is available, so
//! computations run in data order rather than in tree traversal order.
//!
//! [`Rule`]s are templates that instantiate one reaction per matching syntax
//! node when a [`RuleSet`] is installed.

mod node;
mod reaction;
mod reactor;
mod rule;

pub use node::{Lookup, Node};
pub use reaction::{Reaction, Trigger};
pub use reactor::{Cx, Outcome, Reactor, Unresolved};
pub use rule::{Rule, RuleSet, Tree, TreeBinding};

pub use kiln_core::{Attribute, Diagnostic, NodeId, ReactionId};
