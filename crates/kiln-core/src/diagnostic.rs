//! Semantic diagnostics reported while a reactor runs.
//!
//! Unlike [`Error`](crate::Error), a diagnostic never aborts the run: it is
//! appended to the reactor's error list and analysis carries on.

use crate::{Attribute, NodeId, ReactionId};
use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq, MietteDiagnostic)]
pub enum Diagnostic {
    /// An ill-typed construct. The node's type stays absent.
    #[error("{message}")]
    #[diagnostic(code(kiln::typing))]
    Type { node: NodeId, message: String },

    /// A class name that could not be resolved.
    #[error("Cannot resolve class '{name}'")]
    #[diagnostic(code(kiln::resolve::unresolved))]
    UnresolvedClass { node: NodeId, name: String },

    /// A class that has no field, method or member class of that name.
    #[error("Cannot find member '{member}' in class '{class}'")]
    #[diagnostic(code(kiln::resolve::member))]
    MemberNotFound { class: String, member: String },

    /// More than one class answers to the same chain.
    #[error("Ambiguous class definitions for '{chain}'")]
    #[diagnostic(code(kiln::resolve::ambiguous))]
    AmbiguousClass { chain: String },

    /// A reaction whose inputs never all became available.
    #[error("{reaction} never ran, missing: {}", list(.attributes))]
    #[diagnostic(code(kiln::reactor::unresolved))]
    UnresolvedDependency {
        reaction: ReactionId,
        attributes: Vec<Attribute>,
    },

    /// A reaction ran without reporting anything and without supplying
    /// everything it promised.
    #[error("{reaction} did not provide: {}", list(.attributes))]
    #[diagnostic(code(kiln::reactor::provision))]
    MissingProvision {
        reaction: ReactionId,
        attributes: Vec<Attribute>,
    },
}

impl Diagnostic {
    /// Builds a type error for the given node.
    pub fn type_error(node: NodeId, message: impl Into<String>) -> Self {
        Self::Type {
            node,
            message: message.into(),
        }
    }

    /// The syntax node the diagnostic points at, if any.
    pub fn node(&self) -> Option<NodeId> {
        match self {
            Self::Type { node, .. } | Self::UnresolvedClass { node, .. } => Some(*node),
            _ => None,
        }
    }
}

fn list(attributes: &[Attribute]) -> String {
    attributes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
