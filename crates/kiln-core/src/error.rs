//! Error types and result aliases for the Kiln engine.
//!
//! These are the failures that abort a run. Semantic problems found while
//! analysing a program are [`Diagnostic`](crate::Diagnostic)s instead.

use crate::Attribute;
use miette::Diagnostic;
use thiserror::Error;

/// Main error type for the Kiln engine.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// A rule supplied an attribute a second time with a different value.
    #[error("Attribute {attribute} already holds {existing}, cannot set it to {value}")]
    #[diagnostic(code(kiln::reactor::conflict))]
    AttributeConflict {
        attribute: Attribute,
        existing: String,
        value: String,
    },

    #[error("Unknown reaction: {0}")]
    UnknownReaction(u32),

    /// A class the analysis cannot proceed without could not be loaded.
    #[error("Could not load class: {0}")]
    #[diagnostic(code(kiln::resolve::fatal))]
    ClassLoad(String),

    #[error("Malformed class file: {0}")]
    ClassFormat(String),
}

/// Result type alias using the Kiln Error type.
pub type Result<T> = std::result::Result<T, Error>;
