//! Core types and utilities for the Kiln analysis engine.
//!
//! This crate provides the identifiers, error types and diagnostics shared by
//! the reactor and the Java front-end.

pub mod attribute;
pub mod diagnostic;
pub mod error;

pub use attribute::{Attribute, NodeId, ReactionId};
pub use diagnostic::Diagnostic;
pub use error::{Error, Result};
