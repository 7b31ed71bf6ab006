//! Attribute storage for graph nodes.

use kiln_core::ReactionId;
use std::collections::HashMap;

/// Result of looking an attribute up.
///
/// `Absent` means nothing was ever computed for the name. `None` means it was
/// computed and found not to exist, which is a definitive answer.
#[derive(Debug, PartialEq, Eq)]
pub enum Lookup<'a, V> {
    Absent,
    None,
    Value(&'a V),
}

impl<V> Clone for Lookup<'_, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for Lookup<'_, V> {}

impl<'a, V> Lookup<'a, V> {
    /// Whether a consumer of this attribute may run.
    pub fn is_available(&self) -> bool {
        !matches!(self, Lookup::Absent)
    }

    pub fn value(self) -> Option<&'a V> {
        match self {
            Lookup::Value(value) => Some(value),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub(crate) struct Slot<V> {
    pub(crate) value: Option<V>,
    /// The reaction that last wrote the slot from a trigger, with its run
    /// count at the time.
    pub(crate) supplier: Option<(ReactionId, u32)>,
}

/// A vertex of the attribute graph.
#[derive(Debug)]
pub struct Node<V> {
    label: String,
    pub(crate) values: HashMap<String, Slot<V>>,
    pub(crate) suppliers: HashMap<String, Vec<ReactionId>>,
    pub(crate) consumers: HashMap<String, Vec<ReactionId>>,
}

impl<V> Node<V> {
    pub(crate) fn new(label: String) -> Self {
        Self {
            label,
            values: HashMap::new(),
            suppliers: HashMap::new(),
            consumers: HashMap::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn get(&self, name: &str) -> Lookup<'_, V> {
        match self.values.get(name) {
            None => Lookup::Absent,
            Some(Slot { value: None, .. }) => Lookup::None,
            Some(Slot {
                value: Some(value), ..
            }) => Lookup::Value(value),
        }
    }

    /// Peeks at a stored value, treating absent and none alike.
    pub fn raw(&self, name: &str) -> Option<&V> {
        self.get(name).value()
    }

    pub fn is_available(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Names that currently hold a value or an explicit none.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Reactions registered as suppliers of `name`.
    pub fn suppliers(&self, name: &str) -> &[ReactionId] {
        self.suppliers.get(name).map_or(&[], Vec::as_slice)
    }

    /// Reactions waiting on `name`.
    pub fn consumers(&self, name: &str) -> &[ReactionId] {
        self.consumers.get(name).map_or(&[], Vec::as_slice)
    }
}
