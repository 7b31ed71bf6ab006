//! Plain-text rendering of analysis results. Colors are added by the
//! commands.

use kiln_java::{ClassScope, JavaType, Origin};

pub fn origin_name(origin: Origin) -> &'static str {
    match origin {
        Origin::Bytecode => "bytecode",
        Origin::Reflection => "reflection",
        Origin::Source => "source",
    }
}

/// `java.util.Map$Entry (interface, bytecode)`, with an `ambiguous` marker
/// when the class shares its chain with another one.
pub fn describe_class(class: &ClassScope) -> String {
    let mut line = format!(
        "{} ({}, {})",
        class.canonical_name(),
        class.kind(),
        origin_name(class.origin())
    );
    if class.ambiguous_chain() {
        line.push_str(" [ambiguous]");
    }
    line
}

/// Splits a dotted chain into its components, ignoring empty ones.
pub fn parse_chain(chain: &str) -> Vec<String> {
    chain
        .split('.')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}
