//! Implementation of the `kiln candidates` command.

use crate::report::parse_chain;
use anyhow::Result;
use colored::Colorize;
use kiln_java::derive_candidates;

/// Prints every canonical name `chain` may denote, least nested first.
///
/// # Errors
/// Returns an error if the chain is empty.
pub fn execute(chain: &str) -> Result<()> {
    let parts = parse_chain(chain);
    if parts.is_empty() {
        anyhow::bail!("Empty class chain '{chain}'");
    }

    for (i, candidate) in derive_candidates(&parts).iter().enumerate() {
        println!("{:>4} {candidate}", format!("{}.", i + 1).dimmed());
    }
    Ok(())
}
