//! Implementation of the `kiln resolve` command.

use crate::report::{describe_class, parse_chain};
use anyhow::{Context, Result};
use colored::Colorize;
use kiln_core::Diagnostic;
use kiln_java::{ClassLookup, JavaReactor, Resolver};
use kiln_utils::{Analysis, Config};
use std::path::PathBuf;
use tracing::debug;

/// The answer for one chain.
#[derive(Debug)]
pub struct Resolution {
    pub chain: String,
    /// Rendered class, `None` if the chain denotes nothing.
    pub class: Option<String>,
}

/// Resolves `chains` with the given settings and returns one resolution
/// per chain and the diagnostics of the run.
///
/// # Errors
/// Returns an error if the run aborts or leaves reactions unresolved.
pub fn resolve_all(
    chains: &[String],
    analysis: Analysis,
    root: &std::path::Path,
) -> Result<(Vec<Resolution>, Vec<Diagnostic>)> {
    let mut resolver = Resolver::from_analysis(&analysis, root);
    let mut reactor = JavaReactor::new();
    reactor.set_attachment(analysis);
    resolver.attach(&mut reactor);

    let parsed: Vec<Vec<String>> = chains.iter().map(|chain| parse_chain(chain)).collect();
    for chain in &parsed {
        resolver.full_chain(&mut reactor, chain);
    }
    let outcome = reactor
        .run(&mut resolver)
        .with_context(|| "Resolution aborted")?;
    if !outcome.is_success() {
        anyhow::bail!("{} reaction(s) never ran", outcome.unresolved.len());
    }

    let resolutions = chains
        .iter()
        .zip(&parsed)
        .map(|(chain, parts)| {
            let class = match resolver.full_chain(&mut reactor, parts) {
                ClassLookup::Found(id) => Some(describe_class(resolver.class(id))),
                ClassLookup::NotFound | ClassLookup::Pending => None,
            };
            Resolution {
                chain: chain.clone(),
                class,
            }
        })
        .collect();
    Ok((resolutions, outcome.errors))
}

/// Resolves each chain and prints what it denotes.
///
/// # Errors
/// Returns an error if the configuration is invalid or the run fails.
pub fn execute(chains: &[String], extra_classpath: Vec<PathBuf>) -> Result<()> {
    let (mut analysis, root) = match Config::find() {
        Ok((config, root)) => (config.analysis, root),
        Err(e) => {
            debug!(error = %e, "no configuration found, using defaults");
            (Analysis::default(), PathBuf::from("."))
        }
    };
    let current_dir = std::env::current_dir().with_context(|| "Failed to get current directory")?;
    analysis
        .classpath
        .extend(extra_classpath.into_iter().map(|entry| current_dir.join(entry)));

    let (resolutions, diagnostics) = resolve_all(chains, analysis, &root)?;
    for resolution in &resolutions {
        match &resolution.class {
            Some(class) => println!("{} {} -> {class}", "Resolved".green().bold(), resolution.chain),
            None => println!("{} {}", "Not found".yellow().bold(), resolution.chain),
        }
    }
    for diagnostic in diagnostics {
        eprintln!("{:?}", miette::Report::new(diagnostic));
    }
    Ok(())
}
