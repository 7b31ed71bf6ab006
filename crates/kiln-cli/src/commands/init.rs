//! Implementation of the `kiln init` command.

use anyhow::{Context, Result};
use colored::Colorize;
use kiln_utils::{CONFIG_FILE, Config};
use std::path::Path;

/// Writes a default configuration in the current directory.
///
/// # Errors
/// Returns an error if kiln.toml already exists or cannot be written.
pub fn execute() -> Result<()> {
    let current_dir = std::env::current_dir().with_context(|| "Failed to get current directory")?;
    let name = init_in(&current_dir)?;

    println!("     {} Kiln project '{}'", "Created".green().bold(), name);
    Ok(())
}

/// Writes a default configuration named after `dir`. Returns the name.
///
/// # Errors
/// Returns an error if the configuration already exists or cannot be saved.
pub fn init_in(dir: &Path) -> Result<String> {
    let path = dir.join(CONFIG_FILE);
    if path.exists() {
        anyhow::bail!("{CONFIG_FILE} already exists in {}", dir.display());
    }

    let name = dir
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("kiln-project")
        .to_string();
    Config::new(name.as_str()).save(&path)?;
    Ok(name)
}
