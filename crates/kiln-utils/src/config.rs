//! Configuration file handling for Kiln projects.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the configuration file searched for by [`Config::find`].
pub const CONFIG_FILE: &str = "kiln.toml";

/// Represents the kiln.toml configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub project: Project,
    #[serde(default)]
    pub analysis: Analysis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
}

/// Settings for one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Analysis {
    /// Directories searched for `.class` files, relative to the project root.
    #[serde(default)]
    pub classpath: Vec<PathBuf>,
    /// Canonical name prefixes eligible for reflective loading.
    #[serde(default = "default_reflective_prefixes")]
    pub reflective_prefixes: Vec<String>,
    #[serde(default)]
    pub conflict_policy: ConflictPolicy,
}

/// What to do when a second definition of a canonical name is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictPolicy {
    /// Keep the first registered definition.
    #[default]
    PreferFirst,
    /// Let a source definition replace one loaded from bytecode or reflection.
    PreferSource,
}

fn default_reflective_prefixes() -> Vec<String> {
    vec!["java.".to_string(), "javax.".to_string()]
}

impl Default for Analysis {
    fn default() -> Self {
        Self {
            classpath: Vec::new(),
            reflective_prefixes: default_reflective_prefixes(),
            conflict_policy: ConflictPolicy::default(),
        }
    }
}

impl Config {
    /// Creates a new default configuration with the given project name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            project: Project { name: name.into() },
            analysis: Analysis::default(),
        }
    }

    /// Loads configuration from a kiln.toml file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read {}", path.as_ref().display()))?;

        toml::from_str(&contents).with_context(|| format!("Failed to parse {CONFIG_FILE}"))
    }

    /// Saves configuration to a kiln.toml file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let contents =
            toml::to_string_pretty(self).with_context(|| "Failed to serialize configuration")?;

        fs::write(path.as_ref(), contents)
            .with_context(|| format!("Failed to write {}", path.as_ref().display()))
    }

    /// Finds the kiln.toml file starting from the current directory.
    ///
    /// # Errors
    /// Returns an error if no kiln.toml is found in the current or parent directories.
    pub fn find() -> Result<(Self, PathBuf)> {
        let current_dir =
            std::env::current_dir().with_context(|| "Failed to get current directory")?;
        Self::find_from(current_dir)
    }

    /// Finds the kiln.toml file starting from `start` and walking up.
    ///
    /// # Errors
    /// Returns an error if no kiln.toml is found in `start` or its ancestors.
    pub fn find_from(start: impl Into<PathBuf>) -> Result<(Self, PathBuf)> {
        let mut current_dir = start.into();

        loop {
            let config_path = current_dir.join(CONFIG_FILE);
            if config_path.exists() {
                let config = Self::load(&config_path)?;
                return Ok((config, current_dir));
            }

            if !current_dir.pop() {
                anyhow::bail!(
                    "Could not find {CONFIG_FILE} in current directory or any parent directory"
                );
            }
        }
    }

    /// Classpath entries resolved against the project root.
    #[must_use]
    pub fn classpath(&self, project_root: &Path) -> Vec<PathBuf> {
        self.analysis
            .classpath
            .iter()
            .map(|entry| project_root.join(entry))
            .collect()
    }
}
