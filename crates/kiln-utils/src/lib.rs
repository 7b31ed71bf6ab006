//! Shared utilities for Kiln tools.

mod config;

pub use config::{Analysis, CONFIG_FILE, Config, ConflictPolicy, Project};
