//! Kiln CLI library for testing and reusability.

pub mod commands;
pub mod logging;
pub mod report;

pub use kiln_utils::Config;
