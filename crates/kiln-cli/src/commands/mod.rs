//! Command implementations for the Kiln CLI.

pub mod candidates;
pub mod init;
pub mod resolve;
