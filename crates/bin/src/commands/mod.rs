//! Subcommand implementations.

pub mod demo;
pub mod history;
pub mod snapshot;
