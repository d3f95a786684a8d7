//! Command-line interface for refagent.

pub mod commands;

pub use commands::Cli;
