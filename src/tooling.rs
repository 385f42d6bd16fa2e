//! Tooling & Integration Layer
//!
//! Command-line front end over the record resource hooks.

pub mod cli;

pub use cli::{Cli, CliContext, Commands};
