//! CLI module for the lbpool tool.
//!
//! This module provides the command-line interface for driving the
//! backend address pool lifecycle from a configuration file.

mod commands;
mod output;

pub use commands::{confirmed, Cli, Commands, OutputFormat};
pub use output::OutputFormatter;
