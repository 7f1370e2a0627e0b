//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Parser, Subcommand};
use std::io::BufRead;
use std::path::PathBuf;

/// lbpool - Manage Azure load balancer backend address pools.
#[derive(Parser, Debug)]
#[command(name = "lbpool")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, global = true, env = "LBPOOL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate the configuration.
    Validate {
        /// Show all warnings, not just errors.
        #[arg(short, long)]
        warnings: bool,
    },

    /// Print the backend address pool schema.
    Schema,

    /// Create the configured backend address pools.
    Create {
        /// Only create the pool with this name.
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Refresh tracked pools from Azure.
    Read {
        /// Only refresh the pool with this name.
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Delete tracked backend address pools.
    Delete {
        /// Only delete the pool with this name.
        #[arg(short, long)]
        name: Option<String>,

        /// Skip confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },

    /// Show the local state.
    Show,
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Reads one line of input and checks it against the confirmation word.
///
/// # Errors
///
/// Returns an error if the input cannot be read.
pub fn confirmed(input: &mut impl BufRead, word: &str) -> std::io::Result<bool> {
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim() == word)
}
