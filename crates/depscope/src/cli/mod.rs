//! CLI argument parsing and command dispatch.
//!
//! # Commands
//!
//! - `explore`: seed an engine, expand it against a fixture, apply scripted
//!   steps and print the result
//!
//! # Global Flags
//!
//! - `--json`: Output in JSON format
//!
//! # Example
//!
//! ```bash
//! depscope explore --seed pkg:npm/express --fixture npm.yaml --depth 2
//! depscope --json explore --seed pkg:npm/express --step collapse=pkg:npm/express@4.19.2
//! ```

mod args;
mod execute;

use anyhow::Result;
use clap::{Parser, Subcommand};

pub use args::{ExploreArgs, NodeKindArg, Step, parse_step, validate_node_id};

/// Depscope - incremental dependency graph explorer
///
/// Materializes a package dependency graph one neighborhood at a time.
#[derive(Parser, Debug)]
#[command(name = "depscope")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output in JSON format for programmatic use
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Expand a graph from a seed node and print it
    ///
    /// Neighborhoods are answered from a fixture file. After the initial
    /// expansion to `--depth`, each `--step` is applied in order.
    Explore(ExploreArgs),
}

impl Cli {
    /// Parse CLI arguments from command line
    #[must_use]
    pub fn parse_args() -> Self {
        <Self as Parser>::parse()
    }

    /// Parse CLI arguments from an iterator (for testing)
    ///
    /// # Errors
    ///
    /// Returns the clap error for invalid arguments.
    pub fn try_parse_from<I, T>(iter: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(iter)
    }

    /// Execute the CLI command
    ///
    /// # Errors
    ///
    /// Returns an error if configuration or fixture loading fails, a step
    /// names an unknown node, or output cannot be written.
    pub async fn execute(&self) -> Result<()> {
        use crate::output::OutputMode;

        let output_mode = if self.json {
            OutputMode::Json
        } else {
            OutputMode::Text
        };

        match &self.command {
            Commands::Explore(args) => execute::execute_explore(args, output_mode).await,
        }
    }
}
