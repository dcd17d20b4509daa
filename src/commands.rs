//! CLI command definitions
//!
//! Defines the clap commands for the meetcheck CLI.

use clap::{Args, Subcommand};
use std::path::PathBuf;

/// Where the backend and its database live
///
/// Each flag overrides the environment, which overrides the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Config file (default: platform config directory)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Backend HTTP base URL, e.g. http://localhost:5000
    #[arg(long)]
    pub backend_url: Option<String>,

    /// WebSocket audio endpoint, e.g. ws://localhost:5000/audio
    #[arg(long)]
    pub ws_url: Option<String>,

    /// Postgres connection string for the database scenarios
    #[arg(long)]
    pub database_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a conformance suite against the backend
    Run {
        #[command(flatten)]
        target: TargetArgs,

        /// Built-in suite to run (see 'meetcheck list')
        #[arg(long, short, default_value = "full")]
        suite: String,

        /// Run a suite from a YAML file instead of a built-in one
        #[arg(long, conflicts_with = "suite")]
        suite_file: Option<PathBuf>,

        /// User id for every message and the user fixture
        #[arg(long)]
        user_id: Option<String>,

        /// Print the summary as JSON instead of progress output
        #[arg(long)]
        json: bool,
    },

    /// List the built-in suites
    List,

    /// Check that the backend, WebSocket endpoint and database are reachable
    Probe {
        #[command(flatten)]
        target: TargetArgs,
    },
}
