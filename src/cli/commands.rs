//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Checkly tap: extract Checkly API resources as schema-tagged records
#[derive(Parser, Debug)]
#[command(name = "tap-checkly")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (JSON)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Inline config JSON
    #[arg(long, global = true)]
    pub config_json: Option<String>,

    /// State file (JSON), read at start and rewritten after each stream
    #[arg(short, long, global = true)]
    pub state: Option<PathBuf>,

    /// Inline state JSON
    #[arg(long, global = true)]
    pub state_json: Option<String>,

    /// Output format for non-record output
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Show the configuration specification
    Spec,

    /// Verify credentials against the API
    Check,

    /// Describe the streams available for the config
    Discover,

    /// Read data from streams
    Read {
        /// Streams to sync (comma-separated, empty = all)
        #[arg(long, value_delimiter = ',')]
        streams: Vec<String>,

        /// Drop records that fail schema validation
        #[arg(long)]
        strict: bool,
    },

    /// List available stream names (lightweight, no schemas)
    Streams,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}
