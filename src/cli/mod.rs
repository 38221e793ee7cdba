//! CLI module
//!
//! Command-line interface for running the tap.
//!
//! # Commands
//!
//! - `spec` - Print the configuration specification
//! - `check` - Verify credentials against the API
//! - `discover` - Describe available streams
//! - `read` - Extract data from streams
//! - `streams` - List stream names (lightweight)

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
