//! tap-checkly CLI
//!
//! Command-line interface for the Checkly tap. Messages go to stdout,
//! logs to stderr.

use clap::Parser;
use tap_checkly::cli::{Cli, Runner};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose
    let default_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_level.to_string())),
        )
        .init();

    let runner = Runner::new(cli);

    if let Err(e) = runner.run().await {
        tracing::error!(error = %e, "tap-checkly failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
