//! # tap-checkly
//!
//! Extracts resources from the Checkly monitoring API (checks, alerts,
//! dashboards, status pages and more) and emits them as schema-tagged
//! records with incremental replication state.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tap_checkly::{
//!     auth::AuthConfig, catalog::Catalog, config::TapConfig, engine::SyncEngine,
//!     http::HttpClient, output::JsonLinesSink, state::StateManager,
//! };
//!
//! #[tokio::main]
//! async fn main() -> tap_checkly::Result<()> {
//!     let config = TapConfig::new("account-id", "cu_token");
//!     let catalog = Catalog::builtin()?;
//!     let selection = catalog.select(&config, None)?;
//!     let client = HttpClient::with_auth(
//!         catalog.http_client_config(&config),
//!         AuthConfig::checkly(&config.account_id, &config.token),
//!     )?;
//!
//!     let mut engine = SyncEngine::new(client, catalog, StateManager::in_memory(), JsonLinesSink::stdout());
//!     let report = engine.run(selection).await?;
//!     assert!(report.is_success());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         SyncEngine                              │
//! │  catalog order → parent record → child partitions → STATE       │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬───────────┬─────────────┐
//! │ Request  │   HTTP    │   Paginate    │ Partition │   Output    │
//! ├──────────┼───────────┼───────────────┼───────────┼─────────────┤
//! │ Path tpl │ Bearer    │ Page number   │ Parent    │ SCHEMA      │
//! │ from=    │ Retry     │ Cursor        │ context   │ RECORD      │
//! │ Paging   │ Rate Limit│ None          │           │ STATE       │
//! └──────────┴───────────┴───────────────┴───────────┴─────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Tap configuration
pub mod config;

/// Authentication
pub mod auth;

/// HTTP client with retry and rate limiting
pub mod http;

/// Pagination strategies
pub mod pagination;

/// Parent to child partitioning
pub mod partition;

/// Record extraction from responses
pub mod decode;

/// JSON Schema types and record validation
pub mod schema;

/// Replication state and persistence
pub mod state;

/// Path template interpolation
pub mod template;

/// YAML loader for stream catalogs
pub mod loader;

/// Built-in Checkly catalog
pub mod catalog;

/// Request construction
pub mod request;

/// Output messages and sinks
pub mod output;

/// Main execution engine
pub mod engine;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

pub use catalog::Catalog;
pub use config::TapConfig;
pub use engine::{SyncEngine, SyncReport};
pub use loader::{load_catalog_from_str, CatalogDefinition, StreamDefinition};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
