//! Loader types
//!
//! Declarative catalog definition types for YAML parsing.

use crate::config::DEFAULT_API_URL;
use crate::decode::DEFAULT_RECORDS_PATH;
use crate::http::{HttpClientConfig, RateLimiterConfig};
use crate::pagination::PaginationConfig;
use crate::partition::ParentLink;
use crate::schema::JsonSchema;
use crate::state::ReplicationKind;
use crate::types::SyncMode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

// ============================================================================
// Catalog Definition
// ============================================================================

/// Top-level catalog definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CatalogDefinition {
    /// Catalog name
    pub name: String,
    /// Catalog version
    #[serde(default = "default_version")]
    pub version: String,
    /// Base URL for all requests
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// HTTP client configuration
    #[serde(default)]
    pub http: HttpDefinition,
    /// Connection check configuration
    #[serde(default)]
    pub check: CheckDefinition,
    /// Stream definitions, in sync order
    pub streams: Vec<StreamDefinition>,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

fn default_base_url() -> String {
    DEFAULT_API_URL.to_string()
}

impl CatalogDefinition {
    /// Get a stream by name
    pub fn get(&self, name: &str) -> Option<&StreamDefinition> {
        self.streams.iter().find(|s| s.name == name)
    }

    /// Streams whose parent is `name`, in catalog order
    pub fn children_of<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a StreamDefinition> {
        self.streams
            .iter()
            .filter(move |s| s.parent.as_ref().is_some_and(|p| p.stream == name))
    }
}

/// Connection check configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CheckDefinition {
    /// URL path for check endpoint
    pub path: String,
}

impl Default for CheckDefinition {
    fn default() -> Self {
        Self {
            path: "/locations".to_string(),
        }
    }
}

// ============================================================================
// HTTP Definition
// ============================================================================

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct HttpDefinition {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Maximum retries
    #[serde(default = "default_retries")]
    pub max_retries: u32,
    /// Rate limit (requests per second)
    #[serde(default)]
    pub rate_limit_rps: Option<u32>,
}

impl Default for HttpDefinition {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            max_retries: default_retries(),
            rate_limit_rps: None,
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_retries() -> u32 {
    3
}

impl HttpDefinition {
    /// Build the client configuration for a base URL and user agent
    pub fn client_config(&self, base_url: &str, user_agent: &str) -> HttpClientConfig {
        let builder = HttpClientConfig::builder()
            .base_url(base_url)
            .timeout(Duration::from_secs(self.timeout_secs))
            .max_retries(self.max_retries)
            .user_agent(user_agent);
        match self.rate_limit_rps {
            Some(rps) => builder.rate_limit(RateLimiterConfig::per_second(rps)),
            None => builder.no_rate_limit(),
        }
        .build()
    }
}

// ============================================================================
// Stream Definition
// ============================================================================

/// Stream definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StreamDefinition {
    /// Stream name
    pub name: String,
    /// URL path, may contain `{{ placeholder }}`s filled from the parent context
    pub path: String,
    /// Primary key fields
    #[serde(default)]
    pub primary_key: Vec<String>,
    /// Field used as the incremental watermark
    #[serde(default)]
    pub replication_key: Option<String>,
    /// Pagination configuration
    #[serde(default)]
    pub pagination: PaginationConfig,
    /// JSONPath to the records in a response
    #[serde(default = "default_records_path")]
    pub records_path: String,
    /// Static query parameters
    #[serde(default)]
    pub params: BTreeMap<String, String>,
    /// Parent stream link (for child streams)
    #[serde(default)]
    pub parent: Option<ParentLink>,
    /// Requires a paid plan
    #[serde(default)]
    pub paid: bool,
    /// Human readable description
    #[serde(default)]
    pub description: Option<String>,
    /// Record schema, attached from the schema documents at load time
    #[serde(skip)]
    pub schema: JsonSchema,
}

fn default_records_path() -> String {
    DEFAULT_RECORDS_PATH.to_string()
}

impl StreamDefinition {
    /// Whether the stream syncs incrementally
    pub fn is_incremental(&self) -> bool {
        self.replication_key.is_some()
    }

    /// Sync mode advertised for the stream
    pub fn sync_mode(&self) -> SyncMode {
        if self.is_incremental() {
            SyncMode::Incremental
        } else {
            SyncMode::FullRefresh
        }
    }

    /// How replication values compare, from the schema of the replication key
    pub fn replication_kind(&self) -> ReplicationKind {
        ReplicationKind::from_property(
            self.replication_key
                .as_deref()
                .and_then(|key| self.schema.get_property(key)),
        )
    }

    /// Name of the parent stream, if any
    pub fn parent_stream(&self) -> Option<&str> {
        self.parent.as_ref().map(|p| p.stream.as_str())
    }
}
