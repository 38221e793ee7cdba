//! Built-in Checkly stream catalog embedded in the binary
//!
//! The catalog YAML and every stream's JSON Schema are compiled in, so the
//! tap runs without any files besides its config and state.

use crate::config::TapConfig;
use crate::error::{Error, Result};
use crate::http::HttpClientConfig;
use crate::loader::{load_catalog_from_str, CatalogDefinition, StreamDefinition};
use crate::types::SyncMode;
use serde_json::{json, Value};
use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;
use tracing::debug;

/// Built-in catalog YAML
pub const BUILTIN_CATALOG: &str = include_str!("../catalog/checkly.yaml");

/// Built-in stream schemas, keyed by stream name
pub static BUILTIN_SCHEMAS: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| {
        let mut m = HashMap::new();

        // Alerting
        m.insert("alert_channels", include_str!("../schemas/alert_channels.json"));
        m.insert(
            "alert_notifications",
            include_str!("../schemas/alert_notifications.json"),
        );
        m.insert("check_alerts", include_str!("../schemas/check_alerts.json"));

        // Checks
        m.insert("checks", include_str!("../schemas/checks.json"));
        m.insert("check_groups", include_str!("../schemas/check_groups.json"));
        m.insert("check_results", include_str!("../schemas/check_results.json"));
        m.insert("snippets", include_str!("../schemas/snippets.json"));
        m.insert(
            "environment_variables",
            include_str!("../schemas/environment_variables.json"),
        );
        m.insert(
            "maintenance_windows",
            include_str!("../schemas/maintenance_windows.json"),
        );

        // Infrastructure
        m.insert("locations", include_str!("../schemas/locations.json"));
        m.insert(
            "private_locations",
            include_str!("../schemas/private_locations.json"),
        );
        m.insert("runtimes", include_str!("../schemas/runtimes.json"));

        // Reporting
        m.insert("dashboards", include_str!("../schemas/dashboards.json"));
        m.insert("status_pages", include_str!("../schemas/status_pages.json"));
        m.insert(
            "status_page_incidents",
            include_str!("../schemas/status_page_incidents.json"),
        );
        m.insert(
            "status_page_services",
            include_str!("../schemas/status_page_services.json"),
        );

        m
    });

/// Get a built-in stream schema by name
pub fn builtin_schema(stream: &str) -> Option<&'static str> {
    BUILTIN_SCHEMAS.get(stream).copied()
}

/// The set of streams a run syncs
///
/// A selected child pulls in its parent so it has records to fan out from.
/// Such a parent is fetched for context only and emits nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Streams to sync, in catalog order
    streams: Vec<String>,
    /// Streams whose records are emitted
    emitted: BTreeSet<String>,
}

impl Selection {
    /// Streams to sync, in catalog order
    pub fn streams(&self) -> &[String] {
        &self.streams
    }

    /// Whether a stream takes part in the run
    pub fn includes(&self, stream: &str) -> bool {
        self.streams.iter().any(|s| s == stream)
    }

    /// Whether a stream's records are emitted
    pub fn emits(&self, stream: &str) -> bool {
        self.emitted.contains(stream)
    }

    /// Number of streams in the run
    pub fn len(&self) -> usize {
        self.streams.len()
    }

    /// Check if nothing is selected
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}

/// Stream catalog
#[derive(Debug, Clone)]
pub struct Catalog {
    definition: CatalogDefinition,
}

impl Catalog {
    /// Load the built-in Checkly catalog
    pub fn builtin() -> Result<Self> {
        let definition = load_catalog_from_str(BUILTIN_CATALOG, |stream| {
            builtin_schema(stream).map(ToString::to_string)
        })?;
        Ok(Self { definition })
    }

    /// The underlying definition
    pub fn definition(&self) -> &CatalogDefinition {
        &self.definition
    }

    /// All streams in catalog order, regardless of gating
    pub fn streams(&self) -> &[StreamDefinition] {
        &self.definition.streams
    }

    /// Get a stream by name
    pub fn get(&self, name: &str) -> Option<&StreamDefinition> {
        self.definition.get(name)
    }

    /// Direct children of a stream, in catalog order
    pub fn children_of<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a StreamDefinition> {
        self.definition.children_of(name)
    }

    /// URL path used to verify credentials
    pub fn check_path(&self) -> &str {
        &self.definition.check.path
    }

    /// Streams available under a config, in catalog order
    ///
    /// Paid streams need `include_paid_streams`, and a child is only
    /// available when its parent is.
    pub fn discover(&self, config: &TapConfig) -> Vec<&StreamDefinition> {
        let mut available: Vec<&StreamDefinition> = Vec::new();
        for stream in &self.definition.streams {
            if stream.paid && !config.include_paid_streams {
                debug!(stream = %stream.name, "Skipping paid stream");
                continue;
            }
            if let Some(parent) = stream.parent_stream() {
                if !available.iter().any(|s| s.name == parent) {
                    debug!(stream = %stream.name, parent, "Skipping stream whose parent is unavailable");
                    continue;
                }
            }
            available.push(stream);
        }
        available
    }

    /// Resolve the streams to sync
    ///
    /// `None` selects every available stream. Unknown names fail with
    /// `StreamNotFound`; known names gated off by the config are rejected.
    pub fn select(&self, config: &TapConfig, names: Option<&[String]>) -> Result<Selection> {
        let available = self.discover(config);

        let Some(names) = names else {
            let streams: Vec<String> = available.iter().map(|s| s.name.clone()).collect();
            return Ok(Selection {
                emitted: streams.iter().cloned().collect(),
                streams,
            });
        };

        let mut emitted = BTreeSet::new();
        for name in names {
            if self.get(name).is_none() {
                return Err(Error::StreamNotFound {
                    stream: name.clone(),
                });
            }
            if !available.iter().any(|s| &s.name == name) {
                return Err(Error::invalid_value(
                    "streams",
                    format!("stream '{name}' requires include_paid_streams"),
                ));
            }
            emitted.insert(name.clone());
        }

        // Pull in ancestors of selected children
        let mut included = emitted.clone();
        for name in names {
            let mut current = self.get(name).and_then(StreamDefinition::parent_stream);
            while let Some(parent) = current {
                included.insert(parent.to_string());
                current = self.get(parent).and_then(StreamDefinition::parent_stream);
            }
        }

        let streams = available
            .iter()
            .filter(|s| included.contains(&s.name))
            .map(|s| s.name.clone())
            .collect();
        Ok(Selection { streams, emitted })
    }

    /// HTTP client configuration for a run
    pub fn http_client_config(&self, config: &TapConfig) -> HttpClientConfig {
        let base_url = config
            .api_url
            .as_deref()
            .unwrap_or(&self.definition.base_url);
        self.definition
            .http
            .client_config(base_url, &config.user_agent())
    }

    /// Discovery document listing every available stream
    pub fn discovery_json(&self, config: &TapConfig) -> Value {
        let streams: Vec<Value> = self
            .discover(config)
            .into_iter()
            .map(|stream| {
                let mode = stream.sync_mode();
                let mut modes = vec![SyncMode::FullRefresh];
                if mode == SyncMode::Incremental {
                    modes.push(mode);
                }
                json!({
                    "tap_stream_id": stream.name,
                    "stream": stream.name,
                    "description": stream.description,
                    "schema": stream.schema.to_json(),
                    "key_properties": stream.primary_key,
                    "replication_key": stream.replication_key,
                    "replication_method": match mode {
                        SyncMode::Incremental => "INCREMENTAL",
                        SyncMode::FullRefresh => "FULL_TABLE",
                    },
                    "supported_sync_modes": modes,
                    "parent_stream": stream.parent_stream(),
                })
            })
            .collect();
        json!({ "streams": streams })
    }
}
