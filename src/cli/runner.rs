//! CLI runner - executes commands

use crate::auth::AuthConfig;
use crate::catalog::Catalog;
use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::{config_spec, TapConfig};
use crate::engine::{SyncConfig, SyncEngine, SyncReport};
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::output::JsonLinesSink;
use crate::request::RequestBuilder;
use crate::state::StateManager;
use crate::types::ValidationPolicy;
use serde_json::{json, Value};
use tracing::{error, info};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Spec => self.spec(),
            Commands::Check => self.check().await,
            Commands::Discover => self.discover(),
            Commands::Read { streams, strict } => self.read(streams, *strict).await,
            Commands::Streams => self.streams(),
        }
    }

    /// Load the tap configuration; inline JSON takes precedence over the file
    fn load_config(&self) -> Result<TapConfig> {
        if let Some(json_str) = &self.cli.config_json {
            return TapConfig::from_json_str(json_str);
        }
        if let Some(path) = &self.cli.config {
            return TapConfig::from_file(path);
        }
        Err(Error::config(
            "No configuration given (use --config or --config-json)",
        ))
    }

    /// Load state; inline JSON seeds the state and `--state` is where it is written
    fn load_state(&self) -> Result<StateManager> {
        match (&self.cli.state_json, &self.cli.state) {
            (Some(state_json), Some(path)) => Ok(StateManager::from_json(state_json)?.persist_to(path)),
            (Some(state_json), None) => StateManager::from_json(state_json),
            (None, Some(path)) => StateManager::from_file(path),
            (None, None) => Ok(StateManager::in_memory()),
        }
    }

    /// Authenticated client for the catalog's API
    fn client(catalog: &Catalog, config: &TapConfig) -> Result<HttpClient> {
        HttpClient::with_auth(
            catalog.http_client_config(config),
            AuthConfig::checkly(&config.account_id, &config.token),
        )
    }

    /// Print the configuration specification
    fn spec(&self) -> Result<()> {
        self.output_message(&json!({
            "type": "SPEC",
            "spec": {
                "documentationUrl": "https://developers.checklyhq.com/reference",
                "connectionSpecification": config_spec()
            }
        }));
        Ok(())
    }

    /// Check connection
    async fn check(&self) -> Result<()> {
        let config = self.load_config()?;
        let catalog = Catalog::builtin()?;
        let client = Self::client(&catalog, &config)?;

        info!(url = config.api_url(), "Checking connection");
        match client.get_json(catalog.check_path()).await {
            Ok(_) => {
                self.output_message(&json!({
                    "type": "CONNECTION_STATUS",
                    "connectionStatus": {
                        "status": "SUCCEEDED",
                        "message": "Connection successful"
                    }
                }));
                Ok(())
            }
            Err(e) => {
                self.output_message(&json!({
                    "type": "CONNECTION_STATUS",
                    "connectionStatus": {
                        "status": "FAILED",
                        "message": format!("Connection failed: {e}")
                    }
                }));
                Err(e)
            }
        }
    }

    /// Discover streams
    fn discover(&self) -> Result<()> {
        let config = self.load_config()?;
        let catalog = Catalog::builtin()?;
        let mut doc = catalog.discovery_json(&config);
        if let Value::Object(map) = &mut doc {
            map.insert("type".to_string(), json!("CATALOG"));
        }
        self.output_message(&doc);
        Ok(())
    }

    /// List stream names
    ///
    /// Without a config every stream is listed; with one, only those it unlocks.
    fn streams(&self) -> Result<()> {
        let catalog = Catalog::builtin()?;
        let names: Vec<&str> = if self.cli.config.is_some() || self.cli.config_json.is_some() {
            let config = self.load_config()?;
            catalog
                .discover(&config)
                .into_iter()
                .map(|s| s.name.as_str())
                .collect()
        } else {
            catalog.streams().iter().map(|s| s.name.as_str()).collect()
        };

        self.output_message(&json!({
            "type": "STREAMS",
            "streams": names,
            "catalog": catalog.definition().name
        }));
        Ok(())
    }

    /// Read data from streams
    async fn read(&self, streams: &[String], strict: bool) -> Result<()> {
        let mut config = self.load_config()?;
        if strict {
            config.validation = ValidationPolicy::Strict;
        }

        let catalog = Catalog::builtin()?;
        let names = (!streams.is_empty()).then_some(streams);
        let selection = catalog.select(&config, names)?;
        if selection.is_empty() {
            info!("No streams selected");
            return Ok(());
        }

        let client = Self::client(&catalog, &config)?;
        let state = self.load_state()?;
        let mut engine = SyncEngine::new(client, catalog, state, JsonLinesSink::stdout())
            .with_config(SyncConfig::from_tap_config(&config)?)
            .with_request_builder(RequestBuilder::from_tap_config(&config));

        info!(streams = selection.len(), "Starting sync");
        let report = engine.run(selection).await?;
        Self::summarize(&report)
    }

    /// Log the per-stream summary and fail if any stream failed
    fn summarize(report: &SyncReport) -> Result<()> {
        for outcome in &report.outcomes {
            info!(
                stream = %outcome.stream,
                phase = %outcome.phase,
                records = outcome.records,
                "Stream summary"
            );
        }
        let stats = &report.stats;
        info!(
            records = stats.total_records(),
            pages = stats.pages_fetched,
            partitions = stats.partitions_synced,
            filtered = stats.records_filtered,
            invalid = stats.records_invalid,
            dropped = stats.records_dropped,
            duration_ms = stats.duration_ms,
            "Sync finished"
        );

        let failed: Vec<&str> = report.failed().map(|o| o.stream.as_str()).collect();
        if failed.is_empty() {
            return Ok(());
        }
        for outcome in report.failed() {
            error!(
                stream = %outcome.stream,
                error = outcome.error.as_deref().unwrap_or("unknown"),
                "Stream failed"
            );
        }
        Err(Error::Other(format!(
            "{} stream(s) failed: {}",
            failed.len(),
            failed.join(", ")
        )))
    }

    /// Output a message
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}
