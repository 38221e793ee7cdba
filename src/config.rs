//! Tap configuration
//!
//! The user-supplied settings for a run: credentials, the incremental
//! floor, stream gating and a few operational overrides.

use crate::error::{Error, Result};
use crate::state::parse_timestamp;
use crate::types::{OptionStringExt, ValidationPolicy};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;

/// Base URL of the Checkly public API
pub const DEFAULT_API_URL: &str = "https://api.checklyhq.com/v1";

/// Configuration for a tap run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TapConfig {
    /// Checkly account ID, sent as `X-Checkly-Account`
    #[serde(default)]
    pub account_id: String,

    /// API token, sent as a bearer token
    #[serde(default)]
    pub token: String,

    /// Earliest datetime to get data from (incremental streams only)
    #[serde(default)]
    pub start_date: Option<String>,

    /// Include streams that require a paid Checkly plan
    #[serde(default)]
    pub include_paid_streams: bool,

    /// Override for the API base URL
    #[serde(default)]
    pub api_url: Option<String>,

    /// How to treat records that fail schema validation
    #[serde(default)]
    pub validation: ValidationPolicy,

    /// Override for the User-Agent header
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl TapConfig {
    /// Create a config with the two required credentials
    pub fn new(account_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            token: token.into(),
            ..Default::default()
        }
    }

    /// Parse a config from a JSON string and validate it
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::config(format!("Invalid config JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a JSON file and validate it
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read config file '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_json_str(&content)
    }

    /// Set the start date
    #[must_use]
    pub fn with_start_date(mut self, start_date: impl Into<String>) -> Self {
        self.start_date = Some(start_date.into());
        self
    }

    /// Set the API base URL
    #[must_use]
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    /// Enable or disable paid-tier streams
    #[must_use]
    pub fn with_paid_streams(mut self, include: bool) -> Self {
        self.include_paid_streams = include;
        self
    }

    /// Set the validation policy
    #[must_use]
    pub fn with_validation(mut self, policy: ValidationPolicy) -> Self {
        self.validation = policy;
        self
    }

    /// Check required fields and value formats
    pub fn validate(&self) -> Result<()> {
        if self.account_id.clone().none_if_empty().is_none() {
            return Err(Error::missing_field("account_id"));
        }
        if self.token.clone().none_if_empty().is_none() {
            return Err(Error::missing_field("token"));
        }
        self.start_date()?;
        if let Some(url) = &self.api_url {
            url::Url::parse(url).map_err(|e| Error::invalid_value("api_url", e.to_string()))?;
        }
        Ok(())
    }

    /// The parsed start date, if configured
    pub fn start_date(&self) -> Result<Option<DateTime<Utc>>> {
        match self.start_date.clone().none_if_empty() {
            Some(raw) => parse_timestamp(&raw)
                .map(Some)
                .ok_or_else(|| Error::invalid_value("start_date", format!("'{raw}' is not a datetime"))),
            None => Ok(None),
        }
    }

    /// The API base URL to use
    pub fn api_url(&self) -> &str {
        self.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }

    /// The User-Agent header value
    pub fn user_agent(&self) -> String {
        self.user_agent
            .clone()
            .none_if_empty()
            .unwrap_or_else(|| format!("{}/{}", crate::NAME, crate::VERSION))
    }
}

/// JSON Schema of the accepted configuration, printed by the `spec` command
pub fn config_spec() -> Value {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "required": ["account_id", "token"],
        "properties": {
            "account_id": {
                "type": "string",
                "description": "Checkly Account ID"
            },
            "token": {
                "type": "string",
                "description": "API Token for Checkly",
                "secret": true
            },
            "start_date": {
                "type": "string",
                "format": "date-time",
                "description": "Earliest datetime to get data from"
            },
            "include_paid_streams": {
                "type": "boolean",
                "default": false,
                "description": "Include streams that require a paid Checkly plan"
            },
            "api_url": {
                "type": "string",
                "default": DEFAULT_API_URL,
                "description": "Base URL of the Checkly API"
            },
            "validation": {
                "type": "string",
                "enum": ["lenient", "strict"],
                "default": "lenient",
                "description": "Emit (lenient) or drop (strict) records that fail schema validation"
            },
            "user_agent": {
                "type": "string",
                "description": "User-Agent header sent with every request"
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_config_from_json() {
        let config = TapConfig::from_json_str(
            r#"{"account_id": "acc-1", "token": "tok", "start_date": "2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();

        assert_eq!(config.account_id, "acc-1");
        assert!(!config.include_paid_streams);
        assert_eq!(config.validation, ValidationPolicy::Lenient);
        assert_eq!(
            config.start_date().unwrap(),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(config.api_url(), DEFAULT_API_URL);
    }

    #[test]
    fn test_config_missing_account_id() {
        let err = TapConfig::from_json_str(r#"{"token": "tok"}"#).unwrap_err();
        assert!(matches!(err, Error::MissingConfigField { field } if field == "account_id"));
    }

    #[test]
    fn test_config_blank_token() {
        let err = TapConfig::from_json_str(r#"{"account_id": "a", "token": "  "}"#).unwrap_err();
        assert!(matches!(err, Error::MissingConfigField { field } if field == "token"));
    }

    #[test]
    fn test_config_invalid_start_date() {
        let err = TapConfig::new("a", "t")
            .with_start_date("yesterday")
            .validate()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfigValue { field, .. } if field == "start_date"));
    }

    #[test]
    fn test_config_bare_date_start() {
        let config = TapConfig::new("a", "t").with_start_date("2023-06-15");
        assert_eq!(
            config.start_date().unwrap(),
            Some(Utc.with_ymd_and_hms(2023, 6, 15, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_config_invalid_api_url() {
        let err = TapConfig::new("a", "t")
            .with_api_url("not a url")
            .validate()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfigValue { field, .. } if field == "api_url"));
    }

    #[test]
    fn test_config_user_agent_default() {
        let config = TapConfig::new("a", "t");
        assert_eq!(
            config.user_agent(),
            format!("tap-checkly/{}", env!("CARGO_PKG_VERSION"))
        );
    }

    #[test]
    fn test_config_spec_lists_required_fields() {
        let spec = config_spec();
        assert_eq!(spec["required"], json!(["account_id", "token"]));
        assert_eq!(spec["properties"]["include_paid_streams"]["default"], false);
    }
}
