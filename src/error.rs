//! Error types for tap-checkly
//!
//! This module defines the error hierarchy for the whole tap.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for tap-checkly
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Authentication Errors
    // ============================================================================
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    // ============================================================================
    // HTTP Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Rate limited, retry after {retry_after_seconds}s")]
    RateLimited { retry_after_seconds: u64 },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Data Processing Errors
    // ============================================================================
    #[error("Failed to extract records from path '{path}': {message}")]
    RecordExtraction { path: String, message: String },

    #[error("Failed to decode response: {message}")]
    Decode { message: String },

    #[error("Record in stream '{stream}' does not match its schema: {}", violations.join("; "))]
    SchemaValidation {
        stream: String,
        violations: Vec<String>,
    },

    #[error("Output error: {message}")]
    Output { message: String },

    // ============================================================================
    // State Errors
    // ============================================================================
    #[error("State error: {message}")]
    State { message: String },

    // ============================================================================
    // Catalog Errors
    // ============================================================================
    #[error("Stream '{stream}' not found in catalog")]
    StreamNotFound { stream: String },

    #[error("Stream '{stream}' failed: {message}")]
    StreamFailed { stream: String, message: String },

    // ============================================================================
    // Template Errors
    // ============================================================================
    #[error("Undefined variable in template: {variable}")]
    UndefinedVariable { variable: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an auth error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create an undefined variable error
    pub fn undefined_var(variable: impl Into<String>) -> Self {
        Self::UndefinedVariable {
            variable: variable.into(),
        }
    }

    /// Create a state error
    pub fn state(message: impl Into<String>) -> Self {
        Self::State {
            message: message.into(),
        }
    }

    /// Create an output error
    pub fn output(message: impl Into<String>) -> Self {
        Self::Output {
            message: message.into(),
        }
    }

    /// Create a stream failure wrapping the underlying cause
    pub fn stream_failed(stream: impl Into<String>, cause: &Error) -> Self {
        Self::StreamFailed {
            stream: stream.into(),
            message: cause.to_string(),
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(_) | Error::RateLimited { .. } | Error::Timeout { .. } => true,
            Error::HttpStatus { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }

    /// Check if this error must abort the whole run rather than a single stream
    ///
    /// Rejected credentials and broken configuration affect every stream alike.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Auth { .. }
                | Error::Config { .. }
                | Error::MissingConfigField { .. }
                | Error::InvalidConfigValue { .. }
                | Error::UndefinedVariable { .. }
        )
    }
}

/// Check if an HTTP status code is retryable
fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504 | 520..=524)
}

/// Result type alias for tap-checkly
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::missing_field("account_id");
        assert_eq!(err.to_string(), "Missing required config field: account_id");

        let err = Error::http_status(404, "Not found");
        assert_eq!(err.to_string(), "HTTP 404: Not found");
    }

    #[test]
    fn test_schema_validation_display() {
        let err = Error::SchemaValidation {
            stream: "checks".to_string(),
            violations: vec![
                "/id: expected string".to_string(),
                "/name: required".to_string(),
            ],
        };
        assert_eq!(
            err.to_string(),
            "Record in stream 'checks' does not match its schema: /id: expected string; /name: required"
        );
    }

    #[test]
    fn test_is_retryable() {
        assert!(Error::RateLimited {
            retry_after_seconds: 60
        }
        .is_retryable());
        assert!(Error::Timeout { timeout_ms: 1000 }.is_retryable());
        assert!(Error::http_status(429, "").is_retryable());
        assert!(Error::http_status(500, "").is_retryable());
        assert!(Error::http_status(503, "").is_retryable());

        assert!(!Error::http_status(400, "").is_retryable());
        assert!(!Error::http_status(404, "").is_retryable());
        assert!(!Error::auth("bad token").is_retryable());
        assert!(!Error::config("test").is_retryable());
    }

    #[test]
    fn test_is_fatal() {
        assert!(Error::auth("rejected").is_fatal());
        assert!(Error::missing_field("token").is_fatal());
        assert!(Error::undefined_var("checkId").is_fatal());

        assert!(!Error::http_status(500, "").is_fatal());
        assert!(!Error::decode("bad body").is_fatal());
        assert!(!Error::stream_failed("checks", &Error::decode("x")).is_fatal());
    }

    #[test]
    fn test_stream_failed_carries_cause() {
        let err = Error::stream_failed("checks", &Error::http_status(502, "Bad gateway"));
        assert_eq!(
            err.to_string(),
            "Stream 'checks' failed: HTTP 502: Bad gateway"
        );
    }
}
