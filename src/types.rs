//! Common types used throughout tap-checkly
//!
//! This module contains shared type definitions, type aliases,
//! and utility types used across multiple modules.

use serde::{Deserialize, Serialize};

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// A single extracted record
pub type Record = JsonObject;

// ============================================================================
// Sync Mode
// ============================================================================

/// Synchronization mode for streams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Full refresh - fetch all data every time
    #[default]
    FullRefresh,
    /// Incremental - only fetch new/updated data
    Incremental,
}

// ============================================================================
// Validation Policy
// ============================================================================

/// What to do with a record that does not match its stream schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationPolicy {
    /// Report the violation and emit the record anyway
    #[default]
    Lenient,
    /// Report the violation and drop the record
    Strict,
}

// ============================================================================
// Backoff Type
// ============================================================================

/// Type of backoff for retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffType {
    /// Constant delay between retries
    Constant,
    /// Linear increase in delay
    Linear,
    /// Exponential increase in delay
    #[default]
    Exponential,
}

// ============================================================================
// Utilities
// ============================================================================

/// Extension trait for Option<String> to handle empty strings
pub trait OptionStringExt {
    /// Returns None if the string is empty
    fn none_if_empty(self) -> Option<String>;
}

impl OptionStringExt for Option<String> {
    fn none_if_empty(self) -> Option<String> {
        self.filter(|s| !s.trim().is_empty())
    }
}

impl OptionStringExt for String {
    fn none_if_empty(self) -> Option<String> {
        if self.trim().is_empty() {
            None
        } else {
            Some(self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_mode_serde() {
        let mode: SyncMode = serde_json::from_str("\"incremental\"").unwrap();
        assert_eq!(mode, SyncMode::Incremental);

        let json = serde_json::to_string(&SyncMode::FullRefresh).unwrap();
        assert_eq!(json, "\"full_refresh\"");
    }

    #[test]
    fn test_validation_policy_default_is_lenient() {
        assert_eq!(ValidationPolicy::default(), ValidationPolicy::Lenient);
        let policy: ValidationPolicy = serde_json::from_str("\"strict\"").unwrap();
        assert_eq!(policy, ValidationPolicy::Strict);
    }

    #[test]
    fn test_option_string_none_if_empty() {
        assert_eq!(
            Some("test".to_string()).none_if_empty(),
            Some("test".to_string())
        );
        assert_eq!(Some(String::new()).none_if_empty(), None);
        assert_eq!(Some("   ".to_string()).none_if_empty(), None);
        assert_eq!(None::<String>.none_if_empty(), None);
        assert_eq!("test".to_string().none_if_empty(), Some("test".to_string()));
        assert_eq!(String::new().none_if_empty(), None);
    }
}
