//! Record extractor and JSON path helpers

use super::types::{Records, DEFAULT_RECORDS_PATH};
use crate::error::{Error, Result};
use serde_json::Value;

/// Pulls the records of one stream out of a response body
#[derive(Debug, Clone)]
pub struct RecordExtractor {
    /// JSONPath to the records
    records_path: String,
}

impl Default for RecordExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_RECORDS_PATH)
    }
}

impl RecordExtractor {
    /// Create an extractor for a records path
    pub fn new(records_path: impl Into<String>) -> Self {
        Self {
            records_path: records_path.into(),
        }
    }

    /// The configured records path
    pub fn records_path(&self) -> &str {
        &self.records_path
    }

    /// Extract the records from a parsed body
    pub fn extract(&self, body: &Value) -> Result<Records> {
        let path = self.records_path.as_str();
        // Simple paths are walked by hand; jsonpath-rust handles wildcards
        let values = if path.contains('*') && !path.contains("[-") {
            extract_with_jsonpath(body, path)?
        } else {
            match extract_simple_path(body, path) {
                Some(Value::Array(arr)) => arr,
                Some(Value::Null) | None => Vec::new(),
                Some(v) => vec![v],
            }
        };
        Ok(Records::new(values, path))
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Extract a scalar at a dot-notation path as a string
///
/// Null, arrays and objects yield `None`.
pub fn extract_jsonpath(value: &Value, path: &str) -> Option<String> {
    match extract_simple_path(value, path)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Extract a value using simple dot-notation path
fn extract_simple_path(value: &Value, path: &str) -> Option<Value> {
    let path = path.strip_prefix('$').unwrap_or(path);
    let path = path.strip_prefix('.').unwrap_or(path);
    if path.is_empty() {
        return Some(value.clone());
    }

    let mut current = value;
    for part in path.split('.') {
        // Handle array indexing like "entries[0]" or "entries[-1]"
        if let Some(bracket_pos) = part.find('[') {
            let name = &part[..bracket_pos];
            let index_str = part[bracket_pos + 1..].trim_end_matches(']');

            if !name.is_empty() {
                current = current.get(name)?;
            }

            let index = index_str.parse::<i64>().ok()?;
            let Value::Array(arr) = current else {
                return None;
            };
            #[allow(
                clippy::cast_possible_truncation,
                clippy::cast_sign_loss,
                clippy::cast_possible_wrap
            )]
            let idx = if index < 0 {
                (arr.len() as i64 + index) as usize
            } else {
                index as usize
            };
            current = arr.get(idx)?;
        } else {
            current = current.get(part)?;
        }
    }

    Some(current.clone())
}

/// Extract records using jsonpath-rust
fn extract_with_jsonpath(value: &Value, path: &str) -> Result<Vec<Value>> {
    use jsonpath_rust::JsonPath;

    let jp = JsonPath::try_from(path).map_err(|e| Error::RecordExtraction {
        path: path.to_string(),
        message: format!("Invalid JSONPath: {e}"),
    })?;

    match jp.find(value) {
        Value::Array(arr) => Ok(arr),
        Value::Null => Ok(vec![]),
        other => Ok(vec![other]),
    }
}
