//! Extraction types
//!
//! Defines the lazy record sequence handed to the engine.

use crate::types::{JsonValue, Record};
use tracing::warn;

/// Records path used when a stream does not declare one
pub const DEFAULT_RECORDS_PATH: &str = "$[*]";

/// Single-pass sequence of the records found in one response
///
/// Elements that are not JSON objects are skipped with a warning.
#[derive(Debug)]
pub struct Records {
    inner: std::vec::IntoIter<JsonValue>,
    path: String,
    skipped: usize,
}

impl Records {
    pub(crate) fn new(values: Vec<JsonValue>, path: impl Into<String>) -> Self {
        Self {
            inner: values.into_iter(),
            path: path.into(),
            skipped: 0,
        }
    }

    /// An empty sequence
    pub fn empty() -> Self {
        Self::new(Vec::new(), DEFAULT_RECORDS_PATH)
    }

    /// Number of non-object elements skipped so far
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl Iterator for Records {
    type Item = Record;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.inner.next()? {
                JsonValue::Object(record) => return Some(record),
                other => {
                    self.skipped += 1;
                    warn!(
                        path = %self.path,
                        kind = value_kind(&other),
                        "Skipping element that is not a JSON object"
                    );
                }
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.inner.size_hint().1)
    }
}

fn value_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
