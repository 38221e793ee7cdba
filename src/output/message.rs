//! Output messages
//!
//! Every line written by `read` is one of these, tagged by `type`.

use crate::schema::JsonSchema;
use crate::types::Record;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A message in the output stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    /// Describes the records of a stream; precedes its first record
    Schema {
        /// Stream name
        stream: String,
        /// JSON Schema of the records
        schema: Value,
        /// Primary key fields
        key_properties: Vec<String>,
        /// Replication key fields
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        bookmark_properties: Vec<String>,
    },
    /// One extracted record
    Record {
        /// Stream name
        stream: String,
        /// The record
        record: Record,
        /// When the record was extracted
        #[serde(default, skip_serializing_if = "Option::is_none")]
        time_extracted: Option<DateTime<Utc>>,
    },
    /// Checkpoint of the replication state
    State {
        /// Full state document
        value: Value,
    },
}

impl Message {
    /// Create a schema message
    pub fn schema(
        stream: impl Into<String>,
        schema: &JsonSchema,
        key_properties: Vec<String>,
        replication_key: Option<&str>,
    ) -> Self {
        Self::Schema {
            stream: stream.into(),
            schema: schema.to_json(),
            key_properties,
            bookmark_properties: replication_key.map(ToString::to_string).into_iter().collect(),
        }
    }

    /// Create a record message stamped with the current time
    pub fn record(stream: impl Into<String>, record: Record) -> Self {
        Self::Record {
            stream: stream.into(),
            record,
            time_extracted: Some(Utc::now()),
        }
    }

    /// Create a state message
    pub fn state(value: Value) -> Self {
        Self::State { value }
    }

    /// Stream the message belongs to, if any
    pub fn stream(&self) -> Option<&str> {
        match self {
            Self::Schema { stream, .. } | Self::Record { stream, .. } => Some(stream),
            Self::State { .. } => None,
        }
    }

    /// Check if this is a schema message
    pub fn is_schema(&self) -> bool {
        matches!(self, Self::Schema { .. })
    }

    /// Check if this is a record message
    pub fn is_record(&self) -> bool {
        matches!(self, Self::Record { .. })
    }

    /// Check if this is a state message
    pub fn is_state(&self) -> bool {
        matches!(self, Self::State { .. })
    }
}
