//! State types for tracking sync progress
//!
//! These types are serialized to JSON and persisted between runs:
//!
//! ```json
//! {"bookmarks": {"check_results": {"replication_key": "created_at",
//!   "partitions": {"checkId=c1": {"replication_key": "created_at",
//!                                 "replication_key_value": "2024-01-01T00:00:00Z"}}}}}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Complete state of the tap
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Per-stream bookmarks
    #[serde(default)]
    pub bookmarks: BTreeMap<String, StreamState>,
}

impl State {
    /// Create a new empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get state for a stream
    pub fn get_stream(&self, stream: &str) -> Option<&StreamState> {
        self.bookmarks.get(stream)
    }

    /// Persisted watermark of a stream or one of its partitions
    pub fn watermark(&self, stream: &str, partition: Option<&str>) -> Option<&Value> {
        let stream_state = self.get_stream(stream)?;
        match partition {
            Some(key) => stream_state.get_partition(key)?.replication_key_value.as_ref(),
            None => stream_state.replication_key_value.as_ref(),
        }
    }
}

/// State for a single stream
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamState {
    /// Field the watermark was taken from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_key: Option<String>,

    /// Highest replication value emitted by a successful sync
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_key_value: Option<Value>,

    /// Per-partition state (for child streams)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub partitions: BTreeMap<String, PartitionState>,
}

impl StreamState {
    /// Get partition state
    pub fn get_partition(&self, partition_key: &str) -> Option<&PartitionState> {
        self.partitions.get(partition_key)
    }
}

/// State for a single partition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartitionState {
    /// Field the watermark was taken from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_key: Option<String>,

    /// Highest replication value emitted within this partition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_key_value: Option<Value>,
}
