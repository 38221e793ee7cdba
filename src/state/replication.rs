//! Replication watermarks
//!
//! Tracks the highest replication-key value seen per stream and per
//! partition. Values observed during a sync stay pending until the stream
//! completes; only then are they committed into the persisted bookmark, so
//! a failed sync never moves the watermark past data that was not emitted.

use super::types::{PartitionState, StreamState};
use crate::schema::{JsonType, SchemaProperty};
use crate::types::Record;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Parse a timestamp in RFC 3339, naive ISO 8601 (assumed UTC) or bare date form
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// How replication values of a field compare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplicationKind {
    /// `format: date-time` strings, compared as instants
    Timestamp,
    /// integer or number fields, compared numerically
    Numeric,
    /// anything else, compared as strings
    #[default]
    Text,
}

impl ReplicationKind {
    /// Derive the kind from the schema property of the replication key
    pub fn from_property(property: Option<&SchemaProperty>) -> Self {
        let Some(property) = property else {
            return Self::Text;
        };
        if property.format.as_deref() == Some("date-time") {
            return Self::Timestamp;
        }
        match property.primary_type() {
            Some(JsonType::Integer | JsonType::Number) => Self::Numeric,
            _ => Self::Text,
        }
    }
}

/// A typed replication-key value
#[derive(Debug, Clone, PartialEq)]
pub enum ReplicationValue {
    Timestamp(DateTime<Utc>),
    Number(f64),
    Text(String),
}

impl ReplicationValue {
    /// Interpret a JSON value according to the field kind
    ///
    /// Null and unparseable values yield `None`.
    pub fn parse(kind: ReplicationKind, value: &Value) -> Option<Self> {
        match (kind, value) {
            (_, Value::Null) => None,
            (ReplicationKind::Timestamp, Value::String(s)) => parse_timestamp(s).map(Self::Timestamp),
            (ReplicationKind::Timestamp, Value::Number(n)) => n
                .as_i64()
                .and_then(|secs| DateTime::from_timestamp(secs, 0))
                .map(Self::Timestamp),
            (ReplicationKind::Numeric, Value::Number(n)) => n.as_f64().map(Self::Number),
            (ReplicationKind::Numeric, Value::String(s)) => s.trim().parse().ok().map(Self::Number),
            (ReplicationKind::Text, Value::String(s)) => Some(Self::Text(s.clone())),
            (ReplicationKind::Text, other) => Some(Self::Text(other.to_string())),
            _ => None,
        }
    }

    /// JSON form stored in bookmarks
    pub fn to_json(&self) -> Value {
        match self {
            Self::Timestamp(dt) => Value::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Self::Number(n) => serde_json::Number::from_f64(*n)
                .map_or(Value::Null, Value::Number),
            Self::Text(s) => Value::String(s.clone()),
        }
    }

    /// Seconds since the Unix epoch, for the server-side `from` filter
    #[allow(clippy::cast_possible_truncation)]
    pub fn epoch_seconds(&self) -> Option<i64> {
        match self {
            Self::Timestamp(dt) => Some(dt.timestamp()),
            Self::Number(n) if n.is_finite() => Some(n.trunc() as i64),
            _ => None,
        }
    }
}

impl PartialOrd for ReplicationValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Timestamp(a), Self::Timestamp(b)) => a.partial_cmp(b),
            (Self::Number(a), Self::Number(b)) => a.partial_cmp(b),
            (Self::Text(a), Self::Text(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl From<DateTime<Utc>> for ReplicationValue {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::Timestamp(dt)
    }
}

impl std::fmt::Display for ReplicationValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.to_json() {
            Value::String(s) => write!(f, "{s}"),
            other => write!(f, "{other}"),
        }
    }
}

/// Keep the larger of two optional values
fn max_value(current: Option<ReplicationValue>, candidate: ReplicationValue) -> ReplicationValue {
    match current {
        Some(current) if current >= candidate => current,
        _ => candidate,
    }
}

/// Watermarks of one incremental stream
#[derive(Debug, Clone)]
struct StreamWatermarks {
    key: String,
    kind: ReplicationKind,
    committed: BTreeMap<Option<String>, ReplicationValue>,
    pending: BTreeMap<Option<String>, ReplicationValue>,
}

/// Per-stream, per-partition high-water-mark tracking
#[derive(Debug, Clone, Default)]
pub struct ReplicationState {
    streams: BTreeMap<String, StreamWatermarks>,
}

impl ReplicationState {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an incremental stream, seeding it from its persisted bookmark
    pub fn register(
        &mut self,
        stream: &str,
        key: &str,
        kind: ReplicationKind,
        persisted: Option<&StreamState>,
    ) {
        let mut committed = BTreeMap::new();
        if let Some(bookmark) = persisted {
            if bookmark.replication_key.as_deref().is_some_and(|k| k != key) {
                warn!(
                    stream,
                    stored = ?bookmark.replication_key,
                    key,
                    "Bookmark was taken from a different replication key, ignoring it"
                );
            } else {
                let values = std::iter::once((None, bookmark.replication_key_value.as_ref()))
                    .chain(
                        bookmark
                            .partitions
                            .iter()
                            .map(|(k, p)| (Some(k.clone()), p.replication_key_value.as_ref())),
                    );
                for (partition, raw) in values {
                    if let Some(value) = raw.and_then(|v| ReplicationValue::parse(kind, v)) {
                        committed.insert(partition, value);
                    }
                }
            }
        }

        self.streams.insert(
            stream.to_string(),
            StreamWatermarks {
                key: key.to_string(),
                kind,
                committed,
                pending: BTreeMap::new(),
            },
        );
    }

    /// Replication key and kind of a registered stream
    pub fn key_of(&self, stream: &str) -> Option<(&str, ReplicationKind)> {
        self.streams.get(stream).map(|s| (s.key.as_str(), s.kind))
    }

    /// Parse the replication value carried by a record
    pub fn value_of(&self, stream: &str, record: &Record) -> Option<ReplicationValue> {
        let watermarks = self.streams.get(stream)?;
        record
            .get(&watermarks.key)
            .and_then(|v| ReplicationValue::parse(watermarks.kind, v))
    }

    /// Persisted watermark, before anything observed in this sync
    pub fn committed(&self, stream: &str, partition: Option<&str>) -> Option<&ReplicationValue> {
        self.streams
            .get(stream)?
            .committed
            .get(&partition.map(ToString::to_string))
    }

    /// Current watermark: the larger of persisted and pending
    pub fn watermark(&self, stream: &str, partition: Option<&str>) -> Option<ReplicationValue> {
        let watermarks = self.streams.get(stream)?;
        let key = partition.map(ToString::to_string);
        let committed = watermarks.committed.get(&key).cloned();
        match watermarks.pending.get(&key) {
            Some(pending) => Some(max_value(committed, pending.clone())),
            None => committed,
        }
    }

    /// Lower bound for a sync: the persisted watermark, raised to `floor`
    pub fn starting_watermark(
        &self,
        stream: &str,
        partition: Option<&str>,
        floor: Option<DateTime<Utc>>,
    ) -> Option<ReplicationValue> {
        let committed = self.committed(stream, partition).cloned();
        let floor = floor.and_then(|dt| {
            let (_, kind) = self.key_of(stream)?;
            match kind {
                ReplicationKind::Timestamp => Some(ReplicationValue::Timestamp(dt)),
                // A date floor means nothing to a numeric or text key
                _ => None,
            }
        });
        match (committed, floor) {
            (Some(c), Some(f)) => Some(max_value(Some(c), f)),
            (c, f) => c.or(f),
        }
    }

    /// Record the replication value of an emitted record
    ///
    /// Returns the value observed, if the record carried one.
    pub fn observe(
        &mut self,
        stream: &str,
        partition: Option<&str>,
        record: &Record,
    ) -> Option<ReplicationValue> {
        let value = self.value_of(stream, record)?;
        let watermarks = self.streams.get_mut(stream)?;
        let key = partition.map(ToString::to_string);
        let current = watermarks.pending.remove(&key);
        watermarks.pending.insert(key, max_value(current, value.clone()));
        Some(value)
    }

    /// Promote pending watermarks and return the bookmark to persist
    ///
    /// Returns `None` for streams that are not incremental.
    pub fn commit(&mut self, stream: &str) -> Option<StreamState> {
        let watermarks = self.streams.get_mut(stream)?;
        for (partition, value) in std::mem::take(&mut watermarks.pending) {
            let current = watermarks.committed.remove(&partition);
            watermarks
                .committed
                .insert(partition, max_value(current, value));
        }

        let mut bookmark = StreamState {
            replication_key: Some(watermarks.key.clone()),
            ..Default::default()
        };
        for (partition, value) in &watermarks.committed {
            match partition {
                None => bookmark.replication_key_value = Some(value.to_json()),
                Some(partition) => {
                    bookmark.partitions.insert(
                        partition.clone(),
                        PartitionState {
                            replication_key: Some(watermarks.key.clone()),
                            replication_key_value: Some(value.to_json()),
                        },
                    );
                }
            }
        }
        debug!(stream, partitions = bookmark.partitions.len(), "Committed watermarks");
        Some(bookmark)
    }

    /// Drop pending watermarks of a failed stream
    pub fn discard(&mut self, stream: &str) {
        if let Some(watermarks) = self.streams.get_mut(stream) {
            let dropped = std::mem::take(&mut watermarks.pending).len();
            if dropped > 0 {
                debug!(stream, dropped, "Discarded pending watermarks");
            }
        }
    }
}
