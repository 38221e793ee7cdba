//! Partition types
//!
//! Defines the parent link and the child context derived from it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Declares that a stream is fetched once per record of another stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentLink {
    /// Name of the parent stream
    pub stream: String,
    /// Context key to parent record field (`checkId: id`)
    pub context: BTreeMap<String, String>,
}

impl ParentLink {
    /// Create a link with a single context mapping
    pub fn new(
        stream: impl Into<String>,
        context_key: impl Into<String>,
        parent_field: impl Into<String>,
    ) -> Self {
        let mut context = BTreeMap::new();
        context.insert(context_key.into(), parent_field.into());
        Self {
            stream: stream.into(),
            context,
        }
    }
}

/// Values injected by one parent record into its child requests
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChildContext {
    values: BTreeMap<String, Value>,
}

impl ChildContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value to the context
    #[must_use]
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Get a value by key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Check if the context carries no values
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Canonical `key=value` form, used as the partition key in state
    pub fn partition_key(&self) -> String {
        self.values
            .iter()
            .map(|(k, v)| match v {
                Value::String(s) => format!("{k}={s}"),
                other => format!("{k}={other}"),
            })
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Context as a JSON object, for template rendering
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.values
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect::<Map<String, Value>>(),
        )
    }
}

impl fmt::Display for ChildContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.partition_key())
    }
}
