//! Partition router implementations

use super::types::{ChildContext, ParentLink};
use crate::types::Record;
use serde_json::Value;
use tracing::warn;

// ============================================================================
// Parent Router
// ============================================================================

/// Parent stream-based partition router
///
/// Derives the child context of each parent record from the link's
/// field mapping.
#[derive(Debug, Clone)]
pub struct ParentRouter {
    link: ParentLink,
}

impl ParentRouter {
    /// Create a new parent router
    pub fn new(link: ParentLink) -> Self {
        Self { link }
    }

    /// Name of the parent stream
    pub fn parent_stream(&self) -> &str {
        &self.link.stream
    }

    /// Build the child context for one parent record
    ///
    /// Returns `None` when a mapped field is missing, null or not a scalar,
    /// since the child request could not be addressed.
    pub fn context_for(&self, parent: &Record) -> Option<ChildContext> {
        let mut context = ChildContext::new();
        for (key, field) in &self.link.context {
            match extract_key(parent, field) {
                Some(value) => context = context.with_value(key.clone(), value),
                None => {
                    warn!(
                        parent = %self.link.stream,
                        field = %field,
                        "Parent record has no usable value for child context, skipping"
                    );
                    return None;
                }
            }
        }
        Some(context)
    }
}

/// Extract a scalar from a record by dotted path (`id`, `meta.id`)
fn extract_key(record: &Record, path: &str) -> Option<Value> {
    let mut parts = path.split('.');
    let mut current = record.get(parts.next()?)?;
    for part in parts {
        current = current.get(part)?;
    }

    match current {
        Value::String(s) if !s.is_empty() => Some(current.clone()),
        Value::Number(_) | Value::Bool(_) => Some(current.clone()),
        _ => None,
    }
}
