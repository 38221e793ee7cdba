//! Template interpolation for stream paths
//!
//! Handles `{{ variable }}` placeholders in catalog path templates, such as
//! `/check-results/{{ checkId }}`. Bare names resolve from the child context
//! first, then from the tap configuration; `{{ context.x }}` and
//! `{{ config.x }}` address one source explicitly.

use crate::error::{Error, Result};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Regex for matching template variables: {{ variable.path }}
static TEMPLATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([a-zA-Z_][a-zA-Z0-9_]*(?:\.[a-zA-Z_][a-zA-Z0-9_]*)*)\s*\}\}").unwrap()
});

/// Context for template interpolation
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    /// Tap configuration values
    pub config: Value,
    /// Child context of the current partition
    pub context: Value,
}

impl TemplateContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Create context with config values
    pub fn with_config(config: Value) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Set child context values
    #[must_use]
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = context;
        self
    }

    /// Get a value by path (e.g., "checkId" or "config.account_id")
    pub fn get(&self, path: &str) -> Option<&Value> {
        let parts: Vec<&str> = path.split('.').collect();
        match parts.first().copied() {
            Some("config") if parts.len() > 1 => get_nested_value(&self.config, &parts[1..]),
            Some("context") if parts.len() > 1 => get_nested_value(&self.context, &parts[1..]),
            Some(_) => get_nested_value(&self.context, &parts)
                .or_else(|| get_nested_value(&self.config, &parts)),
            None => None,
        }
    }
}

/// Get a nested value from a JSON value by path
fn get_nested_value<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = value;
    for part in path {
        match current {
            Value::Object(map) => {
                current = map.get(*part)?;
            }
            _ => return None,
        }
    }
    Some(current).filter(|v| !v.is_null())
}

/// Render a URL path template with the given context
///
/// Each substituted value is percent-encoded as a single path segment.
/// Every unresolved placeholder is reported in one `UndefinedVariable` error.
pub fn render_path(template: &str, ctx: &TemplateContext) -> Result<String> {
    let mut errors = Vec::new();

    let rendered = TEMPLATE_REGEX.replace_all(template, |cap: &regex::Captures<'_>| {
        let var_path = &cap[1];
        match ctx.get(var_path) {
            Some(value) => urlencoding::encode(&value_to_string(value)).into_owned(),
            None => {
                errors.push(var_path.to_string());
                String::new()
            }
        }
    });

    if errors.is_empty() {
        Ok(rendered.into_owned())
    } else {
        Err(Error::undefined_var(errors.join(", ")))
    }
}

/// Extract all variable names from a template
pub fn extract_variables(template: &str) -> Vec<String> {
    TEMPLATE_REGEX
        .captures_iter(template)
        .map(|cap| cap[1].to_string())
        .collect()
}

/// Convert a JSON value to a string for template substitution
fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        // For complex types, use JSON serialization
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
