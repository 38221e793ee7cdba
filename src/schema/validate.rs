//! Record validation against a stream schema
//!
//! Violations are reported as `<pointer>: <problem>` strings, where the
//! pointer is a JSON pointer into the record (`/alertSettings/reminders`).

use super::types::{JsonSchema, JsonType, SchemaProperty};
use crate::types::Record;
use chrono::{DateTime, NaiveDate};
use serde_json::Value;
use std::collections::BTreeMap;

/// Validate a record, returning every violation found
///
/// An empty result means the record conforms.
pub fn validate_record(schema: &JsonSchema, record: &Record) -> Vec<String> {
    let mut violations = Vec::new();
    check_object(
        "",
        record,
        &schema.properties,
        &schema.required,
        schema.additional_properties,
        &mut violations,
    );
    violations
}

fn check_object(
    pointer: &str,
    object: &serde_json::Map<String, Value>,
    properties: &BTreeMap<String, SchemaProperty>,
    required: &[String],
    additional_allowed: bool,
    violations: &mut Vec<String>,
) {
    for name in required {
        if !object.contains_key(name) {
            violations.push(format!("{pointer}/{name}: required property is missing"));
        }
    }

    for (name, value) in object {
        let child = format!("{pointer}/{name}");
        match properties.get(name) {
            Some(property) => check_value(&child, value, property, violations),
            None if !additional_allowed => {
                violations.push(format!("{child}: property is not allowed"));
            }
            None => {}
        }
    }
}

fn check_value(pointer: &str, value: &Value, property: &SchemaProperty, violations: &mut Vec<String>) {
    if let Some(expected) = &property.json_type {
        if !expected.matches(value) {
            violations.push(format!(
                "{pointer}: expected {expected}, got {}",
                JsonType::of(value)
            ));
            return;
        }
    }

    if let Some(allowed) = &property.enum_values {
        if !value.is_null() && !allowed.contains(value) {
            violations.push(format!("{pointer}: value {value} is not one of the allowed values"));
        }
    }

    match value {
        Value::String(s) => check_format(pointer, s, property.format.as_deref(), violations),
        Value::Object(object) => {
            if let Some(properties) = &property.properties {
                check_object(
                    pointer,
                    object,
                    properties,
                    &property.required,
                    property.additional_properties.unwrap_or(true),
                    violations,
                );
            }
        }
        Value::Array(items) => {
            if let Some(item_schema) = &property.items {
                for (i, item) in items.iter().enumerate() {
                    check_value(&format!("{pointer}/{i}"), item, item_schema, violations);
                }
            }
        }
        _ => {}
    }
}

fn check_format(pointer: &str, value: &str, format: Option<&str>, violations: &mut Vec<String>) {
    let valid = match format {
        Some("date-time") => DateTime::parse_from_rfc3339(value).is_ok(),
        Some("date") => NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok(),
        _ => true,
    };
    if !valid {
        if let Some(format) = format {
            violations.push(format!("{pointer}: '{value}' is not a valid {format}"));
        }
    }
}
