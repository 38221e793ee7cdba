//! YAML parser for the stream catalog
//!
//! Parses the catalog, attaches each stream's JSON Schema and validates
//! the result.

use crate::error::{Error, Result};
use crate::loader::types::{CatalogDefinition, StreamDefinition};
use crate::schema::JsonSchema;
use crate::template::extract_variables;
use std::collections::HashSet;

/// Load a catalog from a YAML string, resolving schemas by stream name
pub fn load_catalog_from_str<F>(yaml: &str, schema_for: F) -> Result<CatalogDefinition>
where
    F: Fn(&str) -> Option<String>,
{
    let mut def: CatalogDefinition = serde_yaml::from_str(yaml)
        .map_err(|e| Error::config(format!("Failed to parse catalog YAML: {e}")))?;

    for stream in &mut def.streams {
        let raw = schema_for(&stream.name).ok_or_else(|| {
            Error::config(format!("Stream '{}' has no schema document", stream.name))
        })?;
        stream.schema = JsonSchema::from_json_str(&raw).map_err(|e| {
            Error::config(format!("Invalid schema for stream '{}': {e}", stream.name))
        })?;
    }

    validate_catalog(&def)?;
    Ok(def)
}

/// Validate a catalog definition
fn validate_catalog(def: &CatalogDefinition) -> Result<()> {
    if def.name.is_empty() {
        return Err(Error::config("Catalog name cannot be empty"));
    }

    url::Url::parse(&def.base_url)
        .map_err(|e| Error::config(format!("Catalog base_url is invalid: {e}")))?;

    if def.streams.is_empty() {
        return Err(Error::config("Catalog must have at least one stream"));
    }

    let mut seen = HashSet::new();
    for stream in &def.streams {
        if !seen.insert(stream.name.as_str()) {
            return Err(Error::config(format!(
                "Duplicate stream name: {}",
                stream.name
            )));
        }
        validate_stream(stream, &seen)?;
    }

    Ok(())
}

/// Validate a stream definition against the streams declared before it
fn validate_stream(stream: &StreamDefinition, declared: &HashSet<&str>) -> Result<()> {
    if stream.name.is_empty() {
        return Err(Error::config("Stream name cannot be empty"));
    }

    if stream.path.is_empty() {
        return Err(Error::config(format!(
            "Stream '{}' path cannot be empty",
            stream.name
        )));
    }

    if stream.primary_key.is_empty() || stream.primary_key.iter().any(String::is_empty) {
        return Err(Error::config(format!(
            "Stream '{}' must declare a primary key",
            stream.name
        )));
    }

    if let Some(key) = &stream.replication_key {
        if stream.schema.get_property(key).is_none() {
            return Err(Error::config(format!(
                "Stream '{}' replication key '{key}' is not in its schema",
                stream.name
            )));
        }
    }

    let placeholders = extract_variables(&stream.path);
    match &stream.parent {
        Some(parent) => {
            if parent.stream == stream.name {
                return Err(Error::config(format!(
                    "Stream '{}' cannot be its own parent",
                    stream.name
                )));
            }
            if !declared.contains(parent.stream.as_str()) {
                return Err(Error::config(format!(
                    "Stream '{}' has parent '{}' which is not declared before it",
                    stream.name, parent.stream
                )));
            }
            if parent.context.is_empty() {
                return Err(Error::config(format!(
                    "Stream '{}' parent link has an empty context",
                    stream.name
                )));
            }
            for placeholder in &placeholders {
                let name = placeholder.strip_prefix("context.").unwrap_or(placeholder);
                if !parent.context.contains_key(name) && !placeholder.starts_with("config.") {
                    return Err(Error::config(format!(
                        "Stream '{}' path placeholder '{placeholder}' is not provided by its parent",
                        stream.name
                    )));
                }
            }
        }
        None => {
            if let Some(placeholder) = placeholders.iter().find(|p| !p.starts_with("config.")) {
                return Err(Error::config(format!(
                    "Stream '{}' path placeholder '{placeholder}' needs a parent stream",
                    stream.name
                )));
            }
        }
    }

    Ok(())
}
