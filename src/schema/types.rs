//! Schema types

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// JSON Schema type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonType {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
    Null,
}

impl JsonType {
    /// Check whether a JSON value is an instance of this type
    pub fn matches(self, value: &Value) -> bool {
        match (self, value) {
            (JsonType::String, Value::String(_))
            | (JsonType::Number, Value::Number(_))
            | (JsonType::Boolean, Value::Bool(_))
            | (JsonType::Object, Value::Object(_))
            | (JsonType::Array, Value::Array(_))
            | (JsonType::Null, Value::Null) => true,
            (JsonType::Integer, Value::Number(n)) => {
                n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0)
            }
            _ => false,
        }
    }

    /// The type name of a JSON value
    pub fn of(value: &Value) -> JsonType {
        match value {
            Value::Null => JsonType::Null,
            Value::Bool(_) => JsonType::Boolean,
            Value::Number(n) if n.is_i64() || n.is_u64() => JsonType::Integer,
            Value::Number(_) => JsonType::Number,
            Value::String(_) => JsonType::String,
            Value::Array(_) => JsonType::Array,
            Value::Object(_) => JsonType::Object,
        }
    }
}

impl std::fmt::Display for JsonType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JsonType::String => write!(f, "string"),
            JsonType::Number => write!(f, "number"),
            JsonType::Integer => write!(f, "integer"),
            JsonType::Boolean => write!(f, "boolean"),
            JsonType::Object => write!(f, "object"),
            JsonType::Array => write!(f, "array"),
            JsonType::Null => write!(f, "null"),
        }
    }
}

/// JSON type can be a single type or array of types (for nullable)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonTypeOrArray {
    Single(JsonType),
    Multiple(Vec<JsonType>),
}

impl JsonTypeOrArray {
    /// Create a nullable type
    pub fn nullable(t: JsonType) -> Self {
        if t == JsonType::Null {
            JsonTypeOrArray::Single(JsonType::Null)
        } else {
            JsonTypeOrArray::Multiple(vec![t, JsonType::Null])
        }
    }

    /// Check if this type is nullable
    pub fn is_nullable(&self) -> bool {
        match self {
            JsonTypeOrArray::Single(t) => *t == JsonType::Null,
            JsonTypeOrArray::Multiple(types) => types.contains(&JsonType::Null),
        }
    }

    /// Get the primary (non-null) type
    pub fn primary_type(&self) -> Option<JsonType> {
        match self {
            JsonTypeOrArray::Single(t) => Some(*t),
            JsonTypeOrArray::Multiple(types) => {
                types.iter().copied().find(|t| *t != JsonType::Null)
            }
        }
    }

    /// Check whether a value is an instance of any listed type
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            JsonTypeOrArray::Single(t) => t.matches(value),
            JsonTypeOrArray::Multiple(types) => types.iter().any(|t| t.matches(value)),
        }
    }
}

impl std::fmt::Display for JsonTypeOrArray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JsonTypeOrArray::Single(t) => write!(f, "{t}"),
            JsonTypeOrArray::Multiple(types) => {
                let names: Vec<String> = types.iter().map(ToString::to_string).collect();
                write!(f, "{}", names.join(" or "))
            }
        }
    }
}

/// JSON Schema property definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaProperty {
    /// Property type(s); absent means any value
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub json_type: Option<JsonTypeOrArray>,

    /// Description (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Format hint (e.g., "date-time")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Nested properties (for objects)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, SchemaProperty>>,

    /// Required nested properties (for objects)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    /// Additional properties allowed (for objects)
    #[serde(
        rename = "additionalProperties",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<bool>,

    /// Array items schema
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaProperty>>,

    /// Enum values
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
}

impl SchemaProperty {
    /// Create a new property with the given type
    pub fn new(json_type: JsonType) -> Self {
        Self {
            json_type: Some(JsonTypeOrArray::Single(json_type)),
            ..Default::default()
        }
    }

    /// Create a nullable property
    pub fn nullable(json_type: JsonType) -> Self {
        Self {
            json_type: Some(JsonTypeOrArray::nullable(json_type)),
            ..Default::default()
        }
    }

    /// Create an object property with nested properties
    pub fn object(properties: BTreeMap<String, SchemaProperty>) -> Self {
        Self {
            json_type: Some(JsonTypeOrArray::Single(JsonType::Object)),
            properties: Some(properties),
            ..Default::default()
        }
    }

    /// Create an array property with item schema
    pub fn array(items: SchemaProperty) -> Self {
        Self {
            json_type: Some(JsonTypeOrArray::Single(JsonType::Array)),
            items: Some(Box::new(items)),
            ..Default::default()
        }
    }

    /// Set format hint
    #[must_use]
    pub fn with_format(mut self, format: &str) -> Self {
        self.format = Some(format.to_string());
        self
    }

    /// Mark nested properties as required
    #[must_use]
    pub fn with_required(mut self, names: &[&str]) -> Self {
        self.required = names.iter().map(ToString::to_string).collect();
        self
    }

    /// Check if nullable; an untyped property accepts null
    pub fn is_nullable(&self) -> bool {
        self.json_type.as_ref().map_or(true, JsonTypeOrArray::is_nullable)
    }

    /// The primary (non-null) type, if declared
    pub fn primary_type(&self) -> Option<JsonType> {
        self.json_type.as_ref().and_then(JsonTypeOrArray::primary_type)
    }
}

/// Full JSON Schema document of a stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonSchema {
    /// Schema version
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Schema type (always "object" for top-level)
    #[serde(rename = "type", default = "default_object_type")]
    pub json_type: JsonTypeOrArray,

    /// Schema title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Schema description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Object properties
    #[serde(default)]
    pub properties: BTreeMap<String, SchemaProperty>,

    /// Required properties
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    /// Allow additional properties
    #[serde(rename = "additionalProperties", default = "default_true")]
    pub additional_properties: bool,
}

fn default_object_type() -> JsonTypeOrArray {
    JsonTypeOrArray::Single(JsonType::Object)
}

fn default_true() -> bool {
    true
}

impl Default for JsonSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonSchema {
    /// Create a new empty schema
    pub fn new() -> Self {
        Self {
            schema: Some("http://json-schema.org/draft-07/schema#".to_string()),
            json_type: default_object_type(),
            title: None,
            description: None,
            properties: BTreeMap::new(),
            required: Vec::new(),
            additional_properties: true,
        }
    }

    /// Parse a schema document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let schema: Self = serde_json::from_str(json)?;
        if schema.json_type.primary_type() != Some(JsonType::Object) {
            return Err(Error::config(format!(
                "Stream schema must describe an object, got {}",
                schema.json_type
            )));
        }
        Ok(schema)
    }

    /// Set the schema title
    #[must_use]
    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    /// Add a property
    pub fn add_property(&mut self, name: &str, property: SchemaProperty) {
        self.properties.insert(name.to_string(), property);
    }

    /// Add a required property
    pub fn add_required(&mut self, name: &str) {
        if !self.is_required(name) {
            self.required.push(name.to_string());
        }
    }

    /// Check if a property is required
    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|n| n == name)
    }

    /// Get a property
    pub fn get_property(&self, name: &str) -> Option<&SchemaProperty> {
        self.properties.get(name)
    }

    /// Convert to JSON value
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}
