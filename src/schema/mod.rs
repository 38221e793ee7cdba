//! Stream schema module
//!
//! Every stream ships a JSON Schema document describing its records.
//! The schema is advertised in discovery and SCHEMA messages and each
//! extracted record is checked against it before it is emitted.
//!
//! # Features
//!
//! - **Types**: single or nullable (`["string", "null"]`) property types
//! - **Formats**: `date-time` (RFC 3339 with offset) and `date` strings are checked
//! - **Nesting**: nested objects and array items are validated recursively
//! - **Required**: required properties at every level

mod types;
mod validate;

pub use types::{JsonSchema, JsonType, JsonTypeOrArray, SchemaProperty};
pub use validate::validate_record;
