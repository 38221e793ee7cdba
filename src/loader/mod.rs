//! YAML Loader module
//!
//! Parse the stream catalog from YAML.
//!
//! # Overview
//!
//! The loader module provides:
//! - `CatalogDefinition` - Declarative description of the API and its streams
//! - `StreamDefinition` - One stream: path, keys, pagination, parent link
//! - YAML parsing with validation of the stream graph and schemas

mod parser;
mod types;

pub use parser::load_catalog_from_str;
pub use types::{CatalogDefinition, CheckDefinition, HttpDefinition, StreamDefinition};
