//! Record extraction module
//!
//! # Overview
//!
//! The decode module turns a parsed response body into the ordered
//! sequence of records for a stream, using the stream's records path
//! (`$[*]` for bare arrays, `$.entries[*]` for wrapped pages). It does
//! not validate records; that happens in [`crate::schema`].

mod extractor;
mod types;

pub use extractor::{extract_jsonpath, RecordExtractor};
pub use types::{Records, DEFAULT_RECORDS_PATH};
