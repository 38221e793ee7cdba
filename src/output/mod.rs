//! Output module
//!
//! Handles the message stream written by `read`.
//!
//! # Overview
//!
//! This module provides:
//! - `Message` - SCHEMA, RECORD and STATE messages in the Singer wire format
//! - `RecordSink` - Destination for messages
//! - `JsonLinesSink` - One JSON document per line, normally on stdout
//! - `MemorySink` - Collects messages in memory

mod message;
mod sink;

pub use message::Message;
pub use sink::{JsonLinesSink, MemorySink, RecordSink};
