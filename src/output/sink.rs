//! Message sinks
//!
//! Destinations for the output message stream.

use crate::error::{Error, Result};
use crate::output::Message;
use crate::types::Record;
use serde_json::Value;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

/// Destination for output messages
pub trait RecordSink: Send {
    /// Write one message
    fn write(&mut self, message: &Message) -> Result<()>;

    /// Flush buffered output
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Writes each message as one line of JSON
#[derive(Debug)]
pub struct JsonLinesSink<W: Write + Send> {
    writer: W,
    written: usize,
}

impl JsonLinesSink<io::Stdout> {
    /// Sink writing to stdout
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> JsonLinesSink<W> {
    /// Create a sink over a writer
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    /// Number of messages written
    pub fn written(&self) -> usize {
        self.written
    }

    /// Consume the sink and return the writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> RecordSink for JsonLinesSink<W> {
    fn write(&mut self, message: &Message) -> Result<()> {
        serde_json::to_writer(&mut self.writer, message)
            .map_err(|e| Error::output(format!("Failed to serialize message: {e}")))?;
        self.writer
            .write_all(b"\n")
            .map_err(|e| Error::output(format!("Failed to write message: {e}")))?;
        self.written += 1;

        // State must not sit in a buffer behind records it acknowledges
        if message.is_state() {
            self.flush()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| Error::output(format!("Failed to flush output: {e}")))
    }
}

/// Collects messages in memory; clones share the same buffer
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    messages: Arc<Mutex<Vec<Message>>>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages written so far
    pub fn messages(&self) -> Vec<Message> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Records written for a stream, in order
    pub fn records(&self, stream: &str) -> Vec<Record> {
        self.messages()
            .into_iter()
            .filter_map(|m| match m {
                Message::Record {
                    stream: s, record, ..
                } if s == stream => Some(record),
                _ => None,
            })
            .collect()
    }

    /// Values of all state messages, in order
    pub fn states(&self) -> Vec<Value> {
        self.messages()
            .into_iter()
            .filter_map(|m| match m {
                Message::State { value } => Some(value),
                _ => None,
            })
            .collect()
    }

    /// Names of streams that received a schema message, in order
    pub fn schema_streams(&self) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter_map(|m| match m {
                Message::Schema { stream, .. } => Some(stream),
                _ => None,
            })
            .collect()
    }
}

impl RecordSink for MemorySink {
    fn write(&mut self, message: &Message) -> Result<()> {
        self.messages
            .lock()
            .map_err(|_| Error::output("Memory sink lock poisoned"))?
            .push(message.clone());
        Ok(())
    }
}
