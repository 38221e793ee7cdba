//! State management module
//!
//! Handles replication watermarks, checkpointing, and resumability.
//! State is persisted between sync runs to enable incremental syncs.
//!
//! # Overview
//!
//! The state module provides:
//! - `State` - The bookmarks document with stream and partition watermarks
//! - `StateManager` - File-based state persistence
//! - `ReplicationState` - Pending/committed watermark tracking during a sync

mod manager;
mod replication;
mod types;

pub use manager::StateManager;
pub use replication::{parse_timestamp, ReplicationKind, ReplicationState, ReplicationValue};
pub use types::{PartitionState, State, StreamState};
