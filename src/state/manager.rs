//! State manager implementation
//!
//! Holds the bookmarks of a run and persists them to a state file with
//! atomic writes at each checkpoint.

use super::types::{State, StreamState};
use crate::error::{Error, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// State manager for persisting and loading state
#[derive(Debug, Clone)]
pub struct StateManager {
    /// Path to the state file, empty when in memory
    path: PathBuf,
    /// Current state (shared between clones)
    state: Arc<RwLock<State>>,
}

impl StateManager {
    /// Create an in-memory state manager (no file persistence)
    pub fn in_memory() -> Self {
        Self::from_state(State::new())
    }

    /// Create an in-memory state manager seeded with a state
    pub fn from_state(state: State) -> Self {
        Self {
            path: PathBuf::new(),
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Create a state manager from a file, loading existing state if present
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let state = if path.exists() {
            let contents = std::fs::read_to_string(path)
                .map_err(|e| Error::state(format!("Failed to read state file: {e}")))?;
            parse_state(&contents)?
        } else {
            State::new()
        };

        Ok(Self::from_state(state).persist_to(path))
    }

    /// Create a state manager from inline JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::from_state(parse_state(json)?))
    }

    /// Persist to `path` from now on, keeping the current state
    #[must_use]
    pub fn persist_to(mut self, path: impl AsRef<Path>) -> Self {
        self.path = path.as_ref().to_path_buf();
        self
    }

    /// Write the current state to the state file
    ///
    /// Writes a temporary sibling first and renames it over the target.
    /// A no-op for in-memory state.
    pub async fn checkpoint(&self) -> Result<()> {
        if self.is_in_memory() {
            return Ok(());
        }

        let contents = {
            let state = self.state.read().await;
            serde_json::to_string_pretty(&*state)
                .map_err(|e| Error::state(format!("Failed to serialize state: {e}")))?
        };

        let temp_path = self.path.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents)
            .await
            .map_err(|e| Error::state(format!("Failed to write state file: {e}")))?;
        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| Error::state(format!("Failed to rename state file: {e}")))?;

        debug!(path = %self.path.display(), "State checkpointed");
        Ok(())
    }

    /// Snapshot of the current state
    pub async fn snapshot(&self) -> State {
        self.state.read().await.clone()
    }

    /// Current state as a JSON value, as carried by STATE messages
    pub async fn to_value(&self) -> Result<Value> {
        let state = self.state.read().await;
        serde_json::to_value(&*state)
            .map_err(|e| Error::state(format!("Failed to serialize state: {e}")))
    }

    /// Get the bookmark of a stream
    pub async fn stream_state(&self, stream: &str) -> Option<StreamState> {
        self.state.read().await.get_stream(stream).cloned()
    }

    /// Replace the bookmark of a stream
    ///
    /// The change reaches the state file at the next [`checkpoint`](Self::checkpoint).
    pub async fn set_stream_state(&self, stream: &str, stream_state: StreamState) {
        self.state
            .write()
            .await
            .bookmarks
            .insert(stream.to_string(), stream_state);
    }

    /// Get the state file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if using in-memory mode
    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str().is_empty()
    }
}

fn parse_state(json: &str) -> Result<State> {
    if json.trim().is_empty() {
        return Ok(State::new());
    }
    serde_json::from_str(json).map_err(|e| Error::state(format!("Failed to parse state: {e}")))
}
