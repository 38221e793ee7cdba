//! Execution engine module
//!
//! Main read loop and stream orchestration.
//!
//! # Overview
//!
//! The engine module provides:
//! - `SyncEngine` - Syncs selected streams in catalog order, parents before children
//! - `SyncConfig` - Validation policy and start date floor
//! - `SyncReport` - Per-stream outcomes and run statistics
//!
//! Each stream moves through INIT, FETCHING and EXTRACTING until its
//! paginator is done. Children of a stream sync fully for one parent
//! record before the next parent record is processed. A failing child
//! partition marks the child stream FAILED while the parent and the other
//! partitions carry on. Watermarks are committed when a top-level stream
//! and its children finish, except for streams that failed along the way.

mod types;

pub use types::{StreamOutcome, StreamPhase, SyncConfig, SyncReport, SyncStats};

use crate::catalog::{Catalog, Selection};
use crate::decode::RecordExtractor;
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::loader::StreamDefinition;
use crate::output::{Message, RecordSink};
use crate::pagination::NextPage;
use crate::partition::{ChildContext, ParentRouter};
use crate::request::RequestBuilder;
use crate::schema::validate_record;
use crate::state::{ReplicationState, ReplicationValue, StateManager};
use crate::types::{Record, ValidationPolicy};
use futures::future::BoxFuture;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, trace, warn};

/// Sync engine for orchestrating data extraction
pub struct SyncEngine {
    /// HTTP client
    client: HttpClient,
    /// Stream catalog
    catalog: Arc<Catalog>,
    /// Persisted state
    state: StateManager,
    /// Watermarks of the current run
    replication: ReplicationState,
    /// Request construction
    requests: RequestBuilder,
    /// Message destination
    sink: Box<dyn RecordSink>,
    /// Sync configuration
    config: SyncConfig,
    /// Streams of the current run
    selection: Selection,
    /// Statistics
    stats: SyncStats,
    /// Streams that failed in the current run, with their first error
    failed: BTreeMap<String, String>,
}

impl SyncEngine {
    /// Create a new sync engine
    pub fn new(
        client: HttpClient,
        catalog: Catalog,
        state: StateManager,
        sink: impl RecordSink + 'static,
    ) -> Self {
        Self {
            client,
            catalog: Arc::new(catalog),
            state,
            replication: ReplicationState::new(),
            requests: RequestBuilder::default(),
            sink: Box::new(sink),
            config: SyncConfig::default(),
            selection: Selection::default(),
            stats: SyncStats::default(),
            failed: BTreeMap::new(),
        }
    }

    /// Set sync configuration
    #[must_use]
    pub fn with_config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the request builder
    #[must_use]
    pub fn with_request_builder(mut self, requests: RequestBuilder) -> Self {
        self.requests = requests;
        self
    }

    /// Get the state manager
    pub fn state(&self) -> &StateManager {
        &self.state
    }

    /// Get statistics
    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    /// Sync every stream of a selection
    ///
    /// A stream failure is recorded in the report and the next top-level
    /// stream still runs. Fatal errors (rejected credentials, broken
    /// configuration) abort the run.
    pub async fn run(&mut self, selection: Selection) -> Result<SyncReport> {
        let start = Instant::now();
        self.selection = selection;
        self.stats = SyncStats::default();
        self.replication = ReplicationState::new();
        self.failed.clear();

        let catalog = Arc::clone(&self.catalog);
        let roots: Vec<String> = self
            .selection
            .streams()
            .iter()
            .filter(|name| catalog.get(name).is_some_and(|s| s.parent.is_none()))
            .cloned()
            .collect();

        let mut outcomes = Vec::new();
        for root in &roots {
            let tree = self.tree_of(root);
            self.begin_tree(&tree).await?;

            info!(stream = %root, streams = tree.len(), "Starting stream sync");
            let result = self.sync_stream(root, None).await;

            match result {
                Ok(records) => info!(stream = %root, records, "Completed stream sync"),
                Err(e) if e.is_fatal() => {
                    for stream in &tree {
                        self.replication.discard(stream);
                    }
                    error!(stream = %root, error = %e, "Aborting run");
                    return Err(e);
                }
                Err(e) => {
                    error!(stream = %root, phase = %StreamPhase::Failed, error = %e, "Stream failed");
                    self.fail_stream(root, &e);
                }
            }
            self.commit_tree(&tree).await?;

            for stream in tree.iter().filter(|s| self.selection.emits(s)) {
                let error = self.failed.get(stream).cloned();
                outcomes.push(StreamOutcome {
                    stream: stream.clone(),
                    phase: if error.is_some() {
                        StreamPhase::Failed
                    } else {
                        StreamPhase::Done
                    },
                    records: self.stats.records_for(stream),
                    error,
                });
            }
        }

        self.sink.flush()?;
        self.stats.set_duration(start.elapsed().as_millis() as u64);

        Ok(SyncReport {
            outcomes,
            stats: self.stats.clone(),
        })
    }

    /// A top-level stream and its selected descendants, in catalog order
    fn tree_of(&self, root: &str) -> Vec<String> {
        self.selection
            .streams()
            .iter()
            .filter(|name| self.descends_from(name, root))
            .cloned()
            .collect()
    }

    /// Whether `stream` is `ancestor` or sits below it in the parent chain
    fn descends_from(&self, stream: &str, ancestor: &str) -> bool {
        let mut current = Some(stream);
        while let Some(name) = current {
            if name == ancestor {
                return true;
            }
            current = self.catalog.get(name).and_then(StreamDefinition::parent_stream);
        }
        false
    }

    /// Mark a stream and its selected descendants FAILED
    ///
    /// Only the first error of a stream is kept.
    fn fail_stream(&mut self, name: &str, cause: &Error) {
        let affected: Vec<String> = self
            .selection
            .streams()
            .iter()
            .filter(|s| self.descends_from(s, name))
            .cloned()
            .collect();
        for stream in affected {
            let message = if stream == name {
                cause.to_string()
            } else {
                Error::stream_failed(name, cause).to_string()
            };
            self.failed.entry(stream).or_insert(message);
        }
    }

    /// Register watermarks and announce schemas for a stream tree
    async fn begin_tree(&mut self, tree: &[String]) -> Result<()> {
        for name in tree {
            if !self.selection.emits(name) {
                continue;
            }
            let Some(stream) = self.catalog.get(name) else {
                return Err(Error::StreamNotFound {
                    stream: name.clone(),
                });
            };

            if let Some(key) = &stream.replication_key {
                let persisted = self.state.stream_state(name).await;
                self.replication
                    .register(name, key, stream.replication_kind(), persisted.as_ref());
            }

            self.sink.write(&Message::schema(
                name.as_str(),
                &stream.schema,
                stream.primary_key.clone(),
                stream.replication_key.as_deref(),
            ))?;
        }
        Ok(())
    }

    /// Persist the watermarks of a finished tree and emit a STATE message
    ///
    /// Failed streams keep their persisted bookmark untouched.
    async fn commit_tree(&mut self, tree: &[String]) -> Result<()> {
        let mut committed = false;
        for name in tree {
            if self.failed.contains_key(name) {
                self.replication.discard(name);
                continue;
            }
            if let Some(bookmark) = self.replication.commit(name) {
                self.state.set_stream_state(name, bookmark).await;
                committed = true;
            }
        }

        if committed {
            self.state.checkpoint().await?;
            let value = self.state.to_value().await?;
            self.sink.write(&Message::state(value))?;
        }
        Ok(())
    }

    /// Sync one stream, or one partition of a child stream
    ///
    /// Returns the number of records emitted.
    fn sync_stream<'a>(
        &'a mut self,
        name: &'a str,
        context: Option<&'a ChildContext>,
    ) -> BoxFuture<'a, Result<usize>> {
        Box::pin(async move {
            let catalog = Arc::clone(&self.catalog);
            let stream = catalog.get(name).ok_or_else(|| Error::StreamNotFound {
                stream: name.to_string(),
            })?;
            let emits = self.selection.emits(name);
            let partition_key = context.map(ChildContext::partition_key);
            let partition = partition_key.as_deref();

            let children: Vec<(String, ParentRouter)> = catalog
                .children_of(name)
                .filter(|child| self.selection.includes(&child.name))
                .filter_map(|child| {
                    child
                        .parent
                        .clone()
                        .map(|link| (child.name.clone(), ParentRouter::new(link)))
                })
                .collect();

            // INIT
            let starting =
                self.replication
                    .starting_watermark(name, partition, self.config.start_date);
            let paginator = stream.pagination.build();
            let extractor = RecordExtractor::new(stream.records_path.as_str());
            let mut token = paginator.initial_token();
            let mut emitted = 0usize;
            debug!(
                stream = name,
                partition,
                phase = %StreamPhase::Init,
                watermark = ?starting.as_ref().map(ToString::to_string),
                pagination = stream.pagination.kind(),
                "Stream initialised"
            );

            loop {
                trace!(stream = name, partition, phase = %StreamPhase::Fetching, page = %token);
                let request =
                    self.requests
                        .build(stream, paginator.as_ref(), &token, starting.as_ref(), context)?;
                let body = self
                    .client
                    .get_json_with_config(&request.path, request.to_request_config())
                    .await?;
                self.stats.add_page();

                trace!(stream = name, partition, phase = %StreamPhase::Extracting, page = %token);
                let mut extracted = 0usize;
                for record in extractor.extract(&body)? {
                    extracted += 1;
                    if !self.admit(stream, &record, starting.as_ref(), emits) {
                        continue;
                    }

                    if emits {
                        self.replication.observe(name, partition, &record);
                        self.sink.write(&Message::record(name, record.clone()))?;
                        self.stats.add_record(name);
                        emitted += 1;
                    }

                    for (child, router) in &children {
                        let Some(child_context) = router.context_for(&record) else {
                            continue;
                        };
                        match self.sync_stream(child, Some(&child_context)).await {
                            Ok(_) => self.stats.add_partition(),
                            Err(e) if e.is_fatal() => return Err(e),
                            Err(e) => {
                                error!(
                                    stream = %child,
                                    partition = %child_context,
                                    phase = %StreamPhase::Failed,
                                    error = %e,
                                    "Child partition failed"
                                );
                                self.fail_stream(child, &e);
                            }
                        }
                    }
                }

                debug!(stream = name, partition, page = %token, records = extracted, "Fetched page");

                match paginator.next(&token, &body, extracted) {
                    NextPage::Continue(next) => token = next,
                    NextPage::Done => break,
                }
            }

            debug!(stream = name, partition, phase = %StreamPhase::Done, records = emitted);
            Ok::<_, Error>(emitted)
        })
    }

    /// Decide whether a record is emitted (and fans out to children)
    fn admit(
        &mut self,
        stream: &StreamDefinition,
        record: &Record,
        starting: Option<&ReplicationValue>,
        emits: bool,
    ) -> bool {
        if let Some(key) = stream
            .primary_key
            .iter()
            .find(|k| record.get(k.as_str()).map_or(true, Value::is_null))
        {
            warn!(stream = %stream.name, key = %key, "Dropping record with null primary key");
            self.stats.records_dropped += 1;
            return false;
        }

        if let Some(starting) = starting {
            let value = self.replication.value_of(&stream.name, record);
            if value.is_some_and(|v| v < *starting) {
                self.stats.records_filtered += 1;
                return false;
            }
        }

        if !emits {
            return true;
        }

        let violations = validate_record(&stream.schema, record);
        if violations.is_empty() {
            return true;
        }
        self.stats.records_invalid += 1;
        let err = Error::SchemaValidation {
            stream: stream.name.clone(),
            violations,
        };
        match self.config.validation {
            ValidationPolicy::Lenient => {
                warn!(error = %err, "Emitting record that does not match its schema");
                true
            }
            ValidationPolicy::Strict => {
                warn!(error = %err, "Dropping record that does not match its schema");
                self.stats.records_dropped += 1;
                false
            }
        }
    }
}

#[cfg(test)]
mod tests;
