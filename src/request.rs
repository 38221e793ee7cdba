//! Request construction
//!
//! Turns a stream definition plus the current pagination token, watermark
//! and child context into the path and query of the next request.

use crate::config::TapConfig;
use crate::error::Result;
use crate::http::RequestConfig;
use crate::loader::StreamDefinition;
use crate::pagination::{PaginationToken, Paginator};
use crate::partition::ChildContext;
use crate::state::ReplicationValue;
use crate::template::{render_path, TemplateContext};
use serde_json::Value;
use std::collections::BTreeMap;

/// Query parameter carrying the incremental lower bound
pub const FROM_PARAM: &str = "from";

/// Path and query parameters of one request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreparedRequest {
    /// Path relative to the base URL
    pub path: String,
    /// Query parameters
    pub query: BTreeMap<String, String>,
}

impl PreparedRequest {
    /// Convert into a per-request HTTP config
    pub fn to_request_config(&self) -> RequestConfig {
        self.query
            .iter()
            .fold(RequestConfig::new(), |config, (k, v)| config.query(k, v))
    }
}

/// Builds requests for stream fetches
#[derive(Debug, Clone, Default)]
pub struct RequestBuilder {
    config: Value,
}

impl RequestBuilder {
    /// Create a builder; `config` is reachable from paths as `{{ config.x }}`
    pub fn new(config: Value) -> Self {
        Self { config }
    }

    /// Create a builder from the tap config, leaving the token out of reach
    pub fn from_tap_config(config: &TapConfig) -> Self {
        let mut value = serde_json::to_value(config).unwrap_or_default();
        if let Value::Object(map) = &mut value {
            map.remove("token");
        }
        Self::new(value)
    }

    /// Build the next request of a stream
    ///
    /// Fails with `UndefinedVariable` when a path placeholder cannot be
    /// resolved from the child context or the config.
    pub fn build(
        &self,
        stream: &StreamDefinition,
        paginator: &dyn Paginator,
        token: &PaginationToken,
        watermark: Option<&ReplicationValue>,
        context: Option<&ChildContext>,
    ) -> Result<PreparedRequest> {
        let mut ctx = TemplateContext::with_config(self.config.clone());
        if let Some(context) = context {
            ctx = ctx.with_context(context.to_json());
        }
        let path = render_path(&stream.path, &ctx)?;

        let mut query = stream.params.clone();

        if stream.is_incremental() {
            if let Some(from) = watermark.and_then(ReplicationValue::epoch_seconds) {
                query.insert(FROM_PARAM.to_string(), from.to_string());
            }
        }

        query.extend(paginator.query_params(token));

        Ok(PreparedRequest { path, query })
    }
}
