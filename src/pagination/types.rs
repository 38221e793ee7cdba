//! Pagination types and traits
//!
//! Defines the core pagination abstractions used by all strategies.

use super::strategies::{CursorPaginator, NoPaginator, PageNumberPaginator};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Number of records requested per page
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Position of a stream within its paginated result set
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PaginationToken {
    /// First request of a cursor or unpaginated stream
    #[default]
    Initial,
    /// Page number (1-based)
    Page(u32),
    /// Opaque cursor handed out by the server
    Cursor(String),
}

impl fmt::Display for PaginationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initial => write!(f, "initial"),
            Self::Page(n) => write!(f, "page {n}"),
            Self::Cursor(c) => write!(f, "cursor {c}"),
        }
    }
}

/// Result of the next page computation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextPage {
    /// Fetch again with this token
    Continue(PaginationToken),
    /// No more pages
    Done,
}

/// Pagination strategy of a stream, as declared in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaginationConfig {
    /// Single request
    #[default]
    None,

    /// Page number pagination, stops on the first empty page
    PageNumber {
        /// Query parameter name for the page number
        #[serde(default = "default_page_param")]
        page_param: String,
        /// Query parameter name for the page size
        #[serde(default = "default_size_param")]
        size_param: String,
        /// Records per page
        #[serde(default = "default_page_size")]
        page_size: u32,
    },

    /// Cursor pagination, stops when the cursor is absent
    Cursor {
        /// Query parameter name for the cursor
        #[serde(default = "default_cursor_param")]
        cursor_param: String,
        /// JSONPath to the next cursor in the response body
        #[serde(default = "default_cursor_path")]
        cursor_path: String,
    },
}

fn default_page_param() -> String {
    "page".to_string()
}

fn default_size_param() -> String {
    "limit".to_string()
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_cursor_param() -> String {
    "nextId".to_string()
}

fn default_cursor_path() -> String {
    "$.nextId".to_string()
}

impl PaginationConfig {
    /// Page number pagination with Checkly's `page`/`limit` parameters
    pub fn page_number() -> Self {
        Self::PageNumber {
            page_param: default_page_param(),
            size_param: default_size_param(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Cursor pagination with Checkly's `nextId` parameter
    pub fn cursor() -> Self {
        Self::Cursor {
            cursor_param: default_cursor_param(),
            cursor_path: default_cursor_path(),
        }
    }

    /// Short name used in logs and discovery output
    pub fn kind(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::PageNumber { .. } => "page_number",
            Self::Cursor { .. } => "cursor",
        }
    }

    /// Instantiate the paginator for this strategy
    pub fn build(&self) -> Box<dyn Paginator> {
        match self {
            Self::None => Box::new(NoPaginator),
            Self::PageNumber {
                page_param,
                size_param,
                page_size,
            } => Box::new(PageNumberPaginator::new(
                page_param.clone(),
                size_param.clone(),
                *page_size,
            )),
            Self::Cursor {
                cursor_param,
                cursor_path,
            } => Box::new(CursorPaginator::new(
                cursor_param.clone(),
                cursor_path.clone(),
            )),
        }
    }
}

/// Core trait for pagination strategies
pub trait Paginator: Send + Sync {
    /// Token for the first request
    fn initial_token(&self) -> PaginationToken;

    /// Query parameters that carry the token
    fn query_params(&self, token: &PaginationToken) -> BTreeMap<String, String>;

    /// Decide what follows the page fetched with `current`
    fn next(&self, current: &PaginationToken, body: &Value, records_count: usize) -> NextPage;
}
