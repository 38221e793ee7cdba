//! Pagination strategy implementations
//!
//! Each strategy handles a specific pagination pattern.

use super::types::{NextPage, PaginationToken, Paginator};
use crate::decode::extract_jsonpath;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

// ============================================================================
// Page Number Pagination
// ============================================================================

/// Page number pagination
///
/// Sends `?page=N&limit=SIZE`, starting at page 1. A page that yields no
/// records ends the stream, so `k` full pages cost `k + 1` requests.
#[derive(Debug, Clone)]
pub struct PageNumberPaginator {
    /// Query parameter name for page number
    pub page_param: String,
    /// Query parameter name for page size
    pub size_param: String,
    /// Page size value
    pub page_size: u32,
}

impl PageNumberPaginator {
    /// Create a new page number paginator
    pub fn new(page_param: impl Into<String>, size_param: impl Into<String>, page_size: u32) -> Self {
        Self {
            page_param: page_param.into(),
            size_param: size_param.into(),
            page_size,
        }
    }
}

impl Paginator for PageNumberPaginator {
    fn initial_token(&self) -> PaginationToken {
        PaginationToken::Page(1)
    }

    fn query_params(&self, token: &PaginationToken) -> BTreeMap<String, String> {
        let page = match token {
            PaginationToken::Page(n) => *n,
            _ => 1,
        };
        let mut params = BTreeMap::new();
        params.insert(self.page_param.clone(), page.to_string());
        params.insert(self.size_param.clone(), self.page_size.to_string());
        params
    }

    fn next(&self, current: &PaginationToken, _body: &Value, records_count: usize) -> NextPage {
        if records_count == 0 {
            return NextPage::Done;
        }
        match current {
            PaginationToken::Page(n) => NextPage::Continue(PaginationToken::Page(n + 1)),
            _ => NextPage::Continue(PaginationToken::Page(2)),
        }
    }
}

// ============================================================================
// Cursor Pagination
// ============================================================================

/// Cursor-based pagination
///
/// Reads the next cursor from the response body and sends it back as a
/// query parameter. An absent, null or empty cursor ends the stream.
#[derive(Debug, Clone)]
pub struct CursorPaginator {
    /// Query parameter name for cursor
    pub cursor_param: String,
    /// JSONPath to extract cursor from response
    pub cursor_path: String,
}

impl CursorPaginator {
    /// Create a new cursor paginator
    pub fn new(cursor_param: impl Into<String>, cursor_path: impl Into<String>) -> Self {
        Self {
            cursor_param: cursor_param.into(),
            cursor_path: cursor_path.into(),
        }
    }
}

impl Paginator for CursorPaginator {
    fn initial_token(&self) -> PaginationToken {
        PaginationToken::Initial
    }

    fn query_params(&self, token: &PaginationToken) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        if let PaginationToken::Cursor(cursor) = token {
            params.insert(self.cursor_param.clone(), cursor.clone());
        }
        params
    }

    fn next(&self, current: &PaginationToken, body: &Value, _records_count: usize) -> NextPage {
        match extract_jsonpath(body, &self.cursor_path) {
            Some(cursor) if !cursor.is_empty() => {
                if matches!(current, PaginationToken::Cursor(c) if *c == cursor) {
                    // The server handed back the cursor we just sent
                    debug!(cursor = %cursor, "Cursor did not advance, stopping");
                    return NextPage::Done;
                }
                NextPage::Continue(PaginationToken::Cursor(cursor))
            }
            _ => NextPage::Done,
        }
    }
}

// ============================================================================
// No Pagination
// ============================================================================

/// No pagination - single request
#[derive(Debug, Clone, Default)]
pub struct NoPaginator;

impl Paginator for NoPaginator {
    fn initial_token(&self) -> PaginationToken {
        PaginationToken::Initial
    }

    fn query_params(&self, _token: &PaginationToken) -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    fn next(&self, _current: &PaginationToken, _body: &Value, _records_count: usize) -> NextPage {
        NextPage::Done
    }
}
