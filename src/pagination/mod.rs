//! Pagination module
//!
//! Supports: Page Number, Cursor (next id), None
//!
//! # Overview
//!
//! Each strategy decides, from the last response and its record count,
//! whether another page should be fetched and which token to send.
//! Termination is guaranteed: page numbers stop on the first empty page,
//! cursors stop when the response no longer carries one.

mod strategies;
mod types;

pub use strategies::{CursorPaginator, NoPaginator, PageNumberPaginator};
pub use types::{NextPage, PaginationConfig, PaginationToken, Paginator, DEFAULT_PAGE_SIZE};

#[cfg(test)]
mod tests;
