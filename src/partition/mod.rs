//! Partition routing module
//!
//! Supports: Parent stream
//!
//! # Overview
//!
//! A child stream is split into one partition per parent record. The
//! parent link of the child declares which parent fields feed which path
//! placeholders (`checkId: id`); the router turns each parent record into a
//! [`ChildContext`] that scopes the child's requests and names its slice of
//! the replication state.

mod routers;
mod types;

pub use routers::ParentRouter;
pub use types::{ChildContext, ParentLink};

#[cfg(test)]
mod tests;
