//! Authentication module
//!
//! Supports: Bearer token, account-scoped bearer token, custom headers
//!
//! The Checkly API authenticates every request with a bearer token and
//! scopes it to one account through the `X-Checkly-Account` header.

mod authenticator;
mod types;

pub use authenticator::Authenticator;
pub use types::{AuthConfig, ACCOUNT_HEADER};
