//! Authenticator implementation
//!
//! Applies the configured credentials to outgoing requests.

use super::types::AuthConfig;
use reqwest::RequestBuilder;

/// Authenticator handles applying authentication to HTTP requests
#[derive(Debug, Clone, Default)]
pub struct Authenticator {
    /// Auth configuration
    config: AuthConfig,
}

impl Authenticator {
    /// Create a new authenticator with the given config
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Get the auth configuration
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Apply authentication to a request builder
    pub fn apply(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.config {
            AuthConfig::None => req,

            AuthConfig::AccountBearer {
                token,
                account_header,
                account_id,
            } => req
                .bearer_auth(token)
                .header(account_header.as_str(), account_id.as_str()),
        }
    }
}
