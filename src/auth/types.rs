//! Auth configuration types

use std::fmt;

/// Header carrying the Checkly account scope
pub const ACCOUNT_HEADER: &str = "X-Checkly-Account";

/// Authentication configuration
#[derive(Clone, Default)]
pub enum AuthConfig {
    /// No authentication required
    #[default]
    None,

    /// Bearer token scoped to an account via a header
    AccountBearer {
        /// The bearer token
        token: String,
        /// Header name carrying the account ID
        account_header: String,
        /// Account ID
        account_id: String,
    },
}

impl AuthConfig {
    /// Bearer auth scoped to a Checkly account
    pub fn checkly(account_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self::AccountBearer {
            token: token.into(),
            account_header: ACCOUNT_HEADER.to_string(),
            account_id: account_id.into(),
        }
    }
}

// Tokens never reach logs.
impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::AccountBearer {
                account_header,
                account_id,
                ..
            } => f
                .debug_struct("AccountBearer")
                .field("token", &"***")
                .field("account_header", account_header)
                .field("account_id", account_id)
                .finish(),
        }
    }
}

#[cfg(test)]
mod type_tests {
    use super::*;

    #[test]
    fn test_auth_config_default() {
        assert!(matches!(AuthConfig::default(), AuthConfig::None));
    }

    #[test]
    fn test_checkly_auth_uses_account_header() {
        match AuthConfig::checkly("acc-1", "tok") {
            AuthConfig::AccountBearer {
                account_header,
                account_id,
                token,
            } => {
                assert_eq!(account_header, "X-Checkly-Account");
                assert_eq!(account_id, "acc-1");
                assert_eq!(token, "tok");
            }
            AuthConfig::None => panic!("expected account bearer auth"),
        }
    }

    #[test]
    fn test_debug_redacts_token() {
        let debug = format!("{:?}", AuthConfig::checkly("acc-1", "super-secret"));
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("acc-1"));
    }
}
