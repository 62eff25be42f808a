//! Authentication error types.

use fleet_core::error::FleetError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// The provider refused the authorization code.
    #[error("failed to exchange code with {provider}: {message}")]
    Exchange { provider: String, message: String },

    /// The provider accepted the code but the profile call failed.
    #[error("failed to get user info from {provider}: {message}")]
    Profile { provider: String, message: String },

    #[error("cryptography error: {0}")]
    Crypto(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<AuthError> for FleetError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::TokenExpired | AuthError::TokenInvalid(_) | AuthError::Exchange { .. } => {
                FleetError::AuthenticationFailed {
                    reason: err.to_string(),
                }
            }
            AuthError::UnsupportedProvider(_) => FleetError::Validation {
                message: err.to_string(),
            },
            AuthError::Profile { .. } => FleetError::Upstream(err.to_string()),
            AuthError::Crypto(msg) | AuthError::Config(msg) => FleetError::Internal(msg),
        }
    }
}
