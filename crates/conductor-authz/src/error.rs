//! Authentication error types.

use conductor_core::error::ConductorError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing credentials")]
    MissingCredentials,

    #[error("malformed authorization header")]
    MalformedCredentials,

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for ConductorError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredentials
            | AuthError::MalformedCredentials
            | AuthError::TokenExpired
            | AuthError::TokenInvalid(_) => ConductorError::AuthenticationFailed {
                reason: err.to_string(),
            },
            AuthError::Crypto(msg) => ConductorError::Crypto(msg),
        }
    }
}
