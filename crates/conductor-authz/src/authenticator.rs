//! Request authentication.

use conductor_core::models::identity::Identity;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::token;

/// The parts of an inbound request authentication looks at.
#[derive(Debug, Clone, Default)]
pub struct AuthRequest {
    /// Raw `Authorization` header value.
    pub authorization: Option<String>,
    /// Remote address, for audit logs.
    pub peer_addr: Option<String>,
}

impl AuthRequest {
    pub fn bearer(token: &str) -> Self {
        Self {
            authorization: Some(format!("Bearer {token}")),
            peer_addr: None,
        }
    }
}

/// Turns a request into an [`Identity`] or an [`AuthError`].
pub trait Authenticator: Send + Sync {
    fn authenticate(
        &self,
        request: &AuthRequest,
    ) -> impl Future<Output = Result<Identity, AuthError>> + Send;
}

/// Authenticates `Authorization: Bearer <jwt>` headers.
pub struct BearerTokenAuthenticator {
    config: AuthConfig,
}

impl BearerTokenAuthenticator {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }
}

/// Extract the token from a `Bearer` authorization header.
fn bearer_token(header: &str) -> Result<&str, AuthError> {
    let (scheme, token) = header
        .trim()
        .split_once(' ')
        .ok_or(AuthError::MalformedCredentials)?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(AuthError::MalformedCredentials);
    }
    Ok(token)
}

impl Authenticator for BearerTokenAuthenticator {
    async fn authenticate(&self, request: &AuthRequest) -> Result<Identity, AuthError> {
        let header = request
            .authorization
            .as_deref()
            .ok_or(AuthError::MissingCredentials)?;
        let raw = bearer_token(header)?;
        let claims = token::validate_access_token(raw, &self.config)?.0;
        Ok(Identity::new(claims.sub, claims.roles))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        assert_eq!(bearer_token("Bearer abc").unwrap(), "abc");
        assert_eq!(bearer_token("bearer  abc ").unwrap(), "abc");
    }

    #[test]
    fn other_schemes_are_malformed() {
        assert!(matches!(
            bearer_token("Basic dXNlcjpwdw=="),
            Err(AuthError::MalformedCredentials)
        ));
        assert!(matches!(
            bearer_token("Bearer"),
            Err(AuthError::MalformedCredentials)
        ));
        assert!(matches!(
            bearer_token("Bearer   "),
            Err(AuthError::MalformedCredentials)
        ));
    }
}
