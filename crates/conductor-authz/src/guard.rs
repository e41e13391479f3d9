//! The access guard: authentication followed by authorization, run
//! before an action handler.
//!
//! Unauthenticated callers get [`AccessError::Unauthenticated`] (401)
//! and are never evaluated by the gate. Authenticated callers lacking a
//! permission get [`AccessError::Forbidden`] (403), whose message does
//! not say which permission was missing.

use conductor_core::access::PermissionChecker;
use conductor_core::error::ConductorError;
use conductor_core::models::identity::Identity;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::authenticator::{AuthRequest, Authenticator};
use crate::error::AuthError;
use crate::gate::{AccessContext, AuthorizationGate, Decision};
use crate::token::token_fingerprint;

#[derive(Debug, Error)]
pub enum AccessError {
    #[error("unauthenticated")]
    Unauthenticated(#[source] AuthError),

    /// `missing` is for audit logs only.
    #[error("forbidden")]
    Forbidden { action: String, missing: String },

    #[error("internal error")]
    Internal(String),
}

impl AccessError {
    pub fn status_code(&self) -> u16 {
        match self {
            AccessError::Unauthenticated(_) => 401,
            AccessError::Forbidden { .. } => 403,
            AccessError::Internal(_) => 500,
        }
    }
}

impl From<AccessError> for ConductorError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::Unauthenticated(auth) => auth.into(),
            AccessError::Forbidden { action, missing } => {
                ConductorError::AuthorizationDenied { action, missing }
            }
            AccessError::Internal(msg) => ConductorError::Internal(msg),
        }
    }
}

/// Runs an [`Authenticator`] and then an [`AuthorizationGate`].
pub struct AccessGuard<A: Authenticator, P: PermissionChecker> {
    authenticator: A,
    gate: AuthorizationGate<P>,
}

impl<A: Authenticator, P: PermissionChecker> AccessGuard<A, P> {
    pub fn new(authenticator: A, gate: AuthorizationGate<P>) -> Self {
        Self {
            authenticator,
            gate,
        }
    }

    pub fn gate(&self) -> &AuthorizationGate<P> {
        &self.gate
    }

    /// Authenticate `request` and authorize `action` for the resulting
    /// identity.
    pub async fn check(
        &self,
        request: &AuthRequest,
        action: &str,
        context: &AccessContext,
    ) -> Result<Identity, AccessError> {
        let identity = match self.authenticator.authenticate(request).await {
            Ok(identity) => identity,
            Err(AuthError::Crypto(msg)) => {
                error!(action, error = %msg, "Authenticator misconfigured");
                return Err(AccessError::Internal(msg));
            }
            Err(err) => {
                let fingerprint = request.authorization.as_deref().map(token_fingerprint);
                info!(
                    action,
                    peer = ?request.peer_addr,
                    credential = ?fingerprint,
                    reason = %err,
                    outcome = "unauthenticated",
                    "Access audit"
                );
                return Err(AccessError::Unauthenticated(err));
            }
        };

        match self.gate.authorize(&identity, action, context).await {
            Decision::Allow => {
                info!(
                    subject = %identity.subject,
                    action,
                    outcome = "allowed",
                    "Access audit"
                );
                Ok(identity)
            }
            Decision::Deny(denial) => {
                let missing = denial.unmet.join(" | ");
                warn!(
                    subject = %identity.subject,
                    action,
                    group = ?denial.group,
                    missing = %missing,
                    outcome = "denied",
                    "Access audit"
                );
                Err(AccessError::Forbidden {
                    action: action.to_string(),
                    missing,
                })
            }
        }
    }

    /// Run `handler` with the caller's identity once access is granted.
    pub async fn call<F, Fut, T>(
        &self,
        request: &AuthRequest,
        action: &str,
        context: &AccessContext,
        handler: F,
    ) -> Result<T, AccessError>
    where
        F: FnOnce(Identity) -> Fut,
        Fut: Future<Output = T>,
    {
        let identity = self.check(request, action, context).await?;
        Ok(handler(identity).await)
    }
}
