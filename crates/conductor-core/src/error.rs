//! Error types for the Conductor system.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConductorError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    /// The caller is known but lacks a required permission.
    ///
    /// `missing` is kept for audit logging only; the rendered message
    /// never includes it.
    #[error("forbidden")]
    AuthorizationDenied { action: String, missing: String },

    /// A uniqueness race could not be resolved within the retry budget.
    #[error("Conflict on {entity}: {reason}")]
    Conflict { entity: String, reason: String },

    #[error("Checkpoint store unavailable: {0}")]
    CheckpointUnavailable(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cryptography error: {0}")]
    Crypto(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConductorError {
    /// HTTP status an API layer should answer with for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            ConductorError::AuthenticationFailed { .. } => 401,
            ConductorError::AuthorizationDenied { .. } => 403,
            ConductorError::NotFound { .. } => 404,
            ConductorError::Conflict { .. } => 409,
            ConductorError::CheckpointUnavailable(_) => 503,
            ConductorError::Database(_)
            | ConductorError::Crypto(_)
            | ConductorError::Internal(_) => 500,
        }
    }
}

pub type ConductorResult<T> = Result<T, ConductorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authentication_and_authorization_map_to_distinct_statuses() {
        let unauthenticated = ConductorError::AuthenticationFailed {
            reason: "missing bearer token".into(),
        };
        let forbidden = ConductorError::AuthorizationDenied {
            action: "trigger_dag".into(),
            missing: "can_trigger on Airflow".into(),
        };
        assert_eq!(unauthenticated.status_code(), 401);
        assert_eq!(forbidden.status_code(), 403);
    }

    #[test]
    fn denial_message_does_not_leak_permission() {
        let err = ConductorError::AuthorizationDenied {
            action: "delete_dag".into(),
            missing: "can_dag_edit on D1".into(),
        };
        let rendered = err.to_string();
        assert_eq!(rendered, "forbidden");
        assert!(!rendered.contains("can_dag_edit"));
    }
}
