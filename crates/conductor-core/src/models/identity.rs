//! Authenticated caller identity.

use serde::{Deserialize, Serialize};

/// The principal produced by a successful authentication.
///
/// Carries role names only; what those roles grant is resolved on every
/// check through a [`PermissionChecker`](crate::access::PermissionChecker).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable subject identifier (user or service account id).
    pub subject: String,
    /// Names of the roles held by the subject.
    pub roles: Vec<String>,
}

impl Identity {
    pub fn new(subject: impl Into<String>, roles: Vec<String>) -> Self {
        Self {
            subject: subject.into(),
            roles,
        }
    }
}
