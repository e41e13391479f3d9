//! Permission domain model.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A capability bound to a resource scope, e.g. `can_trigger` on
/// `Airflow` or `can_dag_edit` on a specific DAG id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permission {
    /// The capability name (e.g., `can_delete`).
    pub capability: String,
    /// The resource scope the capability applies to.
    pub resource: String,
}

impl Permission {
    pub fn new(capability: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            capability: capability.into(),
            resource: resource.into(),
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on {}", self.capability, self.resource)
    }
}
