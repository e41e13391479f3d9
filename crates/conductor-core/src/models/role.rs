//! Role domain model.

use serde::{Deserialize, Serialize};

use super::permission::Permission;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
    pub permissions: Vec<Permission>,
}

impl Role {
    pub fn grants(&self, permission: &Permission) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}
