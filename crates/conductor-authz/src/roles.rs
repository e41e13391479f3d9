//! In-memory [`PermissionChecker`] built from configured roles.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use conductor_core::access::PermissionChecker;
use conductor_core::error::{ConductorError, ConductorResult};
use conductor_core::models::identity::Identity;
use conductor_core::models::permission::Permission;
use conductor_core::models::role::Role;
use tracing::info;

/// Role name → granted permissions, replaceable at runtime.
#[derive(Debug, Default)]
pub struct RoleRegistry {
    roles: RwLock<HashMap<String, Role>>,
}

impl RoleRegistry {
    pub fn new(roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            roles: RwLock::new(
                roles
                    .into_iter()
                    .map(|role| (role.name.clone(), role))
                    .collect(),
            ),
        }
    }

    /// Add a role or replace its grants. Takes effect for the next check.
    pub fn upsert(&self, role: Role) {
        info!(
            role = %role.name,
            permissions = role.permissions.len(),
            "Updating role"
        );
        self.roles
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(role.name.clone(), role);
    }

    pub fn remove(&self, name: &str) -> Option<Role> {
        self.roles
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
    }
}

impl PermissionChecker for RoleRegistry {
    async fn has_access(&self, identity: &Identity, permission: &Permission) -> bool {
        let roles = self.roles.read().unwrap_or_else(PoisonError::into_inner);
        identity
            .roles
            .iter()
            .filter_map(|name| roles.get(name))
            .any(|role| role.grants(permission))
    }

    async fn find_role(&self, name: &str) -> ConductorResult<Role> {
        self.roles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| ConductorError::NotFound {
                entity: "role".into(),
                id: name.to_string(),
            })
    }
}
