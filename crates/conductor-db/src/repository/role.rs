//! SurrealDB-backed [`PermissionChecker`].
//!
//! Roles live in the `role` table keyed by name; each granted permission
//! is one `role_permission` row. Grants are seeded from configuration via
//! [`SurrealRoleStore::define_role`].

use std::collections::HashSet;

use conductor_core::access::PermissionChecker;
use conductor_core::error::ConductorResult;
use conductor_core::models::identity::Identity;
use conductor_core::models::permission::Permission;
use conductor_core::models::role::Role;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::{debug, info, warn};

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct RoleRow {
    name: String,
}

#[derive(Debug, SurrealValue)]
struct PermissionRow {
    capability: String,
    resource: String,
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the role store.
#[derive(Clone)]
pub struct SurrealRoleStore<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealRoleStore<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// Create `role` or replace all of its grants with `role.permissions`.
    ///
    /// Runs as one transaction: if any grant fails to insert, the role
    /// keeps its previous grants. Duplicate permissions are collapsed.
    pub async fn define_role(&self, role: &Role) -> ConductorResult<()> {
        let mut seen = HashSet::new();
        let grants: Vec<Vec<String>> = role
            .permissions
            .iter()
            .filter(|p| seen.insert(*p))
            .map(|p| vec![p.capability.clone(), p.resource.clone()])
            .collect();
        let granted = grants.len();

        self.db
            .query(
                "BEGIN TRANSACTION; \
                 UPSERT type::record('role', $name) SET \
                 name = $name, updated_at = time::now(); \
                 DELETE role_permission WHERE role = $name; \
                 FOR $grant IN $grants { \
                     CREATE role_permission SET \
                     role = $name, capability = $grant[0], resource = $grant[1]; \
                 }; \
                 COMMIT TRANSACTION;",
            )
            .bind(("name", role.name.clone()))
            .bind(("grants", grants))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from_statement)?;

        info!(role = %role.name, permissions = granted, "Defined role");
        Ok(())
    }

    async fn count_grants(
        &self,
        roles: &[String],
        permission: &Permission,
    ) -> Result<u64, DbError> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM role_permission \
                 WHERE role IN $roles \
                 AND capability = $capability \
                 AND resource = $resource \
                 GROUP ALL",
            )
            .bind(("roles", roles.to_vec()))
            .bind(("capability", permission.capability.clone()))
            .bind(("resource", permission.resource.clone()))
            .await?;

        let rows: Vec<CountRow> = result.take(0)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }
}

impl<C: Connection> PermissionChecker for SurrealRoleStore<C> {
    async fn has_access(&self, identity: &Identity, permission: &Permission) -> bool {
        if identity.roles.is_empty() {
            return false;
        }

        match self.count_grants(&identity.roles, permission).await {
            Ok(total) => {
                debug!(
                    subject = %identity.subject,
                    %permission,
                    granted = total > 0,
                    "Role store permission check"
                );
                total > 0
            }
            Err(err) => {
                warn!(
                    subject = %identity.subject,
                    %permission,
                    error = %err,
                    "Role store unavailable, denying"
                );
                false
            }
        }
    }

    async fn find_role(&self, name: &str) -> ConductorResult<Role> {
        let mut result = self
            .db
            .query("SELECT name FROM type::record('role', $name)")
            .bind(("name", name.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "role".into(),
            id: name.to_string(),
        })?;

        let mut result = self
            .db
            .query(
                "SELECT capability, resource FROM role_permission \
                 WHERE role = $name \
                 ORDER BY capability ASC, resource ASC",
            )
            .bind(("name", name.to_string()))
            .await
            .map_err(DbError::from)?;

        let grants: Vec<PermissionRow> = result.take(0).map_err(DbError::from)?;

        Ok(Role {
            name: row.name,
            permissions: grants
                .into_iter()
                .map(|g| Permission::new(g.capability, g.resource))
                .collect(),
        })
    }
}
