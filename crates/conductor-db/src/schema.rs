//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity. Owner
//! ids double as record keys, and every natural key is additionally
//! guarded by a UNIQUE index.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Watch checkpoints (one row per owning scheduler)
-- =======================================================================
DEFINE TABLE kube_resource_version SCHEMAFULL;
DEFINE FIELD owner_id ON TABLE kube_resource_version TYPE string;
DEFINE FIELD resource_version ON TABLE kube_resource_version TYPE string \
    DEFAULT '0';
DEFINE FIELD updated_at ON TABLE kube_resource_version TYPE datetime \
    VALUE time::now();
DEFINE INDEX idx_resource_version_owner ON TABLE kube_resource_version \
    COLUMNS owner_id UNIQUE;

-- =======================================================================
-- Worker identities (one claim per owning scheduler)
-- =======================================================================
DEFINE TABLE kube_worker_uuid SCHEMAFULL;
DEFINE FIELD owner_id ON TABLE kube_worker_uuid TYPE string;
DEFINE FIELD worker_uuid ON TABLE kube_worker_uuid TYPE string;
DEFINE FIELD claimed_at ON TABLE kube_worker_uuid TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_worker_owner ON TABLE kube_worker_uuid \
    COLUMNS owner_id UNIQUE;
DEFINE INDEX idx_worker_uuid ON TABLE kube_worker_uuid \
    COLUMNS worker_uuid UNIQUE;

-- =======================================================================
-- Roles and their granted permissions
-- =======================================================================
DEFINE TABLE role SCHEMAFULL;
DEFINE FIELD name ON TABLE role TYPE string;
DEFINE FIELD created_at ON TABLE role TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE role TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_role_name ON TABLE role COLUMNS name UNIQUE;

DEFINE TABLE role_permission SCHEMAFULL;
DEFINE FIELD role ON TABLE role_permission TYPE string;
DEFINE FIELD capability ON TABLE role_permission TYPE string;
DEFINE FIELD resource ON TABLE role_permission TYPE string;
DEFINE INDEX idx_role_permission ON TABLE role_permission \
    COLUMNS role, capability, resource UNIQUE;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Highest migration version recorded in `_migration` (0 on a fresh
/// database).
pub async fn schema_version<C: Connection>(db: &Surreal<C>) -> Result<u32, DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let mut result = db
        .query("SELECT version, name FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    Ok(records.first().map_or(0, |m| m.version))
}

async fn apply<C: Connection>(db: &Surreal<C>, migration: &Migration) -> Result<(), DbError> {
    let failed = |stage: &str, err: surrealdb::Error| {
        DbError::Migration(format!(
            "v{} '{}' {stage}: {err}",
            migration.version, migration.name
        ))
    };

    db.query(migration.sql)
        .await?
        .check()
        .map_err(|e| failed("failed", e))?;

    db.query("CREATE _migration SET version = $version, name = $name")
        .bind(("version", migration.version))
        .bind(("name", migration.name))
        .await?
        .check()
        .map_err(|e| failed("could not be recorded", e))?;
    Ok(())
}

/// Bring the schema up to date. Returns how many migrations were applied;
/// rerunning against a current schema applies none.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<usize, DbError> {
    let current = schema_version(db).await?;
    let mut applied = 0;

    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        info!(version = migration.version, name = migration.name, "Applying migration");
        apply(db, migration).await?;
        applied += 1;
    }

    if applied > 0 {
        info!(from = current, applied, "Schema migrated");
    }
    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_ordered() {
        for window in MIGRATIONS.windows(2) {
            assert!(
                window[0].version < window[1].version,
                "Migrations must be in ascending version order"
            );
        }
    }

    #[test]
    fn checkpoint_owner_is_unique() {
        assert!(SCHEMA_V1.contains("COLUMNS owner_id UNIQUE"));
    }
}
