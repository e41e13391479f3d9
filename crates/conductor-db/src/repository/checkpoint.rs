//! SurrealDB implementation of [`CheckpointRepository`].
//!
//! The owner id is the record key of `kube_resource_version`, so two
//! racing `CREATE`s for the same owner cannot both succeed. The loser
//! re-reads the winner's row instead of retrying blindly.

use conductor_core::error::{ConductorError, ConductorResult};
use conductor_core::models::checkpoint::{CheckpointRecord, FULL_RESYNC_VERSION};
use conductor_core::repository::CheckpointRepository;
use serde::Deserialize;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::{debug, info, warn};

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct CheckpointRow {
    owner_id: String,
    resource_version: String,
}

impl From<CheckpointRow> for CheckpointRecord {
    fn from(row: CheckpointRow) -> Self {
        CheckpointRecord {
            owner_id: row.owner_id,
            resource_version: row.resource_version,
        }
    }
}

/// Tuning for [`SurrealCheckpointRepository`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CheckpointConfig {
    /// Read/create rounds `get_or_create` makes before giving up
    /// (default: 5).
    pub max_create_attempts: u32,
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            max_create_attempts: 5,
        }
    }
}

fn unavailable(err: DbError) -> ConductorError {
    ConductorError::CheckpointUnavailable(err.to_string())
}

/// SurrealDB implementation of the checkpoint repository.
#[derive(Clone)]
pub struct SurrealCheckpointRepository<C: Connection> {
    db: Surreal<C>,
    config: CheckpointConfig,
}

impl<C: Connection> SurrealCheckpointRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self::with_config(db, CheckpointConfig::default())
    }

    pub fn with_config(db: Surreal<C>, config: CheckpointConfig) -> Self {
        Self { db, config }
    }

    async fn fetch(&self, owner_id: &str) -> Result<Option<CheckpointRecord>, DbError> {
        let mut result = self
            .db
            .query(
                "SELECT owner_id, resource_version \
                 FROM type::record('kube_resource_version', $owner_id)",
            )
            .bind(("owner_id", owner_id.to_string()))
            .await?;

        let rows: Vec<CheckpointRow> = result.take(0)?;
        Ok(rows.into_iter().next().map(CheckpointRecord::from))
    }

    async fn create(&self, owner_id: &str) -> Result<String, DbError> {
        let result = self
            .db
            .query(
                "CREATE type::record('kube_resource_version', $owner_id) SET \
                 owner_id = $owner_id, resource_version = $resource_version",
            )
            .bind(("owner_id", owner_id.to_string()))
            .bind(("resource_version", FULL_RESYNC_VERSION.to_string()))
            .await?;

        let mut result = result.check().map_err(DbError::from_statement)?;

        let rows: Vec<CheckpointRow> = result.take(0)?;
        rows.into_iter()
            .next()
            .map(|row| row.resource_version)
            .ok_or_else(|| DbError::NotFound {
                entity: "kube_resource_version".into(),
                id: owner_id.to_string(),
            })
    }
}

impl<C: Connection> CheckpointRepository for SurrealCheckpointRepository<C> {
    async fn get(&self, owner_id: &str) -> ConductorResult<Option<CheckpointRecord>> {
        self.fetch(owner_id).await.map_err(unavailable)
    }

    async fn get_or_create(&self, owner_id: &str) -> ConductorResult<String> {
        for attempt in 1..=self.config.max_create_attempts {
            if let Some(record) = self.fetch(owner_id).await.map_err(unavailable)? {
                debug!(
                    owner_id,
                    resource_version = %record.resource_version,
                    "Found checkpoint"
                );
                return Ok(record.resource_version);
            }

            match self.create(owner_id).await {
                Ok(version) => {
                    info!(owner_id, "Created checkpoint record for full resync");
                    return Ok(version);
                }
                // Another claimant may have committed first. The next
                // read either finds its row or reports the store down.
                Err(err) => {
                    debug!(
                        owner_id,
                        attempt,
                        error = %err,
                        "Checkpoint create lost a race, re-reading"
                    );
                }
            }
        }

        warn!(
            owner_id,
            attempts = self.config.max_create_attempts,
            "Giving up on checkpoint record creation"
        );
        Err(ConductorError::CheckpointUnavailable(format!(
            "no checkpoint record for {owner_id} after {} attempts",
            self.config.max_create_attempts
        )))
    }

    async fn checkpoint(&self, owner_id: &str, resource_version: &str) -> ConductorResult<()> {
        if resource_version.is_empty() {
            debug!(owner_id, "Ignoring empty resource version");
            return Ok(());
        }

        // UPDATE on a missing record id matches nothing and creates nothing.
        let result = self
            .db
            .query(
                "UPDATE type::record('kube_resource_version', $owner_id) SET \
                 resource_version = $resource_version",
            )
            .bind(("owner_id", owner_id.to_string()))
            .bind(("resource_version", resource_version.to_string()))
            .await
            .map_err(|e| unavailable(e.into()))?;

        result
            .check()
            .map_err(|e| unavailable(DbError::from_statement(e)))?;

        debug!(owner_id, resource_version, "Checkpointed resource version");
        Ok(())
    }

    async fn reset(&self, owner_id: &str) -> ConductorResult<String> {
        let result = self
            .db
            .query(
                "UPSERT type::record('kube_resource_version', $owner_id) SET \
                 owner_id = $owner_id, resource_version = $resource_version",
            )
            .bind(("owner_id", owner_id.to_string()))
            .bind(("resource_version", FULL_RESYNC_VERSION.to_string()))
            .await
            .map_err(|e| unavailable(e.into()))?;

        result
            .check()
            .map_err(|e| unavailable(DbError::from_statement(e)))?;

        info!(owner_id, "Reset resource version to full resync");
        Ok(FULL_RESYNC_VERSION.to_string())
    }
}
