//! SurrealDB implementation of [`WorkerIdentityRepository`].

use chrono::{DateTime, Utc};
use conductor_core::error::{ConductorError, ConductorResult};
use conductor_core::models::worker::WorkerIdentity;
use conductor_core::repository::WorkerIdentityRepository;
use serde::Deserialize;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct WorkerRow {
    owner_id: String,
    worker_uuid: String,
    claimed_at: DateTime<Utc>,
}

impl WorkerRow {
    fn try_into_identity(self) -> Result<WorkerIdentity, DbError> {
        let worker_uuid = Uuid::parse_str(&self.worker_uuid)
            .map_err(|e| DbError::Decode(format!("invalid worker UUID: {e}")))?;
        Ok(WorkerIdentity {
            owner_id: self.owner_id,
            worker_uuid,
            claimed_at: self.claimed_at,
        })
    }
}

/// Tuning for [`SurrealWorkerIdentityRepository`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkerIdentityConfig {
    /// Fresh identifiers tried before a claim fails (default: 3).
    pub max_claim_attempts: u32,
}

impl Default for WorkerIdentityConfig {
    fn default() -> Self {
        Self {
            max_claim_attempts: 3,
        }
    }
}

/// SurrealDB implementation of the worker identity repository.
#[derive(Clone)]
pub struct SurrealWorkerIdentityRepository<C: Connection> {
    db: Surreal<C>,
    config: WorkerIdentityConfig,
    generate: fn() -> Uuid,
}

impl<C: Connection> SurrealWorkerIdentityRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self::with_config(db, WorkerIdentityConfig::default())
    }

    pub fn with_config(db: Surreal<C>, config: WorkerIdentityConfig) -> Self {
        Self {
            db,
            config,
            generate: Uuid::new_v4,
        }
    }

    /// Replace the identifier source. Used to exercise collisions.
    pub fn with_generator(mut self, generate: fn() -> Uuid) -> Self {
        self.generate = generate;
        self
    }

    async fn insert(&self, owner_id: &str, worker_uuid: Uuid) -> Result<WorkerIdentity, DbError> {
        let result = self
            .db
            .query(
                "CREATE type::record('kube_worker_uuid', $owner_id) SET \
                 owner_id = $owner_id, worker_uuid = $worker_uuid",
            )
            .bind(("owner_id", owner_id.to_string()))
            .bind(("worker_uuid", worker_uuid.to_string()))
            .await?;

        let mut result = result.check().map_err(DbError::from_statement)?;

        let rows: Vec<WorkerRow> = result.take(0)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "kube_worker_uuid".into(),
            id: owner_id.to_string(),
        })?;
        row.try_into_identity()
    }
}

impl<C: Connection> WorkerIdentityRepository for SurrealWorkerIdentityRepository<C> {
    async fn claim(&self, owner_id: &str) -> ConductorResult<WorkerIdentity> {
        for attempt in 1..=self.config.max_claim_attempts {
            if let Some(existing) = self.get(owner_id).await? {
                return Ok(existing);
            }

            let candidate = (self.generate)();
            match self.insert(owner_id, candidate).await {
                Ok(identity) => {
                    info!(
                        owner_id,
                        worker_uuid = %identity.worker_uuid,
                        "Claimed worker identity"
                    );
                    return Ok(identity);
                }
                Err(DbError::Conflict(reason)) => {
                    warn!(
                        owner_id,
                        attempt,
                        worker_uuid = %candidate,
                        %reason,
                        "Worker identity claim conflicted"
                    );
                }
                Err(other) => return Err(other.into()),
            }
        }

        Err(ConductorError::Conflict {
            entity: "kube_worker_uuid".into(),
            reason: format!(
                "no unique worker identity for {owner_id} after {} attempts",
                self.config.max_claim_attempts
            ),
        })
    }

    async fn get(&self, owner_id: &str) -> ConductorResult<Option<WorkerIdentity>> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('kube_worker_uuid', $owner_id)")
            .bind(("owner_id", owner_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<WorkerRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.try_into_identity()?)),
            None => Ok(None),
        }
    }
}
