//! SurrealDB connection management.

use serde::Deserialize;
use surrealdb::Surreal;
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use tracing::info;

use crate::error::DbError;
use crate::repository::{
    CheckpointConfig, SurrealCheckpointRepository, SurrealRoleStore,
    SurrealWorkerIdentityRepository, WorkerIdentityConfig,
};
use crate::schema::run_migrations;

/// Where the checkpoint store lives.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    /// WebSocket endpoint, `host:port`.
    pub url: String,
    pub namespace: String,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "127.0.0.1:8000".into(),
            namespace: "conductor".into(),
            database: "main".into(),
            username: "root".into(),
            password: "root".into(),
        }
    }
}

/// A migrated SurrealDB session and the repositories built on it.
#[derive(Clone)]
pub struct DbManager {
    db: Surreal<Client>,
}

impl DbManager {
    /// Sign in as root and select the configured namespace and database.
    ///
    /// The schema is not touched; see [`DbManager::open`].
    pub async fn connect(config: &DbConfig) -> Result<Self, DbError> {
        info!(
            url = %config.url,
            namespace = %config.namespace,
            database = %config.database,
            "Connecting to checkpoint store"
        );

        let db = Surreal::new::<Ws>(config.url.as_str()).await?;
        db.signin(Root {
            username: config.username.clone(),
            password: config.password.clone(),
        })
        .await?;
        db.use_ns(&config.namespace).use_db(&config.database).await?;

        Ok(Self { db })
    }

    /// Connect and bring the schema up to date.
    pub async fn open(config: &DbConfig) -> Result<Self, DbError> {
        let manager = Self::connect(config).await?;
        let applied = run_migrations(&manager.db).await?;
        info!(applied, "Checkpoint store ready");
        Ok(manager)
    }

    pub fn client(&self) -> &Surreal<Client> {
        &self.db
    }

    pub fn checkpoints(&self, config: CheckpointConfig) -> SurrealCheckpointRepository<Client> {
        SurrealCheckpointRepository::with_config(self.db.clone(), config)
    }

    pub fn worker_identities(
        &self,
        config: WorkerIdentityConfig,
    ) -> SurrealWorkerIdentityRepository<Client> {
        SurrealWorkerIdentityRepository::with_config(self.db.clone(), config)
    }

    pub fn role_store(&self) -> SurrealRoleStore<Client> {
        SurrealRoleStore::new(self.db.clone())
    }
}
