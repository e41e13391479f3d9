//! Conductor server: application entry point.

mod config;

use anyhow::{Context, Result};
use conductor_authz::{AccessGuard, AuthorizationGate, BearerTokenAuthenticator, PermissionCatalog};
use conductor_core::models::checkpoint::CheckpointRecord;
use conductor_core::repository::{CheckpointRepository, WorkerIdentityRepository};
use conductor_db::DbManager;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("conductor=info"));
    tracing_subscriber::fmt().with_env_filter(filter).json().init();

    tracing::info!("Starting Conductor server...");

    let config = config::load(&config::config_path()).await?;

    let db = DbManager::open(&config.db)
        .await
        .context("Failed to open the checkpoint store")?;

    let roles = db.role_store();
    for role in &config.roles {
        roles
            .define_role(role)
            .await
            .with_context(|| format!("Failed to define role {}", role.name))?;
    }
    tracing::info!(roles = config.roles.len(), "Seeded roles");

    if config.auth.jwt_public_key_pem.is_empty() {
        tracing::warn!("No JWT public key configured; bearer tokens cannot be verified");
    }
    let catalog = PermissionCatalog::standard().extend(config.actions.clone());
    let guard = AccessGuard::new(
        BearerTokenAuthenticator::new(config.auth.clone()),
        AuthorizationGate::new(catalog, roles),
    );

    let owner_id = config.watch.owner_id.as_str();
    let worker = db
        .worker_identities(config.worker.clone())
        .claim(owner_id)
        .await?;

    let checkpoint = CheckpointRecord {
        owner_id: owner_id.to_string(),
        resource_version: db
            .checkpoints(config.checkpoint.clone())
            .get_or_create(owner_id)
            .await?,
    };

    tracing::info!(
        owner_id,
        worker_uuid = %worker.worker_uuid,
        resource_version = %checkpoint.resource_version,
        full_resync = checkpoint.is_full_resync(),
        guarded_actions = guard.gate().catalog().len(),
        request_listener = false,
        "Conductor server ready; access guard built but not serving requests"
    );

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    tracing::info!("Conductor server stopped.");
    Ok(())
}
