//! Server configuration file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use conductor_authz::{ActionRequirement, AuthConfig};
use conductor_core::models::role::Role;
use conductor_db::DbConfig;
use conductor_db::repository::{CheckpointConfig, WorkerIdentityConfig};
use conductor_watch::WatchConfig;
use serde::Deserialize;
use tokio::fs;
use tracing::{debug, info};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "CONDUCTOR_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "conductor.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub db: DbConfig,
    pub auth: AuthConfig,
    /// Role definitions seeded into the role store at startup.
    pub roles: Vec<Role>,
    /// Extra catalog entries, merged over the built-in actions.
    pub actions: HashMap<String, ActionRequirement>,
    pub watch: WatchConfig,
    pub checkpoint: CheckpointConfig,
    pub worker: WorkerIdentityConfig,
}

pub fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// Load the config at `path`; a missing file yields defaults.
pub async fn load(path: &Path) -> Result<ServerConfig> {
    if !fs::try_exists(path).await.unwrap_or(false) {
        debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(ServerConfig::default());
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config = parse(&raw)
        .with_context(|| format!("Failed to parse config TOML at: {}", path.display()))?;

    info!(path = %path.display(), "Loaded config");
    Ok(config)
}

pub fn parse(raw: &str) -> Result<ServerConfig> {
    Ok(toml::from_str(raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config.db.namespace, "conductor");
        assert_eq!(config.watch.owner_id, "scheduler");
        assert!(config.roles.is_empty());
        assert!(config.actions.is_empty());
    }

    #[test]
    fn sections_override_defaults() {
        let config = parse(
            r#"
            [db]
            url = "db.internal:8000"

            [watch]
            owner_id = "sched-7"
            max_backoff_ms = 1000

            [[roles]]
            name = "Op"
            permissions = [
                { capability = "can_trigger", resource = "Airflow" },
            ]

            [actions.clear_task]
            groups = [{ all = [{ capability = "can_edit", resource = "TaskInstanceModelView" }] }]
            "#,
        )
        .unwrap();

        assert_eq!(config.db.url, "db.internal:8000");
        assert_eq!(config.db.database, "main");
        assert_eq!(config.watch.owner_id, "sched-7");
        assert_eq!(config.watch.initial_backoff_ms, 500);
        assert_eq!(config.roles[0].permissions.len(), 1);
        assert!(!config.actions["clear_task"].is_empty());
    }

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let config = load(Path::new("/nonexistent/conductor.toml")).await.unwrap();
        assert_eq!(config.checkpoint.max_create_attempts, 5);
    }
}
