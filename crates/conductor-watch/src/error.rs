//! Watch-loop error types.

use conductor_core::error::ConductorError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WatchError {
    /// The requested resource version is too old for the provider to
    /// replay (HTTP 410). Recovery requires a full resync.
    #[error("resource version {resource_version} is gone")]
    Gone { resource_version: String },

    #[error("watch transport error: {0}")]
    Transport(String),

    /// The event handler could not process a batch.
    #[error("event handler failed: {0}")]
    Handler(String),

    #[error("checkpoint store error: {0}")]
    Checkpoint(#[from] ConductorError),
}

impl WatchError {
    pub fn is_gone(&self) -> bool {
        matches!(self, Self::Gone { .. })
    }
}
