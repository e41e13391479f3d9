//! Watch checkpoint domain model.

use serde::{Deserialize, Serialize};

/// Sentinel resource version meaning "watch from the beginning".
pub const FULL_RESYNC_VERSION: &str = "0";

/// The last acknowledged resource version of a watch stream, keyed by the
/// scheduler instance that owns the stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointRecord {
    /// Unique owner key (e.g., a scheduler job id).
    pub owner_id: String,
    /// Opaque token from the watched resource provider.
    pub resource_version: String,
}

impl CheckpointRecord {
    pub fn is_full_resync(&self) -> bool {
        self.resource_version == FULL_RESYNC_VERSION
    }
}
