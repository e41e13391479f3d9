//! Worker identity domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A unique worker identifier claimed by a scheduler instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerIdentity {
    pub owner_id: String,
    pub worker_uuid: Uuid,
    pub claimed_at: DateTime<Utc>,
}
