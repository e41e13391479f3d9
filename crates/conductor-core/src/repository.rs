//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async and commit before returning.

use crate::error::ConductorResult;
use crate::models::checkpoint::CheckpointRecord;
use crate::models::worker::WorkerIdentity;

// ---------------------------------------------------------------------------
// Watch checkpoints
// ---------------------------------------------------------------------------

/// Durable store of the last acknowledged watch resource version per
/// owner.
pub trait CheckpointRepository: Send + Sync {
    /// Stored record for `owner_id`, without creating one.
    fn get(
        &self,
        owner_id: &str,
    ) -> impl Future<Output = ConductorResult<Option<CheckpointRecord>>> + Send;

    /// Return the stored version for `owner_id`, creating the record at
    /// the full-resync sentinel `"0"` on first access.
    ///
    /// Racing first accesses for the same owner resolve to a single
    /// record and all callers observe the same version.
    fn get_or_create(&self, owner_id: &str) -> impl Future<Output = ConductorResult<String>> + Send;

    /// Advance the stored version.
    ///
    /// An empty `resource_version` is a no-op, as is a call for an owner
    /// without a record.
    fn checkpoint(
        &self,
        owner_id: &str,
        resource_version: &str,
    ) -> impl Future<Output = ConductorResult<()>> + Send;

    /// Force the stored version back to `"0"`, creating the record if
    /// needed. Always returns `"0"`.
    fn reset(&self, owner_id: &str) -> impl Future<Output = ConductorResult<String>> + Send;
}

// ---------------------------------------------------------------------------
// Worker identities
// ---------------------------------------------------------------------------

pub trait WorkerIdentityRepository: Send + Sync {
    /// Return the worker identity held by `owner_id`, claiming a fresh
    /// one if the owner has none.
    fn claim(&self, owner_id: &str) -> impl Future<Output = ConductorResult<WorkerIdentity>> + Send;

    /// Current claim for `owner_id`, if any.
    fn get(
        &self,
        owner_id: &str,
    ) -> impl Future<Output = ConductorResult<Option<WorkerIdentity>>> + Send;
}
