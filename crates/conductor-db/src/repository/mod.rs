//! SurrealDB repository implementations.

mod checkpoint;
mod role;
mod worker;

pub use checkpoint::{CheckpointConfig, SurrealCheckpointRepository};
pub use role::SurrealRoleStore;
pub use worker::{SurrealWorkerIdentityRepository, WorkerIdentityConfig};
