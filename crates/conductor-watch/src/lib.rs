//! Resumable watch loop.
//!
//! [`WatchResumeCoordinator`] opens a watch at the last acknowledged
//! resource version, hands event batches to an [`EventHandler`], and
//! checkpoints each processed batch through a
//! [`CheckpointRepository`](conductor_core::repository::CheckpointRepository).

pub mod backoff;
pub mod coordinator;
pub mod error;
pub mod event;
pub mod source;

pub use backoff::Backoff;
pub use coordinator::{EventHandler, WatchConfig, WatchResumeCoordinator, WatchState};
pub use error::WatchError;
pub use event::{EventKind, WatchBatch, WatchEvent};
pub use source::{WatchSource, WatchStream};
