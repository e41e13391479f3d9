//! Watch transport seam.
//!
//! A [`WatchSource`] opens streams positioned at a resource version; the
//! coordinator never talks to the provider directly.

use crate::error::WatchError;
use crate::event::WatchBatch;

pub trait WatchSource: Send + Sync {
    type Stream: WatchStream;

    /// Open a watch that delivers changes after `resource_version`
    /// (`"0"` lists from the beginning).
    fn open(
        &self,
        resource_version: &str,
    ) -> impl Future<Output = Result<Self::Stream, WatchError>> + Send;
}

pub trait WatchStream: Send {
    /// Next batch of events. `Ok(None)` means the provider closed the
    /// stream; [`WatchError::Gone`] means the position has expired.
    fn next_batch(&mut self) -> impl Future<Output = Result<Option<WatchBatch>, WatchError>> + Send;
}
