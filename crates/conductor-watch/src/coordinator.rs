//! Checkpointed watch loop.
//!
//! The coordinator moves between two states. `Resyncing` holds the version
//! just read from (or reset in) the checkpoint store, before a stream is
//! open at it. `Streaming` holds the last version acknowledged on an open
//! stream. Store calls always run to completion; shutdown is only observed
//! while waiting on the transport or sleeping between retries.

use std::time::Duration;

use conductor_core::repository::CheckpointRepository;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::backoff::Backoff;
use crate::error::WatchError;
use crate::event::{WatchBatch, WatchEvent};
use crate::source::{WatchSource, WatchStream};

/// Watch-loop configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Checkpoint key, one per scheduler instance.
    pub owner_id: String,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            owner_id: "scheduler".into(),
            initial_backoff_ms: 500,
            max_backoff_ms: 30_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl WatchConfig {
    pub fn backoff(&self) -> Backoff {
        Backoff::new(
            Duration::from_millis(self.initial_backoff_ms),
            Duration::from_millis(self.max_backoff_ms),
            self.backoff_multiplier,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchState {
    Resyncing { resource_version: String },
    Streaming { resource_version: String },
}

impl WatchState {
    pub fn resource_version(&self) -> &str {
        match self {
            Self::Resyncing { resource_version } | Self::Streaming { resource_version } => {
                resource_version
            }
        }
    }
}

/// Consumer of watch events.
///
/// Delivery is at-least-once: a batch is redelivered if the process stops
/// before its checkpoint commits, so handlers must be idempotent. Report
/// failure with [`WatchError::Handler`].
pub trait EventHandler: Send + Sync {
    fn handle(&self, events: &[WatchEvent]) -> impl Future<Output = Result<(), WatchError>> + Send;
}

pub struct WatchResumeCoordinator<R, S, H>
where
    R: CheckpointRepository,
    S: WatchSource,
    H: EventHandler,
{
    config: WatchConfig,
    checkpoints: R,
    source: S,
    handler: H,
    backoff: Backoff,
    state: WatchState,
}

impl<R, S, H> WatchResumeCoordinator<R, S, H>
where
    R: CheckpointRepository,
    S: WatchSource,
    H: EventHandler,
{
    pub fn new(config: WatchConfig, checkpoints: R, source: S, handler: H) -> Self {
        let backoff = config.backoff();
        Self {
            config,
            checkpoints,
            source,
            handler,
            backoff,
            state: WatchState::Resyncing {
                resource_version: conductor_core::models::checkpoint::FULL_RESYNC_VERSION.into(),
            },
        }
    }

    pub fn state(&self) -> &WatchState {
        &self.state
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Version the next watch should open at: the stored checkpoint,
    /// created at `"0"` on first use.
    pub async fn resume(&mut self) -> Result<String, WatchError> {
        let version = self.checkpoints.get_or_create(&self.config.owner_id).await?;
        self.state = WatchState::Resyncing {
            resource_version: version.clone(),
        };
        Ok(version)
    }

    /// Discard the stored position after the provider reported it gone.
    pub async fn resync(&mut self) -> Result<String, WatchError> {
        let version = self.checkpoints.reset(&self.config.owner_id).await?;
        self.state = WatchState::Resyncing {
            resource_version: version.clone(),
        };
        Ok(version)
    }

    /// Process one batch, then persist its latest version. Nothing is
    /// checkpointed if the handler fails.
    pub async fn acknowledge(&mut self, batch: WatchBatch) -> Result<(), WatchError> {
        let latest = batch.latest_version().map(str::to_owned);
        let work = batch.into_work();

        if !work.is_empty() {
            self.handler.handle(&work).await?;
        }

        if let Some(version) = latest {
            self.checkpoints
                .checkpoint(&self.config.owner_id, &version)
                .await?;
            debug!(
                owner_id = %self.config.owner_id,
                resource_version = %version,
                events = work.len(),
                "Checkpoint advanced"
            );
            self.state = WatchState::Streaming {
                resource_version: version,
            };
        }
        Ok(())
    }

    /// Drive the watch until `shutdown` resolves.
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut pending_reset = false;

        info!(owner_id = %self.config.owner_id, "Watch loop started");

        loop {
            let start = if pending_reset {
                self.resync().await
            } else {
                self.resume().await
            };
            let version = match start {
                Ok(version) => {
                    pending_reset = false;
                    version
                }
                Err(err) => {
                    warn!(owner_id = %self.config.owner_id, error = %err, "Checkpoint store unavailable");
                    if self.pause(&mut shutdown).await {
                        break;
                    }
                    continue;
                }
            };

            let opened = tokio::select! {
                biased;
                _ = &mut shutdown => break,
                opened = self.source.open(&version) => opened,
            };
            let mut stream = match opened {
                Ok(stream) => stream,
                Err(err) if err.is_gone() => {
                    info!(owner_id = %self.config.owner_id, resource_version = %version, "Watch position expired, resyncing");
                    pending_reset = true;
                    if self.pause(&mut shutdown).await {
                        break;
                    }
                    continue;
                }
                Err(err) => {
                    warn!(owner_id = %self.config.owner_id, error = %err, "Failed to open watch");
                    if self.pause(&mut shutdown).await {
                        break;
                    }
                    continue;
                }
            };

            info!(owner_id = %self.config.owner_id, resource_version = %version, "Watch opened");
            self.state = WatchState::Streaming {
                resource_version: version,
            };

            // Set once the stream has delivered at least one acknowledged
            // batch; a stream that ends before that reopens after a pause.
            let mut delivered = false;

            loop {
                let next = tokio::select! {
                    biased;
                    _ = &mut shutdown => {
                        info!(owner_id = %self.config.owner_id, "Watch loop stopped");
                        return;
                    }
                    next = stream.next_batch() => next,
                };

                match next {
                    Ok(Some(batch)) => match self.acknowledge(batch).await {
                        Ok(()) => {
                            self.backoff.reset();
                            delivered = true;
                        }
                        Err(err) => {
                            warn!(
                                owner_id = %self.config.owner_id,
                                resource_version = %self.state.resource_version(),
                                error = %err,
                                "Batch not acknowledged, reopening from last checkpoint"
                            );
                            if self.pause(&mut shutdown).await {
                                return;
                            }
                            break;
                        }
                    },
                    Ok(None) => {
                        debug!(owner_id = %self.config.owner_id, delivered, "Watch stream closed by provider");
                        if self.settle(delivered, &mut shutdown).await {
                            return;
                        }
                        break;
                    }
                    Err(err) if err.is_gone() => {
                        info!(owner_id = %self.config.owner_id, error = %err, "Watch position expired, resyncing");
                        pending_reset = true;
                        if self.settle(delivered, &mut shutdown).await {
                            return;
                        }
                        break;
                    }
                    Err(err) => {
                        warn!(owner_id = %self.config.owner_id, error = %err, "Watch stream failed");
                        if self.pause(&mut shutdown).await {
                            return;
                        }
                        break;
                    }
                }
            }
        }

        info!(owner_id = %self.config.owner_id, "Watch loop stopped");
    }

    /// Wait before reopening a stream that ended on its own. A stream that
    /// made progress only yields to the runtime; one that delivered nothing
    /// backs off. Returns `true` if shutdown was requested meanwhile.
    async fn settle<F>(&mut self, delivered: bool, shutdown: &mut F) -> bool
    where
        F: Future<Output = ()> + Unpin,
    {
        if delivered {
            tokio::task::yield_now().await;
            false
        } else {
            self.pause(shutdown).await
        }
    }

    /// Sleep for the next backoff delay. Returns `true` if shutdown was
    /// requested meanwhile.
    async fn pause<F>(&mut self, shutdown: &mut F) -> bool
    where
        F: Future<Output = ()> + Unpin,
    {
        let delay = self.backoff.next_delay();
        debug!(delay_ms = delay.as_millis() as u64, "Backing off");
        tokio::select! {
            biased;
            _ = shutdown => true,
            _ = tokio::time::sleep(delay) => false,
        }
    }
}
