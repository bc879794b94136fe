//! The long-lived subscription worker.

use std::sync::Arc;
use std::time::Duration;

use event_store::{GlobalPosition, StreamSelector, SubscriptionSource};
use tokio_util::sync::CancellationToken;

use crate::pipeline::EventDispatcher;

/// Configuration for one subscription worker.
#[derive(Debug, Clone)]
pub struct SubscriptionWorkerConfig {
    /// Checkpoint group name; each group tracks its own position.
    pub group_name: String,

    /// Which committed events this worker consumes.
    pub selector: StreamSelector,

    /// Events read per batch.
    pub batch_size: usize,

    /// Idle delay between polls once the log is drained.
    pub poll_interval: Duration,
}

impl SubscriptionWorkerConfig {
    /// A worker over every committed event with sensible defaults.
    pub fn all(group_name: impl Into<String>) -> Self {
        Self {
            group_name: group_name.into(),
            selector: StreamSelector::All,
            batch_size: 256,
            poll_interval: Duration::from_millis(200),
        }
    }
}

/// Tails the store's committed-event log, dispatches each batch, and
/// commits its checkpoint only after the batch fully resolves - so a crash
/// between dispatch and checkpoint redelivers (at-least-once), never skips.
pub struct SubscriptionWorker<S: SubscriptionSource> {
    source: S,
    dispatcher: Arc<EventDispatcher>,
    config: SubscriptionWorkerConfig,
}

impl<S: SubscriptionSource> SubscriptionWorker<S> {
    /// Creates a worker over the given source and dispatcher.
    pub fn new(
        source: S,
        dispatcher: Arc<EventDispatcher>,
        config: SubscriptionWorkerConfig,
    ) -> Self {
        Self {
            source,
            dispatcher,
            config,
        }
    }

    /// Runs until cancelled. Transient source failures are logged and
    /// retried on the next poll; they never kill the loop.
    #[tracing::instrument(skip(self, shutdown), fields(group = %self.config.group_name))]
    pub async fn run(&self, shutdown: CancellationToken) {
        tracing::info!("subscription worker started");

        loop {
            tokio::select! {
                () = shutdown.cancelled() => {
                    tracing::info!("subscription worker shutting down");
                    return;
                }
                result = self.drain() => {
                    if let Err(error) = result {
                        metrics::counter!("dispatcher_source_errors_total").increment(1);
                        tracing::error!(%error, "subscription source error, backing off");
                    }
                }
            }

            tokio::select! {
                () = shutdown.cancelled() => {
                    tracing::info!("subscription worker shutting down");
                    return;
                }
                () = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }
    }

    /// Processes batches until the log is drained. Exposed for catch-up
    /// style usage in tests and startup.
    pub async fn drain(&self) -> Result<(), event_store::EventStoreError> {
        loop {
            let checkpoint = self.source.checkpoint(&self.config.group_name).await?;
            let batch = self
                .source
                .read_from(checkpoint, self.config.batch_size)
                .await?;

            let Some(last_position) = batch.last().map(|e| e.position) else {
                return Ok(());
            };

            let selected: Vec<_> = batch
                .into_iter()
                .filter(|e| self.config.selector.matches(&e.envelope))
                .collect();

            if !selected.is_empty() {
                self.dispatcher.dispatch_batch(&selected).await;
                metrics::counter!("dispatcher_batches_total").increment(1);
            }

            // Checkpoint covers the whole batch, including unselected events
            self.commit(last_position).await?;
        }
    }

    async fn commit(&self, position: GlobalPosition) -> Result<(), event_store::EventStoreError> {
        self.source
            .commit_checkpoint(&self.config.group_name, position)
            .await?;
        metrics::gauge!("dispatcher_checkpoint_position").set(position.as_u64() as f64);
        Ok(())
    }
}
