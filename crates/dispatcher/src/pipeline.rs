//! Delivery pipelines: unordered bounded-parallel "main" and
//! per-partition sequential "ordered", both with bounded retries and a
//! parked-event store instead of silent drops.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use event_store::{CommittedEvent, EventEnvelope};
use tokio::sync::{RwLock, Semaphore};
use tokio::task::JoinSet;

use crate::config::ResolvedRoutes;
use crate::error::DispatchError;
use crate::event::{EventTypeRegistry, PlatformEvent, partition_key};
use crate::handler::DomainEventHandler;

/// Bounded retry with linear backoff.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Redelivery attempts after the first failure.
    pub max_retries: u32,

    /// Base delay; attempt `n` waits `backoff * n`.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: Duration::from_millis(50),
        }
    }
}

/// A delivery that exhausted its retries (or failed fatally) and was set
/// aside for manual intervention.
#[derive(Debug, Clone)]
pub struct ParkedEvent {
    /// The undeliverable event.
    pub envelope: EventEnvelope,

    /// The handler that rejected it.
    pub handler_name: String,

    /// Delivery attempts made, including the first.
    pub attempts: u32,

    /// The final error, rendered.
    pub last_error: String,

    /// When the event was parked.
    pub parked_at: DateTime<Utc>,
}

/// Holds parked events. Nothing is ever dropped: a delivery either
/// succeeds or ends up here, visible to operators.
#[derive(Clone, Default)]
pub struct ParkedEventStore {
    parked: Arc<RwLock<Vec<ParkedEvent>>>,
}

impl ParkedEventStore {
    /// Creates an empty parked event store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parks a failed delivery.
    pub async fn park(&self, event: ParkedEvent) {
        metrics::counter!("dispatcher_events_parked_total").increment(1);
        tracing::error!(
            event_id = %event.envelope.event_id,
            event_type = %event.envelope.event_type,
            handler = %event.handler_name,
            attempts = event.attempts,
            error = %event.last_error,
            "event parked after delivery failure"
        );
        self.parked.write().await.push(event);
    }

    /// Returns a snapshot of all parked events.
    pub async fn parked(&self) -> Vec<ParkedEvent> {
        self.parked.read().await.clone()
    }

    /// Returns the number of parked events.
    pub async fn len(&self) -> usize {
        self.parked.read().await.len()
    }

    /// Returns true if nothing is parked.
    pub async fn is_empty(&self) -> bool {
        self.parked.read().await.is_empty()
    }
}

type DecodedEvent = (PlatformEvent, EventEnvelope, event_store::GlobalPosition);

/// Dispatches committed events to their configured handlers over both
/// pipelines.
pub struct EventDispatcher {
    registry: Arc<EventTypeRegistry>,
    routes: ResolvedRoutes,
    retry: RetryPolicy,
    parked: ParkedEventStore,
    main_permits: Arc<Semaphore>,
}

impl EventDispatcher {
    /// Creates a dispatcher.
    ///
    /// `max_in_flight` bounds concurrent main-pipeline deliveries.
    pub fn new(
        registry: EventTypeRegistry,
        routes: ResolvedRoutes,
        retry: RetryPolicy,
        max_in_flight: usize,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            routes,
            retry,
            parked: ParkedEventStore::new(),
            main_permits: Arc::new(Semaphore::new(max_in_flight)),
        }
    }

    /// Returns the parked event store.
    pub fn parked_events(&self) -> ParkedEventStore {
        self.parked.clone()
    }

    /// Dispatches one batch of committed events through both pipelines.
    ///
    /// Returns once every delivery has succeeded or been parked; the
    /// caller may then commit its checkpoint.
    #[tracing::instrument(skip(self, batch), fields(batch_size = batch.len()))]
    pub async fn dispatch_batch(&self, batch: &[CommittedEvent]) {
        let mut decoded = Vec::with_capacity(batch.len());
        for committed in batch {
            let envelope = &committed.envelope;
            if !self.routes.routes(&envelope.event_type) {
                continue;
            }

            match self.registry.decode(envelope) {
                Ok(event) => decoded.push((event, envelope.clone(), committed.position)),
                Err(error) => {
                    // Unknown or undecodable events are configuration bugs:
                    // parked immediately, no retry, pipeline keeps going.
                    self.parked
                        .park(ParkedEvent {
                            envelope: envelope.clone(),
                            handler_name: "<decode>".to_string(),
                            attempts: 1,
                            last_error: error.to_string(),
                            parked_at: Utc::now(),
                        })
                        .await;
                }
            }
        }

        let decoded = Arc::new(decoded);
        tokio::join!(
            self.dispatch_main(Arc::clone(&decoded)),
            self.dispatch_ordered(Arc::clone(&decoded)),
        );
    }

    /// Main pipeline: every delivery independent, bounded concurrency.
    async fn dispatch_main(&self, events: Arc<Vec<DecodedEvent>>) {
        let mut join_set = JoinSet::new();

        for (index, (_, envelope, _)) in events.iter().enumerate() {
            for handler in self.routes.main_handlers(&envelope.event_type) {
                let handler = Arc::clone(handler);
                let events = Arc::clone(&events);
                let permits = Arc::clone(&self.main_permits);
                let retry = self.retry;
                let parked = self.parked.clone();

                join_set.spawn(async move {
                    let _permit = permits.acquire_owned().await.expect("semaphore closed");
                    let (event, envelope, _) = &events[index];
                    deliver_with_retry(handler, event, envelope, retry, &parked).await;
                });
            }
        }

        while join_set.join_next().await.is_some() {}
    }

    /// Ordered pipeline: partitions processed concurrently, deliveries
    /// within a partition strictly sequential in commit order (which in
    /// turn respects per-stream version order).
    async fn dispatch_ordered(&self, events: Arc<Vec<DecodedEvent>>) {
        let mut partitions: HashMap<String, Vec<usize>> = HashMap::new();
        for (index, (event, envelope, _)) in events.iter().enumerate() {
            if self.routes.ordered_handlers(&envelope.event_type).is_empty() {
                continue;
            }
            partitions
                .entry(partition_key(event, envelope))
                .or_default()
                .push(index);
        }

        let mut join_set = JoinSet::new();
        for (_, mut indices) in partitions {
            // Fold in commit order even when the batch arrived shuffled
            indices.sort_by_key(|&i| events[i].2);

            let events = Arc::clone(&events);
            let routes = self.routes.clone();
            let retry = self.retry;
            let parked = self.parked.clone();

            join_set.spawn(async move {
                for index in indices {
                    let (event, envelope, _) = &events[index];
                    for handler in routes.ordered_handlers(&envelope.event_type) {
                        deliver_with_retry(Arc::clone(handler), event, envelope, retry, &parked)
                            .await;
                    }
                }
            });
        }

        while join_set.join_next().await.is_some() {}
    }
}

/// Delivers one event to one handler, retrying per policy, parking on
/// exhaustion. Failure is contained here: the pipeline always proceeds.
async fn deliver_with_retry(
    handler: Arc<dyn DomainEventHandler>,
    event: &PlatformEvent,
    envelope: &EventEnvelope,
    retry: RetryPolicy,
    parked: &ParkedEventStore,
) {
    let mut attempts = 0;
    loop {
        attempts += 1;
        match handler.handle(event, envelope).await {
            Ok(()) => {
                metrics::counter!("dispatcher_events_handled_total").increment(1);
                return;
            }
            Err(error) if error.is_retryable() && attempts <= retry.max_retries => {
                metrics::counter!("dispatcher_delivery_retries_total").increment(1);
                tracing::warn!(
                    event_id = %envelope.event_id,
                    handler = handler.name(),
                    attempts,
                    %error,
                    "delivery failed, retrying"
                );
                tokio::time::sleep(retry.backoff * attempts).await;
            }
            Err(error) => {
                parked
                    .park(ParkedEvent {
                        envelope: envelope.clone(),
                        handler_name: handler.name().to_string(),
                        attempts,
                        last_error: error.to_string(),
                        parked_at: Utc::now(),
                    })
                    .await;
                return;
            }
        }
    }
}
