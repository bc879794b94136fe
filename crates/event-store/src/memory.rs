use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    AggregateId, CommittedEvent, EventEnvelope, EventQuery, EventStoreError, GlobalPosition,
    Result, Snapshot, SubscriptionSource, Version,
    store::{AppendOptions, EventStore, EventStream, validate_events_for_append},
};

#[derive(Default)]
struct Inner {
    /// Committed events in commit order; position = index + 1.
    log: Vec<CommittedEvent>,
    snapshots: HashMap<AggregateId, Snapshot>,
    checkpoints: HashMap<String, GlobalPosition>,
}

/// In-memory event store implementation.
///
/// Backs unit and integration tests, and provides the same append,
/// subscription and checkpoint semantics as the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryEventStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryEventStore {
    /// Creates a new empty in-memory event store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of events stored.
    pub async fn event_count(&self) -> usize {
        self.inner.read().await.log.len()
    }

    /// Clears all events, snapshots and checkpoints.
    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        inner.log.clear();
        inner.snapshots.clear();
        inner.checkpoints.clear();
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(&self, events: Vec<EventEnvelope>, options: AppendOptions) -> Result<Version> {
        validate_events_for_append(&events)?;

        let first_event = &events[0];
        let aggregate_id = first_event.aggregate_id;

        let mut inner = self.inner.write().await;

        let current_version = inner
            .log
            .iter()
            .filter(|e| e.envelope.aggregate_id == aggregate_id)
            .map(|e| e.envelope.version)
            .max()
            .unwrap_or(Version::initial());

        if let Some(expected) = options.expected_version
            && current_version != expected
        {
            return Err(EventStoreError::ConcurrencyConflict {
                aggregate_id,
                expected,
                actual: current_version,
            });
        }

        // Unique (aggregate, version) constraint simulation
        let first_new_version = first_event.version;
        if first_new_version <= current_version && current_version != Version::initial() {
            return Err(EventStoreError::ConcurrencyConflict {
                aggregate_id,
                expected: options.expected_version.unwrap_or(current_version),
                actual: current_version,
            });
        }

        let last_version = events
            .last()
            .map(|e| e.version)
            .unwrap_or(Version::initial());

        let mut position = inner.log.len() as u64;
        for envelope in events {
            position += 1;
            inner.log.push(CommittedEvent {
                position: GlobalPosition::new(position),
                envelope,
            });
        }

        Ok(last_version)
    }

    async fn get_events_for_aggregate(
        &self,
        aggregate_id: AggregateId,
    ) -> Result<Vec<EventEnvelope>> {
        let inner = self.inner.read().await;
        let mut events: Vec<_> = inner
            .log
            .iter()
            .filter(|e| e.envelope.aggregate_id == aggregate_id)
            .map(|e| e.envelope.clone())
            .collect();
        events.sort_by_key(|e| e.version);
        Ok(events)
    }

    async fn get_events_for_aggregate_from_version(
        &self,
        aggregate_id: AggregateId,
        from_version: Version,
    ) -> Result<Vec<EventEnvelope>> {
        let inner = self.inner.read().await;
        let mut events: Vec<_> = inner
            .log
            .iter()
            .filter(|e| {
                e.envelope.aggregate_id == aggregate_id && e.envelope.version >= from_version
            })
            .map(|e| e.envelope.clone())
            .collect();
        events.sort_by_key(|e| e.version);
        Ok(events)
    }

    async fn query_events(&self, query: EventQuery) -> Result<Vec<EventEnvelope>> {
        let inner = self.inner.read().await;
        let events: Vec<_> = inner
            .log
            .iter()
            .map(|e| &e.envelope)
            .filter(|e| {
                if let Some(id) = query.aggregate_id
                    && e.aggregate_id != id
                {
                    return false;
                }
                if let Some(ref agg_type) = query.aggregate_type
                    && &e.aggregate_type != agg_type
                {
                    return false;
                }
                if let Some(ref types) = query.event_types
                    && !types.contains(&e.event_type)
                {
                    return false;
                }
                if let Some(from) = query.from_version
                    && e.version < from
                {
                    return false;
                }
                if let Some(to) = query.to_version
                    && e.version > to
                {
                    return false;
                }
                if let Some(from) = query.from_timestamp
                    && e.timestamp < from
                {
                    return false;
                }
                if let Some(to) = query.to_timestamp
                    && e.timestamp > to
                {
                    return false;
                }
                true
            })
            .cloned()
            .collect();

        // Log order is already commit order
        let offset = query.offset.unwrap_or(0);
        let events: Vec<_> = events.into_iter().skip(offset).collect();

        let events = if let Some(limit) = query.limit {
            events.into_iter().take(limit).collect()
        } else {
            events
        };

        Ok(events)
    }

    async fn stream_all_events(&self) -> Result<EventStream> {
        use futures_util::stream;

        let inner = self.inner.read().await;
        let events: Vec<_> = inner.log.iter().map(|e| e.envelope.clone()).collect();

        let stream = stream::iter(events.into_iter().map(Ok));
        Ok(Box::pin(stream))
    }

    async fn get_aggregate_version(&self, aggregate_id: AggregateId) -> Result<Option<Version>> {
        let inner = self.inner.read().await;
        let version = inner
            .log
            .iter()
            .filter(|e| e.envelope.aggregate_id == aggregate_id)
            .map(|e| e.envelope.version)
            .max();
        Ok(version)
    }

    async fn save_snapshot(&self, snapshot: Snapshot) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.snapshots.insert(snapshot.aggregate_id, snapshot);
        Ok(())
    }

    async fn get_snapshot(&self, aggregate_id: AggregateId) -> Result<Option<Snapshot>> {
        let inner = self.inner.read().await;
        Ok(inner.snapshots.get(&aggregate_id).cloned())
    }
}

#[async_trait]
impl SubscriptionSource for InMemoryEventStore {
    async fn read_from(&self, after: GlobalPosition, limit: usize) -> Result<Vec<CommittedEvent>> {
        let inner = self.inner.read().await;
        Ok(inner
            .log
            .iter()
            .filter(|e| e.position > after)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn checkpoint(&self, group: &str) -> Result<GlobalPosition> {
        let inner = self.inner.read().await;
        Ok(inner
            .checkpoints
            .get(group)
            .copied()
            .unwrap_or_else(GlobalPosition::start))
    }

    async fn commit_checkpoint(&self, group: &str, position: GlobalPosition) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.checkpoints.insert(group.to_string(), position);
        Ok(())
    }
}
