//! Core aggregate and domain event traits.

use common::AggregateId;
use event_store::Version;
use serde::{Serialize, de::DeserializeOwned};

/// Trait for domain events.
///
/// Domain events represent facts that have happened in the domain.
/// They are immutable and named in past tense.
pub trait DomainEvent: Serialize + DeserializeOwned + Send + Sync + Clone {
    /// Returns the wire discriminator for this event.
    ///
    /// Used for serialization and for subscription routing.
    fn event_type(&self) -> &'static str;
}

/// Trait for aggregates in an event-sourced system.
///
/// An aggregate is a consistency boundary whose state is derived solely by
/// folding its own event stream. Aggregates are request-scoped: they are
/// rebuilt from the store for every command and discarded afterwards, never
/// cached as the source of truth.
pub trait Aggregate: Default + Send + Sync + Sized {
    /// The type of events this aggregate produces and consumes.
    type Event: DomainEvent;

    /// The type of errors this aggregate's command methods can produce.
    type Error: std::error::Error + Send + Sync;

    /// Returns the aggregate type name.
    ///
    /// Used for event store organization and subscription routing.
    fn aggregate_type() -> &'static str;

    /// Returns the aggregate's unique identifier.
    ///
    /// Returns None until a creation event has been applied - the
    /// not-created sentinel callers must check before treating the entity
    /// as existing.
    fn id(&self) -> Option<AggregateId>;

    /// Returns the current version of the aggregate.
    ///
    /// Version is 0 for a stream with no events and tracks the last applied
    /// event otherwise.
    fn version(&self) -> Version;

    /// Sets the aggregate version.
    ///
    /// Called by the repository while folding the stream.
    fn set_version(&mut self, version: Version);

    /// Applies an event to the aggregate, updating its state.
    ///
    /// Must be pure and deterministic: same state and event always produce
    /// the same new state, no side effects, no failure (events are facts).
    fn apply(&mut self, event: Self::Event);

    /// Applies multiple events in sequence.
    fn apply_events(&mut self, events: impl IntoIterator<Item = Self::Event>) {
        for event in events {
            self.apply(event);
        }
    }

    /// Returns true once a creation event has been applied.
    fn is_created(&self) -> bool {
        self.id().is_some()
    }
}

/// Trait for aggregates that support snapshotting.
///
/// Snapshotting is a load optimization only: restoring a snapshot and
/// replaying the stream tail must yield exactly the state a full replay
/// would.
pub trait SnapshotCapable: Aggregate + Serialize + DeserializeOwned {
    /// Returns the snapshot interval (number of events between snapshots).
    fn snapshot_interval() -> usize {
        100
    }

    /// Returns whether a snapshot should be taken at the current version.
    fn should_snapshot(&self) -> bool {
        self.version().as_i64() > 0
            && (self.version().as_i64() as usize).is_multiple_of(Self::snapshot_interval())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    enum CounterEvent {
        Opened { counter_id: AggregateId },
        Incremented { by: i32 },
    }

    impl DomainEvent for CounterEvent {
        fn event_type(&self) -> &'static str {
            match self {
                CounterEvent::Opened { .. } => "CounterOpened",
                CounterEvent::Incremented { .. } => "CounterIncremented",
            }
        }
    }

    #[derive(Debug, Default, Clone, Serialize, Deserialize)]
    struct Counter {
        id: Option<AggregateId>,
        total: i32,
        version: Version,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("counter error")]
    struct CounterError;

    impl Aggregate for Counter {
        type Event = CounterEvent;
        type Error = CounterError;

        fn aggregate_type() -> &'static str {
            "Counter"
        }

        fn id(&self) -> Option<AggregateId> {
            self.id
        }

        fn version(&self) -> Version {
            self.version
        }

        fn set_version(&mut self, version: Version) {
            self.version = version;
        }

        fn apply(&mut self, event: Self::Event) {
            match event {
                CounterEvent::Opened { counter_id } => self.id = Some(counter_id),
                CounterEvent::Incremented { by } => self.total += by,
            }
        }
    }

    impl SnapshotCapable for Counter {}

    #[test]
    fn apply_events_folds_in_order() {
        let mut counter = Counter::default();
        let id = AggregateId::new();
        counter.apply_events(vec![
            CounterEvent::Opened { counter_id: id },
            CounterEvent::Incremented { by: 2 },
            CounterEvent::Incremented { by: 3 },
        ]);

        assert_eq!(counter.id(), Some(id));
        assert!(counter.is_created());
        assert_eq!(counter.total, 5);
    }

    #[test]
    fn default_aggregate_is_not_created() {
        let counter = Counter::default();
        assert!(!counter.is_created());
        assert_eq!(counter.version(), Version::initial());
    }

    #[test]
    fn snapshot_interval_checks_version_multiple() {
        let mut counter = Counter::default();
        assert!(!counter.should_snapshot());

        counter.set_version(Version::new(100));
        assert!(counter.should_snapshot());

        counter.set_version(Version::new(101));
        assert!(!counter.should_snapshot());
    }
}
