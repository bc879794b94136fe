//! Subscription primitives: global commit positions, committed-event
//! records and per-group checkpoints.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{EventEnvelope, Result};

/// Global commit position of an event across all streams.
///
/// Positions are assigned in commit order and are strictly increasing.
/// They are what subscription checkpoints track; stream versions remain the
/// per-aggregate ordering.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct GlobalPosition(u64);

impl GlobalPosition {
    /// Creates a position from a raw value.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// The position before the first committed event.
    pub fn start() -> Self {
        Self(0)
    }

    /// Returns the raw position value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for GlobalPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A committed event together with its global position.
#[derive(Debug, Clone)]
pub struct CommittedEvent {
    /// Commit-order position across all streams.
    pub position: GlobalPosition,

    /// The persisted event record.
    pub envelope: EventEnvelope,
}

/// Selects which committed events a subscription receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamSelector {
    /// Every committed event.
    All,

    /// Only events whose aggregate type matches (a category stream,
    /// e.g. all `Transaction` events).
    AggregateType(String),
}

impl StreamSelector {
    /// Returns true if the given envelope falls within this selection.
    pub fn matches(&self, envelope: &EventEnvelope) -> bool {
        match self {
            StreamSelector::All => true,
            StreamSelector::AggregateType(aggregate_type) => {
                envelope.aggregate_type == *aggregate_type
            }
        }
    }
}

/// Source of committed events for subscription workers.
///
/// Delivery built on this trait is at-least-once: a consumer that processes
/// a batch but crashes before committing its checkpoint will read the same
/// events again on restart.
#[async_trait]
pub trait SubscriptionSource: Send + Sync {
    /// Reads up to `limit` committed events with positions strictly greater
    /// than `after`, in commit order.
    async fn read_from(&self, after: GlobalPosition, limit: usize) -> Result<Vec<CommittedEvent>>;

    /// Returns the checkpoint last committed by the named subscription group,
    /// or the start position if the group has never committed one.
    async fn checkpoint(&self, group: &str) -> Result<GlobalPosition>;

    /// Durably records the position up to which the named group has
    /// processed events.
    async fn commit_checkpoint(&self, group: &str, position: GlobalPosition) -> Result<()>;
}
