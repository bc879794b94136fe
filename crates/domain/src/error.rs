//! Service-level error taxonomy.

use common::AggregateId;
use event_store::EventStoreError;
use thiserror::Error;

/// Uniform failure taxonomy surfaced by command services.
///
/// Retry guidance is part of the contract: `Concurrency` is retryable by
/// reloading and re-running the command, `Unavailable` is retryable with
/// backoff, `Invalid` and `NotFound` are not retryable as-is, and `Fatal`
/// indicates a code or configuration bug that must never be retried.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Bad input or a violated business precondition.
    #[error("Invalid: {0}")]
    Invalid(String),

    /// The referenced entity has no created aggregate or read-model row.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Optimistic version conflict: a concurrent writer appended first.
    #[error("Concurrency conflict on aggregate {aggregate_id}")]
    Concurrency { aggregate_id: AggregateId },

    /// Transient infrastructure failure (store unreachable, pool exhausted).
    #[error("Unavailable: {0}")]
    Unavailable(String),

    /// Configuration or code bug (serialization failure, unknown enum
    /// value, missing handler registration).
    #[error("Fatal: {0}")]
    Fatal(String),
}

impl ServiceError {
    /// Returns true if the operation may be retried after reloading state
    /// or backing off.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ServiceError::Concurrency { .. } | ServiceError::Unavailable(_)
        )
    }
}

impl From<EventStoreError> for ServiceError {
    fn from(e: EventStoreError) -> Self {
        match e {
            EventStoreError::ConcurrencyConflict { aggregate_id, .. } => {
                ServiceError::Concurrency { aggregate_id }
            }
            EventStoreError::AggregateNotFound(id) => ServiceError::NotFound(id.to_string()),
            EventStoreError::InvalidAppend(msg) => ServiceError::Fatal(msg),
            EventStoreError::Database(e) => ServiceError::Unavailable(e.to_string()),
            EventStoreError::Migration(e) => ServiceError::Unavailable(e.to_string()),
            EventStoreError::Serialization(e) => ServiceError::Fatal(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(e: serde_json::Error) -> Self {
        ServiceError::Fatal(e.to_string())
    }
}
