//! Dispatch error types.

use thiserror::Error;

/// Errors that can occur while dispatching committed events.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The event type discriminator is not in the registry. Configuration
    /// bug: a stream is subscribed whose events this build does not know.
    #[error("Unknown event type: {0}")]
    UnknownEventType(String),

    /// The payload failed to decode as its declared type. Code/schema bug,
    /// never retried.
    #[error("Failed to decode {event_type}: {source}")]
    Decode {
        event_type: String,
        #[source]
        source: serde_json::Error,
    },

    /// Routing names a handler that was never registered. Fails fast at
    /// startup.
    #[error("Handler not registered: {0}")]
    UnknownHandler(String),

    /// A handler rejected the delivery. Retried per the retry policy, then
    /// parked.
    #[error("Handler {handler} failed: {message}")]
    Handler { handler: String, message: String },

    /// The subscription source failed.
    #[error("Subscription source error: {0}")]
    Source(#[from] event_store::EventStoreError),
}

impl DispatchError {
    /// Returns true if redelivering the same event may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DispatchError::Handler { .. } | DispatchError::Source(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handler_failures_are_retryable() {
        let err = DispatchError::Handler {
            handler: "merchant-balance".to_string(),
            message: "state store busy".to_string(),
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn decode_failures_are_not_retryable() {
        let source = serde_json::from_str::<serde_json::Value>("nope").unwrap_err();
        let err = DispatchError::Decode {
            event_type: "TransactionHasStarted".to_string(),
            source,
        };
        assert!(!err.is_retryable());
        assert!(!DispatchError::UnknownEventType("X".to_string()).is_retryable());
    }
}
