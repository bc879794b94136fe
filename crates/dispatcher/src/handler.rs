//! Domain event handler trait and registry.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use event_store::EventEnvelope;

use crate::error::DispatchError;
use crate::event::PlatformEvent;

/// A consumer of committed domain events.
///
/// Delivery is at-least-once: every handler must treat a redelivered event
/// as a success, typically by checking whether the causing event id has
/// already been recorded before mutating state.
#[async_trait]
pub trait DomainEventHandler: Send + Sync {
    /// Stable name used in routing configuration.
    fn name(&self) -> &'static str;

    /// Handles one committed event.
    async fn handle(
        &self,
        event: &PlatformEvent,
        envelope: &EventEnvelope,
    ) -> Result<(), DispatchError>;
}

/// Process-wide immutable name-to-handler registry, built once at startup.
#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<&'static str, Arc<dyn DomainEventHandler>>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler under its own name.
    pub fn register(mut self, handler: Arc<dyn DomainEventHandler>) -> Self {
        self.handlers.insert(handler.name(), handler);
        self
    }

    /// Looks a handler up by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn DomainEventHandler>> {
        self.handlers.get(name).cloned()
    }

    /// Returns the number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns true if no handlers are registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
