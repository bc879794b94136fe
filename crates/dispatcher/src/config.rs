//! Event-type to handler routing configuration.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::DispatchError;
use crate::handler::{DomainEventHandler, HandlerRegistry};

/// Declarative routing: which handlers see which event types, per pipeline.
///
/// Two independent maps exist because some projections (the running
/// merchant balance) need strict per-partition ordering while most
/// read-model updates tolerate parallel delivery for throughput.
#[derive(Debug, Clone, Default)]
pub struct DispatcherConfig {
    /// Unordered pipeline routes: event type name to handler names.
    pub main: HashMap<String, Vec<String>>,

    /// Ordered pipeline routes: event type name to handler names.
    pub ordered: HashMap<String, Vec<String>>,
}

impl DispatcherConfig {
    /// Creates an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes an event type to a handler on the main (unordered) pipeline.
    pub fn route_main(mut self, event_type: impl Into<String>, handler: impl Into<String>) -> Self {
        self.main
            .entry(event_type.into())
            .or_default()
            .push(handler.into());
        self
    }

    /// Routes an event type to a handler on the ordered pipeline.
    pub fn route_ordered(
        mut self,
        event_type: impl Into<String>,
        handler: impl Into<String>,
    ) -> Self {
        self.ordered
            .entry(event_type.into())
            .or_default()
            .push(handler.into());
        self
    }

    /// Resolves handler names against the registry.
    ///
    /// A configured-but-unregistered handler name is a configuration bug
    /// and fails here, at startup, rather than at delivery time.
    pub fn resolve(&self, registry: &HandlerRegistry) -> Result<ResolvedRoutes, DispatchError> {
        let resolve_map = |routes: &HashMap<String, Vec<String>>| {
            let mut resolved: HashMap<String, Vec<Arc<dyn DomainEventHandler>>> = HashMap::new();
            for (event_type, handler_names) in routes {
                let mut handlers = Vec::with_capacity(handler_names.len());
                for name in handler_names {
                    let handler = registry
                        .get(name)
                        .ok_or_else(|| DispatchError::UnknownHandler(name.clone()))?;
                    handlers.push(handler);
                }
                resolved.insert(event_type.clone(), handlers);
            }
            Ok(resolved)
        };

        Ok(ResolvedRoutes {
            main: resolve_map(&self.main)?,
            ordered: resolve_map(&self.ordered)?,
        })
    }
}

/// Routing with handler names resolved to handler instances.
#[derive(Clone, Default)]
pub struct ResolvedRoutes {
    main: HashMap<String, Vec<Arc<dyn DomainEventHandler>>>,
    ordered: HashMap<String, Vec<Arc<dyn DomainEventHandler>>>,
}

impl ResolvedRoutes {
    /// Handlers subscribed to this event type on the main pipeline.
    pub fn main_handlers(&self, event_type: &str) -> &[Arc<dyn DomainEventHandler>] {
        self.main.get(event_type).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Handlers subscribed to this event type on the ordered pipeline.
    pub fn ordered_handlers(&self, event_type: &str) -> &[Arc<dyn DomainEventHandler>] {
        self.ordered
            .get(event_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Returns true if any pipeline has handlers for this event type.
    pub fn routes(&self, event_type: &str) -> bool {
        self.main.contains_key(event_type) || self.ordered.contains_key(event_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use event_store::EventEnvelope;

    use crate::event::PlatformEvent;

    struct NoopHandler(&'static str);

    #[async_trait]
    impl DomainEventHandler for NoopHandler {
        fn name(&self) -> &'static str {
            self.0
        }

        async fn handle(
            &self,
            _event: &PlatformEvent,
            _envelope: &EventEnvelope,
        ) -> Result<(), DispatchError> {
            Ok(())
        }
    }

    #[test]
    fn resolve_routes_against_registry() {
        let registry = HandlerRegistry::new()
            .register(Arc::new(NoopHandler("read-model")))
            .register(Arc::new(NoopHandler("merchant-balance")));

        let config = DispatcherConfig::new()
            .route_main("MerchantCreated", "read-model")
            .route_ordered("MerchantDepositMade", "merchant-balance")
            .route_main("MerchantDepositMade", "read-model");

        let routes = config.resolve(&registry).unwrap();
        assert_eq!(routes.main_handlers("MerchantCreated").len(), 1);
        assert_eq!(routes.ordered_handlers("MerchantDepositMade").len(), 1);
        assert!(routes.routes("MerchantDepositMade"));
        assert!(!routes.routes("VoucherIssued"));
    }

    #[test]
    fn unknown_handler_name_fails_resolution() {
        let registry = HandlerRegistry::new();
        let config = DispatcherConfig::new().route_main("MerchantCreated", "missing");

        let result = config.resolve(&registry);
        assert!(matches!(result, Err(DispatchError::UnknownHandler(_))));
    }
}
