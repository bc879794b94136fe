//! Wiring for the background subscription worker.
//!
//! Builds the process-wide immutable configuration once - event type
//! registry, handler registry, routing - and hands it to the dispatcher
//! and worker explicitly. No ambient statics.

pub mod config;

use std::sync::Arc;

use dispatcher::{
    DispatchError, DispatcherConfig, EventDispatcher, EventTypeRegistry, HandlerRegistry,
    RetryPolicy, SubscriptionWorker, SubscriptionWorkerConfig,
};
use event_store::{StreamSelector, SubscriptionSource};
use projections::{
    InMemoryMerchantBalanceRepository, InMemoryReadModel, InMemoryVoucherStateRepository,
    MerchantBalanceProjection, ReadModelHandler, VoucherProjection,
};

pub use config::Config;

/// Errors that can occur while wiring the worker.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    /// Startup-validated configuration is inconsistent.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Routing failed to resolve.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// The query-side state stores the worker maintains.
pub struct QuerySide {
    pub balances: InMemoryMerchantBalanceRepository,
    pub voucher_states: InMemoryVoucherStateRepository,
    pub read_model: Arc<InMemoryReadModel>,
}

/// The standard routing: read-model updates on the main pipeline, running
/// balance and voucher state on the ordered pipeline.
pub fn standard_routes() -> DispatcherConfig {
    let mut config = DispatcherConfig::new();

    for event_type in [
        "EstateCreated",
        "OperatorAddedToEstate",
        "OperatorCreated",
        "MerchantCreated",
        "ContractCreated",
        "ContractProductAdded",
        "TransactionFeeAdded",
        "TransactionHasStarted",
        "TransactionHasBeenCompleted",
        "SettlementCreated",
        "MerchantFeeAddedPendingSettlement",
        "MerchantFeeSettled",
        "SettlementCompleted",
    ] {
        config = config.route_main(event_type, "read-model");
    }

    for event_type in [
        "MerchantDepositMade",
        "MerchantWithdrawalMade",
        "TransactionHasBeenCompleted",
        "MerchantFeeSettled",
    ] {
        config = config.route_ordered(event_type, "merchant-balance");
    }

    for event_type in ["VoucherIssued", "VoucherFullyRedeemed"] {
        config = config.route_ordered(event_type, "voucher-state");
    }

    config
}

/// Builds the subscription worker with the standard projections wired in.
pub fn build_worker<S>(
    source: S,
    config: &Config,
) -> Result<(SubscriptionWorker<S>, Arc<EventDispatcher>, QuerySide), WorkerError>
where
    S: SubscriptionSource,
{
    domain::transaction::validate_request_field_table().map_err(WorkerError::Config)?;

    let balances = InMemoryMerchantBalanceRepository::new();
    let voucher_states = InMemoryVoucherStateRepository::new();
    let read_model = Arc::new(InMemoryReadModel::new());

    let registry = HandlerRegistry::new()
        .register(Arc::new(ReadModelHandler::new(Arc::clone(&read_model))))
        .register(Arc::new(MerchantBalanceProjection::new(balances.clone())))
        .register(Arc::new(VoucherProjection::new(voucher_states.clone())));

    let routes = standard_routes().resolve(&registry)?;

    let dispatcher = Arc::new(EventDispatcher::new(
        EventTypeRegistry::standard(),
        routes,
        RetryPolicy::default(),
        config.max_in_flight,
    ));

    let worker_config = SubscriptionWorkerConfig {
        group_name: config.subscription_group.clone(),
        selector: StreamSelector::All,
        batch_size: config.batch_size,
        poll_interval: config.poll_interval,
    };

    let worker = SubscriptionWorker::new(source, Arc::clone(&dispatcher), worker_config);

    Ok((
        worker,
        dispatcher,
        QuerySide {
            balances,
            voucher_states,
            read_model,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use event_store::InMemoryEventStore;

    #[test]
    fn standard_routes_resolve_against_standard_handlers() {
        let store = InMemoryEventStore::new();
        let result = build_worker(store, &Config::default());
        assert!(result.is_ok());
    }

    #[test]
    fn standard_routes_cover_balance_events_on_ordered_pipeline() {
        let routes = standard_routes();
        let ordered = routes.ordered.get("MerchantDepositMade").unwrap();
        assert_eq!(ordered, &vec!["merchant-balance".to_string()]);
        assert!(routes.main.contains_key("TransactionHasBeenCompleted"));
    }
}
