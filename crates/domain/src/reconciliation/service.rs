//! Reconciliation command service.

use common::AggregateId;
use event_store::EventStore;

use crate::error::ServiceError;
use crate::repository::{AggregateRepository, CommandOutcome};
use crate::values::{EstateId, MerchantId, Money};

use super::Reconciliation;

/// Command handlers for the reconciliation aggregate.
pub struct ReconciliationService<S: EventStore> {
    repository: AggregateRepository<S, Reconciliation>,
}

impl<S: EventStore> ReconciliationService<S> {
    /// Creates a new reconciliation service over the given event store.
    pub fn new(store: S) -> Self {
        Self {
            repository: AggregateRepository::new(store),
        }
    }

    /// Starts a device reconciliation.
    #[tracing::instrument(skip(self), fields(%reconciliation_id))]
    pub async fn start_reconciliation(
        &self,
        reconciliation_id: AggregateId,
        estate_id: EstateId,
        merchant_id: MerchantId,
        device_identifier: String,
    ) -> Result<CommandOutcome<Reconciliation>, ServiceError> {
        self.repository
            .execute(reconciliation_id, |reconciliation| {
                reconciliation.start(
                    reconciliation_id,
                    estate_id,
                    merchant_id,
                    device_identifier,
                )
            })
            .await
    }

    /// Records the device's overall totals.
    #[tracing::instrument(skip(self), fields(%reconciliation_id))]
    pub async fn record_overall_totals(
        &self,
        reconciliation_id: AggregateId,
        transaction_count: u32,
        transaction_value: Money,
    ) -> Result<CommandOutcome<Reconciliation>, ServiceError> {
        self.repository
            .execute(reconciliation_id, |reconciliation| {
                reconciliation.record_overall_totals(transaction_count, transaction_value)
            })
            .await
    }

    /// Completes the reconciliation.
    #[tracing::instrument(skip(self), fields(%reconciliation_id))]
    pub async fn complete_reconciliation(
        &self,
        reconciliation_id: AggregateId,
    ) -> Result<CommandOutcome<Reconciliation>, ServiceError> {
        self.repository
            .execute(reconciliation_id, |reconciliation| reconciliation.complete())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use event_store::InMemoryEventStore;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn full_reconciliation_flow() {
        let service = ReconciliationService::new(InMemoryEventStore::new());
        let reconciliation_id = AggregateId::new();

        service
            .start_reconciliation(
                reconciliation_id,
                EstateId::new(),
                MerchantId::new(),
                "device-1".to_string(),
            )
            .await
            .unwrap();
        service
            .record_overall_totals(reconciliation_id, 42, Money::new(dec!(4200.00)))
            .await
            .unwrap();
        let outcome = service
            .complete_reconciliation(reconciliation_id)
            .await
            .unwrap();

        assert!(outcome.aggregate.is_completed());
    }

    #[tokio::test]
    async fn totals_on_missing_reconciliation_is_not_found() {
        let service = ReconciliationService::new(InMemoryEventStore::new());
        let result = service
            .record_overall_totals(AggregateId::new(), 1, Money::new(dec!(10.00)))
            .await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }
}
