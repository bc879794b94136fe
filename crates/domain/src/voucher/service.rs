//! Voucher command service.

use chrono::{DateTime, Utc};
use common::AggregateId;
use event_store::EventStore;

use crate::error::ServiceError;
use crate::repository::{AggregateRepository, CommandOutcome};
use crate::values::{EstateId, Money};

use super::{Voucher, voucher_aggregate_id};

/// Command handlers for the voucher aggregate.
pub struct VoucherService<S: EventStore> {
    repository: AggregateRepository<S, Voucher>,
}

impl<S: EventStore> VoucherService<S> {
    /// Creates a new voucher service over the given event store.
    pub fn new(store: S) -> Self {
        Self {
            repository: AggregateRepository::new(store),
        }
    }

    /// Issues a voucher for an authorised sale transaction.
    #[tracing::instrument(skip(self), fields(%transaction_id))]
    pub async fn issue_voucher(
        &self,
        estate_id: EstateId,
        transaction_id: AggregateId,
        value: Money,
        expiry_date: DateTime<Utc>,
    ) -> Result<CommandOutcome<Voucher>, ServiceError> {
        let voucher_id = voucher_aggregate_id(estate_id, transaction_id);

        self.repository
            .execute(voucher_id, |voucher| {
                voucher.issue(voucher_id, estate_id, transaction_id, value, expiry_date)
            })
            .await
    }

    /// Redeems a voucher's full value.
    #[tracing::instrument(skip(self), fields(%transaction_id))]
    pub async fn redeem_voucher(
        &self,
        estate_id: EstateId,
        transaction_id: AggregateId,
        redeemed_at: DateTime<Utc>,
    ) -> Result<CommandOutcome<Voucher>, ServiceError> {
        let voucher_id = voucher_aggregate_id(estate_id, transaction_id);

        self.repository
            .execute(voucher_id, |voucher| voucher.redeem(redeemed_at))
            .await
    }

    /// Loads a voucher by originating transaction, mapping the not-created
    /// sentinel to `None`.
    pub async fn get_voucher(
        &self,
        estate_id: EstateId,
        transaction_id: AggregateId,
    ) -> Result<Option<Voucher>, ServiceError> {
        self.repository
            .load_existing(voucher_aggregate_id(estate_id, transaction_id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use event_store::InMemoryEventStore;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn issue_and_redeem() {
        let service = VoucherService::new(InMemoryEventStore::new());
        let estate_id = EstateId::new();
        let transaction_id = AggregateId::new();

        service
            .issue_voucher(
                estate_id,
                transaction_id,
                Money::new(dec!(50.00)),
                Utc::now() + chrono::Duration::days(30),
            )
            .await
            .unwrap();

        let outcome = service
            .redeem_voucher(estate_id, transaction_id, Utc::now())
            .await
            .unwrap();
        assert!(outcome.aggregate.is_redeemed());
    }

    #[tokio::test]
    async fn redeem_missing_voucher_is_not_found() {
        let service = VoucherService::new(InMemoryEventStore::new());
        let result = service
            .redeem_voucher(EstateId::new(), AggregateId::new(), Utc::now())
            .await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }
}
