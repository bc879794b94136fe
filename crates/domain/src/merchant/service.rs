//! Merchant command service.

use chrono::{DateTime, Utc};
use common::AggregateId;
use event_store::EventStore;

use crate::error::ServiceError;
use crate::repository::{AggregateRepository, CommandOutcome};
use crate::values::{EstateId, MerchantId, Money};

use super::{DepositSource, Merchant};

/// Command handlers for the merchant aggregate.
pub struct MerchantService<S: EventStore> {
    repository: AggregateRepository<S, Merchant>,
}

impl<S: EventStore> MerchantService<S> {
    /// Creates a new merchant service over the given event store.
    pub fn new(store: S) -> Self {
        Self {
            repository: AggregateRepository::new(store),
        }
    }

    /// Creates a merchant under an estate.
    #[tracing::instrument(skip(self), fields(%merchant_id))]
    pub async fn create_merchant(
        &self,
        estate_id: EstateId,
        merchant_id: MerchantId,
        merchant_name: String,
    ) -> Result<CommandOutcome<Merchant>, ServiceError> {
        self.repository
            .execute(AggregateId::from_uuid(merchant_id.as_uuid()), |merchant| {
                merchant.create(estate_id, merchant_id, merchant_name)
            })
            .await
    }

    /// Records a deposit to the merchant's account.
    #[tracing::instrument(skip(self), fields(%merchant_id))]
    pub async fn make_deposit(
        &self,
        merchant_id: MerchantId,
        source: DepositSource,
        reference: String,
        amount: Money,
        deposit_date_time: DateTime<Utc>,
    ) -> Result<CommandOutcome<Merchant>, ServiceError> {
        self.repository
            .execute_with_snapshot(AggregateId::from_uuid(merchant_id.as_uuid()), |merchant| {
                merchant.make_deposit(source, reference, amount, deposit_date_time)
            })
            .await
    }

    /// Records a withdrawal from the merchant's account.
    #[tracing::instrument(skip(self), fields(%merchant_id))]
    pub async fn make_withdrawal(
        &self,
        merchant_id: MerchantId,
        amount: Money,
        withdrawal_date_time: DateTime<Utc>,
    ) -> Result<CommandOutcome<Merchant>, ServiceError> {
        self.repository
            .execute_with_snapshot(AggregateId::from_uuid(merchant_id.as_uuid()), |merchant| {
                merchant.make_withdrawal(amount, withdrawal_date_time)
            })
            .await
    }

    /// Loads a merchant, mapping the not-created sentinel to `None`.
    pub async fn get_merchant(
        &self,
        merchant_id: MerchantId,
    ) -> Result<Option<Merchant>, ServiceError> {
        self.repository
            .load_existing(AggregateId::from_uuid(merchant_id.as_uuid()))
            .await
    }
}
