//! Float command service.

use chrono::{DateTime, Utc};
use common::AggregateId;
use event_store::EventStore;

use crate::error::ServiceError;
use crate::repository::{AggregateRepository, CommandOutcome};
use crate::values::{ContractId, EstateId, Money, ProductId};

use super::{Float, float_aggregate_id};

/// Command handlers for the float aggregate.
///
/// All operations address the stream derived from
/// `(estate_id, contract_id, product_id)`.
pub struct FloatService<S: EventStore> {
    repository: AggregateRepository<S, Float>,
}

impl<S: EventStore> FloatService<S> {
    /// Creates a new float service over the given event store.
    pub fn new(store: S) -> Self {
        Self {
            repository: AggregateRepository::new(store),
        }
    }

    /// Creates the float backing a contract product.
    #[tracing::instrument(skip(self), fields(%contract_id, %product_id))]
    pub async fn create_float(
        &self,
        estate_id: EstateId,
        contract_id: ContractId,
        product_id: ProductId,
    ) -> Result<CommandOutcome<Float>, ServiceError> {
        let float_id = float_aggregate_id(estate_id, contract_id, product_id);

        self.repository
            .execute(float_id, |float| {
                float.create_for_contract_product(float_id, estate_id, contract_id, product_id)
            })
            .await
    }

    /// Purchases credit onto a float.
    #[tracing::instrument(skip(self), fields(%contract_id, %product_id))]
    pub async fn purchase_credit(
        &self,
        estate_id: EstateId,
        contract_id: ContractId,
        product_id: ProductId,
        amount: Money,
        cost_price: Money,
        purchase_date_time: DateTime<Utc>,
    ) -> Result<CommandOutcome<Float>, ServiceError> {
        let float_id = float_aggregate_id(estate_id, contract_id, product_id);

        self.repository
            .execute(float_id, |float| {
                float.purchase_credit(amount, cost_price, purchase_date_time)
            })
            .await
    }

    /// Draws a float down for an authorised sale.
    #[tracing::instrument(skip(self), fields(%contract_id, %product_id, %transaction_id))]
    pub async fn record_transaction(
        &self,
        estate_id: EstateId,
        contract_id: ContractId,
        product_id: ProductId,
        transaction_id: AggregateId,
        amount: Money,
    ) -> Result<CommandOutcome<Float>, ServiceError> {
        let float_id = float_aggregate_id(estate_id, contract_id, product_id);

        self.repository
            .execute(float_id, |float| {
                float.record_transaction_against_float(transaction_id, amount)
            })
            .await
    }

    /// Returns the live float state by replaying the stream.
    pub async fn get_float(
        &self,
        estate_id: EstateId,
        contract_id: ContractId,
        product_id: ProductId,
    ) -> Result<Option<Float>, ServiceError> {
        self.repository
            .load_existing(float_aggregate_id(estate_id, contract_id, product_id))
            .await
    }
}
