//! Contract command service.

use common::AggregateId;
use event_store::EventStore;
use rust_decimal::Decimal;

use crate::error::ServiceError;
use crate::fees::{CalculationType, FeeType};
use crate::repository::{AggregateRepository, CommandOutcome};
use crate::values::{ContractId, EstateId, FeeId, Money, OperatorId, ProductId};

use super::Contract;

/// Command handlers for the contract aggregate.
pub struct ContractService<S: EventStore> {
    repository: AggregateRepository<S, Contract>,
}

impl<S: EventStore> ContractService<S> {
    /// Creates a new contract service over the given event store.
    pub fn new(store: S) -> Self {
        Self {
            repository: AggregateRepository::new(store),
        }
    }

    /// Creates a contract between an estate and an operator.
    #[tracing::instrument(skip(self), fields(%contract_id))]
    pub async fn create_contract(
        &self,
        contract_id: ContractId,
        estate_id: EstateId,
        operator_id: OperatorId,
        description: String,
    ) -> Result<CommandOutcome<Contract>, ServiceError> {
        self.repository
            .execute(AggregateId::from_uuid(contract_id.as_uuid()), |contract| {
                contract.create(contract_id, estate_id, operator_id, description)
            })
            .await
    }

    /// Adds a product to a contract.
    #[tracing::instrument(skip(self), fields(%contract_id, %product_id))]
    pub async fn add_product(
        &self,
        contract_id: ContractId,
        product_id: ProductId,
        product_name: String,
        display_text: String,
        value: Option<Money>,
    ) -> Result<CommandOutcome<Contract>, ServiceError> {
        self.repository
            .execute(AggregateId::from_uuid(contract_id.as_uuid()), |contract| {
                contract.add_product(product_id, product_name, display_text, value)
            })
            .await
    }

    /// Configures a transaction fee for a contract product.
    #[tracing::instrument(skip(self), fields(%contract_id, %product_id))]
    pub async fn add_transaction_fee(
        &self,
        contract_id: ContractId,
        fee_id: FeeId,
        product_id: ProductId,
        description: String,
        calculation_type: CalculationType,
        fee_type: FeeType,
        value: Decimal,
    ) -> Result<CommandOutcome<Contract>, ServiceError> {
        self.repository
            .execute(AggregateId::from_uuid(contract_id.as_uuid()), |contract| {
                contract.add_transaction_fee(
                    fee_id,
                    product_id,
                    description,
                    calculation_type,
                    fee_type,
                    value,
                )
            })
            .await
    }

    /// Loads a contract, mapping the not-created sentinel to `None`.
    pub async fn get_contract(
        &self,
        contract_id: ContractId,
    ) -> Result<Option<Contract>, ServiceError> {
        self.repository
            .load_existing(AggregateId::from_uuid(contract_id.as_uuid()))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use event_store::InMemoryEventStore;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn full_contract_setup() {
        let service = ContractService::new(InMemoryEventStore::new());
        let contract_id = ContractId::new();
        let product_id = ProductId::new();

        service
            .create_contract(
                contract_id,
                EstateId::new(),
                OperatorId::new(),
                "Airtime contract".to_string(),
            )
            .await
            .unwrap();
        service
            .add_product(
                contract_id,
                product_id,
                "100 KES Topup".to_string(),
                "100 KES".to_string(),
                Some(Money::new(dec!(100.00))),
            )
            .await
            .unwrap();
        service
            .add_transaction_fee(
                contract_id,
                FeeId::new(),
                product_id,
                "Merchant commission".to_string(),
                CalculationType::Percentage,
                FeeType::Merchant,
                dec!(0.5),
            )
            .await
            .unwrap();

        let contract = service.get_contract(contract_id).await.unwrap().unwrap();
        assert_eq!(contract.transaction_fees_for_product(product_id).len(), 1);
    }

    #[tokio::test]
    async fn fee_on_missing_contract_is_not_found() {
        let service = ContractService::new(InMemoryEventStore::new());
        let result = service
            .add_transaction_fee(
                ContractId::new(),
                FeeId::new(),
                ProductId::new(),
                "Fee".to_string(),
                CalculationType::Fixed,
                FeeType::Merchant,
                dec!(1),
            )
            .await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }
}
