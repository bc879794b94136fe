//! Transaction command service.

use std::collections::HashMap;

use common::AggregateId;
use event_store::EventStore;

use crate::error::ServiceError;
use crate::repository::{AggregateRepository, CommandOutcome};
use crate::values::{ContractId, EstateId, MerchantId, Money, ProductId};

use super::{Transaction, TransactionType};

/// Command handlers for the transaction aggregate.
///
/// Each method loads the aggregate, invokes one command method and persists
/// the result, mapping business failures to the service error taxonomy.
pub struct TransactionService<S: EventStore> {
    repository: AggregateRepository<S, Transaction>,
}

impl<S: EventStore> TransactionService<S> {
    /// Creates a new transaction service over the given event store.
    pub fn new(store: S) -> Self {
        Self {
            repository: AggregateRepository::new(store),
        }
    }

    /// Starts a new transaction.
    #[tracing::instrument(skip(self), fields(%transaction_id))]
    pub async fn start_transaction(
        &self,
        transaction_id: AggregateId,
        estate_id: EstateId,
        merchant_id: MerchantId,
        transaction_type: TransactionType,
        transaction_number: String,
        device_identifier: String,
        transaction_amount: Option<Money>,
    ) -> Result<CommandOutcome<Transaction>, ServiceError> {
        metrics::counter!("transactions_started_total").increment(1);
        self.repository
            .execute(transaction_id, |transaction| {
                transaction.start(
                    transaction_id,
                    estate_id,
                    merchant_id,
                    transaction_type,
                    transaction_number,
                    device_identifier,
                    transaction_amount,
                )
            })
            .await
    }

    /// Records allow-listed additional request data.
    #[tracing::instrument(skip(self, fields), fields(%transaction_id))]
    pub async fn record_additional_request_data(
        &self,
        transaction_id: AggregateId,
        fields: HashMap<String, String>,
    ) -> Result<CommandOutcome<Transaction>, ServiceError> {
        self.repository
            .execute(transaction_id, |transaction| {
                transaction.record_additional_request_data(fields)
            })
            .await
    }

    /// Attaches the contract product being sold.
    #[tracing::instrument(skip(self), fields(%transaction_id))]
    pub async fn add_product_details(
        &self,
        transaction_id: AggregateId,
        contract_id: ContractId,
        product_id: ProductId,
    ) -> Result<CommandOutcome<Transaction>, ServiceError> {
        self.repository
            .execute(transaction_id, |transaction| {
                transaction.add_product_details(contract_id, product_id)
            })
            .await
    }

    /// Authorises the transaction locally.
    #[tracing::instrument(skip(self), fields(%transaction_id))]
    pub async fn authorise_transaction(
        &self,
        transaction_id: AggregateId,
        authorisation_code: String,
        response_code: String,
        response_message: String,
    ) -> Result<CommandOutcome<Transaction>, ServiceError> {
        self.repository
            .execute(transaction_id, |transaction| {
                transaction.authorise_locally(authorisation_code, response_code, response_message)
            })
            .await
    }

    /// Declines the transaction locally.
    #[tracing::instrument(skip(self), fields(%transaction_id))]
    pub async fn decline_transaction(
        &self,
        transaction_id: AggregateId,
        response_code: String,
        response_message: String,
    ) -> Result<CommandOutcome<Transaction>, ServiceError> {
        self.repository
            .execute(transaction_id, |transaction| {
                transaction.decline_locally(response_code, response_message)
            })
            .await
    }

    /// Completes the transaction.
    #[tracing::instrument(skip(self), fields(%transaction_id))]
    pub async fn complete_transaction(
        &self,
        transaction_id: AggregateId,
    ) -> Result<CommandOutcome<Transaction>, ServiceError> {
        metrics::counter!("transactions_completed_total").increment(1);
        self.repository
            .execute(transaction_id, |transaction| transaction.complete())
            .await
    }

    /// Loads a transaction, mapping the not-created sentinel to `None`.
    pub async fn get_transaction(
        &self,
        transaction_id: AggregateId,
    ) -> Result<Option<Transaction>, ServiceError> {
        self.repository.load_existing(transaction_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::TransactionState;
    use event_store::InMemoryEventStore;
    use rust_decimal_macros::dec;

    fn service() -> TransactionService<InMemoryEventStore> {
        TransactionService::new(InMemoryEventStore::new())
    }

    async fn start_sale(service: &TransactionService<InMemoryEventStore>) -> AggregateId {
        let transaction_id = AggregateId::new();
        service
            .start_transaction(
                transaction_id,
                EstateId::new(),
                MerchantId::new(),
                TransactionType::Sale,
                "0001".to_string(),
                "device-1".to_string(),
                Some(Money::new(dec!(10.00))),
            )
            .await
            .unwrap();
        transaction_id
    }

    #[tokio::test]
    async fn start_and_reload() {
        let service = service();
        let transaction_id = start_sale(&service).await;

        let loaded = service.get_transaction(transaction_id).await.unwrap();
        assert!(loaded.is_some());
        assert_eq!(loaded.unwrap().state(), TransactionState::Started);
    }

    #[tokio::test]
    async fn get_missing_transaction_returns_none() {
        let service = service();
        let result = service.get_transaction(AggregateId::new()).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn full_flow_through_service() {
        let service = service();
        let transaction_id = start_sale(&service).await;

        service
            .add_product_details(transaction_id, ContractId::new(), ProductId::new())
            .await
            .unwrap();
        service
            .authorise_transaction(
                transaction_id,
                "ABCD".to_string(),
                "0000".to_string(),
                "SUCCESS".to_string(),
            )
            .await
            .unwrap();
        let outcome = service.complete_transaction(transaction_id).await.unwrap();

        assert_eq!(outcome.aggregate.state(), TransactionState::Completed);
        assert_eq!(outcome.new_version, event_store::Version::new(4));
    }

    #[tokio::test]
    async fn business_failure_maps_to_invalid() {
        let service = service();
        let transaction_id = start_sale(&service).await;

        // Authorising a sale before product details is a business failure
        let result = service
            .authorise_transaction(
                transaction_id,
                "ABCD".to_string(),
                "0000".to_string(),
                "SUCCESS".to_string(),
            )
            .await;

        assert!(matches!(result, Err(ServiceError::Invalid(_))));
    }

    #[tokio::test]
    async fn command_on_missing_transaction_maps_to_not_found() {
        let service = service();
        let result = service.complete_transaction(AggregateId::new()).await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }
}
