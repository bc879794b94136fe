//! Relational read-model contract and the handler that maintains it.
//!
//! The relational schema itself lives behind [`ReadModelRepository`]; this
//! crate ships an in-memory implementation with the same semantics. Every
//! method is idempotent on replay: re-inserting an existing row or
//! re-applying a completed mutation succeeds.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use common::AggregateId;
use dispatcher::{DispatchError, DomainEventHandler, PlatformEvent};
use domain::contract::{ContractCreatedData, ContractProductAddedData, TransactionFeeAddedData};
use domain::estate::{EstateCreatedData, OperatorAddedToEstateData};
use domain::merchant::MerchantCreatedData;
use domain::operator::OperatorCreatedData;
use domain::settlement::{
    MerchantFeeAddedPendingSettlementData, MerchantFeeSettledData, SettlementCompletedData,
    SettlementCreatedData,
};
use domain::transaction::{TransactionCompletedData, TransactionHasStartedData};
use domain::{
    ContractEvent, ContractId, EstateEvent, EstateId, MerchantEvent, MerchantId, Money,
    OperatorEvent, OperatorId, ProductId, SettlementEvent, TransactionEvent, TransactionType,
};
use event_store::EventEnvelope;
use tokio::sync::RwLock;

use crate::error::Result;

/// Flattened estate row.
#[derive(Debug, Clone)]
pub struct EstateRow {
    pub estate_id: EstateId,
    pub estate_name: String,
    pub operators: Vec<OperatorId>,
}

/// Flattened merchant row.
#[derive(Debug, Clone)]
pub struct MerchantRow {
    pub merchant_id: MerchantId,
    pub estate_id: EstateId,
    pub merchant_name: String,
}

/// Flattened contract row with its products and fees.
#[derive(Debug, Clone)]
pub struct ContractRow {
    pub contract_id: ContractId,
    pub estate_id: EstateId,
    pub operator_id: OperatorId,
    pub description: String,
    pub products: Vec<(ProductId, String)>,
    pub fee_count: u32,
}

/// Flattened transaction row, filled in as events arrive.
#[derive(Debug, Clone, Default)]
pub struct TransactionRow {
    pub transaction_id: Option<AggregateId>,
    pub estate_id: Option<EstateId>,
    pub merchant_id: Option<MerchantId>,
    pub transaction_type: Option<TransactionType>,
    pub transaction_number: String,
    pub device_identifier: String,
    pub transaction_amount: Option<Money>,
    pub is_authorised: Option<bool>,
    pub response_code: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Flattened settlement row.
#[derive(Debug, Clone)]
pub struct SettlementRow {
    pub settlement_id: AggregateId,
    pub estate_id: EstateId,
    pub merchant_id: MerchantId,
    pub settlement_date: NaiveDate,
    pub pending_fee_count: u32,
    pub settled_fee_count: u32,
    pub amount_settled: Money,
    pub is_completed: bool,
}

/// Relational persistence for flattened query views.
///
/// One method per consumed event type; each resolves the relevant row from
/// identifiers embedded in the event and applies the stated mutation.
#[async_trait]
pub trait ReadModelRepository: Send + Sync {
    async fn add_estate(&self, data: &EstateCreatedData) -> Result<()>;

    async fn add_operator_to_estate(&self, data: &OperatorAddedToEstateData) -> Result<()>;

    async fn add_operator(&self, data: &OperatorCreatedData) -> Result<()>;

    async fn add_merchant(&self, data: &MerchantCreatedData) -> Result<()>;

    async fn add_contract(&self, data: &ContractCreatedData) -> Result<()>;

    async fn add_contract_product(
        &self,
        contract_id: AggregateId,
        data: &ContractProductAddedData,
    ) -> Result<()>;

    async fn add_contract_fee(
        &self,
        contract_id: AggregateId,
        data: &TransactionFeeAddedData,
    ) -> Result<()>;

    async fn start_transaction(
        &self,
        transaction_id: AggregateId,
        data: &TransactionHasStartedData,
    ) -> Result<()>;

    async fn complete_transaction(
        &self,
        transaction_id: AggregateId,
        data: &TransactionCompletedData,
    ) -> Result<()>;

    async fn add_settlement(&self, data: &SettlementCreatedData) -> Result<()>;

    async fn add_settlement_fee(
        &self,
        settlement_id: AggregateId,
        data: &MerchantFeeAddedPendingSettlementData,
    ) -> Result<()>;

    async fn mark_settlement_fee_settled(
        &self,
        settlement_id: AggregateId,
        data: &MerchantFeeSettledData,
    ) -> Result<()>;

    async fn mark_settlement_as_completed(
        &self,
        settlement_id: AggregateId,
        data: &SettlementCompletedData,
    ) -> Result<()>;
}

#[derive(Default)]
struct ReadModelTables {
    estates: HashMap<EstateId, EstateRow>,
    merchants: HashMap<MerchantId, MerchantRow>,
    contracts: HashMap<ContractId, ContractRow>,
    transactions: HashMap<AggregateId, TransactionRow>,
    settlements: HashMap<AggregateId, SettlementRow>,
}

/// In-memory read model with the same contract as the relational one.
#[derive(Clone, Default)]
pub struct InMemoryReadModel {
    tables: Arc<RwLock<ReadModelTables>>,
}

impl InMemoryReadModel {
    /// Creates an empty read model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns an estate row.
    pub async fn estate(&self, estate_id: EstateId) -> Option<EstateRow> {
        self.tables.read().await.estates.get(&estate_id).cloned()
    }

    /// Returns a merchant row.
    pub async fn merchant(&self, merchant_id: MerchantId) -> Option<MerchantRow> {
        self.tables
            .read()
            .await
            .merchants
            .get(&merchant_id)
            .cloned()
    }

    /// Returns a contract row.
    pub async fn contract(&self, contract_id: ContractId) -> Option<ContractRow> {
        self.tables
            .read()
            .await
            .contracts
            .get(&contract_id)
            .cloned()
    }

    /// Returns a transaction row.
    pub async fn transaction(&self, transaction_id: AggregateId) -> Option<TransactionRow> {
        self.tables
            .read()
            .await
            .transactions
            .get(&transaction_id)
            .cloned()
    }

    /// Returns all transaction rows for a merchant.
    pub async fn transactions_for_merchant(&self, merchant_id: MerchantId) -> Vec<TransactionRow> {
        self.tables
            .read()
            .await
            .transactions
            .values()
            .filter(|t| t.merchant_id == Some(merchant_id))
            .cloned()
            .collect()
    }

    /// Returns a settlement row.
    pub async fn settlement(&self, settlement_id: AggregateId) -> Option<SettlementRow> {
        self.tables
            .read()
            .await
            .settlements
            .get(&settlement_id)
            .cloned()
    }

    /// Returns all settlement rows for a merchant, oldest date first.
    pub async fn settlements_for_merchant(&self, merchant_id: MerchantId) -> Vec<SettlementRow> {
        let mut rows: Vec<_> = self
            .tables
            .read()
            .await
            .settlements
            .values()
            .filter(|s| s.merchant_id == merchant_id)
            .cloned()
            .collect();
        rows.sort_by_key(|s| s.settlement_date);
        rows
    }
}

#[async_trait]
impl ReadModelRepository for InMemoryReadModel {
    async fn add_estate(&self, data: &EstateCreatedData) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.estates.entry(data.estate_id).or_insert(EstateRow {
            estate_id: data.estate_id,
            estate_name: data.estate_name.clone(),
            operators: Vec::new(),
        });
        Ok(())
    }

    async fn add_operator_to_estate(&self, data: &OperatorAddedToEstateData) -> Result<()> {
        let mut tables = self.tables.write().await;
        let row = tables.estates.entry(data.estate_id).or_insert(EstateRow {
            estate_id: data.estate_id,
            estate_name: String::new(),
            operators: Vec::new(),
        });
        if !row.operators.contains(&data.operator_id) {
            row.operators.push(data.operator_id);
        }
        Ok(())
    }

    async fn add_operator(&self, _data: &OperatorCreatedData) -> Result<()> {
        // Operator details live on the estate row once linked; nothing
        // further to flatten here.
        Ok(())
    }

    async fn add_merchant(&self, data: &MerchantCreatedData) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables
            .merchants
            .entry(data.merchant_id)
            .or_insert(MerchantRow {
                merchant_id: data.merchant_id,
                estate_id: data.estate_id,
                merchant_name: data.merchant_name.clone(),
            });
        Ok(())
    }

    async fn add_contract(&self, data: &ContractCreatedData) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables
            .contracts
            .entry(data.contract_id)
            .or_insert(ContractRow {
                contract_id: data.contract_id,
                estate_id: data.estate_id,
                operator_id: data.operator_id,
                description: data.description.clone(),
                products: Vec::new(),
                fee_count: 0,
            });
        Ok(())
    }

    async fn add_contract_product(
        &self,
        contract_id: AggregateId,
        data: &ContractProductAddedData,
    ) -> Result<()> {
        let mut tables = self.tables.write().await;
        let contract_id = ContractId::from_uuid(contract_id.as_uuid());
        if let Some(row) = tables.contracts.get_mut(&contract_id)
            && !row.products.iter().any(|(id, _)| *id == data.product_id)
        {
            row.products
                .push((data.product_id, data.product_name.clone()));
        }
        Ok(())
    }

    async fn add_contract_fee(
        &self,
        contract_id: AggregateId,
        _data: &TransactionFeeAddedData,
    ) -> Result<()> {
        let mut tables = self.tables.write().await;
        let contract_id = ContractId::from_uuid(contract_id.as_uuid());
        if let Some(row) = tables.contracts.get_mut(&contract_id) {
            row.fee_count += 1;
        }
        Ok(())
    }

    async fn start_transaction(
        &self,
        transaction_id: AggregateId,
        data: &TransactionHasStartedData,
    ) -> Result<()> {
        let mut tables = self.tables.write().await;
        let row = tables.transactions.entry(transaction_id).or_default();
        row.transaction_id = Some(transaction_id);
        row.estate_id = Some(data.estate_id);
        row.merchant_id = Some(data.merchant_id);
        row.transaction_type = Some(data.transaction_type);
        row.transaction_number = data.transaction_number.clone();
        row.device_identifier = data.device_identifier.clone();
        row.transaction_amount = data.transaction_amount;
        row.started_at = Some(data.started_at);
        Ok(())
    }

    async fn complete_transaction(
        &self,
        transaction_id: AggregateId,
        data: &TransactionCompletedData,
    ) -> Result<()> {
        let mut tables = self.tables.write().await;
        let row = tables.transactions.entry(transaction_id).or_default();
        row.transaction_id = Some(transaction_id);
        row.estate_id = Some(data.estate_id);
        row.merchant_id = Some(data.merchant_id);
        row.is_authorised = Some(data.is_authorised);
        row.response_code = data.response_code.clone();
        if row.transaction_amount.is_none() {
            row.transaction_amount = data.transaction_amount;
        }
        row.completed_at = Some(data.completed_at);
        Ok(())
    }

    async fn add_settlement(&self, data: &SettlementCreatedData) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables
            .settlements
            .entry(data.settlement_id)
            .or_insert(SettlementRow {
                settlement_id: data.settlement_id,
                estate_id: data.estate_id,
                merchant_id: data.merchant_id,
                settlement_date: data.settlement_date,
                pending_fee_count: 0,
                settled_fee_count: 0,
                amount_settled: Money::zero(),
                is_completed: false,
            });
        Ok(())
    }

    async fn add_settlement_fee(
        &self,
        settlement_id: AggregateId,
        data: &MerchantFeeAddedPendingSettlementData,
    ) -> Result<()> {
        let mut tables = self.tables.write().await;
        if let Some(row) = tables.settlements.get_mut(&settlement_id) {
            row.pending_fee_count += 1;
        } else {
            // Fee arrived ahead of the created row; keep a stub the
            // creation event will fill in.
            tables.settlements.insert(
                settlement_id,
                SettlementRow {
                    settlement_id,
                    estate_id: data.estate_id,
                    merchant_id: data.merchant_id,
                    settlement_date: NaiveDate::default(),
                    pending_fee_count: 1,
                    settled_fee_count: 0,
                    amount_settled: Money::zero(),
                    is_completed: false,
                },
            );
        }
        Ok(())
    }

    async fn mark_settlement_fee_settled(
        &self,
        settlement_id: AggregateId,
        data: &MerchantFeeSettledData,
    ) -> Result<()> {
        let mut tables = self.tables.write().await;
        if let Some(row) = tables.settlements.get_mut(&settlement_id) {
            row.pending_fee_count = row.pending_fee_count.saturating_sub(1);
            row.settled_fee_count += 1;
            row.amount_settled += data.calculated_value;
        }
        Ok(())
    }

    async fn mark_settlement_as_completed(
        &self,
        settlement_id: AggregateId,
        _data: &SettlementCompletedData,
    ) -> Result<()> {
        let mut tables = self.tables.write().await;
        if let Some(row) = tables.settlements.get_mut(&settlement_id) {
            row.is_completed = true;
        }
        Ok(())
    }
}

/// Routes decoded platform events into the read-model repository.
///
/// Registered on the main (unordered) pipeline: every mutation here is an
/// upsert or set-based update, so ordering and redelivery are both safe.
pub struct ReadModelHandler<R: ReadModelRepository> {
    repository: Arc<R>,
}

impl<R: ReadModelRepository> ReadModelHandler<R> {
    /// Creates the handler over the given repository.
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl<R: ReadModelRepository> DomainEventHandler for ReadModelHandler<R> {
    fn name(&self) -> &'static str {
        "read-model"
    }

    async fn handle(
        &self,
        event: &PlatformEvent,
        envelope: &EventEnvelope,
    ) -> Result<(), DispatchError> {
        let result = match event {
            PlatformEvent::Estate(EstateEvent::EstateCreated(data)) => {
                self.repository.add_estate(data).await
            }
            PlatformEvent::Estate(EstateEvent::OperatorAddedToEstate(data)) => {
                self.repository.add_operator_to_estate(data).await
            }
            PlatformEvent::Operator(OperatorEvent::OperatorCreated(data)) => {
                self.repository.add_operator(data).await
            }
            PlatformEvent::Merchant(MerchantEvent::MerchantCreated(data)) => {
                self.repository.add_merchant(data).await
            }
            PlatformEvent::Contract(ContractEvent::ContractCreated(data)) => {
                self.repository.add_contract(data).await
            }
            PlatformEvent::Contract(ContractEvent::ContractProductAdded(data)) => {
                self.repository
                    .add_contract_product(envelope.aggregate_id, data)
                    .await
            }
            PlatformEvent::Contract(ContractEvent::TransactionFeeAdded(data)) => {
                self.repository
                    .add_contract_fee(envelope.aggregate_id, data)
                    .await
            }
            PlatformEvent::Transaction(TransactionEvent::TransactionHasStarted(data)) => {
                self.repository
                    .start_transaction(envelope.aggregate_id, data)
                    .await
            }
            PlatformEvent::Transaction(TransactionEvent::TransactionHasBeenCompleted(data)) => {
                self.repository
                    .complete_transaction(envelope.aggregate_id, data)
                    .await
            }
            PlatformEvent::Settlement(SettlementEvent::SettlementCreated(data)) => {
                self.repository.add_settlement(data).await
            }
            PlatformEvent::Settlement(SettlementEvent::MerchantFeeAddedPendingSettlement(data)) => {
                self.repository
                    .add_settlement_fee(envelope.aggregate_id, data)
                    .await
            }
            PlatformEvent::Settlement(SettlementEvent::MerchantFeeSettled(data)) => {
                self.repository
                    .mark_settlement_fee_settled(envelope.aggregate_id, data)
                    .await
            }
            PlatformEvent::Settlement(SettlementEvent::SettlementCompleted(data)) => {
                self.repository
                    .mark_settlement_as_completed(envelope.aggregate_id, data)
                    .await
            }
            _ => Ok(()),
        };

        result.map_err(|e| DispatchError::Handler {
            handler: "read-model".to_string(),
            message: e.to_string(),
        })
    }
}
