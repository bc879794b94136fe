//! Float aggregate implementation.

use chrono::{DateTime, Utc};
use common::AggregateId;
use event_store::Version;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::Aggregate;
use crate::values::{ContractId, EstateId, Money, ProductId};

use super::{
    FloatError,
    events::{
        FloatCreatedForContractProductData, FloatCreditPurchasedData,
        FloatDecreasedByTransactionData, FloatEvent,
    },
};

/// Float aggregate root.
///
/// A prepaid credit balance backing one contract product, replenished by
/// credit purchases and drawn down by sales.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Float {
    id: Option<AggregateId>,

    #[serde(default)]
    version: Version,

    estate_id: Option<EstateId>,
    contract_id: Option<ContractId>,
    product_id: Option<ProductId>,
    balance: Money,
    total_credit_purchased: Money,
    total_cost_price: Money,
}

impl Aggregate for Float {
    type Event = FloatEvent;
    type Error = FloatError;

    fn aggregate_type() -> &'static str {
        "Float"
    }

    fn id(&self) -> Option<AggregateId> {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            FloatEvent::FloatCreatedForContractProduct(data) => {
                self.id = Some(data.float_id);
                self.estate_id = Some(data.estate_id);
                self.contract_id = Some(data.contract_id);
                self.product_id = Some(data.product_id);
            }
            FloatEvent::FloatCreditPurchased(data) => {
                self.balance += data.amount;
                self.total_credit_purchased += data.amount;
                self.total_cost_price += data.cost_price;
            }
            FloatEvent::FloatDecreasedByTransaction(data) => {
                self.balance -= data.amount;
            }
        }
    }
}

// Query methods
impl Float {
    /// Returns the current credit balance.
    pub fn balance(&self) -> Money {
        self.balance
    }

    /// Returns the total face value of credit ever purchased.
    pub fn total_credit_purchased(&self) -> Money {
        self.total_credit_purchased
    }

    /// Returns the total amount paid for purchased credit.
    pub fn total_cost_price(&self) -> Money {
        self.total_cost_price
    }

    /// Returns the backed contract product.
    pub fn product(&self) -> Option<(ContractId, ProductId)> {
        self.contract_id.zip(self.product_id)
    }
}

// Command methods (return events)
impl Float {
    /// Creates the float for a contract product.
    pub fn create_for_contract_product(
        &self,
        float_id: AggregateId,
        estate_id: EstateId,
        contract_id: ContractId,
        product_id: ProductId,
    ) -> Result<Vec<FloatEvent>, FloatError> {
        if self.id.is_some() {
            return Err(FloatError::AlreadyCreated);
        }

        Ok(vec![FloatEvent::FloatCreatedForContractProduct(
            FloatCreatedForContractProductData {
                float_id,
                estate_id,
                contract_id,
                product_id,
                created_date_time: Utc::now(),
            },
        )])
    }

    /// Purchases credit onto the float.
    pub fn purchase_credit(
        &self,
        amount: Money,
        cost_price: Money,
        purchase_date_time: DateTime<Utc>,
    ) -> Result<Vec<FloatEvent>, FloatError> {
        let estate_id = self.estate_id.ok_or(FloatError::NotCreated)?;

        if !amount.is_positive() {
            return Err(FloatError::InvalidAmount(amount));
        }
        if !cost_price.is_positive() {
            return Err(FloatError::InvalidAmount(cost_price));
        }

        Ok(vec![FloatEvent::FloatCreditPurchased(
            FloatCreditPurchasedData {
                estate_id,
                credit_id: Uuid::new_v4(),
                amount,
                cost_price,
                purchase_date_time,
            },
        )])
    }

    /// Draws the float down for an authorised sale.
    pub fn record_transaction_against_float(
        &self,
        transaction_id: AggregateId,
        amount: Money,
    ) -> Result<Vec<FloatEvent>, FloatError> {
        let estate_id = self.estate_id.ok_or(FloatError::NotCreated)?;

        if !amount.is_positive() {
            return Err(FloatError::InvalidAmount(amount));
        }

        if amount > self.balance {
            return Err(FloatError::InsufficientCredit {
                available: self.balance,
            });
        }

        Ok(vec![FloatEvent::FloatDecreasedByTransaction(
            FloatDecreasedByTransactionData {
                estate_id,
                transaction_id,
                amount,
            },
        )])
    }
}
