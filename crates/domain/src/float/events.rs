//! Float domain events.

use chrono::{DateTime, Utc};
use common::AggregateId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::DomainEvent;
use crate::values::{ContractId, EstateId, Money, ProductId};

/// Events that can occur on a float aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum FloatEvent {
    /// A float was created to back a contract product.
    FloatCreatedForContractProduct(FloatCreatedForContractProductData),

    /// Credit was purchased onto the float.
    FloatCreditPurchased(FloatCreditPurchasedData),

    /// A sale drew the float down.
    FloatDecreasedByTransaction(FloatDecreasedByTransactionData),
}

impl DomainEvent for FloatEvent {
    fn event_type(&self) -> &'static str {
        match self {
            FloatEvent::FloatCreatedForContractProduct(_) => "FloatCreatedForContractProduct",
            FloatEvent::FloatCreditPurchased(_) => "FloatCreditPurchased",
            FloatEvent::FloatDecreasedByTransaction(_) => "FloatDecreasedByTransaction",
        }
    }
}

/// Data for FloatCreatedForContractProduct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloatCreatedForContractProductData {
    /// The derived float stream identity.
    pub float_id: AggregateId,

    /// Estate the float belongs to.
    pub estate_id: EstateId,

    /// Contract whose product this float backs.
    pub contract_id: ContractId,

    /// The backed product.
    pub product_id: ProductId,

    /// When the float was created.
    pub created_date_time: DateTime<Utc>,
}

/// Data for FloatCreditPurchased.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloatCreditPurchasedData {
    /// Estate the float belongs to.
    pub estate_id: EstateId,

    /// Purchase identity.
    pub credit_id: Uuid,

    /// Face value credited to the float.
    pub amount: Money,

    /// What the estate paid for the credit.
    pub cost_price: Money,

    /// When the credit was purchased.
    pub purchase_date_time: DateTime<Utc>,
}

/// Data for FloatDecreasedByTransaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloatDecreasedByTransactionData {
    /// Estate the float belongs to.
    pub estate_id: EstateId,

    /// The sale transaction that drew the float down.
    pub transaction_id: AggregateId,

    /// Amount drawn down.
    pub amount: Money,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn credit_purchased_roundtrip() {
        let event = FloatEvent::FloatCreditPurchased(FloatCreditPurchasedData {
            estate_id: EstateId::new(),
            credit_id: Uuid::new_v4(),
            amount: Money::new(dec!(1000.00)),
            cost_price: Money::new(dec!(985.00)),
            purchase_date_time: Utc::now(),
        });

        assert_eq!(event.event_type(), "FloatCreditPurchased");

        let json = serde_json::to_string(&event).unwrap();
        let decoded: FloatEvent = serde_json::from_str(&json).unwrap();
        if let FloatEvent::FloatCreditPurchased(data) = decoded {
            assert_eq!(data.cost_price, Money::new(dec!(985.00)));
        } else {
            panic!("Expected FloatCreditPurchased event");
        }
    }
}
