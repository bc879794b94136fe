//! Contract domain events.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;
use crate::fees::{CalculationType, FeeType};
use crate::values::{ContractId, EstateId, FeeId, Money, OperatorId, ProductId};

/// Events that can occur on a contract aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ContractEvent {
    /// The contract between an estate and an operator was created.
    ContractCreated(ContractCreatedData),

    /// A product became sellable under the contract.
    ContractProductAdded(ContractProductAddedData),

    /// A transaction fee was configured for a contract product.
    TransactionFeeAdded(TransactionFeeAddedData),
}

impl DomainEvent for ContractEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ContractEvent::ContractCreated(_) => "ContractCreated",
            ContractEvent::ContractProductAdded(_) => "ContractProductAdded",
            ContractEvent::TransactionFeeAdded(_) => "TransactionFeeAdded",
        }
    }
}

/// Data for ContractCreated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractCreatedData {
    /// The contract identity.
    pub contract_id: ContractId,

    /// Estate the contract belongs to.
    pub estate_id: EstateId,

    /// Operator supplying the products.
    pub operator_id: OperatorId,

    /// Human-readable description.
    pub description: String,
}

/// Data for ContractProductAdded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractProductAddedData {
    /// The product identity.
    pub product_id: ProductId,

    /// Product name (e.g. "100 KES Topup").
    pub product_name: String,

    /// Text shown on the device.
    pub display_text: String,

    /// Fixed sale value; `None` for variable-value products.
    pub value: Option<Money>,
}

/// Data for TransactionFeeAdded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionFeeAddedData {
    /// The configured fee identity.
    pub fee_id: FeeId,

    /// Product the fee applies to.
    pub product_id: ProductId,

    /// Human-readable description.
    pub description: String,

    /// How the fee value is interpreted.
    pub calculation_type: CalculationType,

    /// Who the fee applies to.
    pub fee_type: FeeType,

    /// The configured fee value.
    pub value: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn event_types() {
        let event = ContractEvent::TransactionFeeAdded(TransactionFeeAddedData {
            fee_id: FeeId::new(),
            product_id: ProductId::new(),
            description: "Merchant commission".to_string(),
            calculation_type: CalculationType::Percentage,
            fee_type: FeeType::Merchant,
            value: dec!(0.5),
        });
        assert_eq!(event.event_type(), "TransactionFeeAdded");
    }

    #[test]
    fn variable_product_serialization_roundtrip() {
        let event = ContractEvent::ContractProductAdded(ContractProductAddedData {
            product_id: ProductId::new(),
            product_name: "Variable Topup".to_string(),
            display_text: "Custom".to_string(),
            value: None,
        });

        let json = serde_json::to_string(&event).unwrap();
        let decoded: ContractEvent = serde_json::from_str(&json).unwrap();
        if let ContractEvent::ContractProductAdded(data) = decoded {
            assert!(data.value.is_none());
        } else {
            panic!("Expected ContractProductAdded event");
        }
    }
}
