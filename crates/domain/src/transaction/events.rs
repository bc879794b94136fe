//! Transaction domain events.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use common::AggregateId;
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;
use crate::values::{ContractId, EstateId, MerchantId, Money, ProductId};

use super::TransactionType;

/// Events that can occur on a transaction aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum TransactionEvent {
    /// A transaction was started at a merchant device.
    TransactionHasStarted(TransactionHasStartedData),

    /// Operator-specific request data was captured.
    AdditionalRequestDataRecorded(AdditionalRequestDataRecordedData),

    /// The contract product being sold was attached.
    ProductDetailsAdded(ProductDetailsAddedData),

    /// The transaction was authorised locally.
    TransactionHasBeenLocallyAuthorised(TransactionLocallyAuthorisedData),

    /// The transaction was declined locally.
    TransactionHasBeenLocallyDeclined(TransactionDeclinedData),

    /// The transaction was completed.
    TransactionHasBeenCompleted(TransactionCompletedData),
}

impl DomainEvent for TransactionEvent {
    fn event_type(&self) -> &'static str {
        match self {
            TransactionEvent::TransactionHasStarted(_) => "TransactionHasStarted",
            TransactionEvent::AdditionalRequestDataRecorded(_) => "AdditionalRequestDataRecorded",
            TransactionEvent::ProductDetailsAdded(_) => "ProductDetailsAdded",
            TransactionEvent::TransactionHasBeenLocallyAuthorised(_) => {
                "TransactionHasBeenLocallyAuthorised"
            }
            TransactionEvent::TransactionHasBeenLocallyDeclined(_) => {
                "TransactionHasBeenLocallyDeclined"
            }
            TransactionEvent::TransactionHasBeenCompleted(_) => "TransactionHasBeenCompleted",
        }
    }
}

/// Data for TransactionHasStarted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionHasStartedData {
    /// The transaction stream identity.
    pub transaction_id: AggregateId,

    /// Estate the merchant belongs to.
    pub estate_id: EstateId,

    /// Merchant the device belongs to.
    pub merchant_id: MerchantId,

    /// Logon, sale or reconciliation.
    pub transaction_type: TransactionType,

    /// Device-assigned transaction number.
    pub transaction_number: String,

    /// Identifier of the originating device.
    pub device_identifier: String,

    /// Sale amount; absent for logon and reconciliation transactions.
    pub transaction_amount: Option<Money>,

    /// When the transaction started.
    pub started_at: DateTime<Utc>,
}

/// Data for AdditionalRequestDataRecorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdditionalRequestDataRecordedData {
    /// Allow-listed field values captured from the request.
    pub fields: HashMap<String, String>,
}

/// Data for ProductDetailsAdded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductDetailsAddedData {
    /// Contract the product is sold under.
    pub contract_id: ContractId,

    /// The product being sold.
    pub product_id: ProductId,
}

/// Data for TransactionHasBeenLocallyAuthorised.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionLocallyAuthorisedData {
    /// Authorisation code issued to the device.
    pub authorisation_code: String,

    /// Response code (e.g. "0000").
    pub response_code: String,

    /// Human-readable response message.
    pub response_message: String,
}

/// Data for TransactionHasBeenLocallyDeclined.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionDeclinedData {
    /// Response code explaining the decline.
    pub response_code: String,

    /// Human-readable response message.
    pub response_message: String,
}

/// Data for TransactionHasBeenCompleted.
///
/// Carries estate/merchant identity and the amount so projections can fold
/// it without loading the stream head.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionCompletedData {
    /// Estate the merchant belongs to.
    pub estate_id: EstateId,

    /// Merchant the transaction was processed for.
    pub merchant_id: MerchantId,

    /// Whether the transaction was authorised.
    pub is_authorised: bool,

    /// Final response code.
    pub response_code: String,

    /// Sale amount; absent for logon and reconciliation transactions.
    pub transaction_amount: Option<Money>,

    /// When the transaction completed.
    pub completed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn event_types() {
        let event = TransactionEvent::ProductDetailsAdded(ProductDetailsAddedData {
            contract_id: ContractId::new(),
            product_id: ProductId::new(),
        });
        assert_eq!(event.event_type(), "ProductDetailsAdded");

        let event = TransactionEvent::TransactionHasBeenLocallyDeclined(TransactionDeclinedData {
            response_code: "1008".to_string(),
            response_message: "DECLINED BY OPERATOR".to_string(),
        });
        assert_eq!(event.event_type(), "TransactionHasBeenLocallyDeclined");
    }

    #[test]
    fn started_event_serialization_roundtrip() {
        let event = TransactionEvent::TransactionHasStarted(TransactionHasStartedData {
            transaction_id: AggregateId::new(),
            estate_id: EstateId::new(),
            merchant_id: MerchantId::new(),
            transaction_type: TransactionType::Sale,
            transaction_number: "0001".to_string(),
            device_identifier: "device-1".to_string(),
            transaction_amount: Some(Money::new(dec!(10.00))),
            started_at: Utc::now(),
        });

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("TransactionHasStarted"));

        let decoded: TransactionEvent = serde_json::from_str(&json).unwrap();
        if let TransactionEvent::TransactionHasStarted(data) = decoded {
            assert_eq!(data.transaction_number, "0001");
            assert_eq!(data.transaction_amount, Some(Money::new(dec!(10.00))));
        } else {
            panic!("Expected TransactionHasStarted event");
        }
    }

    #[test]
    fn completed_event_serialization_roundtrip() {
        let event = TransactionEvent::TransactionHasBeenCompleted(TransactionCompletedData {
            estate_id: EstateId::new(),
            merchant_id: MerchantId::new(),
            is_authorised: true,
            response_code: "0000".to_string(),
            transaction_amount: Some(Money::new(dec!(25.50))),
            completed_at: Utc::now(),
        });

        let json = serde_json::to_string(&event).unwrap();
        let decoded: TransactionEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.event_type(), "TransactionHasBeenCompleted");
    }
}
