//! Settlement domain events.

use chrono::{DateTime, NaiveDate, Utc};
use common::AggregateId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;
use crate::values::{EstateId, FeeId, MerchantId, Money};

/// Events that can occur on a settlement aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum SettlementEvent {
    /// The settlement stream for a merchant/date was created.
    SettlementCreated(SettlementCreatedData),

    /// A merchant fee was recorded as pending settlement.
    MerchantFeeAddedPendingSettlement(MerchantFeeAddedPendingSettlementData),

    /// A pending merchant fee was settled.
    MerchantFeeSettled(MerchantFeeSettledData),

    /// Settlement processing started.
    SettlementProcessingStarted(SettlementProcessingStartedData),

    /// The settlement completed with zero pending fees.
    SettlementCompleted(SettlementCompletedData),
}

impl DomainEvent for SettlementEvent {
    fn event_type(&self) -> &'static str {
        match self {
            SettlementEvent::SettlementCreated(_) => "SettlementCreated",
            SettlementEvent::MerchantFeeAddedPendingSettlement(_) => {
                "MerchantFeeAddedPendingSettlement"
            }
            SettlementEvent::MerchantFeeSettled(_) => "MerchantFeeSettled",
            SettlementEvent::SettlementProcessingStarted(_) => "SettlementProcessingStarted",
            SettlementEvent::SettlementCompleted(_) => "SettlementCompleted",
        }
    }
}

/// Data for SettlementCreated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementCreatedData {
    /// The derived settlement stream identity.
    pub settlement_id: AggregateId,

    /// Estate the merchant belongs to.
    pub estate_id: EstateId,

    /// Merchant being settled.
    pub merchant_id: MerchantId,

    /// The date this settlement covers.
    pub settlement_date: NaiveDate,
}

/// Data for MerchantFeeAddedPendingSettlement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantFeeAddedPendingSettlementData {
    /// Estate the merchant belongs to.
    pub estate_id: EstateId,

    /// Merchant being settled.
    pub merchant_id: MerchantId,

    /// Transaction the fee was calculated for.
    pub transaction_id: AggregateId,

    /// The configured fee this came from.
    pub fee_id: FeeId,

    /// The configured fee value.
    pub fee_value: Decimal,

    /// The calculated monetary value awaiting settlement.
    pub calculated_value: Money,
}

/// Data for MerchantFeeSettled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantFeeSettledData {
    /// Estate the merchant belongs to.
    pub estate_id: EstateId,

    /// Merchant being settled.
    pub merchant_id: MerchantId,

    /// Transaction the fee was calculated for.
    pub transaction_id: AggregateId,

    /// The configured fee this came from.
    pub fee_id: FeeId,

    /// The settled monetary value.
    pub calculated_value: Money,

    /// When the fee was settled.
    pub settled_at: DateTime<Utc>,
}

/// Data for SettlementProcessingStarted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementProcessingStartedData {
    /// When processing started.
    pub started_at: DateTime<Utc>,
}

/// Data for SettlementCompleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementCompletedData {
    /// When the settlement completed.
    pub completed_at: DateTime<Utc>,

    /// Total value settled across all fees.
    pub amount_settled: Money,

    /// Number of fees settled.
    pub settled_fee_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn event_types() {
        let event = SettlementEvent::SettlementProcessingStarted(SettlementProcessingStartedData {
            started_at: Utc::now(),
        });
        assert_eq!(event.event_type(), "SettlementProcessingStarted");
    }

    #[test]
    fn fee_settled_serialization_roundtrip() {
        let event = SettlementEvent::MerchantFeeSettled(MerchantFeeSettledData {
            estate_id: EstateId::new(),
            merchant_id: MerchantId::new(),
            transaction_id: AggregateId::new(),
            fee_id: FeeId::new(),
            calculated_value: Money::new(dec!(0.50)),
            settled_at: Utc::now(),
        });

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("MerchantFeeSettled"));

        let decoded: SettlementEvent = serde_json::from_str(&json).unwrap();
        if let SettlementEvent::MerchantFeeSettled(data) = decoded {
            assert_eq!(data.calculated_value, Money::new(dec!(0.50)));
        } else {
            panic!("Expected MerchantFeeSettled event");
        }
    }
}
