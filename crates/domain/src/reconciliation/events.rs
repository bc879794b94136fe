//! Reconciliation domain events.

use chrono::{DateTime, Utc};
use common::AggregateId;
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;
use crate::values::{EstateId, MerchantId, Money};

/// Events that can occur on a reconciliation aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ReconciliationEvent {
    /// A device started an end-of-day reconciliation.
    ReconciliationHasStarted(ReconciliationStartedData),

    /// The device's overall totals were recorded.
    OverallTotalsRecorded(OverallTotalsRecordedData),

    /// The reconciliation completed.
    ReconciliationHasBeenCompleted(ReconciliationCompletedData),
}

impl DomainEvent for ReconciliationEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ReconciliationEvent::ReconciliationHasStarted(_) => "ReconciliationHasStarted",
            ReconciliationEvent::OverallTotalsRecorded(_) => "OverallTotalsRecorded",
            ReconciliationEvent::ReconciliationHasBeenCompleted(_) => {
                "ReconciliationHasBeenCompleted"
            }
        }
    }
}

/// Data for ReconciliationHasStarted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationStartedData {
    /// The reconciliation stream identity.
    pub reconciliation_id: AggregateId,

    /// Estate the merchant belongs to.
    pub estate_id: EstateId,

    /// Merchant the device belongs to.
    pub merchant_id: MerchantId,

    /// Identifier of the reconciling device.
    pub device_identifier: String,

    /// When the reconciliation started.
    pub started_at: DateTime<Utc>,
}

/// Data for OverallTotalsRecorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverallTotalsRecordedData {
    /// Number of transactions the device processed.
    pub transaction_count: u32,

    /// Total value of those transactions.
    pub transaction_value: Money,
}

/// Data for ReconciliationHasBeenCompleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationCompletedData {
    /// When the reconciliation completed.
    pub completed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn totals_roundtrip() {
        let event = ReconciliationEvent::OverallTotalsRecorded(OverallTotalsRecordedData {
            transaction_count: 42,
            transaction_value: Money::new(dec!(4200.00)),
        });

        assert_eq!(event.event_type(), "OverallTotalsRecorded");

        let json = serde_json::to_string(&event).unwrap();
        let decoded: ReconciliationEvent = serde_json::from_str(&json).unwrap();
        if let ReconciliationEvent::OverallTotalsRecorded(data) = decoded {
            assert_eq!(data.transaction_count, 42);
        } else {
            panic!("Expected OverallTotalsRecorded event");
        }
    }
}
