//! Merchant domain events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::DomainEvent;
use crate::values::{EstateId, MerchantId, Money};

/// Where a deposit originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DepositSource {
    /// Entered by an estate user.
    Manual,

    /// Received from an automated bank feed.
    Automatic,
}

/// Events that can occur on a merchant aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum MerchantEvent {
    /// The merchant was created under an estate.
    MerchantCreated(MerchantCreatedData),

    /// Funds were deposited to the merchant's account.
    MerchantDepositMade(MerchantDepositMadeData),

    /// Funds were withdrawn from the merchant's account.
    MerchantWithdrawalMade(MerchantWithdrawalMadeData),
}

impl DomainEvent for MerchantEvent {
    fn event_type(&self) -> &'static str {
        match self {
            MerchantEvent::MerchantCreated(_) => "MerchantCreated",
            MerchantEvent::MerchantDepositMade(_) => "MerchantDepositMade",
            MerchantEvent::MerchantWithdrawalMade(_) => "MerchantWithdrawalMade",
        }
    }
}

/// Data for MerchantCreated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantCreatedData {
    /// Estate the merchant belongs to.
    pub estate_id: EstateId,

    /// The merchant identity.
    pub merchant_id: MerchantId,

    /// Trading name.
    pub merchant_name: String,

    /// When the merchant was created.
    pub created_at: DateTime<Utc>,
}

/// Data for MerchantDepositMade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantDepositMadeData {
    /// Estate the merchant belongs to.
    pub estate_id: EstateId,

    /// The merchant identity.
    pub merchant_id: MerchantId,

    /// Deterministic deposit identity derived from the business key, so a
    /// resubmitted deposit is recognised as a duplicate.
    pub deposit_id: Uuid,

    /// Bank or user reference for the deposit.
    pub reference: String,

    /// Deposited amount.
    pub amount: Money,

    /// Where the deposit originated.
    pub source: DepositSource,

    /// When the deposit was made.
    pub deposit_date_time: DateTime<Utc>,
}

/// Data for MerchantWithdrawalMade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantWithdrawalMadeData {
    /// Estate the merchant belongs to.
    pub estate_id: EstateId,

    /// The merchant identity.
    pub merchant_id: MerchantId,

    /// Withdrawal identity.
    pub withdrawal_id: Uuid,

    /// Withdrawn amount.
    pub amount: Money,

    /// When the withdrawal was made.
    pub withdrawal_date_time: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn event_types() {
        let event = MerchantEvent::MerchantCreated(MerchantCreatedData {
            estate_id: EstateId::new(),
            merchant_id: MerchantId::new(),
            merchant_name: "Corner Store".to_string(),
            created_at: Utc::now(),
        });
        assert_eq!(event.event_type(), "MerchantCreated");
    }

    #[test]
    fn deposit_serialization_roundtrip() {
        let event = MerchantEvent::MerchantDepositMade(MerchantDepositMadeData {
            estate_id: EstateId::new(),
            merchant_id: MerchantId::new(),
            deposit_id: Uuid::new_v4(),
            reference: "BANK-REF-1".to_string(),
            amount: Money::new(dec!(100.00)),
            source: DepositSource::Manual,
            deposit_date_time: Utc::now(),
        });

        let json = serde_json::to_string(&event).unwrap();
        let decoded: MerchantEvent = serde_json::from_str(&json).unwrap();
        if let MerchantEvent::MerchantDepositMade(data) = decoded {
            assert_eq!(data.reference, "BANK-REF-1");
            assert_eq!(data.amount, Money::new(dec!(100.00)));
        } else {
            panic!("Expected MerchantDepositMade event");
        }
    }
}
