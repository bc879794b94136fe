//! Merchant aggregate implementation.

use chrono::{DateTime, Utc};
use common::AggregateId;
use event_store::Version;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::{Aggregate, SnapshotCapable};
use crate::values::{EstateId, MerchantId, Money};

use super::{
    MerchantError,
    events::{
        DepositSource, MerchantCreatedData, MerchantDepositMadeData, MerchantEvent,
        MerchantWithdrawalMadeData,
    },
};

/// Merchant aggregate root.
///
/// Tracks the merchant's identity and the deposits/withdrawals recorded
/// against it. The queryable running balance lives in the merchant balance
/// projection; the aggregate keeps only the totals it needs to validate
/// withdrawals.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Merchant {
    id: Option<AggregateId>,

    #[serde(default)]
    version: Version,

    estate_id: Option<EstateId>,
    merchant_name: String,
    deposit_ids: Vec<Uuid>,
    total_deposited: Money,
    total_withdrawn: Money,
}

impl Aggregate for Merchant {
    type Event = MerchantEvent;
    type Error = MerchantError;

    fn aggregate_type() -> &'static str {
        "Merchant"
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
            MerchantEvent::MerchantCreated(data) => {
                self.id = Some(AggregateId::from_uuid(data.merchant_id.as_uuid()));
                self.estate_id = Some(data.estate_id);
                self.merchant_name = data.merchant_name;
            }
            MerchantEvent::MerchantDepositMade(data) => {
                self.deposit_ids.push(data.deposit_id);
                self.total_deposited += data.amount;
            }
            MerchantEvent::MerchantWithdrawalMade(data) => {
                self.total_withdrawn += data.amount;
            }
        }
    }
}

impl SnapshotCapable for Merchant {
    fn snapshot_interval() -> usize {
        // Deposit/withdrawal streams grow without bound
        100
    }
}

// Query methods
impl Merchant {
    /// Returns the estate the merchant belongs to.
    pub fn estate_id(&self) -> Option<EstateId> {
        self.estate_id
    }

    /// Returns the merchant's trading name.
    pub fn merchant_name(&self) -> &str {
        &self.merchant_name
    }

    /// Returns the funds available for withdrawal per the aggregate.
    pub fn withdrawable_funds(&self) -> Money {
        self.total_deposited - self.total_withdrawn
    }
}

// Command methods (return events)
impl Merchant {
    /// Creates the merchant under an estate.
    pub fn create(
        &self,
        estate_id: EstateId,
        merchant_id: MerchantId,
        merchant_name: impl Into<String>,
    ) -> Result<Vec<MerchantEvent>, MerchantError> {
        if self.id.is_some() {
            return Err(MerchantError::AlreadyCreated);
        }

        let merchant_name = merchant_name.into();
        if merchant_name.is_empty() {
            return Err(MerchantError::NameRequired);
        }

        Ok(vec![MerchantEvent::MerchantCreated(MerchantCreatedData {
            estate_id,
            merchant_id,
            merchant_name,
            created_at: Utc::now(),
        })])
    }

    /// Records a deposit.
    ///
    /// The deposit identity derives from the business key, so resubmitting
    /// the same deposit is rejected as a duplicate rather than double
    /// counted.
    pub fn make_deposit(
        &self,
        source: DepositSource,
        reference: impl Into<String>,
        amount: Money,
        deposit_date_time: DateTime<Utc>,
    ) -> Result<Vec<MerchantEvent>, MerchantError> {
        let (estate_id, merchant_id) = self.require_created()?;

        if !amount.is_positive() {
            return Err(MerchantError::InvalidAmount(amount));
        }

        let reference = reference.into();
        let deposit_id = AggregateId::derive(
            "deposit",
            &format!(
                "{merchant_id}/{reference}/{amount}/{}",
                deposit_date_time.timestamp()
            ),
        )
        .as_uuid();

        if self.deposit_ids.contains(&deposit_id) {
            return Err(MerchantError::DuplicateDeposit { reference });
        }

        Ok(vec![MerchantEvent::MerchantDepositMade(
            MerchantDepositMadeData {
                estate_id,
                merchant_id,
                deposit_id,
                reference,
                amount,
                source,
                deposit_date_time,
            },
        )])
    }

    /// Records a withdrawal against the deposited funds.
    pub fn make_withdrawal(
        &self,
        amount: Money,
        withdrawal_date_time: DateTime<Utc>,
    ) -> Result<Vec<MerchantEvent>, MerchantError> {
        let (estate_id, merchant_id) = self.require_created()?;

        if !amount.is_positive() {
            return Err(MerchantError::InvalidAmount(amount));
        }

        let available = self.withdrawable_funds();
        if amount > available {
            return Err(MerchantError::InsufficientFunds { available });
        }

        Ok(vec![MerchantEvent::MerchantWithdrawalMade(
            MerchantWithdrawalMadeData {
                estate_id,
                merchant_id,
                withdrawal_id: Uuid::new_v4(),
                amount,
                withdrawal_date_time,
            },
        )])
    }

    fn require_created(&self) -> Result<(EstateId, MerchantId), MerchantError> {
        match (self.estate_id, self.id) {
            (Some(estate_id), Some(id)) => {
                Ok((estate_id, MerchantId::from_uuid(id.as_uuid())))
            }
            _ => Err(MerchantError::NotCreated),
        }
    }
}
