//! Settlement aggregate implementation.

use chrono::{NaiveDate, Utc};
use common::AggregateId;
use event_store::Version;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;
use crate::values::{EstateId, FeeId, MerchantId, Money};

use super::{
    SettlementError,
    events::{
        MerchantFeeAddedPendingSettlementData, MerchantFeeSettledData, SettlementCompletedData,
        SettlementCreatedData, SettlementEvent, SettlementProcessingStartedData,
    },
};

/// A fee tracked by a settlement, identified by `(transaction_id, fee_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementFee {
    /// Transaction the fee was calculated for.
    pub transaction_id: AggregateId,

    /// The configured fee this came from.
    pub fee_id: FeeId,

    /// The configured fee value.
    pub fee_value: Decimal,

    /// The calculated monetary value.
    pub calculated_value: Money,
}

/// Observable lifecycle state, derived from the applied events.
///
/// ```text
/// NotCreated ──► Created ──► HasPendingFees ──► Processing ──► Completed
/// ```
///
/// Transitions are monotonic: a fee moves pending to settled only inside a
/// settlement that has not completed; completing requires zero pending fees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementState {
    NotCreated,
    Created,
    HasPendingFees,
    Processing,
    Completed,
}

/// Settlement aggregate root.
///
/// Tracks the merchant fees pending and settled for one merchant on one
/// settlement date.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settlement {
    id: Option<AggregateId>,

    #[serde(default)]
    version: Version,

    estate_id: Option<EstateId>,
    merchant_id: Option<MerchantId>,
    settlement_date: Option<NaiveDate>,
    pending_fees: Vec<SettlementFee>,
    settled_fees: Vec<SettlementFee>,
    processing_started: bool,
    complete: bool,
}

impl Aggregate for Settlement {
    type Event = SettlementEvent;
    type Error = SettlementError;

    fn aggregate_type() -> &'static str {
        "Settlement"
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
            SettlementEvent::SettlementCreated(data) => {
                self.id = Some(data.settlement_id);
                self.estate_id = Some(data.estate_id);
                self.merchant_id = Some(data.merchant_id);
                self.settlement_date = Some(data.settlement_date);
            }
            SettlementEvent::MerchantFeeAddedPendingSettlement(data) => {
                self.pending_fees.push(SettlementFee {
                    transaction_id: data.transaction_id,
                    fee_id: data.fee_id,
                    fee_value: data.fee_value,
                    calculated_value: data.calculated_value,
                });
            }
            SettlementEvent::MerchantFeeSettled(data) => {
                if let Some(index) = self.pending_fees.iter().position(|f| {
                    f.transaction_id == data.transaction_id && f.fee_id == data.fee_id
                }) {
                    let fee = self.pending_fees.remove(index);
                    self.settled_fees.push(fee);
                }
            }
            SettlementEvent::SettlementProcessingStarted(_) => {
                self.processing_started = true;
            }
            SettlementEvent::SettlementCompleted(_) => {
                self.complete = true;
            }
        }
    }
}

// Query methods
impl Settlement {
    /// Returns the estate the merchant belongs to.
    pub fn estate_id(&self) -> Option<EstateId> {
        self.estate_id
    }

    /// Returns the merchant being settled.
    pub fn merchant_id(&self) -> Option<MerchantId> {
        self.merchant_id
    }

    /// Returns the date this settlement covers.
    pub fn settlement_date(&self) -> Option<NaiveDate> {
        self.settlement_date
    }

    /// Returns the fees still pending settlement.
    pub fn pending_fees(&self) -> &[SettlementFee] {
        &self.pending_fees
    }

    /// Returns the fees settled so far.
    pub fn settled_fees(&self) -> &[SettlementFee] {
        &self.settled_fees
    }

    /// Returns true once the settlement has completed.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Returns the total value of settled fees.
    pub fn settled_amount(&self) -> Money {
        self.settled_fees
            .iter()
            .fold(Money::zero(), |acc, f| acc + f.calculated_value)
    }

    /// Returns the derived lifecycle state.
    pub fn state(&self) -> SettlementState {
        if self.id.is_none() {
            return SettlementState::NotCreated;
        }
        if self.complete {
            return SettlementState::Completed;
        }
        if self.processing_started {
            return SettlementState::Processing;
        }
        if self.pending_fees.is_empty() {
            SettlementState::Created
        } else {
            SettlementState::HasPendingFees
        }
    }
}

// Command methods (return events)
impl Settlement {
    /// Creates the settlement stream for a merchant/date.
    pub fn create(
        &self,
        settlement_id: AggregateId,
        estate_id: EstateId,
        merchant_id: MerchantId,
        settlement_date: NaiveDate,
    ) -> Result<Vec<SettlementEvent>, SettlementError> {
        if self.id.is_some() {
            return Err(SettlementError::AlreadyCreated);
        }

        Ok(vec![SettlementEvent::SettlementCreated(
            SettlementCreatedData {
                settlement_id,
                estate_id,
                merchant_id,
                settlement_date,
            },
        )])
    }

    /// Records a merchant fee as pending settlement.
    pub fn add_fee_pending_settlement(
        &self,
        fee: SettlementFee,
    ) -> Result<Vec<SettlementEvent>, SettlementError> {
        let (estate_id, merchant_id) = self.require_created()?;
        self.require_open()?;

        let duplicate = self
            .pending_fees
            .iter()
            .chain(self.settled_fees.iter())
            .any(|f| f.transaction_id == fee.transaction_id && f.fee_id == fee.fee_id);
        if duplicate {
            return Err(SettlementError::DuplicateFee {
                transaction_id: fee.transaction_id,
                fee_id: fee.fee_id,
            });
        }

        Ok(vec![SettlementEvent::MerchantFeeAddedPendingSettlement(
            MerchantFeeAddedPendingSettlementData {
                estate_id,
                merchant_id,
                transaction_id: fee.transaction_id,
                fee_id: fee.fee_id,
                fee_value: fee.fee_value,
                calculated_value: fee.calculated_value,
            },
        )])
    }

    /// Settles a single pending fee.
    pub fn mark_fee_settled(
        &self,
        transaction_id: AggregateId,
        fee_id: FeeId,
    ) -> Result<Vec<SettlementEvent>, SettlementError> {
        let (estate_id, merchant_id) = self.require_created()?;
        self.require_open()?;

        let fee = self
            .pending_fees
            .iter()
            .find(|f| f.transaction_id == transaction_id && f.fee_id == fee_id)
            .ok_or(SettlementError::FeeNotPending {
                transaction_id,
                fee_id,
            })?;

        Ok(vec![SettlementEvent::MerchantFeeSettled(
            MerchantFeeSettledData {
                estate_id,
                merchant_id,
                transaction_id,
                fee_id,
                calculated_value: fee.calculated_value,
                settled_at: Utc::now(),
            },
        )])
    }

    /// Processes the settlement: settles every pending fee, then completes.
    ///
    /// Emits several causally-dependent events from one command; each is
    /// folded into a scratch copy so later events observe consistent state.
    pub fn process(&self) -> Result<Vec<SettlementEvent>, SettlementError> {
        self.require_created()?;
        self.require_open()?;

        let mut scratch = self.clone();
        let mut events = Vec::new();

        let started = SettlementEvent::SettlementProcessingStarted(
            SettlementProcessingStartedData {
                started_at: Utc::now(),
            },
        );
        scratch.apply(started.clone());
        events.push(started);

        for fee in self.pending_fees.clone() {
            let settled = scratch.mark_fee_settled(fee.transaction_id, fee.fee_id)?;
            for event in settled {
                scratch.apply(event.clone());
                events.push(event);
            }
        }

        let completed = scratch.complete()?;
        events.extend(completed);

        Ok(events)
    }

    /// Completes the settlement. Requires processing to have started and
    /// zero pending fees.
    pub fn complete(&self) -> Result<Vec<SettlementEvent>, SettlementError> {
        self.require_created()?;
        self.require_open()?;

        if !self.processing_started {
            return Err(SettlementError::ProcessingNotStarted);
        }
        if !self.pending_fees.is_empty() {
            return Err(SettlementError::PendingFeesRemain(self.pending_fees.len()));
        }

        Ok(vec![SettlementEvent::SettlementCompleted(
            SettlementCompletedData {
                completed_at: Utc::now(),
                amount_settled: self.settled_amount(),
                settled_fee_count: self.settled_fees.len() as u32,
            },
        )])
    }

    fn require_created(&self) -> Result<(EstateId, MerchantId), SettlementError> {
        match (self.estate_id, self.merchant_id) {
            (Some(estate_id), Some(merchant_id)) => Ok((estate_id, merchant_id)),
            _ => Err(SettlementError::NotCreated),
        }
    }

    fn require_open(&self) -> Result<(), SettlementError> {
        if self.complete {
            return Err(SettlementError::AlreadyComplete);
        }
        Ok(())
    }
}
