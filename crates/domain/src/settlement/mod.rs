//! Settlement aggregate and related types.

mod aggregate;
mod events;
mod service;

pub use aggregate::{Settlement, SettlementFee, SettlementState};
pub use events::{
    MerchantFeeAddedPendingSettlementData, MerchantFeeSettledData, SettlementCompletedData,
    SettlementCreatedData, SettlementEvent, SettlementProcessingStartedData,
};
pub use service::SettlementService;

use chrono::NaiveDate;
use common::AggregateId;
use thiserror::Error;

use crate::error::ServiceError;
use crate::values::{EstateId, FeeId, MerchantId};

/// Derives the settlement stream identity for a merchant and date.
///
/// Deterministic: repeated settlement operations for the same merchant/date
/// always address the same stream. This derivation is part of the contract
/// between settlement processing and settlement querying.
pub fn settlement_aggregate_id(
    settlement_date: NaiveDate,
    merchant_id: MerchantId,
    estate_id: EstateId,
) -> AggregateId {
    AggregateId::derive(
        "settlement",
        &format!("{settlement_date}/{merchant_id}/{estate_id}"),
    )
}

/// Errors that can occur during settlement operations.
#[derive(Debug, Error)]
pub enum SettlementError {
    /// The settlement has already been created.
    #[error("Settlement already created")]
    AlreadyCreated,

    /// No settlement exists on this stream.
    #[error("Settlement not created")]
    NotCreated,

    /// The settlement has already completed.
    #[error("Settlement already complete")]
    AlreadyComplete,

    /// The fee has already been added to this settlement.
    #[error("Fee {fee_id} for transaction {transaction_id} already added")]
    DuplicateFee {
        transaction_id: AggregateId,
        fee_id: FeeId,
    },

    /// The fee is not pending, so it cannot be settled.
    #[error("Fee {fee_id} for transaction {transaction_id} is not pending settlement")]
    FeeNotPending {
        transaction_id: AggregateId,
        fee_id: FeeId,
    },

    /// Completion requires every pending fee to be settled first.
    #[error("{0} fees are still pending settlement")]
    PendingFeesRemain(usize),

    /// Processing has not been started.
    #[error("Settlement processing has not started")]
    ProcessingNotStarted,
}

impl From<SettlementError> for ServiceError {
    fn from(e: SettlementError) -> Self {
        match e {
            SettlementError::NotCreated => ServiceError::NotFound(e.to_string()),
            other => ServiceError::Invalid(other.to_string()),
        }
    }
}
