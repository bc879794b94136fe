//! Voucher aggregate and related types.

mod aggregate;
mod events;
mod service;

pub use aggregate::Voucher;
pub use events::{VoucherEvent, VoucherFullyRedeemedData, VoucherIssuedData};
pub use service::VoucherService;

use common::AggregateId;
use thiserror::Error;

use crate::error::ServiceError;
use crate::values::EstateId;

/// Derives the voucher stream identity from the originating transaction.
///
/// One sale transaction produces at most one voucher, so the voucher for a
/// transaction is always addressable without a lookup table.
pub fn voucher_aggregate_id(estate_id: EstateId, transaction_id: AggregateId) -> AggregateId {
    AggregateId::derive("voucher", &format!("{estate_id}/{transaction_id}"))
}

/// Errors that can occur during voucher operations.
#[derive(Debug, Error)]
pub enum VoucherError {
    /// The voucher has already been issued.
    #[error("Voucher already issued")]
    AlreadyIssued,

    /// No voucher exists on this stream.
    #[error("Voucher not issued")]
    NotIssued,

    /// The voucher has already been fully redeemed.
    #[error("Voucher already redeemed")]
    AlreadyRedeemed,

    /// The voucher value must be positive.
    #[error("Voucher value must be positive")]
    InvalidValue,

    /// The voucher expired before the redemption attempt.
    #[error("Voucher has expired")]
    Expired,
}

impl From<VoucherError> for ServiceError {
    fn from(e: VoucherError) -> Self {
        match e {
            VoucherError::NotIssued => ServiceError::NotFound(e.to_string()),
            other => ServiceError::Invalid(other.to_string()),
        }
    }
}
