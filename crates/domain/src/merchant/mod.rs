//! Merchant aggregate and related types.

mod aggregate;
mod events;
mod service;

pub use aggregate::Merchant;
pub use events::{
    DepositSource, MerchantCreatedData, MerchantDepositMadeData, MerchantEvent,
    MerchantWithdrawalMadeData,
};
pub use service::MerchantService;

use thiserror::Error;

use crate::error::ServiceError;
use crate::values::Money;

/// Errors that can occur during merchant operations.
#[derive(Debug, Error)]
pub enum MerchantError {
    /// The merchant has already been created.
    #[error("Merchant already created")]
    AlreadyCreated,

    /// No merchant exists on this stream.
    #[error("Merchant not created")]
    NotCreated,

    /// The merchant name is missing.
    #[error("Merchant name must not be empty")]
    NameRequired,

    /// The amount is not strictly positive.
    #[error("Amount must be positive, got {0}")]
    InvalidAmount(Money),

    /// The same deposit has already been recorded.
    #[error("Deposit already recorded: {reference}")]
    DuplicateDeposit { reference: String },

    /// The withdrawal exceeds the funds recorded on the aggregate.
    #[error("Insufficient funds: {available} available")]
    InsufficientFunds { available: Money },
}

impl From<MerchantError> for ServiceError {
    fn from(e: MerchantError) -> Self {
        match e {
            MerchantError::NotCreated => ServiceError::NotFound(e.to_string()),
            other => ServiceError::Invalid(other.to_string()),
        }
    }
}
