//! Transaction aggregate and related types.

mod additional_data;
mod aggregate;
mod events;
mod service;

pub use additional_data::{REQUEST_FIELD_MAPPINGS, RequestFieldMapping, validate_request_field_table};
pub use aggregate::{Transaction, TransactionOutcome, TransactionState, TransactionType};
pub use events::{
    AdditionalRequestDataRecordedData, ProductDetailsAddedData, TransactionCompletedData,
    TransactionDeclinedData, TransactionEvent, TransactionHasStartedData,
    TransactionLocallyAuthorisedData,
};
pub use service::TransactionService;

use thiserror::Error;

use crate::error::ServiceError;

/// Errors that can occur during transaction operations.
#[derive(Debug, Error)]
pub enum TransactionError {
    /// The transaction has already been started.
    #[error("Transaction already started")]
    AlreadyStarted,

    /// No transaction has been started on this stream.
    #[error("Transaction not started")]
    NotStarted,

    /// The transaction has already been completed.
    #[error("Transaction already completed")]
    AlreadyCompleted,

    /// Additional request data has already been recorded.
    #[error("Additional request data already recorded")]
    AdditionalDataAlreadyRecorded,

    /// A request data field is not in the allow-listed table.
    #[error("Unknown request data field: {0}")]
    UnknownRequestField(String),

    /// A required field is missing or malformed.
    #[error("Invalid {field}: {reason}")]
    InvalidField {
        field: &'static str,
        reason: &'static str,
    },

    /// Product details have already been added.
    #[error("Product details already added")]
    ProductAlreadyAssigned,

    /// Sale transactions require product details before authorisation.
    #[error("Product details required before authorisation")]
    ProductRequired,

    /// Only sale transactions carry product details.
    #[error("Transaction type {0} does not carry product details")]
    ProductNotApplicable(TransactionType),

    /// The transaction has already been authorised or declined.
    #[error("Transaction already authorised or declined")]
    AlreadyResolved,

    /// Completion requires an authorisation or decline first.
    #[error("Transaction has not been authorised or declined")]
    NotResolved,
}

impl From<TransactionError> for ServiceError {
    fn from(e: TransactionError) -> Self {
        match e {
            TransactionError::NotStarted => ServiceError::NotFound(e.to_string()),
            other => ServiceError::Invalid(other.to_string()),
        }
    }
}
