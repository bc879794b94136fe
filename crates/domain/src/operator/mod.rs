//! Operator aggregate and related types.

mod aggregate;
mod events;
mod service;

pub use aggregate::Operator;
pub use events::{OperatorCreatedData, OperatorEvent};
pub use service::OperatorService;

use thiserror::Error;

use crate::error::ServiceError;

/// Errors that can occur during operator operations.
#[derive(Debug, Error)]
pub enum OperatorError {
    /// The operator has already been created.
    #[error("Operator already created")]
    AlreadyCreated,

    /// No operator exists on this stream.
    #[error("Operator not created")]
    NotCreated,

    /// The operator name is missing.
    #[error("Operator name must not be empty")]
    NameRequired,
}

impl From<OperatorError> for ServiceError {
    fn from(e: OperatorError) -> Self {
        match e {
            OperatorError::NotCreated => ServiceError::NotFound(e.to_string()),
            other => ServiceError::Invalid(other.to_string()),
        }
    }
}
