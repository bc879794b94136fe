//! Estate aggregate and related types.

mod aggregate;
mod events;
mod service;

pub use aggregate::Estate;
pub use events::{EstateCreatedData, EstateEvent, OperatorAddedToEstateData};
pub use service::EstateService;

use thiserror::Error;

use crate::error::ServiceError;
use crate::values::OperatorId;

/// Errors that can occur during estate operations.
#[derive(Debug, Error)]
pub enum EstateError {
    /// The estate has already been created.
    #[error("Estate already created")]
    AlreadyCreated,

    /// No estate exists on this stream.
    #[error("Estate not created")]
    NotCreated,

    /// The estate name is missing.
    #[error("Estate name must not be empty")]
    NameRequired,

    /// The operator has already been added to this estate.
    #[error("Operator {0} already added to estate")]
    OperatorAlreadyAdded(OperatorId),
}

impl From<EstateError> for ServiceError {
    fn from(e: EstateError) -> Self {
        match e {
            EstateError::NotCreated => ServiceError::NotFound(e.to_string()),
            other => ServiceError::Invalid(other.to_string()),
        }
    }
}
