//! Contract aggregate and related types.

mod aggregate;
mod events;
mod service;

pub use aggregate::{Contract, ContractFee, ContractProduct};
pub use events::{
    ContractCreatedData, ContractEvent, ContractProductAddedData, TransactionFeeAddedData,
};
pub use service::ContractService;

use thiserror::Error;

use crate::error::ServiceError;
use crate::values::ProductId;

/// Errors that can occur during contract operations.
#[derive(Debug, Error)]
pub enum ContractError {
    /// The contract has already been created.
    #[error("Contract already created")]
    AlreadyCreated,

    /// No contract exists on this stream.
    #[error("Contract not created")]
    NotCreated,

    /// The description is missing.
    #[error("Contract description must not be empty")]
    DescriptionRequired,

    /// The product name is missing.
    #[error("Product name must not be empty")]
    ProductNameRequired,

    /// A fixed-value product needs a positive value.
    #[error("Fixed-value product requires a positive value")]
    InvalidProductValue,

    /// The product has already been added to this contract.
    #[error("Product already added: {0}")]
    DuplicateProduct(String),

    /// The referenced product is not on this contract.
    #[error("Product {0} not found on contract")]
    ProductNotFound(ProductId),

    /// The fee value must be positive.
    #[error("Fee value must be positive")]
    InvalidFeeValue,
}

impl From<ContractError> for ServiceError {
    fn from(e: ContractError) -> Self {
        match e {
            ContractError::NotCreated => ServiceError::NotFound(e.to_string()),
            ContractError::ProductNotFound(_) => ServiceError::NotFound(e.to_string()),
            other => ServiceError::Invalid(other.to_string()),
        }
    }
}
