//! Float aggregate and related types.

mod aggregate;
mod events;
mod service;

pub use aggregate::Float;
pub use events::{
    FloatCreatedForContractProductData, FloatCreditPurchasedData, FloatDecreasedByTransactionData,
    FloatEvent,
};
pub use service::FloatService;

use common::AggregateId;
use thiserror::Error;

use crate::error::ServiceError;
use crate::values::{ContractId, EstateId, Money, ProductId};

/// Derives the float stream identity for a contract product.
///
/// One float backs one contract product per estate, so the float for a
/// product is always addressable without a lookup table.
pub fn float_aggregate_id(
    estate_id: EstateId,
    contract_id: ContractId,
    product_id: ProductId,
) -> AggregateId {
    AggregateId::derive("float", &format!("{estate_id}/{contract_id}/{product_id}"))
}

/// Errors that can occur during float operations.
#[derive(Debug, Error)]
pub enum FloatError {
    /// The float has already been created.
    #[error("Float already created")]
    AlreadyCreated,

    /// No float exists on this stream.
    #[error("Float not created")]
    NotCreated,

    /// The amount is not strictly positive.
    #[error("Amount must be positive, got {0}")]
    InvalidAmount(Money),

    /// Drawing down more credit than the float holds.
    #[error("Insufficient float credit: {available} available")]
    InsufficientCredit { available: Money },
}

impl From<FloatError> for ServiceError {
    fn from(e: FloatError) -> Self {
        match e {
            FloatError::NotCreated => ServiceError::NotFound(e.to_string()),
            other => ServiceError::Invalid(other.to_string()),
        }
    }
}
