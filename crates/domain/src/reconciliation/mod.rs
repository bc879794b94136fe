//! Reconciliation aggregate and related types.

mod aggregate;
mod events;
mod service;

pub use aggregate::Reconciliation;
pub use events::{
    OverallTotalsRecordedData, ReconciliationCompletedData, ReconciliationEvent,
    ReconciliationStartedData,
};
pub use service::ReconciliationService;

use thiserror::Error;

use crate::error::ServiceError;

/// Errors that can occur during reconciliation operations.
#[derive(Debug, Error)]
pub enum ReconciliationError {
    /// The reconciliation has already been started.
    #[error("Reconciliation already started")]
    AlreadyStarted,

    /// No reconciliation exists on this stream.
    #[error("Reconciliation not started")]
    NotStarted,

    /// The reconciliation has already completed.
    #[error("Reconciliation already completed")]
    AlreadyCompleted,

    /// Overall totals have already been recorded.
    #[error("Overall totals already recorded")]
    TotalsAlreadyRecorded,

    /// Completion requires the overall totals first.
    #[error("Overall totals have not been recorded")]
    TotalsNotRecorded,
}

impl From<ReconciliationError> for ServiceError {
    fn from(e: ReconciliationError) -> Self {
        match e {
            ReconciliationError::NotStarted => ServiceError::NotFound(e.to_string()),
            other => ServiceError::Invalid(other.to_string()),
        }
    }
}
