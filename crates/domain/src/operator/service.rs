//! Operator command service.

use common::AggregateId;
use event_store::EventStore;

use crate::error::ServiceError;
use crate::repository::{AggregateRepository, CommandOutcome};
use crate::values::{EstateId, OperatorId};

use super::Operator;

/// Command handlers for the operator aggregate.
pub struct OperatorService<S: EventStore> {
    repository: AggregateRepository<S, Operator>,
}

impl<S: EventStore> OperatorService<S> {
    /// Creates a new operator service over the given event store.
    pub fn new(store: S) -> Self {
        Self {
            repository: AggregateRepository::new(store),
        }
    }

    /// Creates an operator.
    #[tracing::instrument(skip(self), fields(%operator_id))]
    pub async fn create_operator(
        &self,
        operator_id: OperatorId,
        estate_id: EstateId,
        name: String,
        require_custom_merchant_number: bool,
        require_custom_terminal_number: bool,
    ) -> Result<CommandOutcome<Operator>, ServiceError> {
        self.repository
            .execute(AggregateId::from_uuid(operator_id.as_uuid()), |operator| {
                operator.create(
                    operator_id,
                    estate_id,
                    name,
                    require_custom_merchant_number,
                    require_custom_terminal_number,
                )
            })
            .await
    }

    /// Loads an operator, mapping the not-created sentinel to `None`.
    pub async fn get_operator(
        &self,
        operator_id: OperatorId,
    ) -> Result<Option<Operator>, ServiceError> {
        self.repository
            .load_existing(AggregateId::from_uuid(operator_id.as_uuid()))
            .await
    }
}
