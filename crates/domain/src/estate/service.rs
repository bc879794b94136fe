//! Estate command service.

use common::AggregateId;
use event_store::EventStore;

use crate::error::ServiceError;
use crate::repository::{AggregateRepository, CommandOutcome};
use crate::values::{EstateId, OperatorId};

use super::Estate;

/// Command handlers for the estate aggregate.
pub struct EstateService<S: EventStore> {
    repository: AggregateRepository<S, Estate>,
}

impl<S: EventStore> EstateService<S> {
    /// Creates a new estate service over the given event store.
    pub fn new(store: S) -> Self {
        Self {
            repository: AggregateRepository::new(store),
        }
    }

    /// Creates an estate.
    #[tracing::instrument(skip(self), fields(%estate_id))]
    pub async fn create_estate(
        &self,
        estate_id: EstateId,
        estate_name: String,
    ) -> Result<CommandOutcome<Estate>, ServiceError> {
        self.repository
            .execute(AggregateId::from_uuid(estate_id.as_uuid()), |estate| {
                estate.create(estate_id, estate_name)
            })
            .await
    }

    /// Adds an operator to an estate.
    #[tracing::instrument(skip(self), fields(%estate_id, %operator_id))]
    pub async fn add_operator_to_estate(
        &self,
        estate_id: EstateId,
        operator_id: OperatorId,
    ) -> Result<CommandOutcome<Estate>, ServiceError> {
        self.repository
            .execute(AggregateId::from_uuid(estate_id.as_uuid()), |estate| {
                estate.add_operator(operator_id)
            })
            .await
    }

    /// Loads an estate, mapping the not-created sentinel to `None`.
    pub async fn get_estate(&self, estate_id: EstateId) -> Result<Option<Estate>, ServiceError> {
        self.repository
            .load_existing(AggregateId::from_uuid(estate_id.as_uuid()))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use event_store::InMemoryEventStore;

    #[tokio::test]
    async fn create_add_operator_reload() {
        let service = EstateService::new(InMemoryEventStore::new());
        let estate_id = EstateId::new();
        let operator_id = OperatorId::new();

        service
            .create_estate(estate_id, "Demo Estate".to_string())
            .await
            .unwrap();
        service
            .add_operator_to_estate(estate_id, operator_id)
            .await
            .unwrap();

        let estate = service.get_estate(estate_id).await.unwrap().unwrap();
        assert_eq!(estate.operators(), &[operator_id]);
    }

    #[tokio::test]
    async fn missing_estate_is_none() {
        let service = EstateService::new(InMemoryEventStore::new());
        let result = service.get_estate(EstateId::new()).await.unwrap();
        assert!(result.is_none());
    }
}
