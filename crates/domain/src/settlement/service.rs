//! Settlement command service.

use chrono::NaiveDate;
use event_store::EventStore;

use crate::aggregate::Aggregate;
use crate::error::ServiceError;
use crate::repository::{AggregateRepository, CommandOutcome};
use crate::values::{EstateId, FeeId, MerchantId};

use super::{Settlement, SettlementFee, settlement_aggregate_id};

/// Command handlers for the settlement aggregate.
///
/// All operations address the stream derived from
/// `(settlement_date, merchant_id, estate_id)`.
pub struct SettlementService<S: EventStore> {
    repository: AggregateRepository<S, Settlement>,
}

impl<S: EventStore> SettlementService<S> {
    /// Creates a new settlement service over the given event store.
    pub fn new(store: S) -> Self {
        Self {
            repository: AggregateRepository::new(store),
        }
    }

    /// Records a merchant fee as pending settlement, creating the
    /// settlement stream on first use.
    #[tracing::instrument(skip(self, fee), fields(%merchant_id, %settlement_date))]
    pub async fn add_fee_pending_settlement(
        &self,
        estate_id: EstateId,
        merchant_id: MerchantId,
        settlement_date: NaiveDate,
        fee: SettlementFee,
    ) -> Result<CommandOutcome<Settlement>, ServiceError> {
        let settlement_id = settlement_aggregate_id(settlement_date, merchant_id, estate_id);

        self.repository
            .execute(settlement_id, |settlement| {
                let mut events = Vec::new();
                let mut scratch = settlement.clone();

                if !scratch.is_created() {
                    let created =
                        scratch.create(settlement_id, estate_id, merchant_id, settlement_date)?;
                    for event in created {
                        scratch.apply(event.clone());
                        events.push(event);
                    }
                }

                events.extend(scratch.add_fee_pending_settlement(fee)?);
                Ok(events)
            })
            .await
    }

    /// Settles a single pending fee.
    #[tracing::instrument(skip(self), fields(%merchant_id, %settlement_date))]
    pub async fn mark_fee_settled(
        &self,
        estate_id: EstateId,
        merchant_id: MerchantId,
        settlement_date: NaiveDate,
        transaction_id: common::AggregateId,
        fee_id: FeeId,
    ) -> Result<CommandOutcome<Settlement>, ServiceError> {
        let settlement_id = settlement_aggregate_id(settlement_date, merchant_id, estate_id);

        self.repository
            .execute(settlement_id, |settlement| {
                settlement.mark_fee_settled(transaction_id, fee_id)
            })
            .await
    }

    /// Processes a merchant's settlement for a date: settles every pending
    /// fee and completes the settlement.
    #[tracing::instrument(skip(self), fields(%merchant_id, %settlement_date))]
    pub async fn process_settlement(
        &self,
        estate_id: EstateId,
        merchant_id: MerchantId,
        settlement_date: NaiveDate,
    ) -> Result<CommandOutcome<Settlement>, ServiceError> {
        metrics::counter!("settlements_processed_total").increment(1);
        let settlement_id = settlement_aggregate_id(settlement_date, merchant_id, estate_id);

        self.repository
            .execute(settlement_id, |settlement| settlement.process())
            .await
    }

    /// Returns the live settlement state for a merchant/date by replaying
    /// the stream.
    ///
    /// This is the strongly consistent read for in-flight settlements; the
    /// read model serves historical queries and may lag the stream.
    pub async fn pending_settlement(
        &self,
        estate_id: EstateId,
        merchant_id: MerchantId,
        settlement_date: NaiveDate,
    ) -> Result<Settlement, ServiceError> {
        let settlement_id = settlement_aggregate_id(settlement_date, merchant_id, estate_id);
        self.repository.load(settlement_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settlement::SettlementState;
    use common::AggregateId;
    use event_store::InMemoryEventStore;
    use rust_decimal_macros::dec;

    use crate::values::Money;

    fn service() -> SettlementService<InMemoryEventStore> {
        SettlementService::new(InMemoryEventStore::new())
    }

    fn fee() -> SettlementFee {
        SettlementFee {
            transaction_id: AggregateId::new(),
            fee_id: FeeId::new(),
            fee_value: dec!(0.5),
            calculated_value: Money::new(dec!(0.05)),
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[tokio::test]
    async fn first_fee_creates_the_settlement() {
        let service = service();
        let estate_id = EstateId::new();
        let merchant_id = MerchantId::new();

        let outcome = service
            .add_fee_pending_settlement(estate_id, merchant_id, date(), fee())
            .await
            .unwrap();

        // SettlementCreated + MerchantFeeAddedPendingSettlement
        assert_eq!(outcome.events.len(), 2);
        assert_eq!(outcome.aggregate.state(), SettlementState::HasPendingFees);
    }

    #[tokio::test]
    async fn subsequent_fees_reuse_the_stream() {
        let service = service();
        let estate_id = EstateId::new();
        let merchant_id = MerchantId::new();

        service
            .add_fee_pending_settlement(estate_id, merchant_id, date(), fee())
            .await
            .unwrap();
        let outcome = service
            .add_fee_pending_settlement(estate_id, merchant_id, date(), fee())
            .await
            .unwrap();

        assert_eq!(outcome.events.len(), 1);
        assert_eq!(outcome.aggregate.pending_fees().len(), 2);
    }

    #[tokio::test]
    async fn process_settlement_end_to_end() {
        let service = service();
        let estate_id = EstateId::new();
        let merchant_id = MerchantId::new();

        service
            .add_fee_pending_settlement(estate_id, merchant_id, date(), fee())
            .await
            .unwrap();
        service
            .add_fee_pending_settlement(estate_id, merchant_id, date(), fee())
            .await
            .unwrap();

        let outcome = service
            .process_settlement(estate_id, merchant_id, date())
            .await
            .unwrap();

        assert_eq!(outcome.aggregate.state(), SettlementState::Completed);
        assert_eq!(outcome.aggregate.settled_amount(), Money::new(dec!(0.10)));
    }

    #[tokio::test]
    async fn process_missing_settlement_is_not_found() {
        let service = service();
        let result = service
            .process_settlement(EstateId::new(), MerchantId::new(), date())
            .await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn pending_settlement_replays_live_state() {
        let service = service();
        let estate_id = EstateId::new();
        let merchant_id = MerchantId::new();

        let pending = service
            .pending_settlement(estate_id, merchant_id, date())
            .await
            .unwrap();
        assert_eq!(pending.state(), SettlementState::NotCreated);

        service
            .add_fee_pending_settlement(estate_id, merchant_id, date(), fee())
            .await
            .unwrap();

        let pending = service
            .pending_settlement(estate_id, merchant_id, date())
            .await
            .unwrap();
        assert_eq!(pending.pending_fees().len(), 1);
    }
}
