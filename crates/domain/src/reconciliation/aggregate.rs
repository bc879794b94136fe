//! Reconciliation aggregate implementation.

use chrono::Utc;
use common::AggregateId;
use event_store::Version;
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;
use crate::values::{EstateId, MerchantId, Money};

use super::{
    ReconciliationError,
    events::{
        OverallTotalsRecordedData, ReconciliationCompletedData, ReconciliationEvent,
        ReconciliationStartedData,
    },
};

/// Reconciliation aggregate root.
///
/// Tracks one device's end-of-day totals reconciliation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Reconciliation {
    id: Option<AggregateId>,

    #[serde(default)]
    version: Version,

    estate_id: Option<EstateId>,
    merchant_id: Option<MerchantId>,
    device_identifier: String,
    transaction_count: Option<u32>,
    transaction_value: Option<Money>,
    completed: bool,
}

impl Aggregate for Reconciliation {
    type Event = ReconciliationEvent;
    type Error = ReconciliationError;

    fn aggregate_type() -> &'static str {
        "Reconciliation"
    }

    fn id(&self) -> Option<AggregateId> {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            ReconciliationEvent::ReconciliationHasStarted(data) => {
                self.id = Some(data.reconciliation_id);
                self.estate_id = Some(data.estate_id);
                self.merchant_id = Some(data.merchant_id);
                self.device_identifier = data.device_identifier;
            }
            ReconciliationEvent::OverallTotalsRecorded(data) => {
                self.transaction_count = Some(data.transaction_count);
                self.transaction_value = Some(data.transaction_value);
            }
            ReconciliationEvent::ReconciliationHasBeenCompleted(_) => {
                self.completed = true;
            }
        }
    }
}

// Query methods
impl Reconciliation {
    /// Returns the recorded totals, if any.
    pub fn totals(&self) -> Option<(u32, Money)> {
        self.transaction_count.zip(self.transaction_value)
    }

    /// Returns true once the reconciliation has completed.
    pub fn is_completed(&self) -> bool {
        self.completed
    }
}

// Command methods (return events)
impl Reconciliation {
    /// Starts the reconciliation.
    pub fn start(
        &self,
        reconciliation_id: AggregateId,
        estate_id: EstateId,
        merchant_id: MerchantId,
        device_identifier: impl Into<String>,
    ) -> Result<Vec<ReconciliationEvent>, ReconciliationError> {
        if self.id.is_some() {
            return Err(ReconciliationError::AlreadyStarted);
        }

        Ok(vec![ReconciliationEvent::ReconciliationHasStarted(
            ReconciliationStartedData {
                reconciliation_id,
                estate_id,
                merchant_id,
                device_identifier: device_identifier.into(),
                started_at: Utc::now(),
            },
        )])
    }

    /// Records the device's overall totals.
    pub fn record_overall_totals(
        &self,
        transaction_count: u32,
        transaction_value: Money,
    ) -> Result<Vec<ReconciliationEvent>, ReconciliationError> {
        self.require_started_and_open()?;

        if self.transaction_count.is_some() {
            return Err(ReconciliationError::TotalsAlreadyRecorded);
        }

        Ok(vec![ReconciliationEvent::OverallTotalsRecorded(
            OverallTotalsRecordedData {
                transaction_count,
                transaction_value,
            },
        )])
    }

    /// Completes the reconciliation.
    pub fn complete(&self) -> Result<Vec<ReconciliationEvent>, ReconciliationError> {
        self.require_started_and_open()?;

        if self.transaction_count.is_none() {
            return Err(ReconciliationError::TotalsNotRecorded);
        }

        Ok(vec![ReconciliationEvent::ReconciliationHasBeenCompleted(
            ReconciliationCompletedData {
                completed_at: Utc::now(),
            },
        )])
    }

    fn require_started_and_open(&self) -> Result<(), ReconciliationError> {
        if self.id.is_none() {
            return Err(ReconciliationError::NotStarted);
        }
        if self.completed {
            return Err(ReconciliationError::AlreadyCompleted);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn started() -> Reconciliation {
        let mut reconciliation = Reconciliation::default();
        let events = reconciliation
            .start(
                AggregateId::new(),
                EstateId::new(),
                MerchantId::new(),
                "device-1",
            )
            .unwrap();
        reconciliation.apply_events(events);
        reconciliation
    }

    #[test]
    fn full_lifecycle() {
        let mut reconciliation = started();

        reconciliation.apply_events(
            reconciliation
                .record_overall_totals(42, Money::new(dec!(4200.00)))
                .unwrap(),
        );
        assert_eq!(
            reconciliation.totals(),
            Some((42, Money::new(dec!(4200.00))))
        );

        reconciliation.apply_events(reconciliation.complete().unwrap());
        assert!(reconciliation.is_completed());
    }

    #[test]
    fn complete_requires_totals() {
        let reconciliation = started();
        let result = reconciliation.complete();
        assert!(matches!(
            result,
            Err(ReconciliationError::TotalsNotRecorded)
        ));
    }

    #[test]
    fn totals_recorded_once() {
        let mut reconciliation = started();
        reconciliation.apply_events(
            reconciliation
                .record_overall_totals(1, Money::new(dec!(10.00)))
                .unwrap(),
        );

        let result = reconciliation.record_overall_totals(2, Money::new(dec!(20.00)));
        assert!(matches!(
            result,
            Err(ReconciliationError::TotalsAlreadyRecorded)
        ));
    }

    #[test]
    fn completed_reconciliation_is_closed() {
        let mut reconciliation = started();
        reconciliation.apply_events(
            reconciliation
                .record_overall_totals(1, Money::new(dec!(10.00)))
                .unwrap(),
        );
        reconciliation.apply_events(reconciliation.complete().unwrap());

        let result = reconciliation.record_overall_totals(2, Money::new(dec!(20.00)));
        assert!(matches!(
            result,
            Err(ReconciliationError::AlreadyCompleted)
        ));
    }

    #[test]
    fn start_twice_fails() {
        let reconciliation = started();
        let result = reconciliation.start(
            AggregateId::new(),
            EstateId::new(),
            MerchantId::new(),
            "device-2",
        );
        assert!(matches!(result, Err(ReconciliationError::AlreadyStarted)));
    }
}
