//! Merchant balance projection - running balance per `(estate, merchant)`
//! partition, with an immutable balance history for audit.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dispatcher::{DispatchError, DomainEventHandler, PlatformEvent};
use domain::{EstateId, MerchantEvent, MerchantId, Money, SettlementEvent, TransactionEvent};
use event_store::{EventEnvelope, EventId};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::{ProjectionError, Result};

/// Running balance snapshot for one merchant.
///
/// Mutated only by folding events in partition order; never by queries.
/// Created on the first relevant event, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantBalanceState {
    /// Estate the merchant belongs to.
    pub estate_id: EstateId,

    /// The merchant.
    pub merchant_id: MerchantId,

    /// Current balance.
    pub balance: Money,

    /// Balance available to spend.
    pub available_balance: Money,

    /// Number of deposits folded.
    pub deposit_count: u64,

    /// Number of withdrawals folded.
    pub withdrawal_count: u64,

    /// Number of authorised sales folded.
    pub sale_count: u64,

    /// Number of declined sales observed (no balance movement).
    pub declined_sale_count: u64,

    /// Number of settled fees folded.
    pub fee_count: u64,

    /// Last deposit timestamp.
    pub last_deposit_at: Option<DateTime<Utc>>,

    /// Last withdrawal timestamp.
    pub last_withdrawal_at: Option<DateTime<Utc>>,

    /// Last sale timestamp.
    pub last_sale_at: Option<DateTime<Utc>>,
}

impl MerchantBalanceState {
    /// Zero state for a partition that has seen no events yet.
    pub fn zero(estate_id: EstateId, merchant_id: MerchantId) -> Self {
        Self {
            estate_id,
            merchant_id,
            balance: Money::zero(),
            available_balance: Money::zero(),
            deposit_count: 0,
            withdrawal_count: 0,
            sale_count: 0,
            declined_sale_count: 0,
            fee_count: 0,
            last_deposit_at: None,
            last_withdrawal_at: None,
            last_sale_at: None,
        }
    }
}

/// The kind of operation a balance history entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalanceEntryType {
    Deposit,
    Withdrawal,
    Sale,
    DeclinedSale,
    Fee,
}

/// Immutable audit record of one folded event.
///
/// Exactly one entry exists per causing event; the entry's event id is the
/// duplicate-delivery guard. Entries are never mutated or deleted, so the
/// full balance can be reconstructed independently of the snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceHistoryEntry {
    /// Estate the merchant belongs to.
    pub estate_id: EstateId,

    /// The merchant.
    pub merchant_id: MerchantId,

    /// The committed event that caused this entry.
    pub event_id: EventId,

    /// Business reference (deposit reference, transaction, fee).
    pub reference: String,

    /// The kind of operation.
    pub entry_type: BalanceEntryType,

    /// Unsigned change amount; zero for declined sales.
    pub change_amount: Money,

    /// True for credits, false for debits.
    pub is_credit: bool,

    /// Balance after applying this entry.
    pub balance_after: Money,

    /// When the underlying operation happened.
    pub timestamp: DateTime<Utc>,
}

/// Persistence contract for merchant balance state and history.
#[async_trait]
pub trait MerchantBalanceRepository: Send + Sync {
    /// Loads the partition's state, or `None` if no events folded yet.
    async fn load(
        &self,
        estate_id: EstateId,
        merchant_id: MerchantId,
    ) -> Result<Option<MerchantBalanceState>>;

    /// Replaces the partition's state.
    async fn save(&self, state: MerchantBalanceState) -> Result<()>;

    /// Returns true if a history entry for this event already exists.
    async fn has_history_entry(&self, event_id: EventId) -> Result<bool>;

    /// Appends an immutable history entry.
    async fn append_history(&self, entry: BalanceHistoryEntry) -> Result<()>;

    /// Returns the partition's history, oldest first.
    async fn history(
        &self,
        estate_id: EstateId,
        merchant_id: MerchantId,
    ) -> Result<Vec<BalanceHistoryEntry>>;
}

#[derive(Default)]
struct BalanceStore {
    states: HashMap<(EstateId, MerchantId), MerchantBalanceState>,
    history: Vec<BalanceHistoryEntry>,
    seen_events: HashSet<EventId>,
}

/// In-memory merchant balance repository.
#[derive(Clone, Default)]
pub struct InMemoryMerchantBalanceRepository {
    store: Arc<RwLock<BalanceStore>>,
}

impl InMemoryMerchantBalanceRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MerchantBalanceRepository for InMemoryMerchantBalanceRepository {
    async fn load(
        &self,
        estate_id: EstateId,
        merchant_id: MerchantId,
    ) -> Result<Option<MerchantBalanceState>> {
        let store = self.store.read().await;
        Ok(store.states.get(&(estate_id, merchant_id)).cloned())
    }

    async fn save(&self, state: MerchantBalanceState) -> Result<()> {
        let mut store = self.store.write().await;
        store
            .states
            .insert((state.estate_id, state.merchant_id), state);
        Ok(())
    }

    async fn has_history_entry(&self, event_id: EventId) -> Result<bool> {
        let store = self.store.read().await;
        Ok(store.seen_events.contains(&event_id))
    }

    async fn append_history(&self, entry: BalanceHistoryEntry) -> Result<()> {
        let mut store = self.store.write().await;
        store.seen_events.insert(entry.event_id);
        store.history.push(entry);
        Ok(())
    }

    async fn history(
        &self,
        estate_id: EstateId,
        merchant_id: MerchantId,
    ) -> Result<Vec<BalanceHistoryEntry>> {
        let store = self.store.read().await;
        Ok(store
            .history
            .iter()
            .filter(|e| e.estate_id == estate_id && e.merchant_id == merchant_id)
            .cloned()
            .collect())
    }
}

/// Folds balance-affecting events into [`MerchantBalanceState`].
///
/// Sign convention: deposits credit the balance; withdrawals, authorised
/// sales and settled merchant fees debit it; declined sales leave the
/// balance unchanged but are counted. Runs on the ordered pipeline, so one
/// partition folds sequentially.
pub struct MerchantBalanceProjection<R: MerchantBalanceRepository> {
    repository: R,
}

impl<R: MerchantBalanceRepository> MerchantBalanceProjection<R> {
    /// Creates the projection over the given repository.
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// Returns a reference to the underlying repository.
    pub fn repository(&self) -> &R {
        &self.repository
    }

    async fn fold(&self, event: &PlatformEvent, envelope: &EventEnvelope) -> Result<()> {
        // At-least-once delivery: a redelivered event is a success, not a
        // double count.
        if self.repository.has_history_entry(envelope.event_id).await? {
            metrics::counter!("projection_duplicate_deliveries_total").increment(1);
            return Ok(());
        }

        let delta = match event {
            PlatformEvent::Merchant(MerchantEvent::MerchantDepositMade(data)) => Some(Delta {
                estate_id: data.estate_id,
                merchant_id: data.merchant_id,
                entry_type: BalanceEntryType::Deposit,
                reference: data.reference.clone(),
                amount: data.amount,
                is_credit: true,
                timestamp: data.deposit_date_time,
            }),
            PlatformEvent::Merchant(MerchantEvent::MerchantWithdrawalMade(data)) => Some(Delta {
                estate_id: data.estate_id,
                merchant_id: data.merchant_id,
                entry_type: BalanceEntryType::Withdrawal,
                reference: data.withdrawal_id.to_string(),
                amount: data.amount,
                is_credit: false,
                timestamp: data.withdrawal_date_time,
            }),
            PlatformEvent::Transaction(TransactionEvent::TransactionHasBeenCompleted(data)) => {
                let amount = data.transaction_amount.unwrap_or_else(Money::zero);
                Some(Delta {
                    estate_id: data.estate_id,
                    merchant_id: data.merchant_id,
                    entry_type: if data.is_authorised {
                        BalanceEntryType::Sale
                    } else {
                        BalanceEntryType::DeclinedSale
                    },
                    reference: envelope.aggregate_id.to_string(),
                    amount: if data.is_authorised {
                        amount
                    } else {
                        Money::zero()
                    },
                    is_credit: false,
                    timestamp: data.completed_at,
                })
            }
            PlatformEvent::Settlement(SettlementEvent::MerchantFeeSettled(data)) => Some(Delta {
                estate_id: data.estate_id,
                merchant_id: data.merchant_id,
                entry_type: BalanceEntryType::Fee,
                reference: data.fee_id.to_string(),
                amount: data.calculated_value,
                is_credit: false,
                timestamp: data.settled_at,
            }),
            _ => None,
        };

        let Some(delta) = delta else {
            return Ok(());
        };

        let mut state = self
            .repository
            .load(delta.estate_id, delta.merchant_id)
            .await?
            .unwrap_or_else(|| MerchantBalanceState::zero(delta.estate_id, delta.merchant_id));

        match delta.entry_type {
            BalanceEntryType::Deposit => {
                state.balance += delta.amount;
                state.available_balance += delta.amount;
                state.deposit_count += 1;
                state.last_deposit_at = Some(delta.timestamp);
            }
            BalanceEntryType::Withdrawal => {
                state.balance -= delta.amount;
                state.available_balance -= delta.amount;
                state.withdrawal_count += 1;
                state.last_withdrawal_at = Some(delta.timestamp);
            }
            BalanceEntryType::Sale => {
                state.balance -= delta.amount;
                state.available_balance -= delta.amount;
                state.sale_count += 1;
                state.last_sale_at = Some(delta.timestamp);
            }
            BalanceEntryType::DeclinedSale => {
                state.declined_sale_count += 1;
            }
            BalanceEntryType::Fee => {
                state.balance -= delta.amount;
                state.available_balance -= delta.amount;
                state.fee_count += 1;
            }
        }

        let balance_after = state.balance;
        self.repository.save(state).await?;
        self.repository
            .append_history(BalanceHistoryEntry {
                estate_id: delta.estate_id,
                merchant_id: delta.merchant_id,
                event_id: envelope.event_id,
                reference: delta.reference,
                entry_type: delta.entry_type,
                change_amount: delta.amount,
                is_credit: delta.is_credit,
                balance_after,
                timestamp: delta.timestamp,
            })
            .await?;

        metrics::counter!("projection_balance_events_folded_total").increment(1);
        Ok(())
    }
}

struct Delta {
    estate_id: EstateId,
    merchant_id: MerchantId,
    entry_type: BalanceEntryType,
    reference: String,
    amount: Money,
    is_credit: bool,
    timestamp: DateTime<Utc>,
}

#[async_trait]
impl<R: MerchantBalanceRepository> DomainEventHandler for MerchantBalanceProjection<R> {
    fn name(&self) -> &'static str {
        "merchant-balance"
    }

    async fn handle(
        &self,
        event: &PlatformEvent,
        envelope: &EventEnvelope,
    ) -> Result<(), DispatchError> {
        self.fold(event, envelope)
            .await
            .map_err(|e| DispatchError::Handler {
                handler: "merchant-balance".to_string(),
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::AggregateId;
    use domain::merchant::{DepositSource, MerchantDepositMadeData, MerchantWithdrawalMadeData};
    use domain::transaction::TransactionCompletedData;
    use domain::FeeId;
    use domain::settlement::MerchantFeeSettledData;
    use event_store::Version;
    use rust_decimal_macros::dec;

    fn projection() -> MerchantBalanceProjection<InMemoryMerchantBalanceRepository> {
        MerchantBalanceProjection::new(InMemoryMerchantBalanceRepository::new())
    }

    fn envelope_for(event: &PlatformEvent, aggregate_type: &str, version: i64) -> EventEnvelope {
        let payload = match event {
            PlatformEvent::Merchant(e) => serde_json::to_value(e).unwrap(),
            PlatformEvent::Transaction(e) => serde_json::to_value(e).unwrap(),
            PlatformEvent::Settlement(e) => serde_json::to_value(e).unwrap(),
            _ => serde_json::json!({}),
        };
        EventEnvelope::builder()
            .aggregate_id(AggregateId::new())
            .aggregate_type(aggregate_type)
            .event_type(event.event_type())
            .version(Version::new(version))
            .payload_raw(payload)
            .build()
    }

    fn deposit(estate_id: EstateId, merchant_id: MerchantId, amount: Money) -> PlatformEvent {
        PlatformEvent::Merchant(MerchantEvent::MerchantDepositMade(MerchantDepositMadeData {
            estate_id,
            merchant_id,
            deposit_id: uuid::Uuid::new_v4(),
            reference: "BANK-REF-1".to_string(),
            amount,
            source: DepositSource::Manual,
            deposit_date_time: Utc::now(),
        }))
    }

    fn completed_sale(
        estate_id: EstateId,
        merchant_id: MerchantId,
        amount: Money,
        is_authorised: bool,
    ) -> PlatformEvent {
        PlatformEvent::Transaction(TransactionEvent::TransactionHasBeenCompleted(
            TransactionCompletedData {
                estate_id,
                merchant_id,
                is_authorised,
                response_code: if is_authorised { "0000" } else { "1008" }.to_string(),
                transaction_amount: Some(amount),
                completed_at: Utc::now(),
            },
        ))
    }

    #[tokio::test]
    async fn deposit_credits_balance() {
        let projection = projection();
        let estate_id = EstateId::new();
        let merchant_id = MerchantId::new();

        let event = deposit(estate_id, merchant_id, Money::new(dec!(100.00)));
        let envelope = envelope_for(&event, "Merchant", 2);
        projection.handle(&event, &envelope).await.unwrap();

        let state = projection
            .repository()
            .load(estate_id, merchant_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(state.balance, Money::new(dec!(100.00)));
        assert_eq!(state.deposit_count, 1);
        assert!(state.last_deposit_at.is_some());
    }

    #[tokio::test]
    async fn authorised_sale_debits_balance_with_history() {
        let projection = projection();
        let estate_id = EstateId::new();
        let merchant_id = MerchantId::new();

        let event = deposit(estate_id, merchant_id, Money::new(dec!(100.00)));
        projection
            .handle(&event, &envelope_for(&event, "Merchant", 2))
            .await
            .unwrap();

        let sale = completed_sale(estate_id, merchant_id, Money::new(dec!(10.00)), true);
        projection
            .handle(&sale, &envelope_for(&sale, "Transaction", 4))
            .await
            .unwrap();

        let state = projection
            .repository()
            .load(estate_id, merchant_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(state.balance, Money::new(dec!(90.00)));
        assert_eq!(state.sale_count, 1);

        let history = projection
            .repository()
            .history(estate_id, merchant_id)
            .await
            .unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].entry_type, BalanceEntryType::Sale);
        assert_eq!(history[1].change_amount, Money::new(dec!(10.00)));
        assert!(!history[1].is_credit);
        assert_eq!(history[1].balance_after, Money::new(dec!(90.00)));
    }

    #[tokio::test]
    async fn declined_sale_counts_without_moving_balance() {
        let projection = projection();
        let estate_id = EstateId::new();
        let merchant_id = MerchantId::new();

        let sale = completed_sale(estate_id, merchant_id, Money::new(dec!(10.00)), false);
        projection
            .handle(&sale, &envelope_for(&sale, "Transaction", 4))
            .await
            .unwrap();

        let state = projection
            .repository()
            .load(estate_id, merchant_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(state.balance, Money::zero());
        assert_eq!(state.declined_sale_count, 1);
        assert_eq!(state.sale_count, 0);
    }

    #[tokio::test]
    async fn settled_fee_debits_balance() {
        let projection = projection();
        let estate_id = EstateId::new();
        let merchant_id = MerchantId::new();

        let event = PlatformEvent::Settlement(SettlementEvent::MerchantFeeSettled(
            MerchantFeeSettledData {
                estate_id,
                merchant_id,
                transaction_id: AggregateId::new(),
                fee_id: FeeId::new(),
                calculated_value: Money::new(dec!(0.05)),
                settled_at: Utc::now(),
            },
        ));
        projection
            .handle(&event, &envelope_for(&event, "Settlement", 3))
            .await
            .unwrap();

        let state = projection
            .repository()
            .load(estate_id, merchant_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(state.balance, Money::new(dec!(-0.05)));
        assert_eq!(state.fee_count, 1);
    }

    #[tokio::test]
    async fn duplicate_delivery_does_not_double_count() {
        let projection = projection();
        let estate_id = EstateId::new();
        let merchant_id = MerchantId::new();

        let event = deposit(estate_id, merchant_id, Money::new(dec!(100.00)));
        let envelope = envelope_for(&event, "Merchant", 2);

        projection.handle(&event, &envelope).await.unwrap();
        // Same committed event redelivered
        projection.handle(&event, &envelope).await.unwrap();

        let state = projection
            .repository()
            .load(estate_id, merchant_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(state.balance, Money::new(dec!(100.00)));
        assert_eq!(state.deposit_count, 1);

        let history = projection
            .repository()
            .history(estate_id, merchant_id)
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn withdrawal_debits_balance() {
        let projection = projection();
        let estate_id = EstateId::new();
        let merchant_id = MerchantId::new();

        let event = deposit(estate_id, merchant_id, Money::new(dec!(100.00)));
        projection
            .handle(&event, &envelope_for(&event, "Merchant", 2))
            .await
            .unwrap();

        let withdrawal = PlatformEvent::Merchant(MerchantEvent::MerchantWithdrawalMade(
            MerchantWithdrawalMadeData {
                estate_id,
                merchant_id,
                withdrawal_id: uuid::Uuid::new_v4(),
                amount: Money::new(dec!(40.00)),
                withdrawal_date_time: Utc::now(),
            },
        ));
        projection
            .handle(&withdrawal, &envelope_for(&withdrawal, "Merchant", 3))
            .await
            .unwrap();

        let state = projection
            .repository()
            .load(estate_id, merchant_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(state.balance, Money::new(dec!(60.00)));
        assert_eq!(state.withdrawal_count, 1);
    }

    #[tokio::test]
    async fn irrelevant_events_are_ignored() {
        let projection = projection();
        let event = PlatformEvent::Estate(domain::EstateEvent::EstateCreated(
            domain::estate::EstateCreatedData {
                estate_id: EstateId::new(),
                estate_name: "Demo".to_string(),
                created_at: Utc::now(),
            },
        ));
        let envelope = envelope_for(&event, "Estate", 1);

        let result = projection.handle(&event, &envelope).await;
        assert!(result.is_ok());
    }
}
