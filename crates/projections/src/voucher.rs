//! Voucher projection - per-voucher lifecycle state.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::AggregateId;
use dispatcher::{DispatchError, DomainEventHandler, PlatformEvent};
use domain::{EstateId, Money, VoucherEvent};
use event_store::EventEnvelope;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::Result;

/// Queryable state of one voucher, keyed by the voucher stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoucherState {
    /// The voucher stream identity (also the partition key).
    pub voucher_id: AggregateId,

    /// Estate the voucher was issued under.
    pub estate_id: EstateId,

    /// Sale transaction the voucher was issued for.
    pub transaction_id: AggregateId,

    /// Face value.
    pub value: Money,

    /// Printed redemption code.
    pub voucher_code: String,

    /// When the voucher was issued.
    pub issued_at: DateTime<Utc>,

    /// When the voucher expires.
    pub expiry_date: DateTime<Utc>,

    /// Whether the voucher has been redeemed, and when.
    pub redeemed_at: Option<DateTime<Utc>>,
}

impl VoucherState {
    /// Returns true once the voucher has been redeemed.
    pub fn is_redeemed(&self) -> bool {
        self.redeemed_at.is_some()
    }
}

/// Persistence contract for voucher projection state.
#[async_trait]
pub trait VoucherStateRepository: Send + Sync {
    /// Loads a voucher's state by stream identity.
    async fn load(&self, voucher_id: AggregateId) -> Result<Option<VoucherState>>;

    /// Replaces a voucher's state.
    async fn save(&self, state: VoucherState) -> Result<()>;

    /// Finds a voucher by its printed code.
    async fn find_by_code(&self, voucher_code: &str) -> Result<Option<VoucherState>>;
}

/// In-memory voucher state repository.
#[derive(Clone, Default)]
pub struct InMemoryVoucherStateRepository {
    vouchers: Arc<RwLock<HashMap<AggregateId, VoucherState>>>,
}

impl InMemoryVoucherStateRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VoucherStateRepository for InMemoryVoucherStateRepository {
    async fn load(&self, voucher_id: AggregateId) -> Result<Option<VoucherState>> {
        Ok(self.vouchers.read().await.get(&voucher_id).cloned())
    }

    async fn save(&self, state: VoucherState) -> Result<()> {
        self.vouchers.write().await.insert(state.voucher_id, state);
        Ok(())
    }

    async fn find_by_code(&self, voucher_code: &str) -> Result<Option<VoucherState>> {
        Ok(self
            .vouchers
            .read()
            .await
            .values()
            .find(|v| v.voucher_code == voucher_code)
            .cloned())
    }
}

/// Folds voucher events into [`VoucherState`].
///
/// Both folds are set-based, so redelivery is naturally idempotent. Runs
/// on the ordered pipeline because redemption must not fold before issue.
pub struct VoucherProjection<R: VoucherStateRepository> {
    repository: R,
}

impl<R: VoucherStateRepository> VoucherProjection<R> {
    /// Creates the projection over the given repository.
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// Returns a reference to the underlying repository.
    pub fn repository(&self) -> &R {
        &self.repository
    }

    async fn fold(&self, event: &PlatformEvent, envelope: &EventEnvelope) -> Result<()> {
        match event {
            PlatformEvent::Voucher(VoucherEvent::VoucherIssued(data)) => {
                self.repository
                    .save(VoucherState {
                        voucher_id: data.voucher_id,
                        estate_id: data.estate_id,
                        transaction_id: data.transaction_id,
                        value: data.value,
                        voucher_code: data.voucher_code.clone(),
                        issued_at: data.issued_at,
                        expiry_date: data.expiry_date,
                        redeemed_at: None,
                    })
                    .await?;
            }
            PlatformEvent::Voucher(VoucherEvent::VoucherFullyRedeemed(data)) => {
                if let Some(mut state) = self.repository.load(envelope.aggregate_id).await? {
                    if state.redeemed_at.is_none() {
                        state.redeemed_at = Some(data.redeemed_at);
                        self.repository.save(state).await?;
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }
}

#[async_trait]
impl<R: VoucherStateRepository> DomainEventHandler for VoucherProjection<R> {
    fn name(&self) -> &'static str {
        "voucher-state"
    }

    async fn handle(
        &self,
        event: &PlatformEvent,
        envelope: &EventEnvelope,
    ) -> Result<(), DispatchError> {
        self.fold(event, envelope)
            .await
            .map_err(|e| DispatchError::Handler {
                handler: "voucher-state".to_string(),
                message: e.to_string(),
            })
    }
}
