//! Voucher domain events.

use chrono::{DateTime, Utc};
use common::AggregateId;
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;
use crate::values::{EstateId, Money};

/// Events that can occur on a voucher aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum VoucherEvent {
    /// A voucher was issued for an authorised sale.
    VoucherIssued(VoucherIssuedData),

    /// The voucher's full value was redeemed.
    VoucherFullyRedeemed(VoucherFullyRedeemedData),
}

impl DomainEvent for VoucherEvent {
    fn event_type(&self) -> &'static str {
        match self {
            VoucherEvent::VoucherIssued(_) => "VoucherIssued",
            VoucherEvent::VoucherFullyRedeemed(_) => "VoucherFullyRedeemed",
        }
    }
}

/// Data for VoucherIssued.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoucherIssuedData {
    /// The voucher stream identity.
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
}

/// Data for VoucherFullyRedeemed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoucherFullyRedeemedData {
    /// Estate the voucher was issued under.
    pub estate_id: EstateId,

    /// When the voucher was redeemed.
    pub redeemed_at: DateTime<Utc>,
}
