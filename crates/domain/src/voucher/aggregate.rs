//! Voucher aggregate implementation.

use chrono::{DateTime, Utc};
use common::AggregateId;
use event_store::Version;
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;
use crate::values::{EstateId, Money};

use super::{
    VoucherError,
    events::{VoucherEvent, VoucherFullyRedeemedData, VoucherIssuedData},
};

/// Voucher aggregate root.
///
/// A voucher is issued against an authorised sale and later redeemed in
/// full; partial redemption does not exist.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Voucher {
    id: Option<AggregateId>,

    #[serde(default)]
    version: Version,

    estate_id: Option<EstateId>,
    transaction_id: Option<AggregateId>,
    value: Money,
    voucher_code: String,
    expiry_date: Option<DateTime<Utc>>,
    redeemed: bool,
}

impl Aggregate for Voucher {
    type Event = VoucherEvent;
    type Error = VoucherError;

    fn aggregate_type() -> &'static str {
        "Voucher"
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
            VoucherEvent::VoucherIssued(data) => {
                self.id = Some(data.voucher_id);
                self.estate_id = Some(data.estate_id);
                self.transaction_id = Some(data.transaction_id);
                self.value = data.value;
                self.voucher_code = data.voucher_code;
                self.expiry_date = Some(data.expiry_date);
            }
            VoucherEvent::VoucherFullyRedeemed(_) => {
                self.redeemed = true;
            }
        }
    }
}

// Query methods
impl Voucher {
    /// Returns the voucher's face value.
    pub fn value(&self) -> Money {
        self.value
    }

    /// Returns the printed redemption code.
    pub fn voucher_code(&self) -> &str {
        &self.voucher_code
    }

    /// Returns true once the voucher has been redeemed.
    pub fn is_redeemed(&self) -> bool {
        self.redeemed
    }

    /// Returns the originating sale transaction.
    pub fn transaction_id(&self) -> Option<AggregateId> {
        self.transaction_id
    }
}

// Command methods (return events)
impl Voucher {
    /// Issues the voucher for an authorised sale.
    pub fn issue(
        &self,
        voucher_id: AggregateId,
        estate_id: EstateId,
        transaction_id: AggregateId,
        value: Money,
        expiry_date: DateTime<Utc>,
    ) -> Result<Vec<VoucherEvent>, VoucherError> {
        if self.id.is_some() {
            return Err(VoucherError::AlreadyIssued);
        }

        if !value.is_positive() {
            return Err(VoucherError::InvalidValue);
        }

        // Redemption code derives from the voucher identity, so reissuing
        // the same voucher would print the same code.
        let voucher_code = voucher_id.as_uuid().simple().to_string()[..10]
            .to_uppercase();

        Ok(vec![VoucherEvent::VoucherIssued(VoucherIssuedData {
            voucher_id,
            estate_id,
            transaction_id,
            value,
            voucher_code,
            issued_at: Utc::now(),
            expiry_date,
        })])
    }

    /// Redeems the voucher's full value.
    pub fn redeem(&self, redeemed_at: DateTime<Utc>) -> Result<Vec<VoucherEvent>, VoucherError> {
        let estate_id = self.estate_id.ok_or(VoucherError::NotIssued)?;

        if self.redeemed {
            return Err(VoucherError::AlreadyRedeemed);
        }

        if let Some(expiry) = self.expiry_date
            && redeemed_at > expiry
        {
            return Err(VoucherError::Expired);
        }

        Ok(vec![VoucherEvent::VoucherFullyRedeemed(
            VoucherFullyRedeemedData {
                estate_id,
                redeemed_at,
            },
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voucher::voucher_aggregate_id;
    use rust_decimal_macros::dec;

    fn issued_voucher() -> Voucher {
        let mut voucher = Voucher::default();
        let estate_id = EstateId::new();
        let transaction_id = AggregateId::new();
        let voucher_id = voucher_aggregate_id(estate_id, transaction_id);

        let events = voucher
            .issue(
                voucher_id,
                estate_id,
                transaction_id,
                Money::new(dec!(50.00)),
                Utc::now() + chrono::Duration::days(30),
            )
            .unwrap();
        voucher.apply_events(events);
        voucher
    }

    #[test]
    fn issue_voucher() {
        let voucher = issued_voucher();
        assert!(voucher.is_created());
        assert_eq!(voucher.value(), Money::new(dec!(50.00)));
        assert_eq!(voucher.voucher_code().len(), 10);
        assert!(!voucher.is_redeemed());
    }

    #[test]
    fn issue_twice_fails() {
        let voucher = issued_voucher();
        let result = voucher.issue(
            AggregateId::new(),
            EstateId::new(),
            AggregateId::new(),
            Money::new(dec!(10.00)),
            Utc::now(),
        );
        assert!(matches!(result, Err(VoucherError::AlreadyIssued)));
    }

    #[test]
    fn zero_value_fails() {
        let voucher = Voucher::default();
        let result = voucher.issue(
            AggregateId::new(),
            EstateId::new(),
            AggregateId::new(),
            Money::zero(),
            Utc::now(),
        );
        assert!(matches!(result, Err(VoucherError::InvalidValue)));
    }

    #[test]
    fn redeem_once() {
        let mut voucher = issued_voucher();
        voucher.apply_events(voucher.redeem(Utc::now()).unwrap());
        assert!(voucher.is_redeemed());

        let result = voucher.redeem(Utc::now());
        assert!(matches!(result, Err(VoucherError::AlreadyRedeemed)));
    }

    #[test]
    fn expired_voucher_cannot_redeem() {
        let voucher = issued_voucher();
        let result = voucher.redeem(Utc::now() + chrono::Duration::days(60));
        assert!(matches!(result, Err(VoucherError::Expired)));
    }

    #[test]
    fn redeem_missing_voucher_fails() {
        let voucher = Voucher::default();
        let result = voucher.redeem(Utc::now());
        assert!(matches!(result, Err(VoucherError::NotIssued)));
    }
}
