//! Value objects shared across the domain: money and identifier newtypes.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Monetary amount backed by a fixed-point decimal.
///
/// All balance and fee arithmetic goes through this type; floating point is
/// not permitted anywhere in monetary calculations.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Creates a money amount from a decimal value.
    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Creates a money amount from a whole number of currency units.
    pub fn from_major(units: i64) -> Self {
        Self(Decimal::from(units))
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Returns the underlying decimal amount.
    pub fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns true if the amount is strictly positive.
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Rounds to 2 decimal places, half-up (midpoint away from zero).
    pub fn round_currency(&self) -> Money {
        Self(self.0.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Self::Output {
        Money(self.0 - rhs.0)
    }
}

impl std::ops::Neg for Money {
    type Output = Money;

    fn neg(self) -> Self::Output {
        Money(-self.0)
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl std::ops::SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID.
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

uuid_id! {
    /// Unique identifier for an estate (the top-level tenant).
    EstateId
}

uuid_id! {
    /// Unique identifier for a merchant within an estate.
    MerchantId
}

uuid_id! {
    /// Unique identifier for an operator (product supplier).
    OperatorId
}

uuid_id! {
    /// Unique identifier for a contract between an estate and an operator.
    ContractId
}

uuid_id! {
    /// Unique identifier for a product sold under a contract.
    ProductId
}

uuid_id! {
    /// Unique identifier for a configured transaction fee.
    FeeId
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn money_arithmetic() {
        let a = Money::new(dec!(10.50));
        let b = Money::new(dec!(0.25));

        assert_eq!((a + b).amount(), dec!(10.75));
        assert_eq!((a - b).amount(), dec!(10.25));
        assert_eq!((-b).amount(), dec!(-0.25));
    }

    #[test]
    fn money_sign_checks() {
        assert!(Money::new(dec!(0.01)).is_positive());
        assert!(Money::zero().is_zero());
        assert!(Money::new(dec!(-3)).is_negative());
    }

    #[test]
    fn money_rounds_half_up_to_two_places() {
        assert_eq!(Money::new(dec!(1.005)).round_currency().amount(), dec!(1.01));
        assert_eq!(Money::new(dec!(1.004)).round_currency().amount(), dec!(1.00));
        assert_eq!(
            Money::new(dec!(-1.005)).round_currency().amount(),
            dec!(-1.01)
        );
    }

    #[test]
    fn money_display_two_places() {
        assert_eq!(Money::new(dec!(7)).to_string(), "7.00");
        assert_eq!(Money::new(dec!(12.3)).to_string(), "12.30");
    }

    #[test]
    fn money_assign_ops() {
        let mut balance = Money::from_major(100);
        balance += Money::new(dec!(25.50));
        balance -= Money::new(dec!(0.50));
        assert_eq!(balance.amount(), dec!(125.00));
    }

    #[test]
    fn ids_are_distinct_types_with_unique_values() {
        let e1 = EstateId::new();
        let e2 = EstateId::new();
        assert_ne!(e1, e2);

        let uuid = Uuid::new_v4();
        assert_eq!(MerchantId::from_uuid(uuid).as_uuid(), uuid);
    }

    #[test]
    fn money_serialization_is_transparent() {
        let money = Money::new(dec!(19.99));
        let json = serde_json::to_string(&money).unwrap();
        assert_eq!(json, "\"19.99\"");
        let decoded: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, money);
    }
}
