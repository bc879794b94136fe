//! Fee calculation engine.
//!
//! Pure functions computing fee amounts from a product's configured fee
//! schedule. No I/O, no side effects; settlement totals depend on this, so
//! the rounding policy is pinned: half-up to 2 decimal places.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::values::{FeeId, Money};

/// How a configured fee value is interpreted.
///
/// These are the only two calculation types; adding a new one requires a
/// new variant and an explicit arm in `calculate_fee_value` (every match is
/// exhaustive, no default fallthrough).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CalculationType {
    /// The value is a percentage of the transaction amount.
    Percentage,

    /// The value is a fixed amount; the transaction amount is ignored.
    Fixed,
}

/// Who the fee is charged to or earned by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeeType {
    /// Fee charged to the merchant.
    Merchant,

    /// Fee earned by the service provider.
    ServiceProvider,
}

/// A configured fee to be calculated against a transaction amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeToCalculate {
    /// The configured fee this came from.
    pub fee_id: FeeId,

    /// How to interpret `value`.
    pub calculation_type: CalculationType,

    /// Who the fee applies to.
    pub fee_type: FeeType,

    /// The configured fee value (percentage points or fixed amount).
    pub value: Decimal,
}

/// The result of calculating one fee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculatedFee {
    /// The configured fee this came from.
    pub fee_id: FeeId,

    /// How the value was interpreted.
    pub calculation_type: CalculationType,

    /// Who the fee applies to.
    pub fee_type: FeeType,

    /// The configured fee value, echoed from the input.
    pub fee_value: Decimal,

    /// The calculated monetary value, rounded half-up to 2 decimal places.
    pub calculated_value: Money,
}

/// Calculates every fee in the list against the transaction amount.
///
/// Each input produces exactly one output, in input order.
pub fn calculate_fees(fees: &[FeeToCalculate], transaction_amount: Money) -> Vec<CalculatedFee> {
    fees.iter()
        .map(|fee| CalculatedFee {
            fee_id: fee.fee_id,
            calculation_type: fee.calculation_type,
            fee_type: fee.fee_type,
            fee_value: fee.value,
            calculated_value: calculate_fee_value(fee, transaction_amount),
        })
        .collect()
}

fn calculate_fee_value(fee: &FeeToCalculate, transaction_amount: Money) -> Money {
    match fee.calculation_type {
        CalculationType::Percentage => {
            Money::new(fee.value / Decimal::from(100) * transaction_amount.amount())
                .round_currency()
        }
        CalculationType::Fixed => Money::new(fee.value).round_currency(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn fee(calculation_type: CalculationType, value: Decimal) -> FeeToCalculate {
        FeeToCalculate {
            fee_id: FeeId::new(),
            calculation_type,
            fee_type: FeeType::Merchant,
            value,
        }
    }

    #[test]
    fn percentage_fee_of_100() {
        let fees = vec![fee(CalculationType::Percentage, dec!(10))];
        let result = calculate_fees(&fees, Money::new(dec!(100.00)));

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].calculated_value, Money::new(dec!(10.00)));
        assert_eq!(result[0].fee_value, dec!(10));
    }

    #[test]
    fn fixed_fee_ignores_transaction_amount() {
        let fees = vec![fee(CalculationType::Fixed, dec!(5))];
        let result = calculate_fees(&fees, Money::new(dec!(100.00)));
        assert_eq!(result[0].calculated_value, Money::new(dec!(5.00)));

        let result = calculate_fees(&fees, Money::new(dec!(9999.99)));
        assert_eq!(result[0].calculated_value, Money::new(dec!(5.00)));
    }

    #[test]
    fn empty_fee_list_yields_empty_result() {
        let result = calculate_fees(&[], Money::new(dec!(50.00)));
        assert!(result.is_empty());
    }

    #[test]
    fn output_preserves_input_order() {
        let first = fee(CalculationType::Percentage, dec!(1));
        let second = fee(CalculationType::Fixed, dec!(2));
        let third = fee(CalculationType::Percentage, dec!(3));
        let fees = vec![first.clone(), second.clone(), third.clone()];

        let result = calculate_fees(&fees, Money::new(dec!(200.00)));

        assert_eq!(result.len(), 3);
        assert_eq!(result[0].fee_id, first.fee_id);
        assert_eq!(result[1].fee_id, second.fee_id);
        assert_eq!(result[2].fee_id, third.fee_id);
    }

    #[test]
    fn percentage_rounds_half_up() {
        // 2.5% of 10.10 = 0.2525 -> 0.25; 2.5% of 10.20 = 0.255 -> 0.26
        let fees = vec![fee(CalculationType::Percentage, dec!(2.5))];

        let result = calculate_fees(&fees, Money::new(dec!(10.10)));
        assert_eq!(result[0].calculated_value, Money::new(dec!(0.25)));

        let result = calculate_fees(&fees, Money::new(dec!(10.20)));
        assert_eq!(result[0].calculated_value, Money::new(dec!(0.26)));
    }

    #[test]
    fn every_input_fee_produces_one_output() {
        let fees: Vec<_> = (0..10)
            .map(|i| fee(CalculationType::Percentage, Decimal::from(i)))
            .collect();
        let result = calculate_fees(&fees, Money::new(dec!(100.00)));
        assert_eq!(result.len(), fees.len());
    }

    #[test]
    fn service_provider_fee_type_is_echoed() {
        let fees = vec![FeeToCalculate {
            fee_id: FeeId::new(),
            calculation_type: CalculationType::Fixed,
            fee_type: FeeType::ServiceProvider,
            value: dec!(1.50),
        }];
        let result = calculate_fees(&fees, Money::new(dec!(10.00)));
        assert_eq!(result[0].fee_type, FeeType::ServiceProvider);
    }
}
