//! Decimal arithmetic utilities for financial calculations.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Round down to lot size (quantity quantization).
pub fn round_down_to_lot(value: Decimal, lot_size: Decimal) -> Decimal {
    if lot_size == Decimal::ZERO {
        return value;
    }
    (value / lot_size).floor() * lot_size
}

/// Decimal precision implied by a step size.
///
/// A step of 0.001 allows three decimal places, a step of 1 allows none.
/// Trailing zeros in the exchange's representation ("0.00100000") do not
/// widen the precision.
pub fn step_precision(step_size: Decimal) -> u32 {
    step_size.normalize().scale()
}

/// Safe division that returns zero if the divisor is zero.
pub fn safe_div(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator == Decimal::ZERO {
        Decimal::ZERO
    } else {
        numerator / denominator
    }
}

/// Volume-weighted average of (value, weight) pairs.
pub fn weighted_average(values: &[(Decimal, Decimal)]) -> Decimal {
    let (sum, weight_sum) = values.iter().fold(
        (Decimal::ZERO, Decimal::ZERO),
        |(sum, weight_sum), (val, weight)| (sum + val * weight, weight_sum + weight),
    );

    safe_div(sum, weight_sum)
}

/// Percent change from `from` to `to`.
pub fn percent_change(from: Decimal, to: Decimal) -> Decimal {
    safe_div(to - from, from) * dec!(100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_down_to_lot() {
        assert_eq!(round_down_to_lot(dec!(0.00456), dec!(0.001)), dec!(0.004));
        assert_eq!(round_down_to_lot(dec!(1.567), dec!(0.01)), dec!(1.56));
        assert_eq!(round_down_to_lot(dec!(1.567), dec!(0.1)), dec!(1.5));
        assert_eq!(round_down_to_lot(dec!(5), Decimal::ZERO), dec!(5));
    }

    #[test]
    fn test_step_precision() {
        assert_eq!(step_precision(dec!(0.001)), 3);
        assert_eq!(step_precision(dec!(0.00100000)), 3);
        assert_eq!(step_precision(dec!(1.00000000)), 0);
        assert_eq!(step_precision(dec!(0.1)), 1);
    }

    #[test]
    fn test_percent_change() {
        assert_eq!(percent_change(dec!(100), dec!(95)), dec!(-5));
        assert_eq!(percent_change(dec!(2000), dec!(2010)), dec!(0.5));
        assert_eq!(percent_change(Decimal::ZERO, dec!(10)), Decimal::ZERO);
    }

    #[test]
    fn test_weighted_average() {
        let fills = vec![(dec!(100), dec!(2)), (dec!(200), dec!(1))];
        let avg = weighted_average(&fills);
        assert!(avg > dec!(133) && avg < dec!(134));
    }
}
