//! Kelly-criterion position sizing.

use rust_decimal::Decimal;
use tracing::debug;

/// Optimal bet fraction per the Kelly criterion: `p - (1 - p) / r`.
///
/// Unclamped on purpose; a losing edge produces a negative fraction and the
/// caller decides what to do with it.
pub fn kelly_fraction(win_probability: Decimal, win_loss_ratio: Decimal) -> Decimal {
    win_probability - (Decimal::ONE - win_probability) / win_loss_ratio
}

/// Computes the quote amount to risk on one trade.
pub struct PositionSizer {
    win_probability: Decimal,
    win_loss_ratio: Decimal,
}

impl PositionSizer {
    pub fn new(win_probability: Decimal, win_loss_ratio: Decimal) -> Self {
        Self {
            win_probability,
            win_loss_ratio,
        }
    }

    /// Balance fraction to invest, with the raw Kelly fraction defensively
    /// clamped to [0, 1] so misconfigured constants cannot produce a negative
    /// or over-balance order size.
    pub fn amount_to_invest(&self, balance: Decimal) -> Decimal {
        let fraction = kelly_fraction(self.win_probability, self.win_loss_ratio)
            .clamp(Decimal::ZERO, Decimal::ONE);
        let amount = balance * fraction;
        debug!(%balance, %fraction, %amount, "Sized position");
        amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_kelly_fraction_default_constants() {
        assert_eq!(kelly_fraction(dec!(0.6), dec!(2)), dec!(0.4));
    }

    #[test]
    fn test_kelly_fraction_losing_edge_is_negative() {
        assert_eq!(kelly_fraction(dec!(0.3), dec!(2)), dec!(-0.05));
    }

    #[test]
    fn test_amount_to_invest() {
        let sizer = PositionSizer::new(dec!(0.6), dec!(2));
        assert_eq!(sizer.amount_to_invest(dec!(100)), dec!(40));
    }

    #[test]
    fn test_amount_clamps_negative_fraction_to_zero() {
        let sizer = PositionSizer::new(dec!(0.3), dec!(2));
        assert_eq!(sizer.amount_to_invest(dec!(100)), Decimal::ZERO);
    }
}
