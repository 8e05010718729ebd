//! Commission value object.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A commission amount denominated in a settlement asset.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Commission {
    /// Amount charged.
    pub amount: Decimal,
    /// Asset the amount is denominated in (e.g., "USDT").
    pub asset: String,
}

impl Commission {
    /// Create a commission.
    #[must_use]
    pub fn new(amount: Decimal, asset: impl Into<String>) -> Self {
        Self {
            amount,
            asset: asset.into(),
        }
    }

    /// Fold another charge into this one.
    ///
    /// Amounts are summed; the asset of the latest charge wins.
    pub fn accumulate(&mut self, other: &Self) {
        self.amount += other.amount;
        if !other.asset.is_empty() {
            self.asset.clone_from(&other.asset);
        }
    }
}

impl fmt::Display for Commission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount.normalize(), self.asset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn accumulate_sums_and_takes_latest_asset() {
        let mut total = Commission::default();
        total.accumulate(&Commission::new(dec!(2.5), "USDT"));
        total.accumulate(&Commission::new(dec!(0.5), "BNB"));
        assert_eq!(total.amount, dec!(3.0));
        assert_eq!(total.asset, "BNB");
    }

    #[test]
    fn display_is_amount_then_asset() {
        assert_eq!(Commission::new(dec!(5.00), "USDT").to_string(), "5 USDT");
    }
}
