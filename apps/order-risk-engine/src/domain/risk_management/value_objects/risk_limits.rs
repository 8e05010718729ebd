//! Per-strategy risk limits.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::domain::shared::DomainError;

const fn default_max_position_size() -> Decimal {
    dec!(1000)
}

const fn default_max_order_size() -> Decimal {
    dec!(100)
}

const fn default_max_daily_loss() -> Decimal {
    dec!(10000)
}

const fn default_max_drawdown_percent() -> Decimal {
    dec!(10)
}

const fn default_max_orders_per_second() -> u32 {
    100
}

const fn default_max_exposure() -> Decimal {
    dec!(100000)
}

const fn default_stop_loss_percent() -> Decimal {
    dec!(2)
}

const fn default_take_profit_percent() -> Decimal {
    dec!(5)
}

/// Risk limits for one strategy.
///
/// An immutable snapshot: the checker fetches a fresh copy per check.
/// Sizes are in base-asset units, money amounts in the quote currency.
///
/// `RiskLimits::default()` is the fallback set used when a strategy has no
/// limits configured:
///
/// | limit | default |
/// |---|---|
/// | `max_position_size` | 1000 |
/// | `max_order_size` | 100 |
/// | `max_daily_loss` | 10000 |
/// | `max_drawdown_percent` | 10 |
/// | `max_orders_per_second` | 100 |
/// | `max_exposure` | 100000 |
/// | `stop_loss_percent` | 2 |
/// | `take_profit_percent` | 5 |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskLimits {
    /// Largest absolute position per symbol.
    #[serde(default = "default_max_position_size")]
    pub max_position_size: Decimal,

    /// Largest single order.
    #[serde(default = "default_max_order_size")]
    pub max_order_size: Decimal,

    /// Largest tolerated unrealized loss on a position.
    #[serde(default = "default_max_daily_loss")]
    pub max_daily_loss: Decimal,

    /// Largest tolerated drawdown, in percent.
    #[serde(default = "default_max_drawdown_percent")]
    pub max_drawdown_percent: Decimal,

    /// Orders allowed per rate window.
    #[serde(default = "default_max_orders_per_second")]
    pub max_orders_per_second: u32,

    /// Largest total notional exposure.
    #[serde(default = "default_max_exposure")]
    pub max_exposure: Decimal,

    /// Stop-loss distance, in percent.
    #[serde(default = "default_stop_loss_percent")]
    pub stop_loss_percent: Decimal,

    /// Take-profit distance, in percent.
    #[serde(default = "default_take_profit_percent")]
    pub take_profit_percent: Decimal,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            max_position_size: default_max_position_size(),
            max_order_size: default_max_order_size(),
            max_daily_loss: default_max_daily_loss(),
            max_drawdown_percent: default_max_drawdown_percent(),
            max_orders_per_second: default_max_orders_per_second(),
            max_exposure: default_max_exposure(),
            stop_loss_percent: default_stop_loss_percent(),
            take_profit_percent: default_take_profit_percent(),
        }
    }
}

impl RiskLimits {
    /// Check that every limit is usable.
    ///
    /// # Errors
    ///
    /// Returns error naming the first limit that is not positive, or a
    /// drawdown percentage above 100.
    pub fn validate(&self) -> Result<(), DomainError> {
        let positive = [
            ("max_position_size", self.max_position_size),
            ("max_order_size", self.max_order_size),
            ("max_daily_loss", self.max_daily_loss),
            ("max_drawdown_percent", self.max_drawdown_percent),
            ("max_exposure", self.max_exposure),
            ("stop_loss_percent", self.stop_loss_percent),
            ("take_profit_percent", self.take_profit_percent),
        ];
        for (field, value) in positive {
            if value <= Decimal::ZERO {
                return Err(DomainError::invalid(field, "must be positive"));
            }
        }
        if self.max_orders_per_second == 0 {
            return Err(DomainError::invalid(
                "max_orders_per_second",
                "must be positive",
            ));
        }
        if self.max_drawdown_percent > dec!(100) {
            return Err(DomainError::invalid(
                "max_drawdown_percent",
                "cannot exceed 100",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let limits = RiskLimits::default();
        assert_eq!(limits.max_position_size, dec!(1000));
        assert_eq!(limits.max_order_size, dec!(100));
        assert_eq!(limits.max_daily_loss, dec!(10000));
        assert_eq!(limits.max_drawdown_percent, dec!(10));
        assert_eq!(limits.max_orders_per_second, 100);
        assert_eq!(limits.max_exposure, dec!(100000));
        assert_eq!(limits.stop_loss_percent, dec!(2));
        assert_eq!(limits.take_profit_percent, dec!(5));
        assert!(limits.validate().is_ok());
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let limits: RiskLimits = serde_yaml_bw::from_str("max_exposure: 50000\n").unwrap();
        assert_eq!(limits.max_exposure, dec!(50000));
        assert_eq!(limits.max_order_size, dec!(100));
    }

    #[test]
    fn validate_rejects_non_positive_and_oversized_drawdown() {
        let limits = RiskLimits {
            max_order_size: Decimal::ZERO,
            ..RiskLimits::default()
        };
        assert!(limits.validate().is_err());

        let limits = RiskLimits {
            max_orders_per_second: 0,
            ..RiskLimits::default()
        };
        assert!(limits.validate().is_err());

        let limits = RiskLimits {
            max_drawdown_percent: dec!(150),
            ..RiskLimits::default()
        };
        assert!(limits.validate().is_err());
    }
}
