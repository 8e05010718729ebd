//! Position snapshot supplied by the position lookup.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::order_execution::value_objects::OrderSide;
use crate::domain::shared::{Price, Quantity, StrategyId, Symbol};

/// Direction of an open position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionSide {
    /// Long.
    Long,
    /// Short.
    Short,
}

impl PositionSide {
    /// True if an order on `side` adds to a position in this direction.
    #[must_use]
    pub const fn is_increased_by(&self, side: OrderSide) -> bool {
        matches!(
            (self, side),
            (Self::Long, OrderSide::Buy) | (Self::Short, OrderSide::Sell)
        )
    }
}

impl fmt::Display for PositionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Long => write!(f, "LONG"),
            Self::Short => write!(f, "SHORT"),
        }
    }
}

/// An open position of one strategy in one symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Owning strategy.
    pub strategy_id: StrategyId,
    /// Symbol.
    pub symbol: Symbol,
    /// Direction.
    pub side: PositionSide,
    /// Absolute size.
    pub size: Quantity,
    /// Average entry price.
    pub entry_price: Price,
    /// Current mark price.
    pub mark_price: Price,
    /// Unrealized profit (positive) or loss (negative).
    pub unrealized_pnl: Decimal,
    /// Posted margin.
    pub margin: Decimal,
    /// Margin required to keep the position open.
    pub maintenance_margin: Decimal,
}

impl Position {
    /// Size after applying an order of `quantity` on `side`.
    ///
    /// Same-direction orders add; opposite orders reduce (or flip) the
    /// position, so the result is `|size - quantity|`. The sum saturates at
    /// `Decimal::MAX`.
    #[must_use]
    pub fn size_after(&self, side: OrderSide, quantity: Quantity) -> Quantity {
        if self.side.is_increased_by(side) {
            Quantity::new(self.size.amount().saturating_add(quantity.amount()))
        } else {
            self.size.abs_diff(quantity)
        }
    }

    /// Unrealized loss as a non-negative amount (zero when in profit).
    #[must_use]
    pub fn unrealized_loss(&self) -> Decimal {
        (-self.unrealized_pnl).max(Decimal::ZERO)
    }

    /// Notional value at the mark price, `None` on overflow.
    #[must_use]
    pub fn notional(&self) -> Option<Decimal> {
        self.mark_price.notional(self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn long(size: Decimal) -> Position {
        Position {
            strategy_id: StrategyId::new("s1"),
            symbol: Symbol::new("BTCUSDT"),
            side: PositionSide::Long,
            size: Quantity::new(size),
            entry_price: Price::new(dec!(50000)),
            mark_price: Price::new(dec!(49000)),
            unrealized_pnl: dec!(-1000),
            margin: dec!(5000),
            maintenance_margin: dec!(2500),
        }
    }

    #[test]
    fn same_side_adds() {
        let pos = long(dec!(900));
        assert_eq!(
            pos.size_after(OrderSide::Buy, Quantity::new(dec!(50))),
            Quantity::new(dec!(950))
        );
    }

    #[test]
    fn same_side_sum_saturates() {
        let pos = long(Decimal::MAX);
        assert_eq!(
            pos.size_after(OrderSide::Buy, Quantity::new(dec!(1))),
            Quantity::new(Decimal::MAX)
        );
    }

    #[test]
    fn opposite_side_reduces_or_flips() {
        let pos = long(dec!(900));
        assert_eq!(
            pos.size_after(OrderSide::Sell, Quantity::new(dec!(100))),
            Quantity::new(dec!(800))
        );
        assert_eq!(
            long(dec!(10)).size_after(OrderSide::Sell, Quantity::new(dec!(30))),
            Quantity::new(dec!(20))
        );
    }

    #[test]
    fn loss_and_notional() {
        let pos = long(dec!(2));
        assert_eq!(pos.unrealized_loss(), dec!(1000));
        assert_eq!(pos.notional(), Some(dec!(98000)));

        let profitable = Position {
            unrealized_pnl: dec!(300),
            ..pos
        };
        assert_eq!(profitable.unrealized_loss(), Decimal::ZERO);
    }
}
