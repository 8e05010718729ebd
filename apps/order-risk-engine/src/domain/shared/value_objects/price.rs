//! Price value object for per-unit prices.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use super::Quantity;
use crate::domain::shared::DomainError;

/// A per-unit price in the quote currency of a symbol.
///
/// Zero is a legal value: market and stop orders carry a zero limit price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Zero price.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new Price from a Decimal.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Get the inner Decimal value.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns true if this price is strictly positive.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Returns true if this price is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Notional value of `quantity` units at this price.
    ///
    /// `None` when the product does not fit in a `Decimal`.
    #[must_use]
    pub fn notional(&self, quantity: Quantity) -> Option<Decimal> {
        self.0.checked_mul(quantity.amount())
    }

    /// Validate a price supplied with an order request.
    ///
    /// # Errors
    ///
    /// Returns error if the price is negative.
    pub fn validate_for_order(&self, field: &str) -> Result<(), DomainError> {
        if self.0.is_sign_negative() && !self.0.is_zero() {
            return Err(DomainError::invalid(field, "cannot be negative"));
        }
        Ok(())
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl PartialOrd for Price {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Price {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl From<Decimal> for Price {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}
