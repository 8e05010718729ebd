//! Symbol value object for trading pairs.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::shared::DomainError;

/// Quote assets recognised when a symbol has no separator, longest first.
const KNOWN_QUOTES: &[&str] = &["USDT", "USDC", "BUSD", "USD", "EUR", "BTC", "ETH"];

/// A trading symbol such as "BTCUSDT" or "ETH/USD".
///
/// The symbol is normalized to uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Create a new Symbol.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into().trim().to_uppercase())
    }

    /// Get the symbol string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validate the symbol for order submission.
    ///
    /// # Errors
    ///
    /// Returns error if the symbol is empty or contains characters other
    /// than ASCII alphanumerics and `/ - _ .`.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.0.is_empty() {
            return Err(DomainError::invalid("symbol", "cannot be empty"));
        }
        if let Some(bad) = self
            .0
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '/' | '-' | '_' | '.')))
        {
            return Err(DomainError::invalid(
                "symbol",
                format!("contains invalid character '{bad}'"),
            ));
        }
        Ok(())
    }

    /// Quote currency of the pair, used as the commission settlement asset.
    ///
    /// "ETH/USD" and "ETH-USD" split on the separator; "BTCUSDT" is matched
    /// against a list of well-known quote assets. Returns `None` when the
    /// quote cannot be determined.
    #[must_use]
    pub fn quote_currency(&self) -> Option<&str> {
        if let Some((base, quote)) = self.0.rsplit_once(['/', '-', '_']) {
            if !base.is_empty() && !quote.is_empty() {
                return Some(quote);
            }
        }
        KNOWN_QUOTES
            .iter()
            .find(|q| self.0.len() > q.len() && self.0.ends_with(*q))
            .map(|q| &self.0[self.0.len() - q.len()..])
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Symbol {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn normalizes_to_uppercase() {
        assert_eq!(Symbol::new(" btcusdt ").as_str(), "BTCUSDT");
    }

    #[test_case("BTCUSDT", Some("USDT"))]
    #[test_case("ETHBTC", Some("BTC"))]
    #[test_case("ETH/USD", Some("USD"))]
    #[test_case("SOL-EUR", Some("EUR"))]
    #[test_case("BTCUSDC", Some("USDC"))]
    #[test_case("USDT", None)]
    #[test_case("XYZ", None)]
    fn quote_currency(symbol: &str, expected: Option<&str>) {
        assert_eq!(Symbol::new(symbol).quote_currency(), expected);
    }

    #[test]
    fn validate_rejects_empty_and_bad_chars() {
        assert!(Symbol::new("").validate().is_err());
        assert!(Symbol::new("BTC USDT").validate().is_err());
        assert!(Symbol::new("BTC$").validate().is_err());
        assert!(Symbol::new("ETH/USD").validate().is_ok());
    }
}
