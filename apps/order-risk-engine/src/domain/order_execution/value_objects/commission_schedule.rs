//! Commission schedule (fee rates and settlement assets per exchange).

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::shared::{ExchangeId, Symbol};

/// Default taker fee rate (10 bps).
pub const DEFAULT_COMMISSION_RATE: Decimal = dec!(0.001);

const fn default_rate() -> Decimal {
    DEFAULT_COMMISSION_RATE
}

fn default_fallback_asset() -> String {
    "USDT".to_string()
}

/// Fee rates and settlement assets used to estimate order commission.
///
/// The settlement asset resolves as: per-exchange override, then the quote
/// currency of the symbol, then `fallback_asset`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommissionSchedule {
    /// Rate applied when an exchange has no override.
    #[serde(default = "default_rate")]
    pub default_rate: Decimal,

    /// Per-exchange rate overrides.
    #[serde(default)]
    pub exchange_rates: HashMap<String, Decimal>,

    /// Per-exchange settlement asset overrides (e.g., "BNB").
    #[serde(default)]
    pub settlement_assets: HashMap<String, String>,

    /// Asset used when nothing else resolves.
    #[serde(default = "default_fallback_asset")]
    pub fallback_asset: String,
}

impl Default for CommissionSchedule {
    fn default() -> Self {
        Self {
            default_rate: default_rate(),
            exchange_rates: HashMap::new(),
            settlement_assets: HashMap::new(),
            fallback_asset: default_fallback_asset(),
        }
    }
}

impl CommissionSchedule {
    /// Fee rate for an exchange.
    #[must_use]
    pub fn rate_for(&self, exchange: &ExchangeId) -> Decimal {
        self.exchange_rates
            .get(exchange.as_str())
            .copied()
            .unwrap_or(self.default_rate)
    }

    /// Settlement asset for a trade of `symbol` on `exchange`.
    #[must_use]
    pub fn settlement_asset(&self, exchange: &ExchangeId, symbol: &Symbol) -> String {
        if let Some(asset) = self.settlement_assets.get(exchange.as_str()) {
            return asset.clone();
        }
        symbol
            .quote_currency()
            .map_or_else(|| self.fallback_asset.clone(), str::to_string)
    }
}
