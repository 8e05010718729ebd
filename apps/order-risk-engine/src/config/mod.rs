//! Configuration module for the risk engine.
//!
//! Loads YAML with environment variable interpolation and validates it
//! before anything is wired.
//!
//! # Usage
//!
//! ```rust,ignore
//! use order_risk_engine::config::{Config, load_config};
//!
//! // Load from default path (config.yaml)
//! let config = load_config(None)?;
//!
//! // Load from custom path
//! let config = load_config(Some("config/risk.yaml"))?;
//!
//! println!("event buffer: {}", config.risk.event_buffer);
//! ```

mod observability;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::services::RiskServiceConfig;
use crate::domain::order_execution::value_objects::CommissionSchedule;
use crate::domain::risk_management::RiskLimits;

pub use observability::{MetricsSettings, ObservabilityConfig};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        /// Path to the config file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse YAML configuration.
    #[error("Failed to parse config YAML: {0}")]
    ParseError(#[from] serde_yaml_bw::Error),

    /// Configuration validation failed.
    #[error("Config validation failed: {0}")]
    ValidationError(String),
}

/// Risk checker settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckerConfig {
    /// Sliding window of the order-rate rule, in milliseconds.
    #[serde(default = "default_rate_window_ms")]
    pub rate_window_ms: u64,
}

const fn default_rate_window_ms() -> u64 {
    1_000
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            rate_window_ms: default_rate_window_ms(),
        }
    }
}

impl CheckerConfig {
    /// Order-rate window.
    #[must_use]
    pub const fn rate_window(&self) -> Duration {
        Duration::from_millis(self.rate_window_ms)
    }
}

/// Root configuration structure.
///
/// Every section is optional; an empty document yields the defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    /// Risk service channels and monitor periods.
    #[serde(default)]
    pub risk: RiskServiceConfig,
    /// Risk checker settings.
    #[serde(default)]
    pub checker: CheckerConfig,
    /// Limits for strategies without their own.
    #[serde(default)]
    pub limits: RiskLimits,
    /// Commission rates and settlement assets.
    #[serde(default)]
    pub commission: CommissionSchedule,
    /// Logging and metrics.
    #[serde(default)]
    pub observability: ObservabilityConfig,
    /// Strategies registered as running at startup.
    #[serde(default)]
    pub strategies: Vec<String>,
}

// ============================================
// Configuration Loading
// ============================================

/// Load configuration from a YAML file with environment variable interpolation.
///
/// # Arguments
///
/// * `path` - Optional path to the config file. Defaults to "config.yaml".
///
/// # Errors
///
/// Returns a `ConfigError` if the file cannot be read, parsed, or validated.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or("config.yaml");

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_string(),
        source: e,
    })?;

    load_config_from_string(&contents)
}

/// Load configuration from a YAML string (useful for testing).
///
/// # Errors
///
/// Returns a `ConfigError` if the YAML cannot be parsed or validated.
pub fn load_config_from_string(yaml: &str) -> Result<Config, ConfigError> {
    let interpolated = interpolate_env_vars(yaml);
    let config: Config = if interpolated.trim().is_empty() {
        Config::default()
    } else {
        serde_yaml_bw::from_str(&interpolated)?
    };
    validate_config(&config)?;
    Ok(config)
}

/// Interpolate environment variables in a string.
///
/// Supports both `${VAR}` and `${VAR:-default}` syntax.
#[allow(clippy::expect_used)] // Regex is compile-time constant; expect() is safe here
fn interpolate_env_vars(input: &str) -> String {
    use std::sync::OnceLock;

    static ENV_VAR_REGEX: OnceLock<regex::Regex> = OnceLock::new();

    let re = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("env var regex is valid")
    });

    re.replace_all(input, |cap: &regex::Captures<'_>| {
        let default_value = cap.get(2).map(|m| m.as_str());
        match std::env::var(&cap[1]) {
            Ok(v) if !v.is_empty() => v,
            _ => default_value.map_or_else(String::new, str::to_string),
        }
    })
    .into_owned()
}

/// Validate configuration values.
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` naming the first bad value.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.risk.event_buffer == 0 {
        return Err(ConfigError::ValidationError(
            "risk.event_buffer must be positive".to_string(),
        ));
    }
    if config.risk.violation_buffer == 0 {
        return Err(ConfigError::ValidationError(
            "risk.violation_buffer must be positive".to_string(),
        ));
    }
    if config.risk.event_retention == 0 {
        return Err(ConfigError::ValidationError(
            "risk.event_retention must be positive".to_string(),
        ));
    }
    if config.risk.exposure_check_interval_ms == 0 || config.risk.drawdown_check_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "risk monitor intervals must be positive".to_string(),
        ));
    }
    if config.checker.rate_window_ms == 0 {
        return Err(ConfigError::ValidationError(
            "checker.rate_window_ms must be positive".to_string(),
        ));
    }

    config
        .limits
        .validate()
        .map_err(|e| ConfigError::ValidationError(format!("limits: {e}")))?;

    let schedule = &config.commission;
    let rates = std::iter::once(&schedule.default_rate).chain(schedule.exchange_rates.values());
    for rate in rates {
        if rate.is_sign_negative() || *rate >= rust_decimal::Decimal::ONE {
            return Err(ConfigError::ValidationError(format!(
                "commission rate {rate} must be in [0, 1)"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::LogFormat;
    use rust_decimal_macros::dec;

    #[test]
    fn test_empty_document_yields_defaults() {
        let config = match load_config_from_string("") {
            Ok(c) => c,
            Err(e) => panic!("should load empty config: {e}"),
        };

        assert_eq!(config, Config::default());
        assert_eq!(config.risk.event_buffer, 1000);
        assert_eq!(config.risk.violation_buffer, 100);
        assert_eq!(config.risk.event_retention, 10_000);
        assert_eq!(config.checker.rate_window(), Duration::from_secs(1));
        assert_eq!(config.limits.max_order_size, dec!(100));
        assert!(!config.observability.metrics.enabled);
    }

    #[test]
    fn test_full_config_parse() {
        let yaml = r#"
risk:
  event_buffer: 500
  violation_buffer: 50
  exposure_check_interval_ms: 1000
  drawdown_check_interval_ms: 2000
  event_retention: 5000

checker:
  rate_window_ms: 500

limits:
  max_order_size: "10"
  max_exposure: "50000"
  max_orders_per_second: 20

commission:
  default_rate: "0.0005"
  exchange_rates:
    binance: "0.00075"
  settlement_assets:
    binance: "BNB"

strategies:
  - momentum-1
  - mean-reversion

observability:
  logging:
    filter: "order_risk_engine=debug"
    format: "pretty"
  metrics:
    enabled: true
    listen_addr: "127.0.0.1:9100"
"#;

        let config = match load_config_from_string(yaml) {
            Ok(c) => c,
            Err(e) => panic!("should load full config: {e}"),
        };

        assert_eq!(config.risk.event_buffer, 500);
        assert_eq!(config.risk.drawdown_check_interval(), Duration::from_secs(2));
        assert_eq!(config.risk.event_retention, 5000);
        assert_eq!(config.checker.rate_window(), Duration::from_millis(500));
        assert_eq!(config.limits.max_order_size, dec!(10));
        assert_eq!(config.limits.max_exposure, dec!(50000));
        assert_eq!(config.limits.max_orders_per_second, 20);
        // unspecified limits keep their defaults
        assert_eq!(config.limits.max_position_size, dec!(1000));
        assert_eq!(config.commission.default_rate, dec!(0.0005));
        assert_eq!(config.commission.exchange_rates["binance"], dec!(0.00075));
        assert_eq!(config.strategies, vec!["momentum-1", "mean-reversion"]);
        assert_eq!(config.observability.logging.format, LogFormat::Pretty);
        assert!(config.observability.metrics.enabled);
        assert_eq!(
            config.observability.metrics.exporter_config().listen_addr.port(),
            9100
        );
    }

    #[test]
    fn test_env_var_with_default_when_missing() {
        let input = "filter: ${ORDER_RISK_CONFIG_TEST_NONEXISTENT_VAR:-info}";
        let result = interpolate_env_vars(input);

        assert_eq!(result, "filter: info");
    }

    #[test]
    #[expect(clippy::literal_string_with_formatting_args)] // ${...} is env var syntax, not format args
    fn test_env_var_with_default_uses_existing() {
        // PATH should always exist
        let input = "path: ${PATH:-default}";
        let result = interpolate_env_vars(input);

        assert_ne!(result, "path: default");
        assert!(result.starts_with("path: "));
    }

    #[test]
    fn test_env_var_without_default_becomes_empty() {
        let input = "listen_addr: ${ORDER_RISK_CONFIG_TEST_UNLIKELY_TO_EXIST}";
        let result = interpolate_env_vars(input);

        assert_eq!(result, "listen_addr: ");
    }

    #[test]
    fn test_validation_zero_buffer() {
        let yaml = r"
risk:
  event_buffer: 0
";

        let Err(err) = load_config_from_string(yaml) else {
            panic!("expected error for zero buffer");
        };
        assert!(err.to_string().contains("event_buffer"));
    }

    #[test]
    fn test_validation_invalid_limits() {
        let yaml = r#"
limits:
  max_drawdown_percent: "150"
"#;

        let Err(err) = load_config_from_string(yaml) else {
            panic!("expected error for drawdown above 100");
        };
        assert!(err.to_string().contains("max_drawdown_percent"));
    }

    #[test]
    fn test_validation_commission_rate() {
        let yaml = r#"
commission:
  exchange_rates:
    binance: "1.5"
"#;

        let Err(err) = load_config_from_string(yaml) else {
            panic!("expected error for commission rate");
        };
        assert!(err.to_string().contains("commission rate"));
    }

    #[test]
    fn test_missing_file() {
        let result = load_config(Some("/nonexistent/order-risk-engine.yaml"));
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }
}
