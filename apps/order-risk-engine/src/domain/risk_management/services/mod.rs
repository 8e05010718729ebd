//! Risk Management Domain Services

mod risk_checker;

pub use risk_checker::{DEFAULT_RATE_WINDOW, RiskChecker};
