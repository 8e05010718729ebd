//! Application Services
//!
//! Application services coordinate domain logic and infrastructure adapters.
//! They differ from use cases in that they typically run as background tasks
//! or provide long-running functionality.

mod risk_service;

pub use risk_service::{RiskMetrics, RiskService, RiskServiceConfig, RiskServiceError};
