//! Time in force for orders.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::shared::DomainError;

/// Time in force specifying order validity duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeInForce {
    /// Good-til-canceled.
    #[default]
    Gtc,
    /// Immediate-or-cancel (fill immediately, cancel remainder).
    Ioc,
    /// Fill-or-kill (all or nothing).
    Fok,
    /// Good-til-date; requires an expiry timestamp.
    Gtd,
    /// Valid for the current trading day only.
    Day,
}

impl TimeInForce {
    /// Returns true if the order must carry an expiry timestamp.
    #[must_use]
    pub const fn requires_expiry(&self) -> bool {
        matches!(self, Self::Gtd)
    }

    /// Returns true if the order requires immediate execution.
    #[must_use]
    pub const fn is_immediate(&self) -> bool {
        matches!(self, Self::Ioc | Self::Fok)
    }
}

impl fmt::Display for TimeInForce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gtc => write!(f, "GTC"),
            Self::Ioc => write!(f, "IOC"),
            Self::Fok => write!(f, "FOK"),
            Self::Gtd => write!(f, "GTD"),
            Self::Day => write!(f, "DAY"),
        }
    }
}

impl FromStr for TimeInForce {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GTC" => Ok(Self::Gtc),
            "IOC" => Ok(Self::Ioc),
            "FOK" => Ok(Self::Fok),
            "GTD" => Ok(Self::Gtd),
            "DAY" => Ok(Self::Day),
            _ => Err(DomainError::UnknownVariant {
                kind: "time in force",
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_gtd_requires_expiry() {
        assert!(TimeInForce::Gtd.requires_expiry());
        assert!(!TimeInForce::Gtc.requires_expiry());
        assert!(!TimeInForce::Day.requires_expiry());
    }

    #[test]
    fn immediate() {
        assert!(TimeInForce::Ioc.is_immediate());
        assert!(TimeInForce::Fok.is_immediate());
        assert!(!TimeInForce::Gtc.is_immediate());
    }

    #[test]
    fn default_is_gtc() {
        assert_eq!(TimeInForce::default(), TimeInForce::Gtc);
    }

    #[test]
    fn parse() {
        assert_eq!("gtd".parse::<TimeInForce>().unwrap(), TimeInForce::Gtd);
        assert!("opg".parse::<TimeInForce>().is_err());
    }
}
