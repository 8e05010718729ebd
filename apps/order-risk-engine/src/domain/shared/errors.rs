//! Domain errors shared by value objects.

use std::fmt;

/// Domain-level errors raised while constructing or parsing value objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid value for a field.
    InvalidValue {
        /// Field name.
        field: String,
        /// Error message.
        message: String,
    },

    /// A textual value did not name a known variant.
    UnknownVariant {
        /// Type being parsed (e.g., "OrderSide").
        kind: &'static str,
        /// The rejected input.
        value: String,
    },
}

impl DomainError {
    /// Shorthand for [`DomainError::InvalidValue`].
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidValue { field, message } => {
                write!(f, "invalid {field}: {message}")
            }
            Self::UnknownVariant { kind, value } => {
                write!(f, "unknown {kind}: '{value}'")
            }
        }
    }
}

impl std::error::Error for DomainError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_value_display() {
        let err = DomainError::invalid("quantity", "must be positive");
        assert_eq!(err.to_string(), "invalid quantity: must be positive");
    }

    #[test]
    fn unknown_variant_display() {
        let err = DomainError::UnknownVariant {
            kind: "OrderSide",
            value: "hold".to_string(),
        };
        assert!(err.to_string().contains("OrderSide"));
        assert!(err.to_string().contains("hold"));
    }

    #[test]
    fn domain_error_is_std_error() {
        let err: Box<dyn std::error::Error> = Box::new(DomainError::invalid("symbol", "empty"));
        assert!(!err.to_string().is_empty());
    }
}
