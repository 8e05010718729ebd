//! Order execution errors.

use std::fmt;

use super::value_objects::OrderStatus;
use crate::domain::shared::{DomainError, Quantity};

/// Errors raised by the order aggregate.
///
/// A failed operation never mutates the order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    /// Invalid order parameters.
    InvalidParameters {
        /// Field with invalid value.
        field: String,
        /// Error message.
        message: String,
    },

    /// Operation is not legal in the current status.
    InvalidStateTransition {
        /// Operation attempted (e.g., "confirm").
        action: &'static str,
        /// Current order status.
        from: OrderStatus,
    },

    /// Order cannot be filled in current state.
    CannotFill {
        /// Current status.
        status: OrderStatus,
    },

    /// Order cannot be canceled in current state.
    CannotCancel {
        /// Current status.
        status: OrderStatus,
    },

    /// Fill quantity exceeds remaining quantity.
    FillExceedsRemaining {
        /// Fill quantity attempted.
        fill_qty: Quantity,
        /// Remaining quantity.
        remaining_qty: Quantity,
    },

    /// The exchange order id can only be assigned once.
    ExchangeOrderIdAlreadyAssigned {
        /// Id already on the order.
        existing: String,
    },
}

impl OrderError {
    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidParameters {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for OrderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidParameters { field, message } => {
                write!(f, "invalid order parameter '{field}': {message}")
            }
            Self::InvalidStateTransition { action, from } => {
                write!(f, "cannot {action} order in status {from}")
            }
            Self::CannotFill { status } => {
                write!(f, "cannot fill order in status {status}")
            }
            Self::CannotCancel { status } => {
                write!(f, "cannot cancel order in status {status}")
            }
            Self::FillExceedsRemaining {
                fill_qty,
                remaining_qty,
            } => {
                write!(
                    f,
                    "fill quantity {fill_qty} exceeds remaining quantity {remaining_qty}"
                )
            }
            Self::ExchangeOrderIdAlreadyAssigned { existing } => {
                write!(f, "exchange order id already assigned: {existing}")
            }
        }
    }
}

impl std::error::Error for OrderError {}

impl From<DomainError> for OrderError {
    fn from(err: DomainError) -> Self {
        let message = err.to_string();
        match err {
            DomainError::InvalidValue { field, message } => {
                Self::InvalidParameters { field, message }
            }
            DomainError::UnknownVariant { kind, .. } => Self::InvalidParameters {
                field: kind.replace(' ', "_"),
                message,
            },
        }
    }
}
