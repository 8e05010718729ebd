//! Order State Machine Service
//!
//! Single source of truth for legal order status transitions.

use crate::domain::order_execution::value_objects::OrderStatus;

/// Order State Machine for validating transitions.
pub struct OrderStateMachine;

impl OrderStateMachine {
    /// Check if a state transition is valid.
    ///
    /// `PartiallyFilled -> PartiallyFilled` is legal (another fill).
    #[must_use]
    pub const fn is_valid_transition(from: OrderStatus, to: OrderStatus) -> bool {
        matches!(
            (from, to),
            (OrderStatus::Pending, OrderStatus::New)
                | (
                    OrderStatus::Pending | OrderStatus::New | OrderStatus::PartiallyFilled,
                    OrderStatus::Canceled | OrderStatus::Rejected
                )
                | (
                    OrderStatus::New | OrderStatus::PartiallyFilled,
                    OrderStatus::PartiallyFilled | OrderStatus::Filled
                )
        )
    }

    /// Get all valid next states from a given state.
    #[must_use]
    pub fn valid_next_states(from: OrderStatus) -> Vec<OrderStatus> {
        match from {
            OrderStatus::Pending => vec![
                OrderStatus::New,
                OrderStatus::Canceled,
                OrderStatus::Rejected,
            ],
            OrderStatus::New | OrderStatus::PartiallyFilled => vec![
                OrderStatus::PartiallyFilled,
                OrderStatus::Filled,
                OrderStatus::Canceled,
                OrderStatus::Rejected,
            ],
            OrderStatus::Filled | OrderStatus::Canceled | OrderStatus::Rejected => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::New,
        OrderStatus::PartiallyFilled,
        OrderStatus::Filled,
        OrderStatus::Canceled,
        OrderStatus::Rejected,
    ];

    #[test]
    fn pending_only_confirms_or_terminates() {
        assert!(OrderStateMachine::is_valid_transition(
            OrderStatus::Pending,
            OrderStatus::New
        ));
        assert!(!OrderStateMachine::is_valid_transition(
            OrderStatus::Pending,
            OrderStatus::PartiallyFilled
        ));
        assert!(!OrderStateMachine::is_valid_transition(
            OrderStatus::Pending,
            OrderStatus::Filled
        ));
    }

    #[test]
    fn new_cannot_go_back_to_new() {
        assert!(!OrderStateMachine::is_valid_transition(
            OrderStatus::New,
            OrderStatus::New
        ));
    }

    #[test]
    fn terminal_states_have_no_exits() {
        for from in [
            OrderStatus::Filled,
            OrderStatus::Canceled,
            OrderStatus::Rejected,
        ] {
            assert!(OrderStateMachine::valid_next_states(from).is_empty());
            for to in ALL {
                assert!(!OrderStateMachine::is_valid_transition(from, to));
            }
        }
    }

    #[test]
    fn next_states_agree_with_predicate() {
        for from in ALL {
            for to in ALL {
                assert_eq!(
                    OrderStateMachine::valid_next_states(from).contains(&to),
                    OrderStateMachine::is_valid_transition(from, to),
                    "{from} -> {to}"
                );
            }
        }
    }
}
