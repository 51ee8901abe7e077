use crate::orders::{OrderError, OrderResult, OrderStatus};

/// Order lifecycle rules
///
/// ```text
/// pending -> confirmed -> preparing -> ready -> completed
///    |           |            |          |          |
///    +-----------+------------+----------+----------+--> cancelled
/// ```
///
/// Moving to the current status is always allowed and changes nothing.
pub struct StatusMachine;

impl StatusMachine {
    /// Statuses reachable in one step from `from`, excluding `from` itself
    pub fn next_statuses(from: OrderStatus) -> &'static [OrderStatus] {
        use crate::orders::OrderStatus::*;
        match from {
            Pending => &[Confirmed, Cancelled],
            Confirmed => &[Preparing, Cancelled],
            Preparing => &[Ready, Cancelled],
            Ready => &[Completed, Cancelled],
            // refunds
            Completed => &[Cancelled],
            Cancelled => &[],
        }
    }

    pub fn is_valid_transition(from: OrderStatus, to: OrderStatus) -> bool {
        from == to || Self::next_statuses(from).contains(&to)
    }

    /// Check a transition, returning the target status when allowed
    pub fn transition(from: OrderStatus, to: OrderStatus) -> OrderResult<OrderStatus> {
        if Self::is_valid_transition(from, to) {
            Ok(to)
        } else {
            Err(OrderError::InvalidTransition { from, to })
        }
    }

    /// Inventory is consumed when an order is confirmed, and only then
    pub fn triggers_inventory_deduction(from: OrderStatus, to: OrderStatus) -> bool {
        from != to && to == OrderStatus::Confirmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::OrderStatus::*;

    #[test]
    fn test_forward_path() {
        let path = [Pending, Confirmed, Preparing, Ready, Completed];
        for pair in path.windows(2) {
            assert!(
                StatusMachine::is_valid_transition(pair[0], pair[1]),
                "{} -> {} should be allowed",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_backward_and_skip_transitions_rejected() {
        let rejected = [
            (Confirmed, Pending),
            (Preparing, Confirmed),
            (Ready, Preparing),
            (Completed, Ready),
            (Pending, Preparing),
            (Pending, Completed),
            (Confirmed, Ready),
            (Preparing, Completed),
        ];
        for (from, to) in rejected {
            assert!(!StatusMachine::is_valid_transition(from, to), "{} -> {}", from, to);
        }
    }

    #[test]
    fn test_transition_error_names_both_statuses() {
        let err = StatusMachine::transition(Cancelled, Pending).unwrap_err();
        assert!(matches!(
            err,
            OrderError::InvalidTransition {
                from: Cancelled,
                to: Pending
            }
        ));
    }

    #[test]
    fn test_deduction_trigger() {
        assert!(StatusMachine::triggers_inventory_deduction(Pending, Confirmed));
        assert!(!StatusMachine::triggers_inventory_deduction(Confirmed, Confirmed));
        assert!(!StatusMachine::triggers_inventory_deduction(Confirmed, Preparing));
        assert!(!StatusMachine::triggers_inventory_deduction(Pending, Cancelled));
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn order_status_strategy() -> impl Strategy<Value = OrderStatus> {
        prop::sample::select(OrderStatus::ALL.to_vec())
    }

    /// Same-status transitions are always valid
    #[test]
    fn prop_same_status_is_valid() {
        proptest!(|(status in order_status_strategy())| {
            prop_assert!(StatusMachine::is_valid_transition(status, status));
        });
    }

    /// Cancelled is terminal, and every other status can be cancelled
    #[test]
    fn prop_cancellation_rules() {
        proptest!(|(status in order_status_strategy())| {
            if status != OrderStatus::Cancelled {
                prop_assert!(!StatusMachine::is_valid_transition(OrderStatus::Cancelled, status));
                prop_assert!(StatusMachine::is_valid_transition(status, OrderStatus::Cancelled));
            }
        });
    }

    /// transition() agrees with is_valid_transition()
    #[test]
    fn prop_transition_consistency() {
        proptest!(|(from in order_status_strategy(), to in order_status_strategy())| {
            let result = StatusMachine::transition(from, to);
            if StatusMachine::is_valid_transition(from, to) {
                prop_assert_eq!(result.ok(), Some(to));
            } else {
                prop_assert!(result.is_err());
            }
        });
    }

    /// Deduction fires only on entering confirmed, which is only reachable from pending
    #[test]
    fn prop_deduction_only_from_pending() {
        proptest!(|(from in order_status_strategy(), to in order_status_strategy())| {
            if StatusMachine::is_valid_transition(from, to)
                && StatusMachine::triggers_inventory_deduction(from, to)
            {
                prop_assert_eq!(from, OrderStatus::Pending);
                prop_assert_eq!(to, OrderStatus::Confirmed);
            }
        });
    }
}
