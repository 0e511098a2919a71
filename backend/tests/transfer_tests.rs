//! Transfer and approval workflow tests
//!
//! Property-based and unit tests for:
//! - Transfer conservation (source loses exactly what the destination gains)
//! - Transfer leg pairing via a shared group id
//! - Approval workflow terminality (processed requests never transition)

use proptest::prelude::*;
use uuid::Uuid;

use shared::types::TransferStatus;

/// A transfer leg as it lands in the ledger.
#[derive(Debug, Clone)]
struct TransferLeg {
    location: &'static str,
    delta: i32,
    group_id: Uuid,
}

/// Execute a transfer against two stock levels, producing the leg pair.
fn execute_transfer(
    from_stock: i32,
    to_stock: i32,
    quantity: i32,
) -> Result<(i32, i32, Vec<TransferLeg>), String> {
    if quantity <= 0 {
        return Err("Quantity must be positive".to_string());
    }
    if from_stock < quantity {
        return Err(format!("Insufficient stock: {} available", from_stock));
    }

    let group_id = Uuid::new_v4();
    let legs = vec![
        TransferLeg {
            location: "from",
            delta: -quantity,
            group_id,
        },
        TransferLeg {
            location: "to",
            delta: quantity,
            group_id,
        },
    ];

    Ok((from_stock - quantity, to_stock + quantity, legs))
}

/// The request state machine: pending is the only state that transitions.
fn process(status: TransferStatus, approve: bool) -> Result<TransferStatus, String> {
    if status.is_terminal() {
        return Err(format!(
            "Transfer request has already been {}",
            status.as_str()
        ));
    }
    Ok(if approve {
        TransferStatus::Approved
    } else {
        TransferStatus::Rejected
    })
}

/// Rejection reason handling: optional, with blank input stored as none.
fn record_rejection_reason(reason: Option<&str>) -> Option<String> {
    reason
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_transfer_moves_stock() {
        let (from, to, legs) = execute_transfer(100, 0, 30).unwrap();
        assert_eq!(from, 70);
        assert_eq!(to, 30);
        assert_eq!(legs.len(), 2);
    }

    #[test]
    fn test_transfer_legs_share_group_id() {
        let (_, _, legs) = execute_transfer(100, 0, 30).unwrap();
        assert_eq!(legs[0].group_id, legs[1].group_id);
        assert_eq!(legs[0].location, "from");
        assert_eq!(legs[1].location, "to");
    }

    #[test]
    fn test_transfer_beyond_stock_rejected() {
        let err = execute_transfer(20, 0, 30).unwrap_err();
        assert!(err.contains("20 available"));
    }

    #[test]
    fn test_transfer_of_entire_stock_allowed() {
        let (from, to, _) = execute_transfer(30, 5, 30).unwrap();
        assert_eq!(from, 0);
        assert_eq!(to, 35);
    }

    #[test]
    fn test_zero_and_negative_quantities_rejected() {
        assert!(execute_transfer(100, 0, 0).is_err());
        assert!(execute_transfer(100, 0, -5).is_err());
    }

    #[test]
    fn test_pending_can_be_approved_or_rejected() {
        assert_eq!(
            process(TransferStatus::Pending, true).unwrap(),
            TransferStatus::Approved
        );
        assert_eq!(
            process(TransferStatus::Pending, false).unwrap(),
            TransferStatus::Rejected
        );
    }

    /// A rejection carries no mandatory reason; blank input is stored as
    /// none and real text is kept verbatim.
    #[test]
    fn test_rejection_reason_is_optional() {
        assert_eq!(
            process(TransferStatus::Pending, false).unwrap(),
            TransferStatus::Rejected
        );
        assert_eq!(record_rejection_reason(None), None);
        assert_eq!(record_rejection_reason(Some("   ")), None);
        assert_eq!(
            record_rejection_reason(Some("stock damaged in transit")),
            Some("stock damaged in transit".to_string())
        );
    }

    #[test]
    fn test_terminal_states_never_transition() {
        for status in [TransferStatus::Approved, TransferStatus::Rejected] {
            for approve in [true, false] {
                let err = process(status, approve).unwrap_err();
                assert!(err.contains("already been"));
            }
        }
    }

    #[test]
    fn test_double_approval_fails_second_time() {
        let first = process(TransferStatus::Pending, true).unwrap();
        assert_eq!(first, TransferStatus::Approved);
        assert!(process(first, true).is_err());
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Conservation: the total across both locations never changes.
        #[test]
        fn prop_transfer_conserves_total(
            from_stock in 0i32..1000,
            to_stock in 0i32..1000,
            quantity in 1i32..1000
        ) {
            match execute_transfer(from_stock, to_stock, quantity) {
                Ok((new_from, new_to, _)) => {
                    prop_assert_eq!(new_from + new_to, from_stock + to_stock);
                    prop_assert!(new_from >= 0);
                }
                Err(_) => {
                    // Rejection only for shortfalls; stock is untouched.
                    prop_assert!(from_stock < quantity);
                }
            }
        }

        /// Every successful transfer produces exactly one paired leg set
        /// whose deltas cancel.
        #[test]
        fn prop_legs_pair_and_cancel(
            from_stock in 1i32..1000,
            quantity_frac in 0.0f64..1.0
        ) {
            let quantity = ((from_stock as f64) * quantity_frac) as i32 + 1;
            if quantity <= from_stock {
                let (_, _, legs) = execute_transfer(from_stock, 0, quantity).unwrap();
                prop_assert_eq!(legs.len(), 2);
                prop_assert_eq!(legs[0].group_id, legs[1].group_id);
                prop_assert_eq!(legs[0].delta + legs[1].delta, 0);
                prop_assert!(legs[0].delta < 0);
            }
        }

        /// Distinct transfers never share a group id.
        #[test]
        fn prop_group_ids_distinct(quantity in 1i32..100) {
            let (_, _, a) = execute_transfer(1000, 0, quantity).unwrap();
            let (_, _, b) = execute_transfer(1000, 0, quantity).unwrap();
            prop_assert_ne!(a[0].group_id, b[0].group_id);
        }

        /// Once a request leaves pending it is stuck there: any further
        /// sequence of process attempts fails and the status is unchanged.
        #[test]
        fn prop_terminal_states_absorb(
            first_approve in any::<bool>(),
            attempts in prop::collection::vec(any::<bool>(), 1..10)
        ) {
            let terminal = process(TransferStatus::Pending, first_approve).unwrap();
            prop_assert!(terminal.is_terminal());

            for approve in attempts {
                prop_assert!(process(terminal, approve).is_err());
            }
        }
    }
}
