//! Sale-inventory reconciliation tests
//!
//! Covers the planning core behind sale create/update/delete:
//! - stock conservation when only the quantity changes
//! - full reversal plus reissue when the product or variant changes
//! - delete restoring the pre-sale stock level

use std::collections::HashMap;

use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use shared::models::{LegacyMovementType, MovementType, StockRef};
use shared::reconcile::{plan_issue, plan_reversal, plan_update, PlannedMovement};

fn product_ref() -> StockRef {
    StockRef::Product {
        product_id: Uuid::new_v4(),
        variant_id: None,
    }
}

/// Apply a plan to an in-memory stock table the way the stock mutator
/// applies it to the products table.
fn apply_plan(stocks: &mut HashMap<StockRef, i32>, plan: &[PlannedMovement]) {
    for movement in plan {
        *stocks.entry(movement.target).or_insert(0) += movement.quantity_delta;
    }
}

fn net_delta(plan: &[PlannedMovement], target: StockRef) -> i32 {
    plan.iter()
        .filter(|m| m.target == target)
        .map(|m| m.quantity_delta)
        .sum()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Sale of 5 against stock 20 leaves 15 and one ledger entry with
    /// delta -5; deleting restores 20 with a +5 reversal.
    #[test]
    fn test_create_then_delete_round_trip() {
        let target = product_ref();
        let mut stocks = HashMap::from([(target, 20)]);

        let issue = plan_issue(Some(target), 5, Decimal::from(6));
        assert_eq!(issue.len(), 1);
        assert_eq!(issue[0].quantity_delta, -5);
        apply_plan(&mut stocks, &issue);
        assert_eq!(stocks[&target], 15);

        let reversal = plan_reversal(Some(target), 5, Decimal::from(6));
        assert_eq!(reversal.len(), 1);
        assert_eq!(reversal[0].quantity_delta, 5);
        apply_plan(&mut stocks, &reversal);
        assert_eq!(stocks[&target], 20);
    }

    /// Updating quantity 5 -> 8 with stock 15 applies a single -3, not a
    /// reverse-and-reissue of 8.
    #[test]
    fn test_quantity_increase_applies_delta_once() {
        let target = product_ref();
        let mut stocks = HashMap::from([(target, 15)]);

        let plan = plan_update(
            Some(target),
            5,
            Decimal::from(6),
            Some(target),
            8,
            Decimal::from(6),
        );
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].quantity_delta, -3);

        apply_plan(&mut stocks, &plan);
        assert_eq!(stocks[&target], 12);
    }

    /// Changing product A (qty 5) to product B (qty 7) restores A fully
    /// and debits B fully, reversal first.
    #[test]
    fn test_product_change_reverses_and_reissues() {
        let a = product_ref();
        let b = product_ref();
        let mut stocks = HashMap::from([(a, 15), (b, 30)]);

        let plan = plan_update(Some(a), 5, Decimal::from(6), Some(b), 7, Decimal::from(9));
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].target, a);
        assert_eq!(plan[0].quantity_delta, 5);
        assert_eq!(plan[1].target, b);
        assert_eq!(plan[1].quantity_delta, -7);

        apply_plan(&mut stocks, &plan);
        assert_eq!(stocks[&a], 20);
        assert_eq!(stocks[&b], 23);
    }

    /// Movement types follow the delta sign in both ledger generations.
    #[test]
    fn test_movement_types_by_sign() {
        let target = product_ref();

        let issue = plan_issue(Some(target), 5, Decimal::ZERO);
        assert_eq!(
            LegacyMovementType::for_sale_delta(issue[0].quantity_delta),
            LegacyMovementType::Sale
        );
        assert_eq!(
            MovementType::for_sale_delta(issue[0].quantity_delta),
            MovementType::SaleIssue
        );

        let reversal = plan_reversal(Some(target), 5, Decimal::ZERO);
        assert_eq!(
            LegacyMovementType::for_sale_delta(reversal[0].quantity_delta),
            LegacyMovementType::SaleReversal
        );
        assert_eq!(
            MovementType::for_sale_delta(reversal[0].quantity_delta),
            MovementType::Reversal
        );
    }

    /// Sales without a stock reference never move inventory.
    #[test]
    fn test_service_only_sale_moves_nothing() {
        assert!(plan_issue(None, 5, Decimal::ZERO).is_empty());
        assert!(plan_update(None, 5, Decimal::ZERO, None, 9, Decimal::ZERO).is_empty());
        assert!(plan_reversal(None, 5, Decimal::ZERO).is_empty());
    }

    /// Switching a sale to a new-schema variant reverses the legacy target
    /// and issues against the V2 one.
    #[test]
    fn test_switch_to_item_variant() {
        let legacy = product_ref();
        let v2 = StockRef::ItemVariant {
            inventory_item_variant_id: Uuid::new_v4(),
        };

        let plan = plan_update(Some(legacy), 3, Decimal::ONE, Some(v2), 3, Decimal::ONE);
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].target, legacy);
        assert_eq!(plan[0].quantity_delta, 3);
        assert_eq!(plan[1].target, v2);
        assert_eq!(plan[1].quantity_delta, -3);
    }

    /// Amount is always quantity x price at write time.
    #[test]
    fn test_amount_is_quantity_times_price() {
        let quantity = 5;
        let price = Decimal::from(10);
        assert_eq!(price * Decimal::from(quantity), Decimal::from(50));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn quantity_strategy() -> impl Strategy<Value = i32> {
        0i32..=10_000
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Stock conservation: a quantity-only edit from q1 to q2 nets a
        /// single q1 - q2 delta, so stock_after = stock_before - (q2 - q1).
        #[test]
        fn prop_quantity_edit_conserves_stock(
            q1 in quantity_strategy(),
            q2 in quantity_strategy(),
            stock_before in 0i32..=100_000
        ) {
            let target = product_ref();
            let plan = plan_update(
                Some(target), q1, Decimal::ONE,
                Some(target), q2, Decimal::ONE,
            );

            prop_assert_eq!(net_delta(&plan, target), q1 - q2);
            prop_assert!(plan.len() <= 1);

            let mut stocks = HashMap::from([(target, stock_before)]);
            apply_plan(&mut stocks, &plan);
            prop_assert_eq!(stocks[&target], stock_before - (q2 - q1));
        }

        /// Create followed by delete is a no-op on stock.
        #[test]
        fn prop_create_delete_is_identity(
            quantity in quantity_strategy(),
            stock_before in 0i32..=100_000
        ) {
            let target = product_ref();
            let mut stocks = HashMap::from([(target, stock_before)]);

            apply_plan(&mut stocks, &plan_issue(Some(target), quantity, Decimal::ONE));
            apply_plan(&mut stocks, &plan_reversal(Some(target), quantity, Decimal::ONE));

            prop_assert_eq!(stocks[&target], stock_before);
        }

        /// A product change restores the old target by exactly the old
        /// quantity and debits the new target by exactly the new quantity.
        #[test]
        fn prop_target_change_is_full_reverse_reissue(
            old_qty in 1i32..=10_000,
            new_qty in 1i32..=10_000
        ) {
            let a = product_ref();
            let b = product_ref();
            let plan = plan_update(Some(a), old_qty, Decimal::ONE, Some(b), new_qty, Decimal::ONE);

            prop_assert_eq!(net_delta(&plan, a), old_qty);
            prop_assert_eq!(net_delta(&plan, b), -new_qty);
        }

        /// Every planned movement carries a nonzero delta: zero-deltas are
        /// planned out, so each ledger row records a real stock change.
        #[test]
        fn prop_no_zero_delta_movements(
            q1 in quantity_strategy(),
            q2 in quantity_strategy()
        ) {
            let target = product_ref();
            let plan = plan_update(
                Some(target), q1, Decimal::ONE,
                Some(target), q2, Decimal::ONE,
            );
            prop_assert!(plan.iter().all(|m| m.quantity_delta != 0));
        }

        /// Issue deltas are always negative, reversal deltas positive.
        #[test]
        fn prop_delta_signs(quantity in 1i32..=10_000) {
            let target = product_ref();

            let issue = plan_issue(Some(target), quantity, Decimal::ONE);
            prop_assert!(issue.iter().all(|m| m.quantity_delta < 0));

            let reversal = plan_reversal(Some(target), quantity, Decimal::ONE);
            prop_assert!(reversal.iter().all(|m| m.quantity_delta > 0));
        }
    }
}

// ============================================================================
// Integration Test Helpers (mirror the conditional stock decrement)
// ============================================================================

#[cfg(test)]
mod integration_helpers {
    use super::*;

    /// Simulate the guarded stock update: the row-returning UPDATE only
    /// matches when the resulting stock stays non-negative.
    pub fn simulate_stock_update(current: i32, delta: i32) -> Result<i32, &'static str> {
        if current + delta < 0 {
            return Err("Insufficient stock");
        }
        Ok(current + delta)
    }

    #[test]
    fn test_issue_within_stock() {
        assert_eq!(simulate_stock_update(20, -5).unwrap(), 15);
    }

    #[test]
    fn test_oversell_is_rejected() {
        assert!(simulate_stock_update(4, -5).is_err());
    }

    #[test]
    fn test_reversal_always_succeeds() {
        assert_eq!(simulate_stock_update(0, 5).unwrap(), 5);
    }

    #[test]
    fn test_plan_respects_guard_in_order() {
        // Reversal-before-issue ordering means a swap back to a drained
        // product succeeds when the reversal replenishes it first.
        let a = product_ref();
        let b = product_ref();
        let plan = plan_update(Some(a), 5, Decimal::ONE, Some(b), 5, Decimal::ONE);

        let mut stocks = HashMap::from([(a, 0), (b, 5)]);
        for movement in &plan {
            let current = stocks[&movement.target];
            let next = simulate_stock_update(current, movement.quantity_delta).unwrap();
            stocks.insert(movement.target, next);
        }
        assert_eq!(stocks[&a], 5);
        assert_eq!(stocks[&b], 0);
    }
}
