//! Sale-inventory reconciliation planning
//!
//! Pure functions that turn a sale change (create, update, delete) into the
//! list of stock movements to post. The backend executes a plan inside one
//! database transaction: for each planned movement it appends the ledger
//! row(s) and then applies the same signed delta to the stock counters.
//!
//! Sign convention: a negative `quantity_delta` issues stock out of
//! inventory, a positive one puts it back.

use rust_decimal::Decimal;

use crate::models::StockRef;

/// One stock movement to post and apply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMovement {
    pub target: StockRef,
    pub quantity_delta: i32,
    pub unit_cost: Decimal,
}

/// Plan the initial issue for a newly created sale.
///
/// No movement is planned for a zero quantity or a sale with no stock
/// reference (service-only sales are legal and touch no inventory).
pub fn plan_issue(
    target: Option<StockRef>,
    quantity: i32,
    unit_cost: Decimal,
) -> Vec<PlannedMovement> {
    match target {
        Some(target) if quantity > 0 => vec![PlannedMovement {
            target,
            quantity_delta: -quantity,
            unit_cost,
        }],
        _ => Vec::new(),
    }
}

/// Plan the full reversal posted when a sale is deleted.
pub fn plan_reversal(
    target: Option<StockRef>,
    quantity: i32,
    unit_cost: Decimal,
) -> Vec<PlannedMovement> {
    match target {
        Some(target) if quantity > 0 => vec![PlannedMovement {
            target,
            quantity_delta: quantity,
            unit_cost,
        }],
        _ => Vec::new(),
    }
}

/// Plan the movements for a sale update.
///
/// When the stock reference is unchanged, only the quantity delta moves:
/// editing quantity 5 to 8 posts a single −3, never a reverse-and-reissue
/// of 8. When the reference changed (different product, variant, or
/// inventory-item-variant), the old reference is fully reversed before the
/// new one is issued.
pub fn plan_update(
    old_target: Option<StockRef>,
    old_quantity: i32,
    old_unit_cost: Decimal,
    new_target: Option<StockRef>,
    new_quantity: i32,
    new_unit_cost: Decimal,
) -> Vec<PlannedMovement> {
    if old_target == new_target {
        let Some(target) = new_target else {
            return Vec::new();
        };
        let delta = old_quantity - new_quantity;
        if delta == 0 {
            return Vec::new();
        }
        return vec![PlannedMovement {
            target,
            quantity_delta: delta,
            unit_cost: new_unit_cost,
        }];
    }

    let mut plan = plan_reversal(old_target, old_quantity, old_unit_cost);
    plan.extend(plan_issue(new_target, new_quantity, new_unit_cost));
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn product_ref() -> StockRef {
        StockRef::Product {
            product_id: Uuid::new_v4(),
            variant_id: None,
        }
    }

    #[test]
    fn create_issues_negative_delta() {
        let target = product_ref();
        let plan = plan_issue(Some(target), 5, Decimal::from(6));
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].quantity_delta, -5);
        assert_eq!(plan[0].target, target);
    }

    #[test]
    fn zero_quantity_and_missing_target_plan_nothing() {
        assert!(plan_issue(Some(product_ref()), 0, Decimal::ZERO).is_empty());
        assert!(plan_issue(None, 5, Decimal::ZERO).is_empty());
        assert!(plan_reversal(None, 5, Decimal::ZERO).is_empty());
    }

    #[test]
    fn quantity_only_update_posts_single_delta() {
        let target = product_ref();
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
    }

    #[test]
    fn quantity_decrease_posts_positive_delta() {
        let target = product_ref();
        let plan = plan_update(
            Some(target),
            8,
            Decimal::from(6),
            Some(target),
            5,
            Decimal::from(6),
        );
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].quantity_delta, 3);
    }

    #[test]
    fn unchanged_quantity_posts_nothing() {
        let target = product_ref();
        let plan = plan_update(
            Some(target),
            5,
            Decimal::from(6),
            Some(target),
            5,
            Decimal::from(6),
        );
        assert!(plan.is_empty());
    }

    #[test]
    fn changed_product_reverses_then_issues() {
        let old_target = product_ref();
        let new_target = product_ref();
        let plan = plan_update(
            Some(old_target),
            5,
            Decimal::from(6),
            Some(new_target),
            7,
            Decimal::from(9),
        );
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].target, old_target);
        assert_eq!(plan[0].quantity_delta, 5);
        assert_eq!(plan[1].target, new_target);
        assert_eq!(plan[1].quantity_delta, -7);
    }

    #[test]
    fn changed_item_variant_reverses_then_issues() {
        let old_target = StockRef::ItemVariant {
            inventory_item_variant_id: Uuid::new_v4(),
        };
        let new_target = StockRef::ItemVariant {
            inventory_item_variant_id: Uuid::new_v4(),
        };
        let plan = plan_update(
            Some(old_target),
            4,
            Decimal::ONE,
            Some(new_target),
            4,
            Decimal::ONE,
        );
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].quantity_delta, 4);
        assert_eq!(plan[1].quantity_delta, -4);
    }

    #[test]
    fn reference_removed_reverses_only() {
        let target = product_ref();
        let plan = plan_update(Some(target), 5, Decimal::ONE, None, 5, Decimal::ONE);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].quantity_delta, 5);
    }
}
