//! Stock movement models shared by both inventory ledger generations

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Movement types of the legacy `inventory_transactions` ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LegacyMovementType {
    Sale,
    SaleReversal,
    Purchase,
    AdjustmentIn,
    AdjustmentOut,
}

impl LegacyMovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LegacyMovementType::Sale => "SALE",
            LegacyMovementType::SaleReversal => "SALE_REVERSAL",
            LegacyMovementType::Purchase => "PURCHASE",
            LegacyMovementType::AdjustmentIn => "ADJUSTMENT_IN",
            LegacyMovementType::AdjustmentOut => "ADJUSTMENT_OUT",
        }
    }

    /// Movement type for a sale-driven stock delta. Negative deltas issue
    /// stock, positive deltas reverse a previous issue.
    pub fn for_sale_delta(quantity_delta: i32) -> Self {
        if quantity_delta < 0 {
            LegacyMovementType::Sale
        } else {
            LegacyMovementType::SaleReversal
        }
    }
}

/// Movement types of the Inventory V2 `inventory_movements` ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementType {
    SaleIssue,
    Reversal,
    Purchase,
    Adjustment,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::SaleIssue => "SALE_ISSUE",
            MovementType::Reversal => "REVERSAL",
            MovementType::Purchase => "PURCHASE",
            MovementType::Adjustment => "ADJUSTMENT",
        }
    }

    /// V2 counterpart of [`LegacyMovementType::for_sale_delta`].
    pub fn for_sale_delta(quantity_delta: i32) -> Self {
        if quantity_delta < 0 {
            MovementType::SaleIssue
        } else {
            MovementType::Reversal
        }
    }
}

/// The stock rows a movement applies to.
///
/// A sale references either the legacy product/variant schema or the newer
/// inventory-item-variant registry, never both at once: a new-schema
/// reference wins when present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StockRef {
    Product {
        product_id: Uuid,
        variant_id: Option<Uuid>,
    },
    ItemVariant {
        inventory_item_variant_id: Uuid,
    },
}

impl StockRef {
    /// Resolve the stock target from a sale row's three reference columns.
    pub fn resolve(
        product_id: Option<Uuid>,
        variant_id: Option<Uuid>,
        inventory_item_variant_id: Option<Uuid>,
    ) -> Option<StockRef> {
        if let Some(id) = inventory_item_variant_id {
            return Some(StockRef::ItemVariant {
                inventory_item_variant_id: id,
            });
        }
        product_id.map(|product_id| StockRef::Product {
            product_id,
            variant_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sale_delta_maps_to_issue_and_reversal() {
        assert_eq!(
            LegacyMovementType::for_sale_delta(-5),
            LegacyMovementType::Sale
        );
        assert_eq!(
            LegacyMovementType::for_sale_delta(5),
            LegacyMovementType::SaleReversal
        );
        assert_eq!(MovementType::for_sale_delta(-5), MovementType::SaleIssue);
        assert_eq!(MovementType::for_sale_delta(5), MovementType::Reversal);
    }

    #[test]
    fn new_schema_reference_wins() {
        let product = Uuid::new_v4();
        let item_variant = Uuid::new_v4();
        let resolved = StockRef::resolve(Some(product), None, Some(item_variant));
        assert_eq!(
            resolved,
            Some(StockRef::ItemVariant {
                inventory_item_variant_id: item_variant
            })
        );
    }

    #[test]
    fn no_reference_resolves_to_none() {
        assert_eq!(StockRef::resolve(None, None, None), None);
    }
}
