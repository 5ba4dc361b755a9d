//! HTTP handlers for inventory ledger endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::inventory::{
    AdjustStockInput, AdjustmentOutcome, InventoryMovement, InventoryService,
    InventoryTransaction,
};
use crate::AppState;

/// Query for listing legacy ledger entries
#[derive(Debug, Deserialize)]
pub struct TransactionsQuery {
    pub product_id: Option<Uuid>,
    pub cycle_id: Option<Uuid>,
}

/// Query for listing Inventory V2 ledger entries
#[derive(Debug, Deserialize)]
pub struct MovementsQuery {
    pub inventory_item_variant_id: Option<Uuid>,
    pub source_id: Option<Uuid>,
}

/// List legacy `inventory_transactions` entries
pub async fn list_transactions(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<TransactionsQuery>,
) -> AppResult<Json<Vec<InventoryTransaction>>> {
    let service = InventoryService::new(state.db, &state.config.inventory);
    let transactions = service
        .list_transactions(
            current_user.0.organization_id,
            query.product_id,
            query.cycle_id,
        )
        .await?;
    Ok(Json(transactions))
}

/// List Inventory V2 movement entries
pub async fn list_movements(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<MovementsQuery>,
) -> AppResult<Json<Vec<InventoryMovement>>> {
    let service = InventoryService::new(state.db, &state.config.inventory);
    let movements = service
        .list_movements(
            current_user.0.organization_id,
            query.inventory_item_variant_id,
            query.source_id,
        )
        .await?;
    Ok(Json(movements))
}

/// Record a manual stock adjustment for a product
pub async fn adjust_product_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
    Json(input): Json<AdjustStockInput>,
) -> AppResult<Json<AdjustmentOutcome>> {
    let service = InventoryService::new(state.db, &state.config.inventory);
    let outcome = service
        .adjust_product_stock(&current_user.0, product_id, input)
        .await?;
    Ok(Json(outcome))
}
