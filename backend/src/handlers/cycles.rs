//! HTTP handlers for cycle endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::cycles::{CreateCycleInput, Cycle, CycleService};
use crate::AppState;

/// Query for listing cycles
#[derive(Debug, Deserialize)]
pub struct CyclesQuery {
    pub project_id: Option<Uuid>,
}

/// Create a cycle
pub async fn create_cycle(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateCycleInput>,
) -> AppResult<Json<Cycle>> {
    let service = CycleService::new(state.db);
    let cycle = service.create_cycle(&current_user.0, input).await?;
    Ok(Json(cycle))
}

/// List cycles
pub async fn list_cycles(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<CyclesQuery>,
) -> AppResult<Json<Vec<Cycle>>> {
    let service = CycleService::new(state.db);
    let cycles = service
        .list_cycles(current_user.0.organization_id, query.project_id)
        .await?;
    Ok(Json(cycles))
}

/// Get a cycle
pub async fn get_cycle(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(cycle_id): Path<Uuid>,
) -> AppResult<Json<Cycle>> {
    let service = CycleService::new(state.db);
    let cycle = service
        .get_cycle(current_user.0.organization_id, cycle_id)
        .await?;
    Ok(Json(cycle))
}

/// Lock a cycle's inventory (admin only)
pub async fn lock_cycle(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(cycle_id): Path<Uuid>,
) -> AppResult<Json<Cycle>> {
    let service = CycleService::new(state.db);
    let cycle = service
        .set_inventory_lock(&current_user.0, cycle_id, true)
        .await?;
    Ok(Json(cycle))
}

/// Unlock a cycle's inventory (admin only)
pub async fn unlock_cycle(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(cycle_id): Path<Uuid>,
) -> AppResult<Json<Cycle>> {
    let service = CycleService::new(state.db);
    let cycle = service
        .set_inventory_lock(&current_user.0, cycle_id, false)
        .await?;
    Ok(Json(cycle))
}
