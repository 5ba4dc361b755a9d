//! HTTP handlers for sale endpoints
//!
//! Responses use the `{status, sale(s)}` envelope the client dashboards
//! expect. Cycle-lock conflicts surface as 409, authorization failures as
//! 403, both produced by the service layer.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::sales::{Sale, SalePayload, SalesQuery, SalesService, UpdateSalePayload};
use crate::AppState;

/// Envelope for a single sale
#[derive(serde::Serialize)]
pub struct SaleResponse {
    pub status: &'static str,
    pub sale: Sale,
}

/// Envelope for a sale listing
#[derive(serde::Serialize)]
pub struct SalesListResponse {
    pub status: &'static str,
    pub sales: Vec<Sale>,
}

/// Envelope for mutations without a body
#[derive(serde::Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

/// Query for deleting a sale
#[derive(Debug, Deserialize)]
pub struct DeleteSaleQuery {
    pub id: Uuid,
}

/// List sales, or fetch one when `id` is given
pub async fn list_sales(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<SalesQuery>,
) -> AppResult<axum::response::Response> {
    use axum::response::IntoResponse;

    let service = SalesService::new(state.db, state.exchange, &state.config);

    if let Some(id) = query.id {
        let sale = service.get_sale(&current_user.0, id).await?;
        return Ok(Json(SaleResponse {
            status: "success",
            sale,
        })
        .into_response());
    }

    let sales = service.list_sales(&current_user.0, &query).await?;
    Ok(Json(SalesListResponse {
        status: "success",
        sales,
    })
    .into_response())
}

/// Create a sale
pub async fn create_sale(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(payload): Json<SalePayload>,
) -> AppResult<Json<SaleResponse>> {
    let service = SalesService::new(state.db, state.exchange, &state.config);
    let sale = service.create_sale(&current_user.0, payload).await?;
    Ok(Json(SaleResponse {
        status: "success",
        sale,
    }))
}

/// Update a sale, reconciling stock and ledgers
pub async fn update_sale(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(payload): Json<UpdateSalePayload>,
) -> AppResult<Json<SaleResponse>> {
    let service = SalesService::new(state.db, state.exchange, &state.config);
    let sale = service.update_sale(&current_user.0, payload).await?;
    Ok(Json(SaleResponse {
        status: "success",
        sale,
    }))
}

/// Delete a sale, reversing its stock issue
pub async fn delete_sale(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<DeleteSaleQuery>,
) -> AppResult<Json<StatusResponse>> {
    let service = SalesService::new(state.db, state.exchange, &state.config);
    service.delete_sale(&current_user.0, query.id).await?;
    Ok(Json(StatusResponse { status: "success" }))
}
