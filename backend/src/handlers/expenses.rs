//! HTTP handlers for expense endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};

use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::expenses::{Expense, ExpensePayload, ExpenseService, ExpensesQuery};
use crate::AppState;

/// Record an expense
pub async fn create_expense(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(payload): Json<ExpensePayload>,
) -> AppResult<Json<Expense>> {
    let service = ExpenseService::new(state.db, state.exchange);
    let expense = service.create_expense(&current_user.0, payload).await?;
    Ok(Json(expense))
}

/// List expenses
pub async fn list_expenses(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ExpensesQuery>,
) -> AppResult<Json<Vec<Expense>>> {
    let service = ExpenseService::new(state.db, state.exchange);
    let expenses = service.list_expenses(&current_user.0, &query).await?;
    Ok(Json(expenses))
}

/// Update an expense
pub async fn update_expense(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(expense_id): Path<Uuid>,
    Json(payload): Json<ExpensePayload>,
) -> AppResult<Json<Expense>> {
    let service = ExpenseService::new(state.db, state.exchange);
    let expense = service
        .update_expense(&current_user.0, expense_id, payload)
        .await?;
    Ok(Json(expense))
}

/// Delete an expense
pub async fn delete_expense(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(expense_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    let service = ExpenseService::new(state.db, state.exchange);
    service.delete_expense(&current_user.0, expense_id).await?;
    Ok(Json(()))
}
