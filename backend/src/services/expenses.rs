//! Expense management
//!
//! Expenses share the sale workflow's guards (project access, cycle
//! inventory lock, currency snapshot) but have no stock side effects.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::coerce::{self, RawNumber};

use crate::error::{AppError, AppResult};
use crate::external::exchange::ExchangeRateClient;
use crate::middleware::AuthUser;
use crate::services::access::AccessService;
use crate::services::currency::CurrencyService;
use crate::services::cycles::assert_cycle_not_inventory_locked;

/// Expense service
#[derive(Clone)]
pub struct ExpenseService {
    db: PgPool,
    access: AccessService,
    currency: CurrencyService,
}

/// Expense record
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Expense {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub project_id: Option<Uuid>,
    pub cycle_id: Option<Uuid>,
    pub category: String,
    pub description: Option<String>,
    pub amount: Decimal,
    pub amount_org_ccy: Decimal,
    pub expense_date: NaiveDate,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Expense mutation payload
#[derive(Debug, Default, Deserialize)]
pub struct ExpensePayload {
    pub project_id: Option<Uuid>,
    pub cycle_id: Option<Uuid>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub amount: Option<RawNumber>,
    pub expense_date: Option<NaiveDate>,
}

/// Query parameters for listing expenses
#[derive(Debug, Default, Deserialize)]
pub struct ExpensesQuery {
    pub project_id: Option<Uuid>,
    pub cycle_id: Option<Uuid>,
    pub limit: Option<i64>,
}

const EXPENSE_COLUMNS: &str = "id, organization_id, project_id, cycle_id, category, description, \
     amount, amount_org_ccy, expense_date, created_by, created_at";

struct NormalizedExpense {
    project_id: Option<Uuid>,
    cycle_id: Option<Uuid>,
    category: String,
    description: Option<String>,
    amount: Decimal,
    expense_date: NaiveDate,
}

fn normalize_payload(payload: &ExpensePayload) -> AppResult<NormalizedExpense> {
    let category = coerce::optional_text(payload.category.as_deref()).ok_or_else(|| {
        AppError::Validation {
            field: "category".to_string(),
            message: "Expense category must not be empty".to_string(),
        }
    })?;

    Ok(NormalizedExpense {
        project_id: payload.project_id,
        cycle_id: payload.cycle_id,
        category,
        description: coerce::optional_text(payload.description.as_deref()),
        amount: coerce::money("amount", payload.amount.as_ref())?,
        expense_date: payload
            .expense_date
            .unwrap_or_else(|| Utc::now().date_naive()),
    })
}

impl ExpenseService {
    /// Create a new ExpenseService instance
    pub fn new(db: PgPool, exchange: ExchangeRateClient) -> Self {
        let access = AccessService::new(db.clone());
        let currency = CurrencyService::new(exchange);
        Self {
            db,
            access,
            currency,
        }
    }

    /// Record an expense
    pub async fn create_expense(
        &self,
        user: &AuthUser,
        payload: ExpensePayload,
    ) -> AppResult<Expense> {
        let expense = normalize_payload(&payload)?;

        if let Some(project_id) = expense.project_id {
            self.access
                .ensure_project_in_org(user.organization_id, project_id)
                .await?;
        }
        self.access
            .assert_project_access(user, expense.project_id)
            .await?;
        assert_cycle_not_inventory_locked(&self.db, expense.cycle_id, user.organization_id)
            .await?;

        let mut tx = self.db.begin().await?;

        let amount_org_ccy = self
            .currency
            .amount_in_org_currency(
                &mut *tx,
                user.organization_id,
                expense.project_id,
                expense.amount,
            )
            .await?;

        let created = sqlx::query_as::<_, Expense>(&format!(
            r#"
            INSERT INTO expenses
                (organization_id, project_id, cycle_id, category, description, amount,
                 amount_org_ccy, expense_date, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {EXPENSE_COLUMNS}
            "#
        ))
        .bind(user.organization_id)
        .bind(expense.project_id)
        .bind(expense.cycle_id)
        .bind(&expense.category)
        .bind(&expense.description)
        .bind(expense.amount)
        .bind(amount_org_ccy)
        .bind(expense.expense_date)
        .bind(user.user_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(created)
    }

    /// List expenses, restricted to accessible projects for non-admins
    pub async fn list_expenses(
        &self,
        user: &AuthUser,
        query: &ExpensesQuery,
    ) -> AppResult<Vec<Expense>> {
        let accessible = self.access.accessible_project_ids(user).await?;
        let limit = query.limit.unwrap_or(100).clamp(1, 500);

        let expenses = sqlx::query_as::<_, Expense>(&format!(
            r#"
            SELECT {EXPENSE_COLUMNS}
            FROM expenses
            WHERE organization_id = $1
              AND ($2::uuid IS NULL OR project_id = $2)
              AND ($3::uuid IS NULL OR cycle_id = $3)
              AND ($4::uuid[] IS NULL OR project_id = ANY($4))
            ORDER BY expense_date DESC, created_at DESC
            LIMIT $5
            "#
        ))
        .bind(user.organization_id)
        .bind(query.project_id)
        .bind(query.cycle_id)
        .bind(accessible)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(expenses)
    }

    /// Update an expense
    pub async fn update_expense(
        &self,
        user: &AuthUser,
        expense_id: Uuid,
        payload: ExpensePayload,
    ) -> AppResult<Expense> {
        let original = self.fetch_expense(user.organization_id, expense_id).await?;
        let expense = normalize_payload(&payload)?;

        assert_cycle_not_inventory_locked(&self.db, original.cycle_id, user.organization_id)
            .await?;
        if expense.cycle_id != original.cycle_id {
            assert_cycle_not_inventory_locked(&self.db, expense.cycle_id, user.organization_id)
                .await?;
        }

        if let Some(project_id) = expense.project_id {
            self.access
                .ensure_project_in_org(user.organization_id, project_id)
                .await?;
        }
        self.access
            .assert_project_access(user, original.project_id)
            .await?;
        if expense.project_id != original.project_id {
            self.access
                .assert_project_access(user, expense.project_id)
                .await?;
        }

        let mut tx = self.db.begin().await?;

        let amount_org_ccy = self
            .currency
            .amount_in_org_currency(
                &mut *tx,
                user.organization_id,
                expense.project_id,
                expense.amount,
            )
            .await?;

        let updated = sqlx::query_as::<_, Expense>(&format!(
            r#"
            UPDATE expenses
            SET project_id = $1, cycle_id = $2, category = $3, description = $4,
                amount = $5, amount_org_ccy = $6, expense_date = $7
            WHERE id = $8 AND organization_id = $9
            RETURNING {EXPENSE_COLUMNS}
            "#
        ))
        .bind(expense.project_id)
        .bind(expense.cycle_id)
        .bind(&expense.category)
        .bind(&expense.description)
        .bind(expense.amount)
        .bind(amount_org_ccy)
        .bind(expense.expense_date)
        .bind(expense_id)
        .bind(user.organization_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(updated)
    }

    /// Delete an expense
    pub async fn delete_expense(&self, user: &AuthUser, expense_id: Uuid) -> AppResult<()> {
        let original = self.fetch_expense(user.organization_id, expense_id).await?;

        assert_cycle_not_inventory_locked(&self.db, original.cycle_id, user.organization_id)
            .await?;
        self.access
            .assert_project_access(user, original.project_id)
            .await?;

        sqlx::query("DELETE FROM expenses WHERE id = $1 AND organization_id = $2")
            .bind(expense_id)
            .bind(user.organization_id)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    async fn fetch_expense(&self, organization_id: Uuid, expense_id: Uuid) -> AppResult<Expense> {
        sqlx::query_as::<_, Expense>(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE id = $1 AND organization_id = $2"
        ))
        .bind(expense_id)
        .bind(organization_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Expense".to_string()))
    }
}
