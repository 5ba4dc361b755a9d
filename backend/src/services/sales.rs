//! Sales service: the sale-inventory reconciliation workflow
//!
//! Every mutation walks the same state machine: validate the payload,
//! authorize the acting user against the sale's project, check the cycle
//! inventory lock, then perform the sale row write and its stock/ledger
//! side effects inside one database transaction. Either everything commits
//! or nothing does.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::coerce::{self, RawNumber};
use shared::models::{SaleStatus, StockRef};
use shared::reconcile::{plan_issue, plan_reversal, plan_update, PlannedMovement};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::external::exchange::ExchangeRateClient;
use crate::middleware::AuthUser;
use crate::services::access::AccessService;
use crate::services::currency::CurrencyService;
use crate::services::customers;
use crate::services::cycles::assert_cycle_not_inventory_locked;
use crate::services::inventory::{apply_stock_delta, LedgerRouter, MovementContext};

/// Sales service
#[derive(Clone)]
pub struct SalesService {
    db: PgPool,
    access: AccessService,
    currency: CurrencyService,
    router: LedgerRouter,
}

/// Raw sale mutation payload.
///
/// Numeric fields arrive as numbers, quoted strings, or null depending on
/// the client form; coercion happens in [`normalize_payload`].
#[derive(Debug, Default, Deserialize)]
pub struct SalePayload {
    pub project_id: Option<Uuid>,
    pub cycle_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    pub variant_id: Option<Uuid>,
    pub inventory_item_variant_id: Option<Uuid>,
    pub customer: Option<String>,
    pub quantity: Option<RawNumber>,
    pub unit_cost: Option<RawNumber>,
    pub price: Option<RawNumber>,
    pub cash_at_hand: Option<RawNumber>,
    pub balance: Option<RawNumber>,
    pub status: Option<String>,
    pub sale_date: Option<NaiveDate>,
}

/// Payload for updating a sale
#[derive(Debug, Deserialize)]
pub struct UpdateSalePayload {
    pub id: Uuid,
    #[serde(flatten)]
    pub sale: SalePayload,
}

/// Query parameters for listing sales
#[derive(Debug, Default, Deserialize)]
pub struct SalesQuery {
    pub id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub cycle_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    pub variant_id: Option<Uuid>,
    pub status: Option<String>,
    pub limit: Option<i64>,
}

/// A validated, fully defaulted sale mutation
#[derive(Debug, Clone)]
struct NormalizedSale {
    project_id: Option<Uuid>,
    cycle_id: Option<Uuid>,
    product_id: Option<Uuid>,
    variant_id: Option<Uuid>,
    inventory_item_variant_id: Option<Uuid>,
    customer: Option<String>,
    quantity: i32,
    unit_cost: Decimal,
    price: Decimal,
    amount: Decimal,
    cash_at_hand: Decimal,
    balance: Decimal,
    status: SaleStatus,
    sale_date: NaiveDate,
}

impl NormalizedSale {
    fn stock_target(&self) -> Option<StockRef> {
        StockRef::resolve(
            self.product_id,
            self.variant_id,
            self.inventory_item_variant_id,
        )
    }
}

/// Sale record
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Sale {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub project_id: Option<Uuid>,
    pub cycle_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    pub variant_id: Option<Uuid>,
    pub inventory_item_variant_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub customer_name: Option<String>,
    pub quantity: i32,
    pub unit_cost: Decimal,
    pub price: Decimal,
    pub amount: Decimal,
    pub amount_org_ccy: Decimal,
    pub status: String,
    pub cash_at_hand: Decimal,
    pub balance: Decimal,
    pub sale_date: NaiveDate,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Sale {
    fn stock_target(&self) -> Option<StockRef> {
        StockRef::resolve(
            self.product_id,
            self.variant_id,
            self.inventory_item_variant_id,
        )
    }
}

/// Columns when the deployment carries `sales.inventory_item_variant_id`
const SALE_COLUMNS_V2: &str = "id, organization_id, project_id, cycle_id, product_id, variant_id, \
     inventory_item_variant_id, customer_id, customer_name, quantity, unit_cost, price, amount, \
     amount_org_ccy, status, cash_at_hand, balance, sale_date, created_by, created_at";

/// Columns on deployments that predate the Inventory V2 migration; the
/// missing column is selected as NULL so row decoding stays uniform.
const SALE_COLUMNS_LEGACY: &str = "id, organization_id, project_id, cycle_id, product_id, variant_id, \
     NULL::uuid AS inventory_item_variant_id, customer_id, customer_name, quantity, unit_cost, price, \
     amount, amount_org_ccy, status, cash_at_hand, balance, sale_date, created_by, created_at";

/// Validate and default a raw payload.
///
/// Absent numeric fields become zero; malformed ones are rejected with a
/// field-level validation error. A new-schema variant reference is only
/// legal when the deployment's schema carries the column.
fn normalize_payload(payload: &SalePayload, allow_item_variants: bool) -> AppResult<NormalizedSale> {
    if payload.inventory_item_variant_id.is_some() && !allow_item_variants {
        return Err(AppError::Validation {
            field: "inventory_item_variant_id".to_string(),
            message: "Inventory V2 variant references are not enabled on this deployment"
                .to_string(),
        });
    }

    if payload.variant_id.is_some() && payload.product_id.is_none() {
        return Err(AppError::Validation {
            field: "variant_id".to_string(),
            message: "variant_id requires product_id".to_string(),
        });
    }

    let status = match payload.status.as_deref() {
        None => SaleStatus::default(),
        Some(raw) => SaleStatus::from_str(raw).ok_or_else(|| AppError::Validation {
            field: "status".to_string(),
            message: format!("Unknown sale status '{}'", raw),
        })?,
    };

    let quantity = coerce::quantity("quantity", payload.quantity.as_ref())?;
    let unit_cost = coerce::money("unit_cost", payload.unit_cost.as_ref())?;
    let price = coerce::money("price", payload.price.as_ref())?;
    let cash_at_hand = coerce::money("cash_at_hand", payload.cash_at_hand.as_ref())?;
    let balance = coerce::money("balance", payload.balance.as_ref())?;

    // Invariant: amount is quantity x price at the time of write.
    let amount = price * Decimal::from(quantity);

    Ok(NormalizedSale {
        project_id: payload.project_id,
        cycle_id: payload.cycle_id,
        product_id: payload.product_id,
        variant_id: payload.variant_id,
        inventory_item_variant_id: payload.inventory_item_variant_id,
        customer: coerce::optional_text(payload.customer.as_deref()),
        quantity,
        unit_cost,
        price,
        amount,
        cash_at_hand,
        balance,
        status,
        sale_date: payload.sale_date.unwrap_or_else(|| Utc::now().date_naive()),
    })
}

fn movement_notes(action: &str, sale_id: Uuid, customer: Option<&str>) -> String {
    format!(
        "{} for sale {} ({})",
        action,
        sale_id,
        customer.unwrap_or("walk-in customer")
    )
}

impl SalesService {
    /// Create a new SalesService instance
    pub fn new(db: PgPool, exchange: ExchangeRateClient, config: &Config) -> Self {
        let access = AccessService::new(db.clone());
        let currency = CurrencyService::new(exchange);
        let router = LedgerRouter::new(&config.inventory);
        Self {
            db,
            access,
            currency,
            router,
        }
    }

    fn sale_columns(&self) -> &'static str {
        if self.router.allows_item_variants() {
            SALE_COLUMNS_V2
        } else {
            SALE_COLUMNS_LEGACY
        }
    }

    /// Fetch a single sale, enforcing project access
    pub async fn get_sale(&self, user: &AuthUser, sale_id: Uuid) -> AppResult<Sale> {
        let sale = self.fetch_sale(user.organization_id, sale_id).await?;
        self.access.assert_project_access(user, sale.project_id).await?;
        Ok(sale)
    }

    /// List sales with optional filters. Non-admins only see sales in
    /// projects they are assigned to.
    pub async fn list_sales(&self, user: &AuthUser, query: &SalesQuery) -> AppResult<Vec<Sale>> {
        if let Some(status) = query.status.as_deref() {
            if SaleStatus::from_str(status).is_none() {
                return Err(AppError::Validation {
                    field: "status".to_string(),
                    message: format!("Unknown sale status '{}'", status),
                });
            }
        }

        let accessible = self.access.accessible_project_ids(user).await?;
        let limit = query.limit.unwrap_or(100).clamp(1, 500);

        let sql = format!(
            r#"
            SELECT {columns}
            FROM sales
            WHERE organization_id = $1
              AND ($2::uuid IS NULL OR project_id = $2)
              AND ($3::uuid IS NULL OR cycle_id = $3)
              AND ($4::uuid IS NULL OR product_id = $4)
              AND ($5::uuid IS NULL OR variant_id = $5)
              AND ($6::text IS NULL OR status = $6)
              AND ($7::uuid[] IS NULL OR project_id = ANY($7))
            ORDER BY sale_date DESC, created_at DESC
            LIMIT $8
            "#,
            columns = self.sale_columns()
        );

        let sales = sqlx::query_as::<_, Sale>(&sql)
            .bind(user.organization_id)
            .bind(query.project_id)
            .bind(query.cycle_id)
            .bind(query.product_id)
            .bind(query.variant_id)
            .bind(query.status.as_deref())
            .bind(accessible)
            .bind(limit)
            .fetch_all(&self.db)
            .await?;

        Ok(sales)
    }

    /// Create a sale, issuing stock for its quantity when it references a
    /// product or inventory item variant.
    pub async fn create_sale(&self, user: &AuthUser, payload: SalePayload) -> AppResult<Sale> {
        let sale = normalize_payload(&payload, self.router.allows_item_variants())?;

        if let Some(project_id) = sale.project_id {
            self.access
                .ensure_project_in_org(user.organization_id, project_id)
                .await?;
        }
        self.access
            .assert_project_access(user, sale.project_id)
            .await?;

        assert_cycle_not_inventory_locked(&self.db, sale.cycle_id, user.organization_id).await?;

        let mut tx = self.db.begin().await?;

        let customer_id = match sale.customer.as_deref() {
            Some(name) => Some(customers::upsert_by_name(&mut *tx, user.organization_id, name).await?),
            None => None,
        };

        let amount_org_ccy = self
            .currency
            .amount_in_org_currency(&mut *tx, user.organization_id, sale.project_id, sale.amount)
            .await?;

        let created = self
            .insert_sale(&mut tx, user, &sale, customer_id, amount_org_ccy)
            .await?;

        let plan = plan_issue(created.stock_target(), sale.quantity, sale.unit_cost);
        let ctx = MovementContext {
            organization_id: user.organization_id,
            project_id: sale.project_id,
            cycle_id: sale.cycle_id,
            source_type: "sale",
            source_id: created.id,
            notes: movement_notes("Issue", created.id, sale.customer.as_deref()),
            created_by: user.user_id,
        };
        self.execute_plan(&mut tx, &ctx, &plan).await?;

        tx.commit().await?;

        Ok(created)
    }

    /// Update a sale, reconciling stock and both ledgers against the
    /// original row.
    pub async fn update_sale(&self, user: &AuthUser, payload: UpdateSalePayload) -> AppResult<Sale> {
        let original = self.fetch_sale(user.organization_id, payload.id).await?;
        let sale = normalize_payload(&payload.sale, self.router.allows_item_variants())?;

        // Both the original cycle and, if the sale moves, the target cycle
        // must be unlocked before anything changes.
        assert_cycle_not_inventory_locked(&self.db, original.cycle_id, user.organization_id)
            .await?;
        if sale.cycle_id != original.cycle_id {
            assert_cycle_not_inventory_locked(&self.db, sale.cycle_id, user.organization_id)
                .await?;
        }

        if let Some(project_id) = sale.project_id {
            self.access
                .ensure_project_in_org(user.organization_id, project_id)
                .await?;
        }
        self.access
            .assert_project_access(user, original.project_id)
            .await?;
        if sale.project_id != original.project_id {
            self.access
                .assert_project_access(user, sale.project_id)
                .await?;
        }

        let mut tx = self.db.begin().await?;

        let customer_id = match sale.customer.as_deref() {
            Some(name) => Some(customers::upsert_by_name(&mut *tx, user.organization_id, name).await?),
            None => None,
        };

        let amount_org_ccy = self
            .currency
            .amount_in_org_currency(&mut *tx, user.organization_id, sale.project_id, sale.amount)
            .await?;

        let updated = self
            .update_sale_row(&mut tx, user, payload.id, &sale, customer_id, amount_org_ccy)
            .await?;

        let plan = plan_update(
            original.stock_target(),
            original.quantity,
            original.unit_cost,
            updated.stock_target(),
            sale.quantity,
            sale.unit_cost,
        );

        let old_ctx = MovementContext {
            organization_id: user.organization_id,
            project_id: original.project_id,
            cycle_id: original.cycle_id,
            source_type: "sale",
            source_id: updated.id,
            notes: movement_notes("Reversal", updated.id, original.customer_name.as_deref()),
            created_by: user.user_id,
        };
        let new_ctx = MovementContext {
            organization_id: user.organization_id,
            project_id: sale.project_id,
            cycle_id: sale.cycle_id,
            source_type: "sale",
            source_id: updated.id,
            notes: movement_notes("Adjustment", updated.id, sale.customer.as_deref()),
            created_by: user.user_id,
        };
        self.execute_plan_with_contexts(&mut tx, updated.stock_target(), &old_ctx, &new_ctx, &plan)
            .await?;

        tx.commit().await?;

        Ok(updated)
    }

    /// Delete a sale, fully reversing its stock issue first.
    pub async fn delete_sale(&self, user: &AuthUser, sale_id: Uuid) -> AppResult<()> {
        let original = self.fetch_sale(user.organization_id, sale_id).await?;

        assert_cycle_not_inventory_locked(&self.db, original.cycle_id, user.organization_id)
            .await?;
        self.access
            .assert_project_access(user, original.project_id)
            .await?;

        let mut tx = self.db.begin().await?;

        let plan = plan_reversal(original.stock_target(), original.quantity, original.unit_cost);
        let ctx = MovementContext {
            organization_id: user.organization_id,
            project_id: original.project_id,
            cycle_id: original.cycle_id,
            source_type: "sale",
            source_id: original.id,
            notes: movement_notes("Reversal", original.id, original.customer_name.as_deref()),
            created_by: user.user_id,
        };
        self.execute_plan(&mut tx, &ctx, &plan).await?;

        sqlx::query("DELETE FROM sales WHERE id = $1 AND organization_id = $2")
            .bind(original.id)
            .bind(user.organization_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }

    async fn fetch_sale(&self, organization_id: Uuid, sale_id: Uuid) -> AppResult<Sale> {
        let sql = format!(
            "SELECT {} FROM sales WHERE id = $1 AND organization_id = $2",
            self.sale_columns()
        );
        sqlx::query_as::<_, Sale>(&sql)
            .bind(sale_id)
            .bind(organization_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Sale".to_string()))
    }

    async fn insert_sale(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        user: &AuthUser,
        sale: &NormalizedSale,
        customer_id: Option<Uuid>,
        amount_org_ccy: Decimal,
    ) -> AppResult<Sale> {
        let sql = if self.router.allows_item_variants() {
            format!(
                r#"
                INSERT INTO sales
                    (organization_id, project_id, cycle_id, product_id, variant_id,
                     inventory_item_variant_id, customer_id, customer_name, quantity, unit_cost,
                     price, amount, amount_org_ccy, status, cash_at_hand, balance, sale_date,
                     created_by)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
                RETURNING {}
                "#,
                SALE_COLUMNS_V2
            )
        } else {
            format!(
                r#"
                INSERT INTO sales
                    (organization_id, project_id, cycle_id, product_id, variant_id,
                     customer_id, customer_name, quantity, unit_cost,
                     price, amount, amount_org_ccy, status, cash_at_hand, balance, sale_date,
                     created_by)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
                RETURNING {}
                "#,
                SALE_COLUMNS_LEGACY
            )
        };

        let mut query = sqlx::query_as::<_, Sale>(&sql)
            .bind(user.organization_id)
            .bind(sale.project_id)
            .bind(sale.cycle_id)
            .bind(sale.product_id)
            .bind(sale.variant_id);
        if self.router.allows_item_variants() {
            query = query.bind(sale.inventory_item_variant_id);
        }
        let created = query
            .bind(customer_id)
            .bind(sale.customer.as_deref())
            .bind(sale.quantity)
            .bind(sale.unit_cost)
            .bind(sale.price)
            .bind(sale.amount)
            .bind(amount_org_ccy)
            .bind(sale.status.as_str())
            .bind(sale.cash_at_hand)
            .bind(sale.balance)
            .bind(sale.sale_date)
            .bind(user.user_id)
            .fetch_one(&mut **tx)
            .await?;

        Ok(created)
    }

    async fn update_sale_row(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        user: &AuthUser,
        sale_id: Uuid,
        sale: &NormalizedSale,
        customer_id: Option<Uuid>,
        amount_org_ccy: Decimal,
    ) -> AppResult<Sale> {
        let sql = if self.router.allows_item_variants() {
            format!(
                r#"
                UPDATE sales
                SET project_id = $1, cycle_id = $2, product_id = $3, variant_id = $4,
                    inventory_item_variant_id = $5, customer_id = $6, customer_name = $7,
                    quantity = $8, unit_cost = $9, price = $10, amount = $11,
                    amount_org_ccy = $12, status = $13, cash_at_hand = $14, balance = $15,
                    sale_date = $16
                WHERE id = $17 AND organization_id = $18
                RETURNING {}
                "#,
                SALE_COLUMNS_V2
            )
        } else {
            format!(
                r#"
                UPDATE sales
                SET project_id = $1, cycle_id = $2, product_id = $3, variant_id = $4,
                    customer_id = $5, customer_name = $6,
                    quantity = $7, unit_cost = $8, price = $9, amount = $10,
                    amount_org_ccy = $11, status = $12, cash_at_hand = $13, balance = $14,
                    sale_date = $15
                WHERE id = $16 AND organization_id = $17
                RETURNING {}
                "#,
                SALE_COLUMNS_LEGACY
            )
        };

        let mut query = sqlx::query_as::<_, Sale>(&sql)
            .bind(sale.project_id)
            .bind(sale.cycle_id)
            .bind(sale.product_id)
            .bind(sale.variant_id);
        if self.router.allows_item_variants() {
            query = query.bind(sale.inventory_item_variant_id);
        }
        let updated = query
            .bind(customer_id)
            .bind(sale.customer.as_deref())
            .bind(sale.quantity)
            .bind(sale.unit_cost)
            .bind(sale.price)
            .bind(sale.amount)
            .bind(amount_org_ccy)
            .bind(sale.status.as_str())
            .bind(sale.cash_at_hand)
            .bind(sale.balance)
            .bind(sale.sale_date)
            .bind(sale_id)
            .bind(user.organization_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Sale".to_string()))?;

        Ok(updated)
    }

    /// Post and apply a reconciliation plan under a single context.
    async fn execute_plan(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        ctx: &MovementContext,
        plan: &[PlannedMovement],
    ) -> AppResult<()> {
        for movement in plan {
            self.router.post_sale_movement(&mut **tx, ctx, movement).await?;
            apply_stock_delta(
                &mut **tx,
                ctx.organization_id,
                &movement.target,
                movement.quantity_delta,
            )
            .await?;
        }
        Ok(())
    }

    /// Post and apply an update plan: movements targeting the sale's new
    /// reference carry the new project/cycle context, reversals of the old
    /// reference keep the original one.
    async fn execute_plan_with_contexts(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        new_target: Option<StockRef>,
        old_ctx: &MovementContext,
        new_ctx: &MovementContext,
        plan: &[PlannedMovement],
    ) -> AppResult<()> {
        for movement in plan {
            let ctx = if Some(movement.target) == new_target {
                new_ctx
            } else {
                old_ctx
            };
            self.router.post_sale_movement(&mut **tx, ctx, movement).await?;
            apply_stock_delta(
                &mut **tx,
                ctx.organization_id,
                &movement.target,
                movement.quantity_delta,
            )
            .await?;
        }
        Ok(())
    }
}
