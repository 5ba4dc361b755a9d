//! Inventory ledgers and stock mutation
//!
//! Two generations of append-only movement ledgers coexist:
//!
//! - the legacy `inventory_transactions` ledger, keyed by product/variant;
//! - the Inventory V2 `inventory_movements` ledger, keyed by
//!   inventory-item-variant (with product/variant columns kept for rows
//!   bridged from the legacy schema).
//!
//! Product-keyed movements are written to both ledgers; new-schema variant
//! movements go to V2 only. Which generation a sale may reference is fixed
//! at startup by `inventory.v2_sales_variants`; there is no runtime schema
//! probing. Ledger rows are inserted before the matching stock update so a
//! failure in either aborts the whole transaction.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use shared::models::{LegacyMovementType, MovementType, StockRef};
use shared::reconcile::PlannedMovement;

use crate::config::InventoryConfig;
use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::services::access::AccessService;

/// Bookkeeping fields every posted movement carries
#[derive(Debug, Clone)]
pub struct MovementContext {
    pub organization_id: Uuid,
    pub project_id: Option<Uuid>,
    pub cycle_id: Option<Uuid>,
    pub source_type: &'static str,
    pub source_id: Uuid,
    pub notes: String,
    pub created_by: Uuid,
}

/// Legacy ledger row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct InventoryTransaction {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub project_id: Option<Uuid>,
    pub cycle_id: Option<Uuid>,
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub transaction_type: String,
    pub quantity_delta: i32,
    pub unit_cost: Option<Decimal>,
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Inventory V2 ledger row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct InventoryMovement {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub project_id: Option<Uuid>,
    pub cycle_id: Option<Uuid>,
    pub inventory_item_variant_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    pub variant_id: Option<Uuid>,
    pub transaction_type: String,
    pub quantity_delta: i32,
    pub unit_cost: Option<Decimal>,
    pub source_type: String,
    pub source_id: Uuid,
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Writes product-keyed movements: one legacy row plus its V2 bridge row.
pub struct LegacyLedger;

impl LegacyLedger {
    pub async fn post(
        &self,
        conn: &mut PgConnection,
        ctx: &MovementContext,
        product_id: Uuid,
        variant_id: Option<Uuid>,
        quantity_delta: i32,
        unit_cost: Decimal,
        legacy_type: LegacyMovementType,
        v2_type: MovementType,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO inventory_transactions
                (organization_id, project_id, cycle_id, product_id, variant_id,
                 transaction_type, quantity_delta, unit_cost, notes, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(ctx.organization_id)
        .bind(ctx.project_id)
        .bind(ctx.cycle_id)
        .bind(product_id)
        .bind(variant_id)
        .bind(legacy_type.as_str())
        .bind(quantity_delta)
        .bind(unit_cost)
        .bind(&ctx.notes)
        .bind(ctx.created_by)
        .execute(&mut *conn)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO inventory_movements
                (organization_id, project_id, cycle_id, product_id, variant_id,
                 transaction_type, quantity_delta, unit_cost, source_type, source_id,
                 notes, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(ctx.organization_id)
        .bind(ctx.project_id)
        .bind(ctx.cycle_id)
        .bind(product_id)
        .bind(variant_id)
        .bind(v2_type.as_str())
        .bind(quantity_delta)
        .bind(unit_cost)
        .bind(ctx.source_type)
        .bind(ctx.source_id)
        .bind(&ctx.notes)
        .bind(ctx.created_by)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}

/// Writes movements keyed by the Inventory V2 variant registry.
pub struct V2Ledger;

impl V2Ledger {
    pub async fn post(
        &self,
        conn: &mut PgConnection,
        ctx: &MovementContext,
        inventory_item_variant_id: Uuid,
        quantity_delta: i32,
        unit_cost: Decimal,
        v2_type: MovementType,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO inventory_movements
                (organization_id, project_id, cycle_id, inventory_item_variant_id,
                 transaction_type, quantity_delta, unit_cost, source_type, source_id,
                 notes, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(ctx.organization_id)
        .bind(ctx.project_id)
        .bind(ctx.cycle_id)
        .bind(inventory_item_variant_id)
        .bind(v2_type.as_str())
        .bind(quantity_delta)
        .bind(unit_cost)
        .bind(ctx.source_type)
        .bind(ctx.source_id)
        .bind(&ctx.notes)
        .bind(ctx.created_by)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}

/// Routes each movement to the ledger generation its target belongs to.
/// Built once from configuration; call sites never branch on schema.
#[derive(Clone)]
pub struct LedgerRouter {
    v2_sales_variants: bool,
}

impl LedgerRouter {
    pub fn new(config: &InventoryConfig) -> Self {
        Self {
            v2_sales_variants: config.v2_sales_variants,
        }
    }

    /// Whether sales may reference the Inventory V2 variant registry.
    pub fn allows_item_variants(&self) -> bool {
        self.v2_sales_variants
    }

    /// Post one sale-driven movement to the applicable ledger(s).
    pub async fn post_sale_movement(
        &self,
        conn: &mut PgConnection,
        ctx: &MovementContext,
        movement: &PlannedMovement,
    ) -> AppResult<()> {
        match movement.target {
            StockRef::Product {
                product_id,
                variant_id,
            } => {
                LegacyLedger
                    .post(
                        conn,
                        ctx,
                        product_id,
                        variant_id,
                        movement.quantity_delta,
                        movement.unit_cost,
                        LegacyMovementType::for_sale_delta(movement.quantity_delta),
                        MovementType::for_sale_delta(movement.quantity_delta),
                    )
                    .await
            }
            StockRef::ItemVariant {
                inventory_item_variant_id,
            } => {
                if !self.v2_sales_variants {
                    return Err(AppError::ValidationError(
                        "Inventory V2 variant references are not enabled on this deployment"
                            .to_string(),
                    ));
                }
                V2Ledger
                    .post(
                        conn,
                        ctx,
                        inventory_item_variant_id,
                        movement.quantity_delta,
                        movement.unit_cost,
                        MovementType::for_sale_delta(movement.quantity_delta),
                    )
                    .await
            }
        }
    }

    /// Post a manual (non-sale) movement with explicit types.
    pub async fn post_adjustment(
        &self,
        conn: &mut PgConnection,
        ctx: &MovementContext,
        product_id: Uuid,
        variant_id: Option<Uuid>,
        quantity_delta: i32,
        unit_cost: Decimal,
        legacy_type: LegacyMovementType,
        v2_type: MovementType,
    ) -> AppResult<()> {
        LegacyLedger
            .post(
                conn,
                ctx,
                product_id,
                variant_id,
                quantity_delta,
                unit_cost,
                legacy_type,
                v2_type,
            )
            .await
    }
}

/// Apply a signed stock delta to the target's counter(s), organization
/// scoped. Decrements are guarded so stock can never go negative: a miss
/// with the row present is insufficient stock, a miss without it is a
/// not-found/permission failure. Runs after the ledger post on the same
/// transaction.
pub async fn apply_stock_delta(
    conn: &mut PgConnection,
    organization_id: Uuid,
    target: &StockRef,
    quantity_delta: i32,
) -> AppResult<()> {
    if quantity_delta == 0 {
        return Ok(());
    }

    match target {
        StockRef::Product {
            product_id,
            variant_id,
        } => {
            let updated = sqlx::query(
                r#"
                UPDATE products
                SET quantity_in_stock = quantity_in_stock + $1
                WHERE id = $2 AND organization_id = $3 AND quantity_in_stock + $1 >= 0
                "#,
            )
            .bind(quantity_delta)
            .bind(product_id)
            .bind(organization_id)
            .execute(&mut *conn)
            .await?
            .rows_affected();

            if updated == 0 {
                let exists = sqlx::query_scalar::<_, bool>(
                    "SELECT EXISTS(SELECT 1 FROM products WHERE id = $1 AND organization_id = $2)",
                )
                .bind(product_id)
                .bind(organization_id)
                .fetch_one(&mut *conn)
                .await?;

                return Err(if exists {
                    AppError::InsufficientStock(format!(
                        "Product {} has less than {} in stock",
                        product_id,
                        quantity_delta.unsigned_abs()
                    ))
                } else {
                    AppError::NotFound("Product".to_string())
                });
            }

            if let Some(variant_id) = variant_id {
                let updated = sqlx::query(
                    r#"
                    UPDATE product_variants
                    SET quantity_in_stock = quantity_in_stock + $1
                    WHERE id = $2 AND product_id = $3 AND quantity_in_stock + $1 >= 0
                    "#,
                )
                .bind(quantity_delta)
                .bind(variant_id)
                .bind(product_id)
                .execute(&mut *conn)
                .await?
                .rows_affected();

                if updated == 0 {
                    let exists = sqlx::query_scalar::<_, bool>(
                        "SELECT EXISTS(SELECT 1 FROM product_variants WHERE id = $1 AND product_id = $2)",
                    )
                    .bind(variant_id)
                    .bind(product_id)
                    .fetch_one(&mut *conn)
                    .await?;

                    return Err(if exists {
                        AppError::InsufficientStock(format!(
                            "Variant {} has less than {} in stock",
                            variant_id,
                            quantity_delta.unsigned_abs()
                        ))
                    } else {
                        AppError::NotFound("Product variant".to_string())
                    });
                }
            }
        }
        StockRef::ItemVariant {
            inventory_item_variant_id,
        } => {
            let updated = sqlx::query(
                r#"
                UPDATE inventory_item_variants
                SET quantity_in_stock = quantity_in_stock + $1
                WHERE id = $2 AND organization_id = $3 AND quantity_in_stock + $1 >= 0
                "#,
            )
            .bind(quantity_delta)
            .bind(inventory_item_variant_id)
            .bind(organization_id)
            .execute(&mut *conn)
            .await?
            .rows_affected();

            if updated == 0 {
                let exists = sqlx::query_scalar::<_, bool>(
                    "SELECT EXISTS(SELECT 1 FROM inventory_item_variants WHERE id = $1 AND organization_id = $2)",
                )
                .bind(inventory_item_variant_id)
                .bind(organization_id)
                .fetch_one(&mut *conn)
                .await?;

                return Err(if exists {
                    AppError::InsufficientStock(format!(
                        "Inventory item variant {} has less than {} in stock",
                        inventory_item_variant_id,
                        quantity_delta.unsigned_abs()
                    ))
                } else {
                    AppError::NotFound("Inventory item variant".to_string())
                });
            }
        }
    }

    Ok(())
}

/// Input for a manual product stock adjustment
#[derive(Debug, Deserialize)]
pub struct AdjustStockInput {
    pub variant_id: Option<Uuid>,
    pub quantity_delta: i32,
    pub unit_cost: Option<Decimal>,
    /// "purchase" or "adjustment" (default)
    pub reason: Option<String>,
    pub notes: Option<String>,
}

/// Result of a manual stock adjustment
#[derive(Debug, Serialize)]
pub struct AdjustmentOutcome {
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub quantity_delta: i32,
    pub quantity_in_stock: i32,
}

/// Inventory service: ledger listings and manual adjustments
#[derive(Clone)]
pub struct InventoryService {
    db: PgPool,
    access: AccessService,
    router: LedgerRouter,
}

impl InventoryService {
    /// Create a new InventoryService instance
    pub fn new(db: PgPool, config: &InventoryConfig) -> Self {
        let access = AccessService::new(db.clone());
        let router = LedgerRouter::new(config);
        Self { db, access, router }
    }

    /// Record a manual stock adjustment or purchase for a product.
    ///
    /// Flows through the same ledger-then-stock machinery as sales, inside
    /// one transaction.
    pub async fn adjust_product_stock(
        &self,
        user: &AuthUser,
        product_id: Uuid,
        input: AdjustStockInput,
    ) -> AppResult<AdjustmentOutcome> {
        if input.quantity_delta == 0 {
            return Err(AppError::Validation {
                field: "quantity_delta".to_string(),
                message: "Adjustment delta must not be zero".to_string(),
            });
        }

        let reason = input.reason.as_deref().unwrap_or("adjustment");
        let (legacy_type, v2_type) = match reason {
            "purchase" => {
                if input.quantity_delta < 0 {
                    return Err(AppError::Validation {
                        field: "quantity_delta".to_string(),
                        message: "Purchases must add stock".to_string(),
                    });
                }
                (LegacyMovementType::Purchase, MovementType::Purchase)
            }
            "adjustment" => {
                let legacy = if input.quantity_delta > 0 {
                    LegacyMovementType::AdjustmentIn
                } else {
                    LegacyMovementType::AdjustmentOut
                };
                (legacy, MovementType::Adjustment)
            }
            other => {
                return Err(AppError::Validation {
                    field: "reason".to_string(),
                    message: format!("Unknown adjustment reason '{}'", other),
                });
            }
        };

        let project_id = sqlx::query_scalar::<_, Option<Uuid>>(
            "SELECT project_id FROM products WHERE id = $1 AND organization_id = $2",
        )
        .bind(product_id)
        .bind(user.organization_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        if project_id.is_some() {
            self.access.assert_project_access(user, project_id).await?;
        }

        let ctx = MovementContext {
            organization_id: user.organization_id,
            project_id,
            cycle_id: None,
            source_type: "manual_adjustment",
            source_id: product_id,
            notes: input
                .notes
                .clone()
                .unwrap_or_else(|| format!("Manual {} for product {}", reason, product_id)),
            created_by: user.user_id,
        };

        let target = StockRef::Product {
            product_id,
            variant_id: input.variant_id,
        };

        let mut tx = self.db.begin().await?;

        self.router
            .post_adjustment(
                &mut *tx,
                &ctx,
                product_id,
                input.variant_id,
                input.quantity_delta,
                input.unit_cost.unwrap_or(Decimal::ZERO),
                legacy_type,
                v2_type,
            )
            .await?;

        apply_stock_delta(&mut *tx, user.organization_id, &target, input.quantity_delta).await?;

        let quantity_in_stock = sqlx::query_scalar::<_, i32>(
            "SELECT quantity_in_stock FROM products WHERE id = $1 AND organization_id = $2",
        )
        .bind(product_id)
        .bind(user.organization_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(AdjustmentOutcome {
            product_id,
            variant_id: input.variant_id,
            quantity_delta: input.quantity_delta,
            quantity_in_stock,
        })
    }

    /// List legacy ledger entries, newest first
    pub async fn list_transactions(
        &self,
        organization_id: Uuid,
        product_id: Option<Uuid>,
        cycle_id: Option<Uuid>,
    ) -> AppResult<Vec<InventoryTransaction>> {
        let transactions = sqlx::query_as::<_, InventoryTransaction>(
            r#"
            SELECT id, organization_id, project_id, cycle_id, product_id, variant_id,
                   transaction_type, quantity_delta, unit_cost, notes, created_by, created_at
            FROM inventory_transactions
            WHERE organization_id = $1
              AND ($2::uuid IS NULL OR product_id = $2)
              AND ($3::uuid IS NULL OR cycle_id = $3)
            ORDER BY created_at DESC
            "#,
        )
        .bind(organization_id)
        .bind(product_id)
        .bind(cycle_id)
        .fetch_all(&self.db)
        .await?;

        Ok(transactions)
    }

    /// List Inventory V2 ledger entries, newest first
    pub async fn list_movements(
        &self,
        organization_id: Uuid,
        inventory_item_variant_id: Option<Uuid>,
        source_id: Option<Uuid>,
    ) -> AppResult<Vec<InventoryMovement>> {
        let movements = sqlx::query_as::<_, InventoryMovement>(
            r#"
            SELECT id, organization_id, project_id, cycle_id, inventory_item_variant_id,
                   product_id, variant_id, transaction_type, quantity_delta, unit_cost,
                   source_type, source_id, notes, created_by, created_at
            FROM inventory_movements
            WHERE organization_id = $1
              AND ($2::uuid IS NULL OR inventory_item_variant_id = $2)
              AND ($3::uuid IS NULL OR source_id = $3)
            ORDER BY created_at DESC
            "#,
        )
        .bind(organization_id)
        .bind(inventory_item_variant_id)
        .bind(source_id)
        .fetch_all(&self.db)
        .await?;

        Ok(movements)
    }
}
