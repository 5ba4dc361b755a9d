//! Product and variant management
//!
//! Stock counters are never edited directly here: they move only through
//! ledgered paths (sales and manual adjustments), so every unit in
//! `quantity_in_stock` is accounted for by movement rows.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::services::access::AccessService;

/// Product service
#[derive(Clone)]
pub struct ProductService {
    db: PgPool,
    access: AccessService,
}

/// Product record
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub project_id: Option<Uuid>,
    pub name: String,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub quantity_in_stock: i32,
    pub reorder_level: i32,
    pub unit_cost: Decimal,
    pub selling_price: Decimal,
    pub attributes: Option<Value>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Product variant record
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ProductVariant {
    pub id: Uuid,
    pub product_id: Uuid,
    pub label: String,
    pub sku: Option<String>,
    pub unit_cost: Decimal,
    pub selling_price: Decimal,
    pub quantity_in_stock: i32,
    pub attributes: Option<Value>,
    pub created_at: DateTime<Utc>,
}

/// Product with its variants
#[derive(Debug, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub variants: Vec<ProductVariant>,
}

/// Input for creating a product
#[derive(Debug, Deserialize)]
pub struct CreateProductInput {
    pub project_id: Option<Uuid>,
    pub name: String,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub reorder_level: Option<i32>,
    pub unit_cost: Option<Decimal>,
    pub selling_price: Option<Decimal>,
    pub attributes: Option<Value>,
}

/// Input for updating a product
#[derive(Debug, Deserialize)]
pub struct UpdateProductInput {
    pub project_id: Option<Uuid>,
    pub name: Option<String>,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub reorder_level: Option<i32>,
    pub unit_cost: Option<Decimal>,
    pub selling_price: Option<Decimal>,
    pub attributes: Option<Value>,
}

/// Input for creating a product variant
#[derive(Debug, Deserialize)]
pub struct CreateVariantInput {
    pub label: String,
    pub sku: Option<String>,
    pub unit_cost: Option<Decimal>,
    pub selling_price: Option<Decimal>,
    pub attributes: Option<Value>,
}

/// Input for updating a product variant
#[derive(Debug, Deserialize)]
pub struct UpdateVariantInput {
    pub label: Option<String>,
    pub sku: Option<String>,
    pub unit_cost: Option<Decimal>,
    pub selling_price: Option<Decimal>,
    pub attributes: Option<Value>,
}

const PRODUCT_COLUMNS: &str = "id, organization_id, project_id, name, sku, description, \
     quantity_in_stock, reorder_level, unit_cost, selling_price, attributes, created_by, created_at";

const VARIANT_COLUMNS: &str = "id, product_id, label, sku, unit_cost, selling_price, \
     quantity_in_stock, attributes, created_at";

impl ProductService {
    /// Create a new ProductService instance
    pub fn new(db: PgPool) -> Self {
        let access = AccessService::new(db.clone());
        Self { db, access }
    }

    /// Create a product. Stock starts at zero; use a purchase adjustment
    /// to receive initial inventory.
    pub async fn create_product(
        &self,
        user: &AuthUser,
        input: CreateProductInput,
    ) -> AppResult<Product> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Product name must not be empty".to_string(),
            });
        }

        if let Some(project_id) = input.project_id {
            self.access
                .ensure_project_in_org(user.organization_id, project_id)
                .await?;
            self.access
                .assert_project_access(user, Some(project_id))
                .await?;
        }

        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            INSERT INTO products
                (organization_id, project_id, name, sku, description, reorder_level,
                 unit_cost, selling_price, attributes, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(user.organization_id)
        .bind(input.project_id)
        .bind(name)
        .bind(&input.sku)
        .bind(&input.description)
        .bind(input.reorder_level.unwrap_or(0))
        .bind(input.unit_cost.unwrap_or(Decimal::ZERO))
        .bind(input.selling_price.unwrap_or(Decimal::ZERO))
        .bind(&input.attributes)
        .bind(user.user_id)
        .fetch_one(&self.db)
        .await?;

        Ok(product)
    }

    /// List products, optionally scoped to a project
    pub async fn list_products(
        &self,
        organization_id: Uuid,
        project_id: Option<Uuid>,
    ) -> AppResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE organization_id = $1
              AND ($2::uuid IS NULL OR project_id = $2)
            ORDER BY name
            "#
        ))
        .bind(organization_id)
        .bind(project_id)
        .fetch_all(&self.db)
        .await?;

        Ok(products)
    }

    /// Get a product with its variants
    pub async fn get_product(
        &self,
        organization_id: Uuid,
        product_id: Uuid,
    ) -> AppResult<ProductDetail> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 AND organization_id = $2"
        ))
        .bind(product_id)
        .bind(organization_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        let variants = sqlx::query_as::<_, ProductVariant>(&format!(
            "SELECT {VARIANT_COLUMNS} FROM product_variants WHERE product_id = $1 ORDER BY label"
        ))
        .bind(product_id)
        .fetch_all(&self.db)
        .await?;

        Ok(ProductDetail { product, variants })
    }

    /// Update a product's descriptive fields
    pub async fn update_product(
        &self,
        user: &AuthUser,
        product_id: Uuid,
        input: UpdateProductInput,
    ) -> AppResult<Product> {
        let existing = self.get_product(user.organization_id, product_id).await?.product;

        if existing.project_id.is_some() {
            self.access
                .assert_project_access(user, existing.project_id)
                .await?;
        }
        if let Some(project_id) = input.project_id {
            self.access
                .ensure_project_in_org(user.organization_id, project_id)
                .await?;
        }

        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products
            SET project_id = $1, name = $2, sku = $3, description = $4, reorder_level = $5,
                unit_cost = $6, selling_price = $7, attributes = $8
            WHERE id = $9 AND organization_id = $10
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(input.project_id.or(existing.project_id))
        .bind(input.name.as_deref().map(str::trim).unwrap_or(existing.name.as_str()))
        .bind(input.sku.or(existing.sku))
        .bind(input.description.or(existing.description))
        .bind(input.reorder_level.unwrap_or(existing.reorder_level))
        .bind(input.unit_cost.unwrap_or(existing.unit_cost))
        .bind(input.selling_price.unwrap_or(existing.selling_price))
        .bind(input.attributes.or(existing.attributes))
        .bind(product_id)
        .bind(user.organization_id)
        .fetch_one(&self.db)
        .await?;

        Ok(product)
    }

    /// Delete a product without recorded sales or movements
    pub async fn delete_product(&self, user: &AuthUser, product_id: Uuid) -> AppResult<()> {
        let existing = self.get_product(user.organization_id, product_id).await?.product;
        if existing.project_id.is_some() {
            self.access
                .assert_project_access(user, existing.project_id)
                .await?;
        }

        let referenced = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(SELECT 1 FROM sales WHERE product_id = $1)
                OR EXISTS(SELECT 1 FROM inventory_transactions WHERE product_id = $1)
            "#,
        )
        .bind(product_id)
        .fetch_one(&self.db)
        .await?;

        if referenced {
            return Err(AppError::Conflict {
                resource: "product".to_string(),
                message: "Product has recorded sales or movements and cannot be deleted"
                    .to_string(),
            });
        }

        let result = sqlx::query("DELETE FROM products WHERE id = $1 AND organization_id = $2")
            .bind(product_id)
            .bind(user.organization_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Product".to_string()));
        }
        Ok(())
    }

    /// Add a variant to a product
    pub async fn create_variant(
        &self,
        user: &AuthUser,
        product_id: Uuid,
        input: CreateVariantInput,
    ) -> AppResult<ProductVariant> {
        let label = input.label.trim();
        if label.is_empty() {
            return Err(AppError::Validation {
                field: "label".to_string(),
                message: "Variant label must not be empty".to_string(),
            });
        }

        // Product must exist in this organization before hanging a variant on it
        let product = self.get_product(user.organization_id, product_id).await?.product;
        if product.project_id.is_some() {
            self.access
                .assert_project_access(user, product.project_id)
                .await?;
        }

        let variant = sqlx::query_as::<_, ProductVariant>(&format!(
            r#"
            INSERT INTO product_variants
                (product_id, label, sku, unit_cost, selling_price, attributes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {VARIANT_COLUMNS}
            "#
        ))
        .bind(product_id)
        .bind(label)
        .bind(&input.sku)
        .bind(input.unit_cost.unwrap_or(product.unit_cost))
        .bind(input.selling_price.unwrap_or(product.selling_price))
        .bind(&input.attributes)
        .fetch_one(&self.db)
        .await?;

        Ok(variant)
    }

    /// Update a variant's descriptive fields
    pub async fn update_variant(
        &self,
        user: &AuthUser,
        product_id: Uuid,
        variant_id: Uuid,
        input: UpdateVariantInput,
    ) -> AppResult<ProductVariant> {
        let product = self.get_product(user.organization_id, product_id).await?.product;
        if product.project_id.is_some() {
            self.access
                .assert_project_access(user, product.project_id)
                .await?;
        }

        let existing = sqlx::query_as::<_, ProductVariant>(&format!(
            "SELECT {VARIANT_COLUMNS} FROM product_variants WHERE id = $1 AND product_id = $2"
        ))
        .bind(variant_id)
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product variant".to_string()))?;

        let variant = sqlx::query_as::<_, ProductVariant>(&format!(
            r#"
            UPDATE product_variants
            SET label = $1, sku = $2, unit_cost = $3, selling_price = $4, attributes = $5
            WHERE id = $6 AND product_id = $7
            RETURNING {VARIANT_COLUMNS}
            "#
        ))
        .bind(input.label.as_deref().map(str::trim).unwrap_or(existing.label.as_str()))
        .bind(input.sku.or(existing.sku))
        .bind(input.unit_cost.unwrap_or(existing.unit_cost))
        .bind(input.selling_price.unwrap_or(existing.selling_price))
        .bind(input.attributes.or(existing.attributes))
        .bind(variant_id)
        .bind(product_id)
        .fetch_one(&self.db)
        .await?;

        Ok(variant)
    }

    /// Delete a variant without recorded sales
    pub async fn delete_variant(
        &self,
        user: &AuthUser,
        product_id: Uuid,
        variant_id: Uuid,
    ) -> AppResult<()> {
        let product = self.get_product(user.organization_id, product_id).await?.product;
        if product.project_id.is_some() {
            self.access
                .assert_project_access(user, product.project_id)
                .await?;
        }

        let referenced = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM sales WHERE variant_id = $1)",
        )
        .bind(variant_id)
        .fetch_one(&self.db)
        .await?;

        if referenced {
            return Err(AppError::Conflict {
                resource: "variant".to_string(),
                message: "Variant has recorded sales and cannot be deleted".to_string(),
            });
        }

        let result =
            sqlx::query("DELETE FROM product_variants WHERE id = $1 AND product_id = $2")
                .bind(variant_id)
                .bind(product_id)
                .execute(&self.db)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Product variant".to_string()));
        }
        Ok(())
    }
}
