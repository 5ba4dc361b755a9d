//! Customer management
//!
//! Customers are created implicitly: sale mutations upsert them by name.
//! The service surface is read-only listing.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Customer service
#[derive(Clone)]
pub struct CustomerService {
    db: PgPool,
}

/// Customer record
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Customer {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Upsert a customer by name within an organization, returning its id.
///
/// Name matching is case-sensitive; two sales with the same name share one
/// customer row. Runs on the caller's transaction so the customer and its
/// sale commit together.
pub async fn upsert_by_name(
    conn: &mut PgConnection,
    organization_id: Uuid,
    name: &str,
) -> AppResult<Uuid> {
    let id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO customers (organization_id, name)
        VALUES ($1, $2)
        ON CONFLICT (organization_id, name) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .bind(organization_id)
    .bind(name)
    .fetch_one(conn)
    .await?;

    Ok(id)
}

impl CustomerService {
    /// Create a new CustomerService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List customers for an organization
    pub async fn list_customers(&self, organization_id: Uuid) -> AppResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, organization_id, name, created_at
            FROM customers
            WHERE organization_id = $1
            ORDER BY name
            "#,
        )
        .bind(organization_id)
        .fetch_all(&self.db)
        .await?;

        Ok(customers)
    }

    /// Get a single customer
    pub async fn get_customer(
        &self,
        organization_id: Uuid,
        customer_id: Uuid,
    ) -> AppResult<Customer> {
        sqlx::query_as::<_, Customer>(
            "SELECT id, organization_id, name, created_at FROM customers \
             WHERE id = $1 AND organization_id = $2",
        )
        .bind(customer_id)
        .bind(organization_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer".to_string()))
    }
}
