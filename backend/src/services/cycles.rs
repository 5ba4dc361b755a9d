//! Cycle management and the inventory lock gate
//!
//! A cycle is a bounded accounting period. Once its inventory lock is set,
//! no inventory-affecting mutation may touch sales (or expenses) in that
//! cycle until an admin unlocks it.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;

/// Cycle service for managing accounting cycles
#[derive(Clone)]
pub struct CycleService {
    db: PgPool,
}

/// Cycle record
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Cycle {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub project_id: Option<Uuid>,
    pub name: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub inventory_locked: bool,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a cycle
#[derive(Debug, Deserialize)]
pub struct CreateCycleInput {
    pub project_id: Option<Uuid>,
    pub name: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

const CYCLE_COLUMNS: &str = "id, organization_id, project_id, name, start_date, end_date, \
                             inventory_locked, created_by, created_at";

/// Fail with the distinguished cycle-lock error when the cycle is flagged
/// inventory-locked. A null cycle is never locked. Checked before any sale
/// or expense mutation, against the original cycle and, on a cycle change,
/// the target cycle as well.
pub async fn assert_cycle_not_inventory_locked<'e, E>(
    executor: E,
    cycle_id: Option<Uuid>,
    organization_id: Uuid,
) -> AppResult<()>
where
    E: sqlx::PgExecutor<'e>,
{
    let Some(cycle_id) = cycle_id else {
        return Ok(());
    };

    let row = sqlx::query_as::<_, (String, bool)>(
        "SELECT name, inventory_locked FROM cycles WHERE id = $1 AND organization_id = $2",
    )
    .bind(cycle_id)
    .bind(organization_id)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| AppError::NotFound("Cycle".to_string()))?;

    if row.1 {
        return Err(AppError::CycleLocked(format!(
            "Cycle '{}' is inventory-locked; unlock it before changing its sales",
            row.0
        )));
    }
    Ok(())
}

impl CycleService {
    /// Create a new CycleService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a cycle
    pub async fn create_cycle(
        &self,
        user: &AuthUser,
        input: CreateCycleInput,
    ) -> AppResult<Cycle> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Cycle name must not be empty".to_string(),
            });
        }

        if let Some(project_id) = input.project_id {
            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM projects WHERE id = $1 AND organization_id = $2)",
            )
            .bind(project_id)
            .bind(user.organization_id)
            .fetch_one(&self.db)
            .await?;

            if !exists {
                return Err(AppError::NotFound("Project".to_string()));
            }
        }

        let cycle = sqlx::query_as::<_, Cycle>(&format!(
            r#"
            INSERT INTO cycles (organization_id, project_id, name, start_date, end_date, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {CYCLE_COLUMNS}
            "#
        ))
        .bind(user.organization_id)
        .bind(input.project_id)
        .bind(name)
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(user.user_id)
        .fetch_one(&self.db)
        .await?;

        Ok(cycle)
    }

    /// List cycles, optionally scoped to a project
    pub async fn list_cycles(
        &self,
        organization_id: Uuid,
        project_id: Option<Uuid>,
    ) -> AppResult<Vec<Cycle>> {
        let cycles = sqlx::query_as::<_, Cycle>(&format!(
            r#"
            SELECT {CYCLE_COLUMNS}
            FROM cycles
            WHERE organization_id = $1
              AND ($2::uuid IS NULL OR project_id = $2)
            ORDER BY start_date DESC NULLS LAST, created_at DESC
            "#
        ))
        .bind(organization_id)
        .bind(project_id)
        .fetch_all(&self.db)
        .await?;

        Ok(cycles)
    }

    /// Get a single cycle
    pub async fn get_cycle(&self, organization_id: Uuid, cycle_id: Uuid) -> AppResult<Cycle> {
        sqlx::query_as::<_, Cycle>(&format!(
            "SELECT {CYCLE_COLUMNS} FROM cycles WHERE id = $1 AND organization_id = $2"
        ))
        .bind(cycle_id)
        .bind(organization_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Cycle".to_string()))
    }

    /// Set or clear the inventory lock. Admin only.
    pub async fn set_inventory_lock(
        &self,
        user: &AuthUser,
        cycle_id: Uuid,
        locked: bool,
    ) -> AppResult<Cycle> {
        if !user.is_admin() {
            return Err(AppError::Forbidden(
                "Only admins can change cycle inventory locks".to_string(),
            ));
        }

        sqlx::query_as::<_, Cycle>(&format!(
            r#"
            UPDATE cycles
            SET inventory_locked = $1
            WHERE id = $2 AND organization_id = $3
            RETURNING {CYCLE_COLUMNS}
            "#
        ))
        .bind(locked)
        .bind(cycle_id)
        .bind(user.organization_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Cycle".to_string()))
    }
}
