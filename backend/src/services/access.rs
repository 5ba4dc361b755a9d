//! Project access guard
//!
//! Admins see every project in their organization. Members must be assigned
//! to a project directly or through a team the project is assigned to. The
//! guard runs before any transaction is opened so denied requests never
//! touch the database mutation path.

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;

/// Access guard service
#[derive(Clone)]
pub struct AccessService {
    db: PgPool,
}

impl AccessService {
    /// Create a new AccessService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Verify the project exists inside the user's organization.
    pub async fn ensure_project_in_org(
        &self,
        organization_id: Uuid,
        project_id: Uuid,
    ) -> AppResult<()> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM projects WHERE id = $1 AND organization_id = $2)",
        )
        .bind(project_id)
        .bind(organization_id)
        .fetch_one(&self.db)
        .await?;

        if !exists {
            return Err(AppError::NotFound("Project".to_string()));
        }
        Ok(())
    }

    /// Allow admins through; everyone else must be assigned to the project
    /// directly or via a team. A missing project forbids non-admins.
    pub async fn assert_project_access(
        &self,
        user: &AuthUser,
        project_id: Option<Uuid>,
    ) -> AppResult<()> {
        if user.is_admin() {
            return Ok(());
        }

        let Some(project_id) = project_id else {
            return Err(AppError::Forbidden(
                "You are not assigned to this project".to_string(),
            ));
        };

        let allowed = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM project_members pm
                JOIN projects p ON p.id = pm.project_id
                WHERE pm.project_id = $1 AND pm.user_id = $2 AND p.organization_id = $3
                UNION
                SELECT 1 FROM project_teams pt
                JOIN team_members tm ON tm.team_id = pt.team_id
                JOIN projects p ON p.id = pt.project_id
                WHERE pt.project_id = $1 AND tm.user_id = $2 AND p.organization_id = $3
            )
            "#,
        )
        .bind(project_id)
        .bind(user.user_id)
        .bind(user.organization_id)
        .fetch_one(&self.db)
        .await?;

        if !allowed {
            return Err(AppError::Forbidden(
                "You are not assigned to this project".to_string(),
            ));
        }
        Ok(())
    }

    /// Project ids the user may read. `None` means unrestricted (admin).
    pub async fn accessible_project_ids(&self, user: &AuthUser) -> AppResult<Option<Vec<Uuid>>> {
        if user.is_admin() {
            return Ok(None);
        }

        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT pm.project_id FROM project_members pm
            JOIN projects p ON p.id = pm.project_id
            WHERE pm.user_id = $1 AND p.organization_id = $2
            UNION
            SELECT pt.project_id FROM project_teams pt
            JOIN team_members tm ON tm.team_id = pt.team_id
            JOIN projects p ON p.id = pt.project_id
            WHERE tm.user_id = $1 AND p.organization_id = $2
            "#,
        )
        .bind(user.user_id)
        .bind(user.organization_id)
        .fetch_all(&self.db)
        .await?;

        Ok(Some(ids))
    }
}
