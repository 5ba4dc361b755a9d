//! Project and team management
//!
//! These are the write paths the access guard reads from: direct project
//! membership and team-based assignment. Structural changes are admin-only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::services::access::AccessService;

/// Project service
#[derive(Clone)]
pub struct ProjectService {
    db: PgPool,
    access: AccessService,
}

/// Project record
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Project {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Overrides the organization currency for amounts in this project
    pub currency_code: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Team record
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Team {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a project
#[derive(Debug, Deserialize)]
pub struct CreateProjectInput {
    pub name: String,
    pub description: Option<String>,
    pub currency_code: Option<String>,
}

/// Input for creating a team
#[derive(Debug, Deserialize)]
pub struct CreateTeamInput {
    pub name: String,
}

/// Input naming a user
#[derive(Debug, Deserialize)]
pub struct MemberInput {
    pub user_id: Uuid,
}

/// Input naming a team
#[derive(Debug, Deserialize)]
pub struct TeamAssignmentInput {
    pub team_id: Uuid,
}

const PROJECT_COLUMNS: &str =
    "id, organization_id, name, description, currency_code, created_by, created_at";

impl ProjectService {
    /// Create a new ProjectService instance
    pub fn new(db: PgPool) -> Self {
        let access = AccessService::new(db.clone());
        Self { db, access }
    }

    fn require_admin(user: &AuthUser) -> AppResult<()> {
        if user.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Only admins can manage projects and teams".to_string(),
            ))
        }
    }

    /// Create a project. Admin only.
    pub async fn create_project(
        &self,
        user: &AuthUser,
        input: CreateProjectInput,
    ) -> AppResult<Project> {
        Self::require_admin(user)?;

        let name = input.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Project name must not be empty".to_string(),
            });
        }

        let project = sqlx::query_as::<_, Project>(&format!(
            r#"
            INSERT INTO projects (organization_id, name, description, currency_code, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(user.organization_id)
        .bind(name)
        .bind(&input.description)
        .bind(input.currency_code.as_deref().map(str::to_uppercase))
        .bind(user.user_id)
        .fetch_one(&self.db)
        .await?;

        Ok(project)
    }

    /// List projects the user can see: all for admins, assigned ones for
    /// members.
    pub async fn list_projects(&self, user: &AuthUser) -> AppResult<Vec<Project>> {
        let accessible = self.access.accessible_project_ids(user).await?;

        let projects = sqlx::query_as::<_, Project>(&format!(
            r#"
            SELECT {PROJECT_COLUMNS}
            FROM projects
            WHERE organization_id = $1
              AND ($2::uuid[] IS NULL OR id = ANY($2))
            ORDER BY name
            "#
        ))
        .bind(user.organization_id)
        .bind(accessible)
        .fetch_all(&self.db)
        .await?;

        Ok(projects)
    }

    /// Assign a user to a project. Admin only.
    pub async fn add_member(
        &self,
        user: &AuthUser,
        project_id: Uuid,
        input: MemberInput,
    ) -> AppResult<()> {
        Self::require_admin(user)?;
        self.access
            .ensure_project_in_org(user.organization_id, project_id)
            .await?;
        self.ensure_user_in_org(input.user_id, user.organization_id).await?;

        sqlx::query(
            r#"
            INSERT INTO project_members (project_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (project_id, user_id) DO NOTHING
            "#,
        )
        .bind(project_id)
        .bind(input.user_id)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// Remove a user from a project. Admin only.
    pub async fn remove_member(
        &self,
        user: &AuthUser,
        project_id: Uuid,
        member_id: Uuid,
    ) -> AppResult<()> {
        Self::require_admin(user)?;
        self.access
            .ensure_project_in_org(user.organization_id, project_id)
            .await?;

        let result =
            sqlx::query("DELETE FROM project_members WHERE project_id = $1 AND user_id = $2")
                .bind(project_id)
                .bind(member_id)
                .execute(&self.db)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Project member".to_string()));
        }
        Ok(())
    }

    /// Assign a team to a project. Admin only.
    pub async fn assign_team(
        &self,
        user: &AuthUser,
        project_id: Uuid,
        input: TeamAssignmentInput,
    ) -> AppResult<()> {
        Self::require_admin(user)?;
        self.access
            .ensure_project_in_org(user.organization_id, project_id)
            .await?;

        let team_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM teams WHERE id = $1 AND organization_id = $2)",
        )
        .bind(input.team_id)
        .bind(user.organization_id)
        .fetch_one(&self.db)
        .await?;
        if !team_exists {
            return Err(AppError::NotFound("Team".to_string()));
        }

        sqlx::query(
            r#"
            INSERT INTO project_teams (project_id, team_id)
            VALUES ($1, $2)
            ON CONFLICT (project_id, team_id) DO NOTHING
            "#,
        )
        .bind(project_id)
        .bind(input.team_id)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// Create a team. Admin only.
    pub async fn create_team(&self, user: &AuthUser, input: CreateTeamInput) -> AppResult<Team> {
        Self::require_admin(user)?;

        let name = input.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Team name must not be empty".to_string(),
            });
        }

        let team = sqlx::query_as::<_, Team>(
            r#"
            INSERT INTO teams (organization_id, name)
            VALUES ($1, $2)
            RETURNING id, organization_id, name, created_at
            "#,
        )
        .bind(user.organization_id)
        .bind(name)
        .fetch_one(&self.db)
        .await?;

        Ok(team)
    }

    /// List teams in the organization
    pub async fn list_teams(&self, organization_id: Uuid) -> AppResult<Vec<Team>> {
        let teams = sqlx::query_as::<_, Team>(
            "SELECT id, organization_id, name, created_at FROM teams \
             WHERE organization_id = $1 ORDER BY name",
        )
        .bind(organization_id)
        .fetch_all(&self.db)
        .await?;

        Ok(teams)
    }

    /// Add a user to a team. Admin only.
    pub async fn add_team_member(
        &self,
        user: &AuthUser,
        team_id: Uuid,
        input: MemberInput,
    ) -> AppResult<()> {
        Self::require_admin(user)?;

        let team_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM teams WHERE id = $1 AND organization_id = $2)",
        )
        .bind(team_id)
        .bind(user.organization_id)
        .fetch_one(&self.db)
        .await?;
        if !team_exists {
            return Err(AppError::NotFound("Team".to_string()));
        }
        self.ensure_user_in_org(input.user_id, user.organization_id).await?;

        sqlx::query(
            r#"
            INSERT INTO team_members (team_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (team_id, user_id) DO NOTHING
            "#,
        )
        .bind(team_id)
        .bind(input.user_id)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn ensure_user_in_org(&self, user_id: Uuid, organization_id: Uuid) -> AppResult<()> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE id = $1 AND organization_id = $2)",
        )
        .bind(user_id)
        .bind(organization_id)
        .fetch_one(&self.db)
        .await?;

        if !exists {
            return Err(AppError::NotFound("User".to_string()));
        }
        Ok(())
    }
}
