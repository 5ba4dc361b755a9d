//! HTTP handlers for project and team endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::projects::{
    CreateProjectInput, CreateTeamInput, MemberInput, Project, ProjectService, Team,
    TeamAssignmentInput,
};
use crate::AppState;

/// Create a project (admin only)
pub async fn create_project(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateProjectInput>,
) -> AppResult<Json<Project>> {
    let service = ProjectService::new(state.db);
    let project = service.create_project(&current_user.0, input).await?;
    Ok(Json(project))
}

/// List projects visible to the user
pub async fn list_projects(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<Project>>> {
    let service = ProjectService::new(state.db);
    let projects = service.list_projects(&current_user.0).await?;
    Ok(Json(projects))
}

/// Assign a user to a project (admin only)
pub async fn add_project_member(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(project_id): Path<Uuid>,
    Json(input): Json<MemberInput>,
) -> AppResult<Json<()>> {
    let service = ProjectService::new(state.db);
    service.add_member(&current_user.0, project_id, input).await?;
    Ok(Json(()))
}

/// Remove a user from a project (admin only)
pub async fn remove_project_member(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path((project_id, user_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<()>> {
    let service = ProjectService::new(state.db);
    service
        .remove_member(&current_user.0, project_id, user_id)
        .await?;
    Ok(Json(()))
}

/// Assign a team to a project (admin only)
pub async fn assign_project_team(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(project_id): Path<Uuid>,
    Json(input): Json<TeamAssignmentInput>,
) -> AppResult<Json<()>> {
    let service = ProjectService::new(state.db);
    service
        .assign_team(&current_user.0, project_id, input)
        .await?;
    Ok(Json(()))
}

/// Create a team (admin only)
pub async fn create_team(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateTeamInput>,
) -> AppResult<Json<Team>> {
    let service = ProjectService::new(state.db);
    let team = service.create_team(&current_user.0, input).await?;
    Ok(Json(team))
}

/// List teams
pub async fn list_teams(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<Team>>> {
    let service = ProjectService::new(state.db);
    let teams = service.list_teams(current_user.0.organization_id).await?;
    Ok(Json(teams))
}

/// Add a user to a team (admin only)
pub async fn add_team_member(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(team_id): Path<Uuid>,
    Json(input): Json<MemberInput>,
) -> AppResult<Json<()>> {
    let service = ProjectService::new(state.db);
    service
        .add_team_member(&current_user.0, team_id, input)
        .await?;
    Ok(Json(()))
}
