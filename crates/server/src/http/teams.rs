// SPDX-License-Identifier: MIT

//! Team member and team routes.
//!
//! Member routes take the owning project via the `projectId` query
//! parameter, since default members exist in every project.

use super::{ApiResult, AppState, Json};
use axum::extract::{Path, Query, State};

use maestro_core::{ProjectId, Team, TeamId, TeamMember, TeamMemberId, TeamMemberPatch};
use maestro_engine::services::{CreateTeam, CreateTeamMember, TeamPatch};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectScope {
    pub project_id: ProjectId,
}

pub async fn create_member(
    State(state): State<AppState>,
    Json(input): Json<CreateTeamMember>,
) -> ApiResult<Json<TeamMember>> {
    Ok(Json(state.services.members.create_member(input).await?))
}

pub async fn list_members(
    State(state): State<AppState>,
    Query(scope): Query<ProjectScope>,
) -> Json<Vec<TeamMember>> {
    Json(state.services.members.list_members(&scope.project_id))
}

pub async fn get_member(
    State(state): State<AppState>,
    Path(id): Path<TeamMemberId>,
    Query(scope): Query<ProjectScope>,
) -> ApiResult<Json<TeamMember>> {
    Ok(Json(state.services.members.get_member(&scope.project_id, &id)?))
}

pub async fn update_member(
    State(state): State<AppState>,
    Path(id): Path<TeamMemberId>,
    Query(scope): Query<ProjectScope>,
    Json(patch): Json<TeamMemberPatch>,
) -> ApiResult<Json<TeamMember>> {
    Ok(Json(state.services.members.update_member(&scope.project_id, &id, patch).await?))
}

pub async fn archive_member(
    State(state): State<AppState>,
    Path(id): Path<TeamMemberId>,
    Query(scope): Query<ProjectScope>,
) -> ApiResult<Json<TeamMember>> {
    Ok(Json(state.services.members.archive_member(&scope.project_id, &id).await?))
}

pub async fn reset_member(
    State(state): State<AppState>,
    Path(id): Path<TeamMemberId>,
    Query(scope): Query<ProjectScope>,
) -> ApiResult<Json<TeamMember>> {
    Ok(Json(state.services.members.reset_default(&scope.project_id, &id).await?))
}

pub async fn delete_member(
    State(state): State<AppState>,
    Path(id): Path<TeamMemberId>,
    Query(scope): Query<ProjectScope>,
) -> ApiResult<Json<serde_json::Value>> {
    state.services.members.delete_member(&scope.project_id, &id).await?;
    Ok(Json(serde_json::json!({"deleted": id})))
}

pub async fn create_team(
    State(state): State<AppState>,
    Json(input): Json<CreateTeam>,
) -> ApiResult<Json<Team>> {
    Ok(Json(state.services.teams.create_team(input).await?))
}

pub async fn list_teams(
    State(state): State<AppState>,
    Query(scope): Query<ProjectScope>,
) -> Json<Vec<Team>> {
    Json(state.services.teams.list_teams(&scope.project_id))
}

pub async fn get_team(
    State(state): State<AppState>,
    Path(id): Path<TeamId>,
) -> ApiResult<Json<Team>> {
    Ok(Json(state.services.teams.get_team(&id)?))
}

pub async fn update_team(
    State(state): State<AppState>,
    Path(id): Path<TeamId>,
    Json(patch): Json<TeamPatch>,
) -> ApiResult<Json<Team>> {
    Ok(Json(state.services.teams.update_team(&id, patch).await?))
}

pub async fn delete_team(
    State(state): State<AppState>,
    Path(id): Path<TeamId>,
) -> ApiResult<Json<serde_json::Value>> {
    state.services.teams.delete_team(&id).await?;
    Ok(Json(serde_json::json!({"deleted": id})))
}

pub async fn add_sub_team(
    State(state): State<AppState>,
    Path((id, child_id)): Path<(TeamId, TeamId)>,
) -> ApiResult<Json<Team>> {
    Ok(Json(state.services.teams.add_sub_team(&id, &child_id).await?))
}

pub async fn remove_sub_team(
    State(state): State<AppState>,
    Path((id, child_id)): Path<(TeamId, TeamId)>,
) -> ApiResult<Json<Team>> {
    Ok(Json(state.services.teams.remove_sub_team(&id, &child_id).await?))
}
