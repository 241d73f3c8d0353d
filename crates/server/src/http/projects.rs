// SPDX-License-Identifier: MIT

//! Project routes.

use super::{ApiResult, AppState, Json};
use axum::extract::{Path, State};

use maestro_core::{Project, ProjectId};
use maestro_engine::services::{CreateProject, ProjectPatch};
use serde::Deserialize;

pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateProject>,
) -> ApiResult<Json<Project>> {
    Ok(Json(state.services.projects.create_project(input).await?))
}

pub async fn list(State(state): State<AppState>) -> Json<Vec<Project>> {
    Json(state.services.projects.list_projects())
}

pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<ProjectId>,
) -> ApiResult<Json<Project>> {
    Ok(Json(state.services.projects.get_project(&id)?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<ProjectId>,
    Json(patch): Json<ProjectPatch>,
) -> ApiResult<Json<Project>> {
    Ok(Json(state.services.projects.update_project(&id, patch).await?))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<ProjectId>,
) -> ApiResult<Json<serde_json::Value>> {
    state.services.projects.delete_project(&id).await?;
    Ok(Json(serde_json::json!({"deleted": id})))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetMaster {
    pub is_master: bool,
}

pub async fn set_master(
    State(state): State<AppState>,
    Path(id): Path<ProjectId>,
    Json(body): Json<SetMaster>,
) -> ApiResult<Json<Project>> {
    Ok(Json(state.services.projects.set_master_status(&id, body.is_master).await?))
}
