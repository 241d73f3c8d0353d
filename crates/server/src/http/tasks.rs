// SPDX-License-Identifier: MIT

//! Task routes.

use super::{ApiResult, AppState, Json};
use axum::extract::{Path, Query, State};

use maestro_core::{Task, TaskId, TaskStatus};
use maestro_engine::services::{CreateTask, TaskPatch};
use maestro_storage::TaskFilter;
use serde::Deserialize;

pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateTask>,
) -> ApiResult<Json<Task>> {
    Ok(Json(state.services.tasks.create_task(input).await?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub project_id: Option<maestro_core::ProjectId>,
    pub parent_id: Option<TaskId>,
    pub status: Option<TaskStatus>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<Vec<Task>> {
    let filter = TaskFilter {
        project_id: query.project_id,
        parent_id: query.parent_id,
        status: query.status,
    };
    Json(state.services.tasks.list_tasks(&filter))
}

pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<TaskId>,
) -> ApiResult<Json<Task>> {
    Ok(Json(state.services.tasks.get_task(&id)?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<TaskId>,
    Json(patch): Json<TaskPatch>,
) -> ApiResult<Json<Task>> {
    Ok(Json(state.services.tasks.update_task(&id, patch).await?))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<TaskId>,
) -> ApiResult<Json<serde_json::Value>> {
    state.services.tasks.delete_task(&id).await?;
    Ok(Json(serde_json::json!({"deleted": id})))
}

pub async fn children(
    State(state): State<AppState>,
    Path(id): Path<TaskId>,
) -> ApiResult<Json<Vec<Task>>> {
    Ok(Json(state.services.tasks.children_of(&id)?))
}
