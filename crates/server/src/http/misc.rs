// SPDX-License-Identifier: MIT

//! Task list, template, ordering, and health routes.

use super::{ApiResult, AppState, Json};
use axum::extract::{Path, Query, State};

use maestro_core::{Ordering, ProjectId, TaskId, TaskList, TaskListId, Template};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskListBody {
    pub project_id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub ordered_task_ids: Vec<TaskId>,
}

pub async fn create_task_list(
    State(state): State<AppState>,
    Json(body): Json<CreateTaskListBody>,
) -> ApiResult<Json<TaskList>> {
    Ok(Json(
        state
            .services
            .task_lists
            .create_list(body.project_id, body.name, body.ordered_task_ids)
            .await?,
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectScope {
    pub project_id: ProjectId,
}

pub async fn list_task_lists(
    State(state): State<AppState>,
    Query(scope): Query<ProjectScope>,
) -> Json<Vec<TaskList>> {
    Json(state.services.task_lists.list_lists(&scope.project_id))
}

pub async fn get_task_list(
    State(state): State<AppState>,
    Path(id): Path<TaskListId>,
) -> ApiResult<Json<TaskList>> {
    Ok(Json(state.services.task_lists.get_list(&id)?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub ordered_task_ids: Option<Vec<TaskId>>,
}

pub async fn update_task_list(
    State(state): State<AppState>,
    Path(id): Path<TaskListId>,
    Json(patch): Json<TaskListPatch>,
) -> ApiResult<Json<TaskList>> {
    Ok(Json(
        state.services.task_lists.update_list(&id, patch.name, patch.ordered_task_ids).await?,
    ))
}

pub async fn delete_task_list(
    State(state): State<AppState>,
    Path(id): Path<TaskListId>,
) -> ApiResult<Json<serde_json::Value>> {
    state.services.task_lists.delete_list(&id).await?;
    Ok(Json(serde_json::json!({"deleted": id})))
}

pub async fn get_template(
    State(state): State<AppState>,
    Path(role): Path<String>,
) -> ApiResult<Json<Template>> {
    Ok(Json(state.services.templates.get_template(&role)?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateBody {
    pub content: String,
}

pub async fn set_template(
    State(state): State<AppState>,
    Path(role): Path<String>,
    Json(body): Json<TemplateBody>,
) -> ApiResult<Json<Template>> {
    Ok(Json(state.services.templates.set_template(&role, body.content).await?))
}

pub async fn reset_template(
    State(state): State<AppState>,
    Path(role): Path<String>,
) -> ApiResult<Json<Template>> {
    Ok(Json(state.services.templates.reset_template(&role).await?))
}

pub async fn get_ordering(
    State(state): State<AppState>,
    Path((project_id, entity_type)): Path<(ProjectId, String)>,
) -> Json<Ordering> {
    Json(state.services.orderings.get_ordering(&project_id, &entity_type))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderingBody {
    pub ordered_ids: Vec<String>,
}

pub async fn set_ordering(
    State(state): State<AppState>,
    Path((project_id, entity_type)): Path<(ProjectId, String)>,
    Json(body): Json<OrderingBody>,
) -> ApiResult<Json<Ordering>> {
    Ok(Json(
        state.services.orderings.set_ordering(&project_id, &entity_type, body.ordered_ids).await?,
    ))
}

pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptimeSeconds": state.started_at.elapsed().as_secs(),
    }))
}
