// SPDX-License-Identifier: MIT

//! Queue routes.

use super::{ApiResult, AppState, Json};
use axum::extract::{Path, State};

use maestro_core::{Queue, QueueStats, SessionId, TaskId};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBody {
    pub session_id: SessionId,
    #[serde(default)]
    pub task_ids: Vec<TaskId>,
}

pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateBody>,
) -> ApiResult<Json<Queue>> {
    Ok(Json(state.services.queues.create_queue(&body.session_id, body.task_ids).await?))
}

pub async fn get_one(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
) -> ApiResult<Json<Queue>> {
    Ok(Json(state.services.queues.get_queue(&session_id)?))
}

pub async fn start(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
) -> ApiResult<Json<Queue>> {
    Ok(Json(state.services.queues.start_item(&session_id).await?))
}

pub async fn complete(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
) -> ApiResult<Json<Queue>> {
    Ok(Json(state.services.queues.complete_item(&session_id).await?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailBody {
    #[serde(default)]
    pub reason: Option<String>,
}

pub async fn fail(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
    body: Option<Json<FailBody>>,
) -> ApiResult<Json<Queue>> {
    let reason = body.and_then(|Json(b)| b.reason);
    Ok(Json(state.services.queues.fail_item(&session_id, reason).await?))
}

pub async fn skip(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
) -> ApiResult<Json<Queue>> {
    Ok(Json(state.services.queues.skip_item(&session_id).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushBody {
    pub task_id: TaskId,
}

pub async fn push(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
    Json(body): Json<PushBody>,
) -> ApiResult<Json<Queue>> {
    Ok(Json(state.services.queues.push_item(&session_id, &body.task_id).await?))
}

pub async fn stats(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
) -> ApiResult<Json<QueueStats>> {
    Ok(Json(state.services.queues.get_stats(&session_id)?))
}
