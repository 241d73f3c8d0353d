// SPDX-License-Identifier: MIT

//! Session routes, including spawn, prompt delivery, and log digests.

use super::{ApiResult, AppState, Json};
use axum::extract::{Path, Query, State};

use maestro_core::{PromptMode, Session, SessionId, TaskId, TimelineEventType};
use maestro_engine::services::{CreateSession, SessionPatch};
use maestro_engine::{SessionDigest, SpawnRequest};
use maestro_storage::SessionFilter;
use serde::Deserialize;

pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateSession>,
) -> ApiResult<Json<Session>> {
    Ok(Json(state.services.sessions.create_session(input).await?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub project_id: Option<maestro_core::ProjectId>,
    pub task_id: Option<TaskId>,
    pub active: Option<bool>,
    pub parent_session_id: Option<SessionId>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<Vec<Session>> {
    let filter = SessionFilter {
        project_id: query.project_id,
        task_id: query.task_id,
        active: query.active,
        parent_session_id: query.parent_session_id,
    };
    Json(state.services.sessions.list_sessions(&filter))
}

pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
) -> ApiResult<Json<Session>> {
    Ok(Json(state.services.sessions.get_session(&id)?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
    Json(patch): Json<SessionPatch>,
) -> ApiResult<Json<Session>> {
    Ok(Json(state.services.sessions.update_session(&id, patch).await?))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
) -> ApiResult<Json<serde_json::Value>> {
    state.services.sessions.delete_session(&id).await?;
    Ok(Json(serde_json::json!({"deleted": id})))
}

pub async fn spawn(
    State(state): State<AppState>,
    Json(request): Json<SpawnRequest>,
) -> ApiResult<Json<Session>> {
    Ok(Json(state.spawner.spawn_session(request).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptBody {
    pub content: String,
    pub mode: PromptMode,
    #[serde(default)]
    pub sender_session_id: Option<SessionId>,
}

pub async fn prompt(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
    Json(body): Json<PromptBody>,
) -> ApiResult<Json<serde_json::Value>> {
    state
        .services
        .sessions
        .send_prompt(&id, body.content, body.mode, body.sender_session_id)
        .await?;
    Ok(Json(serde_json::json!({"delivered": id})))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineBody {
    #[serde(rename = "type")]
    pub event_type: TimelineEventType,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub task_id: Option<TaskId>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

pub async fn add_timeline_event(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
    Json(body): Json<TimelineBody>,
) -> ApiResult<Json<Session>> {
    Ok(Json(
        state
            .services
            .sessions
            .add_timeline_event(&id, body.event_type, body.message, body.task_id, body.metadata)
            .await?,
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocBody {
    pub title: String,
    pub content: String,
}

pub async fn add_doc(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
    Json(body): Json<DocBody>,
) -> ApiResult<Json<Session>> {
    Ok(Json(state.services.sessions.add_doc(&id, body.title, body.content).await?))
}

pub async fn add_task(
    State(state): State<AppState>,
    Path((id, task_id)): Path<(SessionId, TaskId)>,
) -> ApiResult<Json<serde_json::Value>> {
    state.services.sessions.add_task_to_session(&id, &task_id).await?;
    Ok(Json(serde_json::json!({"sessionId": id, "taskId": task_id})))
}

pub async fn remove_task(
    State(state): State<AppState>,
    Path((id, task_id)): Path<(SessionId, TaskId)>,
) -> ApiResult<Json<serde_json::Value>> {
    state.services.sessions.remove_task_from_session(&id, &task_id).await?;
    Ok(Json(serde_json::json!({"sessionId": id, "taskId": task_id})))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DigestQuery {
    pub last: Option<usize>,
    pub max_length: Option<usize>,
}

pub async fn digest(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
    Query(query): Query<DigestQuery>,
) -> ApiResult<Json<SessionDigest>> {
    Ok(Json(state.digest.get_digest(&id, query.last, query.max_length).await?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchDigestQuery {
    pub parent_session_id: Option<SessionId>,
    /// Comma-separated explicit list, alternative to `parentSessionId`.
    pub session_ids: Option<String>,
    pub last: Option<usize>,
    pub max_length: Option<usize>,
}

pub async fn batch_digest(
    State(state): State<AppState>,
    Query(query): Query<BatchDigestQuery>,
) -> ApiResult<Json<Vec<SessionDigest>>> {
    if let Some(parent) = query.parent_session_id {
        return Ok(Json(
            state.digest.get_worker_digests(&parent, query.last, query.max_length).await,
        ));
    }
    let ids: Vec<SessionId> = query
        .session_ids
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(SessionId::from_string)
        .collect();
    if ids.is_empty() {
        return Err(maestro_core::DomainError::validation(
            "parentSessionId or sessionIds is required",
        )
        .into());
    }
    Ok(Json(state.digest.get_digests(&ids, query.last, query.max_length).await))
}
