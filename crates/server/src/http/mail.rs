// SPDX-License-Identifier: MIT

//! Mail routes.

use super::{ApiResult, AppState, Json};
use axum::extract::{Path, Query, State};

use maestro_core::{Mail, MailId, ProjectId, SessionId};
use maestro_engine::services::{SendMail, WaitParams};
use serde::Deserialize;

pub async fn send(
    State(state): State<AppState>,
    Json(input): Json<SendMail>,
) -> ApiResult<Json<Vec<Mail>>> {
    Ok(Json(state.services.mail.send(input).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxQuery {
    pub project_id: ProjectId,
    pub session_id: SessionId,
}

pub async fn inbox(
    State(state): State<AppState>,
    Query(query): Query<InboxQuery>,
) -> Json<Vec<Mail>> {
    Json(state.services.mail.inbox(&query.project_id, &query.session_id))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitQuery {
    pub project_id: ProjectId,
    pub session_id: SessionId,
    #[serde(default)]
    pub since: Option<u64>,
    /// Milliseconds; capped server-side.
    #[serde(default)]
    pub timeout: Option<u64>,
}

pub async fn wait(
    State(state): State<AppState>,
    Query(query): Query<WaitQuery>,
) -> ApiResult<Json<Vec<Mail>>> {
    let mails = state
        .services
        .mail
        .wait_for_mail(WaitParams {
            project_id: query.project_id,
            session_id: query.session_id,
            since_ms: query.since.unwrap_or(0),
            timeout_ms: query.timeout,
        })
        .await?;
    Ok(Json(mails))
}

pub async fn thread(
    State(state): State<AppState>,
    Path(thread_id): Path<MailId>,
) -> Json<Vec<Mail>> {
    Json(state.services.mail.list_thread(&thread_id))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<MailId>,
) -> ApiResult<Json<serde_json::Value>> {
    state.services.mail.delete_mail(&id).await?;
    Ok(Json(serde_json::json!({"deleted": id})))
}
