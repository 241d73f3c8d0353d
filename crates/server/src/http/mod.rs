// SPDX-License-Identifier: MIT

//! REST surface.
//!
//! Thin handlers: deserialize, call the owning service, map the typed
//! error onto a status code and the `{error, code, message}` body.

mod mail;
mod misc;
mod projects;
mod queues;
mod sessions;
mod tasks;
mod teams;

use axum::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::Router;
use maestro_core::{DomainError, SystemClock};
use maestro_engine::{DigestService, Services, SpawnService};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Everything handlers need, cheaply cloneable.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

pub struct AppStateInner {
    pub services: Services<SystemClock>,
    pub digest: DigestService<SystemClock>,
    pub spawner: SpawnService<SystemClock>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        services: Services<SystemClock>,
        digest: DigestService<SystemClock>,
        spawner: SpawnService<SystemClock>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner { services, digest, spawner, started_at: Instant::now() }),
        }
    }
}

impl std::ops::Deref for AppState {
    type Target = AppStateInner;

    fn deref(&self) -> &AppStateInner {
        &self.inner
    }
}

/// Wire error: `{error: true, code, message}` with the mapped status.
pub struct ApiError {
    status: StatusCode,
    code: String,
    message: String,
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        let status = match &err {
            DomainError::Validation(_) => StatusCode::BAD_REQUEST,
            DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
            DomainError::BusinessRule(_) => StatusCode::CONFLICT,
            DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
            DomainError::ManifestGeneration { .. } | DomainError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self { status, code: err.code().to_string(), message: err.to_string() }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "validation_failed".into(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": true,
            "code": self.code,
            "message": self.message,
        });
        (self.status, axum::Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// JSON extractor whose rejection carries the wire error shape with 400
/// instead of axum's default 422.
pub struct Json<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for Json<T>
where
    axum::Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let axum::Json(value) = axum::Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

impl<T: serde::Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// The full route table.
pub fn router(state: AppState) -> Router {
    Router::new()
        // projects
        .route("/api/projects", post(projects::create).get(projects::list))
        .route(
            "/api/projects/:id",
            get(projects::get_one).put(projects::update).delete(projects::remove),
        )
        .route("/api/projects/:id/master", post(projects::set_master))
        // tasks
        .route("/api/tasks", post(tasks::create).get(tasks::list))
        .route(
            "/api/tasks/:id",
            get(tasks::get_one).patch(tasks::update).delete(tasks::remove),
        )
        .route("/api/tasks/:id/children", get(tasks::children))
        // sessions
        .route("/api/sessions", post(sessions::create).get(sessions::list))
        .route("/api/sessions/spawn", post(sessions::spawn))
        .route("/api/sessions/log-digests", get(sessions::batch_digest))
        .route(
            "/api/sessions/:id",
            get(sessions::get_one).patch(sessions::update).delete(sessions::remove),
        )
        .route("/api/sessions/:id/prompt", post(sessions::prompt))
        .route("/api/sessions/:id/log-digest", get(sessions::digest))
        .route("/api/sessions/:id/timeline", post(sessions::add_timeline_event))
        .route("/api/sessions/:id/docs", post(sessions::add_doc))
        .route(
            "/api/sessions/:id/tasks/:task_id",
            post(sessions::add_task).delete(sessions::remove_task),
        )
        // mail
        .route("/api/mail", post(mail::send))
        .route("/api/mail/inbox", get(mail::inbox))
        .route("/api/mail/wait", get(mail::wait))
        .route("/api/mail/thread/:thread_id", get(mail::thread))
        .route("/api/mail/:id", delete(mail::remove))
        // queues
        .route("/api/queues", post(queues::create))
        .route("/api/queues/:session_id", get(queues::get_one))
        .route("/api/queues/:session_id/start", post(queues::start))
        .route("/api/queues/:session_id/complete", post(queues::complete))
        .route("/api/queues/:session_id/fail", post(queues::fail))
        .route("/api/queues/:session_id/skip", post(queues::skip))
        .route("/api/queues/:session_id/push", post(queues::push))
        .route("/api/queues/:session_id/stats", get(queues::stats))
        // team members & teams
        .route("/api/team-members", post(teams::create_member).get(teams::list_members))
        .route(
            "/api/team-members/:id",
            get(teams::get_member).patch(teams::update_member).delete(teams::delete_member),
        )
        .route("/api/team-members/:id/archive", post(teams::archive_member))
        .route("/api/team-members/:id/reset", post(teams::reset_member))
        .route("/api/teams", post(teams::create_team).get(teams::list_teams))
        .route(
            "/api/teams/:id",
            get(teams::get_team).patch(teams::update_team).delete(teams::delete_team),
        )
        .route("/api/teams/:id/sub-teams/:child_id", post(teams::add_sub_team).delete(teams::remove_sub_team))
        // task lists, templates, orderings, health
        .route("/api/task-lists", post(misc::create_task_list).get(misc::list_task_lists))
        .route(
            "/api/task-lists/:id",
            get(misc::get_task_list).patch(misc::update_task_list).delete(misc::delete_task_list),
        )
        .route("/api/templates/:role", get(misc::get_template).put(misc::set_template))
        .route("/api/templates/:role/reset", post(misc::reset_template))
        .route(
            "/api/orderings/:project_id/:entity_type",
            get(misc::get_ordering).put(misc::set_ordering),
        )
        .route("/api/health", get(misc::health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
