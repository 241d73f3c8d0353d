// SPDX-License-Identifier: MIT

use super::*;
use crate::config::Config;
use crate::lifecycle::build_state;
use axum::body::Body;
use axum::http::{header, Request};
use maestro_engine::EventBus;
use serde_json::{json, Value};
use tower::ServiceExt;

struct TestApp {
    _dir: tempfile::TempDir,
    router: Router,
    bus: EventBus,
}

fn app() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        state_dir: dir.path().join("state"),
        sessions_dir: dir.path().join("sessions"),
        ..Config::default()
    };
    let bus = EventBus::new();
    let state = build_state(&config, bus.clone()).unwrap();
    TestApp { _dir: dir, router: router(state), bus }
}

async fn call(
    app: &TestApp,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let request = match body {
        Some(value) => Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => Request::builder().method(method).uri(uri).body(Body::empty()).unwrap(),
    };
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn create_project(app: &TestApp) -> String {
    let (status, body) = call(
        app,
        "POST",
        "/api/projects",
        Some(json!({"name": "demo", "workingDir": "/work/demo"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["id"].as_str().unwrap().to_string()
}

async fn create_task(app: &TestApp, project_id: &str, title: &str) -> String {
    let (status, body) = call(
        app,
        "POST",
        "/api/tasks",
        Some(json!({"projectId": project_id, "title": title})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn project_crud_roundtrip() {
    let app = app();
    let id = create_project(&app).await;

    let (status, body) = call(&app, "GET", &format!("/api/projects/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "demo");

    let (status, body) = call(
        &app,
        "PUT",
        &format!("/api/projects/{id}"),
        Some(json!({"name": "renamed"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "renamed");

    let (status, _) = call(&app, "DELETE", &format!("/api/projects/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = call(&app, "GET", &format!("/api/projects/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], true);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn validation_errors_use_the_wire_shape() {
    let app = app();
    let (status, body) = call(
        &app,
        "POST",
        "/api/projects",
        Some(json!({"name": "   ", "workingDir": "/w"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], true);
    assert_eq!(body["code"], "validation_failed");
    assert!(body["message"].as_str().unwrap().contains("name"));
}

#[tokio::test]
async fn project_with_tasks_conflicts_on_delete() {
    let app = app();
    let pid = create_project(&app).await;
    create_task(&app, &pid, "t").await;

    let (status, body) = call(&app, "DELETE", &format!("/api/projects/{pid}"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "business_rule_violation");
}

#[tokio::test]
async fn task_list_filters_by_query() {
    let app = app();
    let pid = create_project(&app).await;
    let tid = create_task(&app, &pid, "a").await;
    create_task(&app, &pid, "b").await;

    let (_, body) = call(
        &app,
        "PATCH",
        &format!("/api/tasks/{tid}"),
        Some(json!({"status": "in_progress"})),
    )
    .await;
    assert_eq!(body["status"], "in_progress");

    let (status, body) = call(
        &app,
        "GET",
        &format!("/api/tasks?projectId={pid}&status=in_progress"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["id"], tid.as_str());
}

#[tokio::test]
async fn agent_updates_cannot_change_user_fields() {
    let app = app();
    let pid = create_project(&app).await;
    let tid = create_task(&app, &pid, "a").await;

    let (status, body) = call(
        &app,
        "PATCH",
        &format!("/api/tasks/{tid}"),
        Some(json!({
            "updateSource": "session",
            "sessionId": "sess_agent",
            "sessionStatus": "completed",
            "status": "completed",
            "title": "hijacked"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "pending");
    assert_eq!(body["title"], "a");
    assert_eq!(body["taskSessionStatuses"]["sess_agent"], "completed");
}

#[tokio::test]
async fn cascade_delete_children_endpoint() {
    let app = app();
    let pid = create_project(&app).await;
    let parent = create_task(&app, &pid, "parent").await;
    let (_, child) = call(
        &app,
        "POST",
        "/api/tasks",
        Some(json!({"projectId": pid, "title": "child", "parentId": parent})),
    )
    .await;
    let child_id = child["id"].as_str().unwrap().to_string();

    let (status, body) = call(&app, "GET", &format!("/api/tasks/{parent}/children"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["id"], child_id.as_str());

    let (status, _) = call(&app, "DELETE", &format!("/api/tasks/{parent}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(&app, "GET", &format!("/api/tasks/{child_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn session_create_and_sticky_complete() {
    let app = app();
    let pid = create_project(&app).await;
    let tid = create_task(&app, &pid, "a").await;

    let (status, session) = call(
        &app,
        "POST",
        "/api/sessions",
        Some(json!({"projectId": pid, "taskIds": [tid]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let sid = session["id"].as_str().unwrap().to_string();
    assert_eq!(session["status"], "spawning");

    let (_, updated) = call(
        &app,
        "PATCH",
        &format!("/api/sessions/{sid}"),
        Some(json!({"status": "completed"})),
    )
    .await;
    assert_eq!(updated["status"], "completed");

    // The stop report is dropped and the response shows completed.
    let (status, after) = call(
        &app,
        "PATCH",
        &format!("/api/sessions/{sid}"),
        Some(json!({"status": "stopped"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(after["status"], "completed");
}

#[tokio::test]
async fn spawn_requires_tasks_and_emits_consolidated_event() {
    let app = app();
    let pid = create_project(&app).await;
    let tid = create_task(&app, &pid, "a").await;

    let (status, body) = call(
        &app,
        "POST",
        "/api/sessions/spawn",
        Some(json!({
            "projectId": pid,
            "taskIds": [],
            "spawnSource": "manual",
            "role": "worker"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_failed");

    let created = std::sync::Arc::new(parking_lot::Mutex::new(Vec::new()));
    let sink = std::sync::Arc::clone(&created);
    app.bus.on(maestro_core::Topic::SessionCreated, move |event| {
        sink.lock().push(event.payload_json());
        Ok(())
    });

    let (status, session) = call(
        &app,
        "POST",
        "/api/sessions/spawn",
        Some(json!({
            "projectId": pid,
            "taskIds": [tid],
            "spawnSource": "manual",
            "role": "worker"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["status"], "spawning");
    assert_eq!(session["env"]["MAESTRO_SERVER_URL"], "http://127.0.0.1:8700");

    let events = created.lock();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["_isSpawnCreated"], true);
}

#[tokio::test]
async fn prompt_maps_errors_per_contract() {
    let app = app();
    let pid = create_project(&app).await;
    let (_, session) =
        call(&app, "POST", "/api/sessions", Some(json!({"projectId": pid}))).await;
    let sid = session["id"].as_str().unwrap().to_string();

    let (status, _) = call(
        &app,
        "POST",
        "/api/sessions/sess_ghost/prompt",
        Some(json!({"content": "hi", "mode": "send"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(
        &app,
        "POST",
        &format!("/api/sessions/{sid}/prompt"),
        Some(json!({"content": "  ", "mode": "send"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        &app,
        "POST",
        &format!("/api/sessions/{sid}/prompt"),
        Some(json!({"content": "hi", "mode": "teleport"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        &app,
        "POST",
        &format!("/api/sessions/{sid}/prompt"),
        Some(json!({"content": "hi", "mode": "paste", "senderSessionId": "sess_coord"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn mail_inbox_is_priority_ordered() {
    let app = app();
    let pid = create_project(&app).await;
    let (_, session) =
        call(&app, "POST", "/api/sessions", Some(json!({"projectId": pid, "status": "idle"})))
            .await;
    let sid = session["id"].as_str().unwrap().to_string();

    for (priority, subject) in
        [("normal", "a"), ("critical", "b"), ("high", "c")]
    {
        let (status, _) = call(
            &app,
            "POST",
            "/api/mail",
            Some(json!({
                "projectId": pid,
                "fromSessionId": "sess_sender",
                "toSessionId": sid,
                "subject": subject,
                "body": "x",
                "priority": priority
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, inbox) = call(
        &app,
        "GET",
        &format!("/api/mail/inbox?projectId={pid}&sessionId={sid}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let subjects: Vec<&str> =
        inbox.as_array().unwrap().iter().map(|m| m["subject"].as_str().unwrap()).collect();
    assert_eq!(subjects, vec!["b", "c", "a"]);
}

#[tokio::test]
async fn mail_wait_times_out_with_empty_list() {
    let app = app();
    let pid = create_project(&app).await;

    let (status, body) = call(
        &app,
        "GET",
        &format!("/api/mail/wait?projectId={pid}&sessionId=sess_x&timeout=100"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn queue_flow_over_http() {
    let app = app();
    let pid = create_project(&app).await;
    let tid = create_task(&app, &pid, "a").await;
    let (_, session) =
        call(&app, "POST", "/api/sessions", Some(json!({"projectId": pid}))).await;
    let sid = session["id"].as_str().unwrap().to_string();

    let (status, _) = call(
        &app,
        "POST",
        "/api/queues",
        Some(json!({"sessionId": sid, "taskIds": [tid]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, started) = call(&app, "POST", &format!("/api/queues/{sid}/start"), None).await;
    assert_eq!(started["currentIndex"], 0);

    let (_, completed) = call(&app, "POST", &format!("/api/queues/{sid}/complete"), None).await;
    assert_eq!(completed["currentIndex"], -1);

    let (status, body) = call(&app, "POST", &format!("/api/queues/{sid}/complete"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_failed");

    let (_, stats) = call(&app, "GET", &format!("/api/queues/{sid}/stats"), None).await;
    assert_eq!(stats["completed"], 1);
}

#[tokio::test]
async fn default_member_delete_is_forbidden() {
    let app = app();
    let pid = create_project(&app).await;
    let (status, _) = call(
        &app,
        "POST",
        &format!("/api/team-members/tm_default_lead/archive?projectId={pid}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(
        &app,
        "DELETE",
        &format!("/api/team-members/tm_default_lead?projectId={pid}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "forbidden");
}

#[tokio::test]
async fn health_reports_ok() {
    let app = app();
    let (status, body) = call(&app, "GET", "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
