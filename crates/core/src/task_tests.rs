// SPDX-License-Identifier: MIT

use super::*;
use yare::parameterized;

#[test]
fn link_session_is_idempotent() {
    let mut task = TaskBuilder::default().build();
    let sid = SessionId::from_string("sess_1");
    task.link_session(sid);
    task.link_session(sid);
    assert_eq!(task.session_ids, vec![sid]);
}

#[test]
fn unlink_session_drops_status_entry() {
    let sid = SessionId::from_string("sess_1");
    let mut task = TaskBuilder::default()
        .session_ids(vec![sid])
        .task_session_statuses(HashMap::from([(sid, TaskSessionStatus::Working)]))
        .build();

    task.unlink_session(&sid);

    assert!(task.session_ids.is_empty());
    assert!(task.task_session_statuses.is_empty());
}

#[parameterized(
    completed = { TaskSessionStatus::Completed, true },
    failed = { TaskSessionStatus::Failed, true },
    skipped = { TaskSessionStatus::Skipped, true },
    working = { TaskSessionStatus::Working, false },
    queued = { TaskSessionStatus::Queued, false },
    blocked = { TaskSessionStatus::Blocked, false },
)]
fn session_status_terminality(status: TaskSessionStatus, terminal: bool) {
    assert_eq!(status.is_terminal(), terminal);
}

#[test]
fn wire_shape_uses_camel_case() {
    let task = TaskBuilder::default().title("t").parent_id("task_parent").build();
    let json = serde_json::to_value(&task).unwrap();
    assert_eq!(json["projectId"], "proj_test");
    assert_eq!(json["parentId"], "task_parent");
    assert_eq!(json["status"], "pending");
    assert_eq!(json["priority"], "medium");
    assert_eq!(json["sessionIds"], serde_json::json!([]));
}

#[test]
fn session_status_map_roundtrips() {
    let sid = SessionId::from_string("sess_9");
    let task = TaskBuilder::default()
        .task_session_statuses(HashMap::from([(sid, TaskSessionStatus::Queued)]))
        .build();

    let json = serde_json::to_string(&task).unwrap();
    let back: Task = serde_json::from_str(&json).unwrap();
    assert_eq!(back.task_session_statuses.get(&sid), Some(&TaskSessionStatus::Queued));
}

#[test]
fn minimal_wire_task_deserializes() {
    let json = r#"{
        "id": "task_1",
        "projectId": "proj_1",
        "title": "do it",
        "status": "pending",
        "createdAtMs": 1,
        "updatedAtMs": 1
    }"#;
    let task: Task = serde_json::from_str(json).unwrap();
    assert_eq!(task.priority, TaskPriority::Medium);
    assert!(task.session_ids.is_empty());
    assert!(task.dependencies.is_empty());
}
