// SPDX-License-Identifier: MIT

use super::*;
use yare::parameterized;

#[parameterized(
    spawning = { SessionStatus::Spawning, false, true },
    idle = { SessionStatus::Idle, false, true },
    working = { SessionStatus::Working, false, true },
    needs_input = { SessionStatus::NeedsInput, false, false },
    completed = { SessionStatus::Completed, true, false },
    failed = { SessionStatus::Failed, true, false },
    stopped = { SessionStatus::Stopped, true, false },
)]
fn status_classification(status: SessionStatus, terminal: bool, active: bool) {
    assert_eq!(status.is_terminal(), terminal);
    assert_eq!(status.is_active(), active);
}

#[test]
fn completed_absorbs_everything() {
    let session = SessionBuilder::default().status(SessionStatus::Completed).build();
    assert!(!session.accepts_transition(SessionStatus::Stopped));
    assert!(!session.accepts_transition(SessionStatus::Failed));
    assert!(!session.accepts_transition(SessionStatus::Working));
    assert!(session.accepts_transition(SessionStatus::Completed));
}

#[test]
fn failed_and_stopped_are_final() {
    for terminal in [SessionStatus::Failed, SessionStatus::Stopped] {
        let session = SessionBuilder::default().status(terminal).build();
        assert!(!session.accepts_transition(SessionStatus::Completed));
        assert!(!session.accepts_transition(SessionStatus::Working));
        assert!(session.accepts_transition(terminal));
    }
}

#[test]
fn non_terminal_accepts_any_transition() {
    let session = SessionBuilder::default().status(SessionStatus::Working).build();
    for next in [
        SessionStatus::Spawning,
        SessionStatus::Idle,
        SessionStatus::NeedsInput,
        SessionStatus::Completed,
        SessionStatus::Failed,
        SessionStatus::Stopped,
    ] {
        assert!(session.accepts_transition(next));
    }
}

#[test]
fn link_and_unlink_task() {
    let mut session = SessionBuilder::default().build();
    let tid = TaskId::from_string("task_1");
    session.link_task(tid);
    session.link_task(tid);
    assert_eq!(session.task_ids, vec![tid]);
    session.unlink_task(&tid);
    assert!(session.task_ids.is_empty());
}

#[test]
fn wire_shape_uses_camel_case() {
    let session = SessionBuilder::default()
        .parent_session_id("sess_parent")
        .role(SessionRole::Worker)
        .build();
    let json = serde_json::to_value(&session).unwrap();
    assert_eq!(json["projectId"], "proj_test");
    assert_eq!(json["parentSessionId"], "sess_parent");
    assert_eq!(json["role"], "worker");
    assert_eq!(json["needsInput"]["active"], false);
}
