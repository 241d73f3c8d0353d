// SPDX-License-Identifier: MIT

//! Task and session lifecycle scenarios.

use super::support::stack;
use maestro_core::{
    DomainError, MaestroEvent, SessionStatus, TaskSessionStatus,
};
use maestro_engine::services::{CreateSession, SessionPatch};

#[tokio::test]
async fn cascade_delete_runs_bottom_up() {
    let s = stack();
    let pid = s.project().await;
    let t1 = s.task(pid, "t1").await;
    let t2 = s.child_task(pid, t1, "t2").await;
    let t3 = s.child_task(pid, t1, "t3").await;
    let t4 = s.child_task(pid, t3, "t4").await;
    s.clear_events();

    s.services.tasks.delete_task(&t1).await.unwrap();

    let deleted: Vec<String> = s
        .events_for("task:deleted")
        .into_iter()
        .map(|e| match e {
            MaestroEvent::TaskDeleted { id } => id.to_string(),
            other => panic!("unexpected event {other:?}"),
        })
        .collect();
    assert_eq!(
        deleted,
        vec![t4.to_string(), t3.to_string(), t2.to_string(), t1.to_string()],
        "children delete before parents, leaves first"
    );
    assert!(matches!(
        s.services.tasks.get_task(&t1),
        Err(DomainError::NotFound { .. })
    ));
    assert!(s.services.projects.get_project(&pid).is_ok());
}

#[tokio::test]
async fn completed_session_absorbs_later_stop() {
    let s = stack();
    let pid = s.project().await;
    let session = s
        .services
        .sessions
        .create_session(CreateSession {
            project_id: pid,
            status: Some(SessionStatus::Working),
            ..Default::default()
        })
        .await
        .unwrap();
    s.clear_events();

    let completed = s
        .services
        .sessions
        .update_session(
            &session.id,
            SessionPatch { status: Some(SessionStatus::Completed), ..Default::default() },
        )
        .await
        .unwrap();
    assert_eq!(completed.status, SessionStatus::Completed);
    assert_eq!(s.events_for("session:updated").len(), 1);
    assert_eq!(s.events_for("notify:session_completed").len(), 1);
    s.clear_events();

    let after_stop = s
        .services
        .sessions
        .update_session(
            &session.id,
            SessionPatch { status: Some(SessionStatus::Stopped), ..Default::default() },
        )
        .await
        .unwrap();
    assert_eq!(after_stop.status, SessionStatus::Completed, "stop report dropped");
    let notifies: Vec<&'static str> = s
        .events_for("notify:session_completed")
        .iter()
        .chain(s.events_for("notify:session_stopped").iter())
        .chain(s.events_for("notify:session_failed").iter())
        .map(|e| e.topic().as_str())
        .collect();
    assert!(notifies.is_empty(), "no further lifecycle notifications: {notifies:?}");

    let after_fail = s
        .services
        .sessions
        .update_session(
            &session.id,
            SessionPatch { status: Some(SessionStatus::Failed), ..Default::default() },
        )
        .await
        .unwrap();
    assert_eq!(after_fail.status, SessionStatus::Completed, "failure report dropped");
}

#[tokio::test]
async fn session_links_are_bidirectional_for_life() {
    let s = stack();
    let pid = s.project().await;
    let t1 = s.task(pid, "t1").await;
    let t2 = s.task(pid, "t2").await;
    s.clear_events();

    let session = s
        .services
        .sessions
        .create_session(CreateSession {
            project_id: pid,
            task_ids: vec![t1, t2],
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(s.events_for("session:created").len(), 1);
    assert_eq!(s.events_for("task:session_added").len(), 2);
    for tid in [t1, t2] {
        let task = s.services.tasks.get_task(&tid).unwrap();
        assert_eq!(task.session_ids, vec![session.id]);
        assert!(session.task_ids.contains(&tid));
    }
    s.clear_events();

    s.services.sessions.delete_session(&session.id).await.unwrap();

    assert_eq!(s.events_for("task:session_removed").len(), 2);
    for tid in [t1, t2] {
        assert!(s.services.tasks.get_task(&tid).unwrap().session_ids.is_empty());
    }
}

#[tokio::test]
async fn terminal_session_propagates_to_task_entries() {
    let s = stack();
    let pid = s.project().await;
    let t = s.task(pid, "t").await;
    let session = s
        .services
        .sessions
        .create_session(CreateSession {
            project_id: pid,
            task_ids: vec![t],
            status: Some(SessionStatus::Working),
            ..Default::default()
        })
        .await
        .unwrap();

    s.services
        .sessions
        .update_session(
            &session.id,
            SessionPatch { status: Some(SessionStatus::Stopped), ..Default::default() },
        )
        .await
        .unwrap();

    let task = s.services.tasks.get_task(&t).unwrap();
    assert_eq!(
        task.task_session_statuses.get(&session.id),
        Some(&TaskSessionStatus::Failed),
        "stopped maps to failed on the task side"
    );
}
