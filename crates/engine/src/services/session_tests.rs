// SPDX-License-Identifier: MIT

use super::*;
use crate::services::{CreateProject, CreateTask};
use crate::test_support::Harness;
use maestro_core::ProjectId;

async fn project(h: &Harness) -> ProjectId {
    h.services
        .projects
        .create_project(CreateProject {
            name: "p".into(),
            working_dir: "/tmp/w".into(),
            description: None,
            is_master: false,
        })
        .await
        .unwrap()
        .id
}

async fn task(h: &Harness, project_id: ProjectId) -> TaskId {
    h.services
        .tasks
        .create_task(CreateTask { project_id, title: "t".into(), ..Default::default() })
        .await
        .unwrap()
        .id
}

async fn session(h: &Harness, project_id: ProjectId, task_ids: Vec<TaskId>) -> Session {
    h.services
        .sessions
        .create_session(CreateSession { project_id, task_ids, ..Default::default() })
        .await
        .unwrap()
}

#[tokio::test]
async fn create_links_both_sides_and_emits() {
    let h = Harness::new();
    let pid = project(&h).await;
    let t1 = task(&h, pid).await;
    let t2 = task(&h, pid).await;
    h.clear_events();

    let s = session(&h, pid, vec![t1, t2]).await;

    assert_eq!(s.task_ids, vec![t1, t2]);
    for tid in [t1, t2] {
        let linked = h.services.tasks.get_task(&tid).unwrap();
        assert_eq!(linked.session_ids, vec![s.id]);
        assert_eq!(
            linked.task_session_statuses.get(&s.id),
            Some(&TaskSessionStatus::Working)
        );
    }
    assert_eq!(h.events_for("session:created").len(), 1);
    assert_eq!(h.events_for("task:session_added").len(), 2);
    // Timeline opens with one task_started per task.
    assert_eq!(
        s.timeline.iter().filter(|e| e.event_type == TimelineEventType::TaskStarted).count(),
        2
    );
}

#[tokio::test]
async fn create_validates_tasks() {
    let h = Harness::new();
    let pid = project(&h).await;
    let err = h
        .services
        .sessions
        .create_session(CreateSession {
            project_id: pid,
            task_ids: vec!["task_ghost".into()],
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound { .. }));
}

#[tokio::test]
async fn master_project_sets_env_flag() {
    let h = Harness::new();
    let pid = project(&h).await;
    h.services.projects.set_master_status(&pid, true).await.unwrap();

    let s = session(&h, pid, Vec::new()).await;
    assert_eq!(s.env.get("MAESTRO_IS_MASTER").map(String::as_str), Some("true"));
}

#[tokio::test]
async fn completed_is_sticky_and_propagates() {
    let h = Harness::new();
    let pid = project(&h).await;
    let t = task(&h, pid).await;
    let s = session(&h, pid, vec![t]).await;
    h.clear_events();

    let updated = h
        .services
        .sessions
        .update_session(&s.id, SessionPatch { status: Some(SessionStatus::Completed), ..Default::default() })
        .await
        .unwrap();
    assert_eq!(updated.status, SessionStatus::Completed);
    assert_eq!(h.events_for("notify:session_completed").len(), 1);
    assert_eq!(
        h.services.tasks.get_task(&t).unwrap().task_session_statuses.get(&s.id),
        Some(&TaskSessionStatus::Completed)
    );
    h.clear_events();

    // A later stop report is dropped: response carries completed, nothing
    // further is notified.
    let after = h
        .services
        .sessions
        .update_session(&s.id, SessionPatch { status: Some(SessionStatus::Stopped), ..Default::default() })
        .await
        .unwrap();
    assert_eq!(after.status, SessionStatus::Completed);
    assert!(h.events_for("notify:session_stopped").is_empty());
    assert!(h.events_for("notify:session_completed").is_empty());
}

#[tokio::test]
async fn failure_propagates_but_respects_terminal_task_state() {
    let h = Harness::new();
    let pid = project(&h).await;
    let t_done = task(&h, pid).await;
    let t_live = task(&h, pid).await;
    let s = session(&h, pid, vec![t_done, t_live]).await;

    // One task already finished from this session's perspective.
    h.services
        .tasks
        .set_session_status(&t_done, &s.id, TaskSessionStatus::Completed, false)
        .await
        .unwrap();

    h.services
        .sessions
        .update_session(&s.id, SessionPatch { status: Some(SessionStatus::Failed), ..Default::default() })
        .await
        .unwrap();

    assert_eq!(
        h.services.tasks.get_task(&t_done).unwrap().task_session_statuses.get(&s.id),
        Some(&TaskSessionStatus::Completed)
    );
    assert_eq!(
        h.services.tasks.get_task(&t_live).unwrap().task_session_statuses.get(&s.id),
        Some(&TaskSessionStatus::Failed)
    );
}

#[tokio::test]
async fn needs_input_notifies_only_on_the_edge() {
    let h = Harness::new();
    let pid = project(&h).await;
    let s = session(&h, pid, Vec::new()).await;
    h.clear_events();

    h.services
        .sessions
        .add_timeline_event(&s.id, TimelineEventType::NeedsInput, Some("pick one".into()), None, None)
        .await
        .unwrap();
    assert_eq!(h.events_for("notify:needs_input").len(), 1);

    // Flag already active: appending another needs_input event re-records
    // it but does not re-notify.
    h.services
        .sessions
        .add_timeline_event(&s.id, TimelineEventType::NeedsInput, Some("still waiting".into()), None, None)
        .await
        .unwrap();
    assert_eq!(h.events_for("notify:needs_input").len(), 1);

    let current = h.services.sessions.get_session(&s.id).unwrap();
    assert!(current.needs_input.active);
    assert_eq!(current.needs_input.message.as_deref(), Some("still waiting"));
}

#[tokio::test]
async fn progress_events_notify_and_update() {
    let h = Harness::new();
    let pid = project(&h).await;
    let s = session(&h, pid, Vec::new()).await;
    h.clear_events();

    h.services
        .sessions
        .add_timeline_event(&s.id, TimelineEventType::Progress, Some("half way".into()), None, None)
        .await
        .unwrap();

    assert_eq!(h.events_for("session:updated").len(), 1);
    assert_eq!(h.events_for("notify:progress").len(), 1);
}

#[tokio::test]
async fn delete_unlinks_tasks_and_emits() {
    let h = Harness::new();
    let pid = project(&h).await;
    let t1 = task(&h, pid).await;
    let t2 = task(&h, pid).await;
    let s = session(&h, pid, vec![t1, t2]).await;
    h.clear_events();

    h.services.sessions.delete_session(&s.id).await.unwrap();

    assert_eq!(h.events_for("task:session_removed").len(), 2);
    assert_eq!(h.events_for("session:deleted").len(), 1);
    for tid in [t1, t2] {
        assert!(h.services.tasks.get_task(&tid).unwrap().session_ids.is_empty());
    }
    assert!(matches!(
        h.services.sessions.get_session(&s.id),
        Err(DomainError::NotFound { .. })
    ));
}

#[tokio::test]
async fn add_then_remove_task_restores_link_sets() {
    let h = Harness::new();
    let pid = project(&h).await;
    let t = task(&h, pid).await;
    let s = session(&h, pid, Vec::new()).await;

    h.services.sessions.add_task_to_session(&s.id, &t).await.unwrap();
    assert_eq!(h.services.sessions.get_session(&s.id).unwrap().task_ids, vec![t]);
    assert_eq!(h.services.tasks.get_task(&t).unwrap().session_ids, vec![s.id]);

    h.services.sessions.remove_task_from_session(&s.id, &t).await.unwrap();
    assert!(h.services.sessions.get_session(&s.id).unwrap().task_ids.is_empty());
    assert!(h.services.tasks.get_task(&t).unwrap().session_ids.is_empty());
}

#[tokio::test]
async fn docs_append_with_timeline_entry() {
    let h = Harness::new();
    let pid = project(&h).await;
    let s = session(&h, pid, Vec::new()).await;

    let updated = h
        .services
        .sessions
        .add_doc(&s.id, "findings".into(), "# Findings".into())
        .await
        .unwrap();

    assert_eq!(updated.docs.len(), 1);
    assert_eq!(updated.docs[0].title, "findings");
    assert!(updated
        .timeline
        .iter()
        .any(|e| e.event_type == TimelineEventType::DocAdded));
}

#[tokio::test]
async fn prompt_delivery_records_preview_and_relays() {
    let h = Harness::new();
    let pid = project(&h).await;
    let s = session(&h, pid, Vec::new()).await;
    h.clear_events();

    let long = "x".repeat(200);
    h.services
        .sessions
        .send_prompt(&s.id, long, PromptMode::Send, Some("sess_coord".into()))
        .await
        .unwrap();

    let relayed = h.events_for("session:prompt_send");
    assert_eq!(relayed.len(), 1);

    let stored = h.services.sessions.get_session(&s.id).unwrap();
    let event = stored
        .timeline
        .iter()
        .find(|e| e.event_type == TimelineEventType::PromptReceived)
        .unwrap();
    let message = event.message.as_deref().unwrap();
    assert!(message.chars().count() <= 121);
    assert!(message.ends_with('…'));
}

#[tokio::test]
async fn empty_prompt_is_rejected() {
    let h = Harness::new();
    let pid = project(&h).await;
    let s = session(&h, pid, Vec::new()).await;

    let err = h
        .services
        .sessions
        .send_prompt(&s.id, "   ".into(), PromptMode::Paste, None)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
}
