// SPDX-License-Identifier: MIT

//! Queue invariants under the full stack.

use super::support::stack;
use maestro_core::{DomainError, QueueItemStatus, SessionStatus, TaskSessionStatus};
use maestro_engine::services::CreateSession;

#[tokio::test]
async fn processing_invariant_holds_across_the_cycle() {
    let s = stack();
    let pid = s.project().await;
    let t1 = s.task(pid, "t1").await;
    let t2 = s.task(pid, "t2").await;
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

    let queue = s.services.queues.create_queue(&session.id, vec![t1, t2]).await.unwrap();
    assert_eq!(queue.current_index, -1);

    let started = s.services.queues.start_item(&session.id).await.unwrap();
    assert_eq!(started.current_index, 0);
    assert_eq!(started.items[0].status, QueueItemStatus::Processing);
    assert!(matches!(
        s.services.queues.start_item(&session.id).await,
        Err(DomainError::Validation(_))
    ));

    let completed = s.services.queues.complete_item(&session.id).await.unwrap();
    assert_eq!(completed.current_index, -1);
    assert!(completed.items.iter().all(|i| i.status != QueueItemStatus::Processing));

    // Settled items never revert: the next start picks item 1.
    let restarted = s.services.queues.start_item(&session.id).await.unwrap();
    assert_eq!(restarted.current_index, 1);
    assert_eq!(restarted.items[0].status, QueueItemStatus::Completed);
}

#[tokio::test]
async fn queue_settlement_propagates_per_session_status() {
    let s = stack();
    let pid = s.project().await;
    let t = s.task(pid, "t").await;
    let session = s
        .services
        .sessions
        .create_session(CreateSession { project_id: pid, ..Default::default() })
        .await
        .unwrap();
    s.services.queues.create_queue(&session.id, vec![t]).await.unwrap();

    s.services.queues.start_item(&session.id).await.unwrap();
    assert_eq!(
        s.services.tasks.get_task(&t).unwrap().task_session_statuses.get(&session.id),
        Some(&TaskSessionStatus::Working)
    );

    s.services.queues.fail_item(&session.id, Some("compile error".into())).await.unwrap();
    let task = s.services.tasks.get_task(&t).unwrap();
    assert_eq!(task.task_session_statuses.get(&session.id), Some(&TaskSessionStatus::Failed));
    s.clear_events();

    // Failure notifications fired exactly once for the transition.
    s.services.queues.get_stats(&session.id).unwrap();
    assert!(s.events_for("notify:task_session_failed").is_empty());
}

#[tokio::test]
async fn double_initialization_is_a_conflict() {
    let s = stack();
    let pid = s.project().await;
    let session = s
        .services
        .sessions
        .create_session(CreateSession { project_id: pid, ..Default::default() })
        .await
        .unwrap();

    s.services.queues.create_queue(&session.id, Vec::new()).await.unwrap();
    assert!(matches!(
        s.services.queues.create_queue(&session.id, Vec::new()).await,
        Err(DomainError::BusinessRule(_))
    ));
}
