// SPDX-License-Identifier: MIT

//! Mail ordering and long-poll scenarios.

use super::support::stack;
use maestro_core::{Clock, MailPriority, SessionStatus};
use maestro_engine::services::{CreateSession, SendMail, WaitParams};
use std::time::Duration;

async fn idle_session(
    s: &super::support::Stack,
    pid: maestro_core::ProjectId,
) -> maestro_core::SessionId {
    s.services
        .sessions
        .create_session(CreateSession {
            project_id: pid,
            status: Some(SessionStatus::Idle),
            ..Default::default()
        })
        .await
        .unwrap()
        .id
}

fn mail_to(
    pid: maestro_core::ProjectId,
    to: maestro_core::SessionId,
    subject: &str,
    priority: Option<MailPriority>,
) -> SendMail {
    SendMail {
        project_id: pid,
        from_session_id: "sess_sender".into(),
        to_session_id: Some(to),
        subject: subject.into(),
        body: "body".into(),
        priority,
        ..Default::default()
    }
}

#[tokio::test]
async fn inbox_orders_criticals_first_then_by_age() {
    let s = stack();
    let pid = s.project().await;
    let me = idle_session(&s, pid).await;

    // A (normal, 100), B (critical, 200), C (high, 150), D (critical, 150).
    s.clock.set_epoch_ms(100);
    s.services.mail.send(mail_to(pid, me, "a", Some(MailPriority::Normal))).await.unwrap();
    s.clock.set_epoch_ms(200);
    s.services.mail.send(mail_to(pid, me, "b", Some(MailPriority::Critical))).await.unwrap();
    s.clock.set_epoch_ms(150);
    s.services.mail.send(mail_to(pid, me, "c", Some(MailPriority::High))).await.unwrap();
    s.services.mail.send(mail_to(pid, me, "d", Some(MailPriority::Critical))).await.unwrap();

    let inbox = s.services.mail.inbox(&pid, &me);
    let subjects: Vec<&str> = inbox.iter().map(|m| m.subject.as_str()).collect();
    assert_eq!(subjects, vec!["d", "b", "c", "a"]);
}

#[tokio::test]
async fn long_poll_wakes_the_right_waiter_only() {
    let s = stack();
    let pid = s.project().await;
    let target = idle_session(&s, pid).await;
    let bystander = idle_session(&s, pid).await;
    let since = s.clock.epoch_ms();

    let mail_for_target = s.services.mail.clone();
    let target_wait = tokio::spawn(async move {
        mail_for_target
            .wait_for_mail(WaitParams {
                project_id: pid,
                session_id: target,
                since_ms: since,
                timeout_ms: Some(5_000),
            })
            .await
    });
    let mail_for_bystander = s.services.mail.clone();
    let bystander_wait = tokio::spawn(async move {
        mail_for_bystander
            .wait_for_mail(WaitParams {
                project_id: pid,
                session_id: bystander,
                since_ms: since,
                timeout_ms: Some(500),
            })
            .await
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    s.clock.set_epoch_ms(since + 10);
    s.services.mail.send(mail_to(pid, target, "wake up", None)).await.unwrap();

    let woken = tokio::time::timeout(Duration::from_millis(500), target_wait)
        .await
        .expect("waiter resolved promptly")
        .unwrap()
        .unwrap();
    assert_eq!(woken.len(), 1);
    assert_eq!(woken[0].subject, "wake up");

    // The bystander's wait was registered before the send but addressed
    // elsewhere: it times out empty.
    let idle = bystander_wait.await.unwrap().unwrap();
    assert!(idle.is_empty());

    // Every waiter unsubscribed on its way out; only the stack's event
    // recorder is still listening.
    assert_eq!(s.bus.subscriber_count(maestro_core::Topic::MailReceived), 1);
}

#[tokio::test]
async fn broadcast_wakes_any_project_waiter() {
    let s = stack();
    let pid = s.project().await;
    let waiter_session = idle_session(&s, pid).await;
    let since = s.clock.epoch_ms();

    let mail = s.services.mail.clone();
    let wait = tokio::spawn(async move {
        mail.wait_for_mail(WaitParams {
            project_id: pid,
            session_id: waiter_session,
            since_ms: since,
            timeout_ms: Some(5_000),
        })
        .await
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    s.services
        .mail
        .send(SendMail {
            project_id: pid,
            from_session_id: "sess_sender".into(),
            subject: "to everyone".into(),
            body: "x".into(),
            ..Default::default()
        })
        .await
        .unwrap();

    let woken = wait.await.unwrap().unwrap();
    assert_eq!(woken.len(), 1);
    assert_eq!(woken[0].to_session_id, None);
}

#[tokio::test]
async fn threads_group_replies_under_the_root() {
    let s = stack();
    let pid = s.project().await;
    let a = idle_session(&s, pid).await;
    let b = idle_session(&s, pid).await;

    let root = s.services.mail.send(mail_to(pid, a, "root", None)).await.unwrap().remove(0);
    let reply = s
        .services
        .mail
        .send(SendMail {
            reply_to_mail_id: Some(root.id),
            ..mail_to(pid, b, "re: root", None)
        })
        .await
        .unwrap()
        .remove(0);

    assert_eq!(root.thread_id, root.id);
    assert_eq!(reply.thread_id, root.id);
    let thread = s.services.mail.list_thread(&root.id);
    assert_eq!(thread.len(), 2);
}
