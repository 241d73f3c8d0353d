// SPDX-License-Identifier: MIT

//! Mail: send with scope fan-out, priority-ordered inboxes, threading,
//! and the long-poll wait with exactly-once wake semantics.

use super::ServiceCtx;
use maestro_core::{
    Clock, DomainError, Mail, MailId, MailPriority, MailScope, MaestroEvent, ProjectId, SessionId,
    SessionStatus, Topic,
};
use maestro_storage::SessionFilter;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

/// Hard cap and default for the long-poll timeout.
pub const WAIT_TIMEOUT_MAX_MS: u64 = 120_000;
pub const WAIT_TIMEOUT_DEFAULT_MS: u64 = 30_000;

/// Input for [`MailService::send`].
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMail {
    pub project_id: ProjectId,
    pub from_session_id: SessionId,
    #[serde(default)]
    pub to_session_id: Option<SessionId>,
    #[serde(default)]
    pub to_team_member_id: Option<maestro_core::TeamMemberId>,
    #[serde(default)]
    pub scope: Option<MailScope>,
    #[serde(default)]
    pub reply_to_mail_id: Option<MailId>,
    #[serde(rename = "type", default)]
    pub mail_type: Option<String>,
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub priority: Option<MailPriority>,
}

/// Parameters for [`MailService::wait_for_mail`].
#[derive(Debug, Clone, Default)]
pub struct WaitParams {
    pub project_id: ProjectId,
    pub session_id: SessionId,
    /// Only mail created strictly after this instant counts as pending.
    pub since_ms: u64,
    pub timeout_ms: Option<u64>,
}

pub struct MailService<C: Clock> {
    ctx: ServiceCtx<C>,
}

impl<C: Clock> Clone for MailService<C> {
    fn clone(&self) -> Self {
        Self { ctx: self.ctx.clone() }
    }
}

impl<C: Clock> MailService<C> {
    pub fn new(ctx: ServiceCtx<C>) -> Self {
        Self { ctx }
    }

    /// Send mail, resolving the addressee set in order: explicit team
    /// member fan-out, then scope fan-out, then a single (possibly
    /// broadcast) message. Returns every stored copy.
    pub async fn send(&self, input: SendMail) -> Result<Vec<Mail>, DomainError> {
        let subject = input.subject.trim().to_string();
        if subject.is_empty() {
            return Err(DomainError::validation("mail subject must not be empty"));
        }
        if !self.ctx.storage.projects.exists(&input.project_id) {
            return Err(DomainError::not_found("project", input.project_id.as_str()));
        }

        let thread_root = self.resolve_thread(&input.reply_to_mail_id)?;
        let recipients: Vec<Option<SessionId>> = self.resolve_recipients(&input);

        let mut stored = Vec::with_capacity(recipients.len());
        for to_session_id in recipients {
            let id = MailId::generate(&self.ctx.ids);
            let mail = Mail {
                id,
                project_id: input.project_id,
                from_session_id: input.from_session_id,
                to_session_id,
                reply_to_mail_id: input.reply_to_mail_id,
                thread_id: thread_root.unwrap_or(id),
                mail_type: input.mail_type.clone(),
                subject: subject.clone(),
                body: input.body.clone(),
                created_at_ms: self.ctx.clock.epoch_ms(),
                priority: input.priority,
            };
            self.ctx.storage.mail.create(mail.clone())?;
            self.ctx.bus.emit(MaestroEvent::MailReceived { mail: mail.clone() });
            stored.push(mail);
        }
        Ok(stored)
    }

    /// A reply inherits its ancestor's thread root; roots thread to
    /// themselves.
    fn resolve_thread(
        &self,
        reply_to: &Option<MailId>,
    ) -> Result<Option<MailId>, DomainError> {
        match reply_to {
            None => Ok(None),
            Some(parent_id) => {
                let parent = self
                    .ctx
                    .storage
                    .mail
                    .find_by_id(parent_id)
                    .ok_or_else(|| DomainError::not_found("mail", parent_id.as_str()))?;
                Ok(Some(if parent.thread_id.is_empty() { parent.id } else { parent.thread_id }))
            }
        }
    }

    fn resolve_recipients(&self, input: &SendMail) -> Vec<Option<SessionId>> {
        // Addressable sessions are the live ones.
        let active = |s: &maestro_core::Session| {
            matches!(s.status, SessionStatus::Working | SessionStatus::Idle | SessionStatus::Spawning)
        };
        let project_sessions = || {
            self.ctx.storage.sessions.find_all(&SessionFilter {
                project_id: Some(input.project_id),
                ..Default::default()
            })
        };

        if input.to_session_id.is_none() {
            if let Some(member_id) = &input.to_team_member_id {
                return project_sessions()
                    .into_iter()
                    .filter(active)
                    .filter(|s| s.team_member_id.as_ref() == Some(member_id))
                    .map(|s| Some(s.id))
                    .collect();
            }
            match input.scope {
                Some(MailScope::MyWorkers) => {
                    return project_sessions()
                        .into_iter()
                        .filter(active)
                        .filter(|s| s.parent_session_id == Some(input.from_session_id))
                        .map(|s| Some(s.id))
                        .collect();
                }
                Some(MailScope::Team) => {
                    let sender_parent = self
                        .ctx
                        .storage
                        .sessions
                        .find_by_id(&input.from_session_id)
                        .and_then(|s| s.parent_session_id);
                    return project_sessions()
                        .into_iter()
                        .filter(active)
                        .filter(|s| s.parent_session_id == sender_parent)
                        .filter(|s| s.id != input.from_session_id)
                        .map(|s| Some(s.id))
                        .collect();
                }
                None => {}
            }
        }
        vec![input.to_session_id]
    }

    /// Inbox for `(project, session)`: broadcasts plus direct mail, sorted
    /// critical-first and oldest-first within equal priority.
    pub fn inbox(&self, project_id: &ProjectId, session_id: &SessionId) -> Vec<Mail> {
        let mut mails = self.ctx.storage.mail.inbox(project_id, session_id);
        mails.sort_by(|a, b| a.inbox_cmp(b));
        mails
    }

    pub fn get_mail(&self, id: &MailId) -> Result<Mail, DomainError> {
        self.ctx
            .storage
            .mail
            .find_by_id(id)
            .ok_or_else(|| DomainError::not_found("mail", id.as_str()))
    }

    /// All mail in a thread, oldest first.
    pub fn list_thread(&self, thread_id: &MailId) -> Vec<Mail> {
        self.ctx.storage.mail.thread(thread_id)
    }

    pub async fn delete_mail(&self, id: &MailId) -> Result<(), DomainError> {
        if !self.ctx.storage.mail.delete(id)? {
            return Err(DomainError::not_found("mail", id.as_str()));
        }
        self.ctx.bus.emit(MaestroEvent::MailDeleted { id: *id });
        Ok(())
    }

    /// Long-poll for new mail.
    ///
    /// Returns immediately with anything created after `since_ms`;
    /// otherwise parks on the bus until a matching mail arrives or the
    /// (capped) timeout elapses, in which case the list is empty. The
    /// waiter resolves at most once and its subscription is dropped on
    /// every exit path, including request cancellation.
    pub async fn wait_for_mail(&self, params: WaitParams) -> Result<Vec<Mail>, DomainError> {
        let timeout_ms = params
            .timeout_ms
            .unwrap_or(WAIT_TIMEOUT_DEFAULT_MS)
            .min(WAIT_TIMEOUT_MAX_MS);

        let pending: Vec<Mail> = self
            .inbox(&params.project_id, &params.session_id)
            .into_iter()
            .filter(|m| m.created_at_ms > params.since_ms)
            .collect();
        if !pending.is_empty() {
            return Ok(pending);
        }

        let (tx, rx) = oneshot::channel::<Vec<Mail>>();
        // Taken exactly once; late matches after resolution are dropped.
        let slot = Arc::new(Mutex::new(Some(tx)));
        let waiter_slot = Arc::clone(&slot);
        let project_id = params.project_id;
        let session_id = params.session_id;

        let subscription = self.ctx.bus.on(Topic::MailReceived, move |event| {
            let MaestroEvent::MailReceived { mail } = event else {
                return Ok(());
            };
            if mail.project_id != project_id || !mail.addressed_to(&session_id) {
                return Ok(());
            }
            if let Some(tx) = waiter_slot.lock().take() {
                // Receiver gone means the wait already timed out or was
                // cancelled; nothing to do.
                let _ = tx.send(vec![mail.clone()]);
            }
            Ok(())
        });
        let _guard = self.ctx.bus.guard(subscription);

        match tokio::time::timeout(Duration::from_millis(timeout_ms), rx).await {
            Ok(Ok(mails)) => Ok(mails),
            // Timeout (or a dropped sender) resolves to an empty inbox.
            _ => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
#[path = "mail_tests.rs"]
mod tests;
