// SPDX-License-Identifier: MIT

//! Session lifecycle, timeline events, bidirectional task linking, and
//! status transition notifications.
//!
//! Terminal-state rules live in [`Session::accepts_transition`]; this
//! service adds the propagation into task per-session statuses and the
//! needs-input edge detection, both decided against snapshots taken
//! before mutation.

use super::task::TaskService;
use super::member::TeamMemberService;
use super::ServiceCtx;
use maestro_core::{
    Clock, DocEntry, DocId, DomainError, EventId, MaestroEvent, NeedsInput, PromptMode, Session,
    SessionId, SessionRole, SessionStatus, TaskId, TaskSessionStatus, TimelineEvent,
    TimelineEventType,
};
use maestro_storage::SessionFilter;
use std::collections::HashMap;

/// Input for [`SessionService::create_session`].
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSession {
    pub project_id: maestro_core::ProjectId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub task_ids: Vec<TaskId>,
    #[serde(default)]
    pub status: Option<SessionStatus>,
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default)]
    pub team_member_id: Option<maestro_core::TeamMemberId>,
    #[serde(default)]
    pub parent_session_id: Option<SessionId>,
    #[serde(default)]
    pub role: Option<SessionRole>,
    /// Internal: the spawn orchestrator emits one consolidated
    /// `session:created` itself, so plain creation events are suppressed.
    #[serde(skip)]
    pub suppress_created_event: bool,
}

/// Partial update for [`SessionService::update_session`].
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<SessionStatus>,
    #[serde(default)]
    pub needs_input: Option<NeedsInput>,
    #[serde(default)]
    pub env: Option<HashMap<String, String>>,
}

pub struct SessionService<C: Clock> {
    ctx: ServiceCtx<C>,
    tasks: TaskService<C>,
    members: TeamMemberService<C>,
}

impl<C: Clock> Clone for SessionService<C> {
    fn clone(&self) -> Self {
        Self { ctx: self.ctx.clone(), tasks: self.tasks.clone(), members: self.members.clone() }
    }
}

impl<C: Clock> SessionService<C> {
    pub fn new(ctx: ServiceCtx<C>, tasks: TaskService<C>, members: TeamMemberService<C>) -> Self {
        Self { ctx, tasks, members }
    }

    pub async fn create_session(&self, input: CreateSession) -> Result<Session, DomainError> {
        let project = self
            .ctx
            .storage
            .projects
            .find_by_id(&input.project_id)
            .ok_or_else(|| DomainError::not_found("project", input.project_id.as_str()))?;
        for task_id in &input.task_ids {
            if !self.ctx.storage.tasks.exists(task_id) {
                return Err(DomainError::not_found("task", task_id.as_str()));
            }
        }

        let now = self.ctx.clock.epoch_ms();
        let mut env = input.env;
        if project.is_master {
            env.insert("MAESTRO_IS_MASTER".into(), "true".into());
        }
        let team_member_snapshot = match &input.team_member_id {
            Some(member_id) => {
                Some(self.members.get_member(&input.project_id, member_id)?)
            }
            None => None,
        };

        let mut session = Session {
            id: SessionId::generate(&self.ctx.ids),
            project_id: input.project_id,
            name: input.name,
            task_ids: Vec::new(),
            status: input.status.unwrap_or(SessionStatus::Spawning),
            needs_input: NeedsInput::default(),
            env,
            team_member_id: input.team_member_id,
            team_member_snapshot,
            parent_session_id: input.parent_session_id,
            role: input.role,
            timeline: Vec::new(),
            docs: Vec::new(),
            created_at_ms: now,
            updated_at_ms: now,
        };

        // Link every task both ways, mark it started on the timeline, and
        // open its per-session status as working.
        for task_id in &input.task_ids {
            session.link_task(*task_id);
            session.timeline.push(TimelineEvent {
                id: EventId::generate(&self.ctx.ids),
                event_type: TimelineEventType::TaskStarted,
                at_ms: now,
                message: None,
                task_id: Some(*task_id),
                metadata: None,
            });
        }
        self.ctx.storage.sessions.create(session.clone())?;

        for task_id in &input.task_ids {
            let _guard = self.ctx.locks.acquire(task_id.as_str()).await;
            if let Some(mut task) = self.ctx.storage.tasks.find_by_id(task_id) {
                task.link_session(session.id);
                task.task_session_statuses.insert(session.id, TaskSessionStatus::Working);
                task.updated_at_ms = now;
                self.ctx.storage.tasks.update(task)?;
            }
        }

        if !input.suppress_created_event {
            self.ctx
                .bus
                .emit(MaestroEvent::SessionCreated { session: session.clone(), spawn: None });
            for task_id in &input.task_ids {
                self.ctx.bus.emit(MaestroEvent::TaskSessionAdded {
                    task_id: *task_id,
                    session_id: session.id,
                });
            }
        }
        Ok(session)
    }

    pub fn get_session(&self, id: &SessionId) -> Result<Session, DomainError> {
        self.ctx
            .storage
            .sessions
            .find_by_id(id)
            .ok_or_else(|| DomainError::not_found("session", id.as_str()))
    }

    pub fn list_sessions(&self, filter: &SessionFilter) -> Vec<Session> {
        self.ctx.storage.sessions.find_all(filter)
    }

    pub async fn update_session(
        &self,
        id: &SessionId,
        patch: SessionPatch,
    ) -> Result<Session, DomainError> {
        let _guard = self.ctx.locks.acquire(id.as_str()).await;
        let mut session = self.get_session(id)?;

        // Snapshots for the notification decisions below.
        let old_status = session.status;
        let was_needs_input = session.needs_input.active;

        if let Some(name) = patch.name {
            session.name = Some(name);
        }
        if let Some(env) = patch.env {
            session.env = env;
        }
        if let Some(next) = patch.status {
            // Terminal states never regress; rejected updates are dropped
            // silently and the response carries the current status.
            if session.accepts_transition(next) {
                session.status = next;
            }
        }
        if let Some(needs_input) = patch.needs_input {
            let now = self.ctx.clock.epoch_ms();
            let since_ms = if needs_input.active {
                needs_input.since_ms.or(Some(now))
            } else {
                None
            };
            session.needs_input = NeedsInput { since_ms, ..needs_input };
        }

        session.updated_at_ms = self.ctx.clock.epoch_ms();
        self.ctx.storage.sessions.update(session.clone())?;
        self.ctx.bus.emit(MaestroEvent::SessionUpdated { session: session.clone() });

        if session.needs_input.active && !was_needs_input {
            self.ctx.bus.emit(MaestroEvent::NotifyNeedsInput {
                session_id: session.id,
                message: session.needs_input.message.clone(),
            });
        }
        if session.status != old_status && session.status.is_terminal() {
            self.finish_session(&session).await?;
        }
        Ok(session)
    }

    /// Propagate a terminal session status into every linked task and emit
    /// the lifecycle notification.
    async fn finish_session(&self, session: &Session) -> Result<(), DomainError> {
        let propagated = match session.status {
            SessionStatus::Completed => TaskSessionStatus::Completed,
            SessionStatus::Failed | SessionStatus::Stopped => TaskSessionStatus::Failed,
            _ => return Ok(()),
        };
        for task_id in &session.task_ids {
            self.tasks.set_session_status(task_id, &session.id, propagated, true).await?;
        }
        let notify = match session.status {
            SessionStatus::Completed => {
                MaestroEvent::NotifySessionCompleted { session_id: session.id }
            }
            SessionStatus::Failed => MaestroEvent::NotifySessionFailed { session_id: session.id },
            _ => MaestroEvent::NotifySessionStopped { session_id: session.id },
        };
        self.ctx.bus.emit(notify);
        Ok(())
    }

    /// Stop and remove a session: record the stop on its timeline, unlink
    /// every task, then delete.
    pub async fn delete_session(&self, id: &SessionId) -> Result<(), DomainError> {
        let _guard = self.ctx.locks.acquire(id.as_str()).await;
        let mut session = self.get_session(id)?;
        let now = self.ctx.clock.epoch_ms();
        session.timeline.push(TimelineEvent {
            id: EventId::generate(&self.ctx.ids),
            event_type: TimelineEventType::SessionStopped,
            at_ms: now,
            message: None,
            task_id: None,
            metadata: None,
        });
        session.updated_at_ms = now;
        self.ctx.storage.sessions.update(session.clone())?;

        for task_id in session.task_ids.clone() {
            let _task_guard = self.ctx.locks.acquire(task_id.as_str()).await;
            if let Some(mut task) = self.ctx.storage.tasks.find_by_id(&task_id) {
                task.unlink_session(id);
                task.updated_at_ms = now;
                self.ctx.storage.tasks.update(task)?;
                self.ctx
                    .bus
                    .emit(MaestroEvent::TaskSessionRemoved { task_id, session_id: *id });
            }
        }

        self.ctx.storage.queues.delete(id)?;
        self.ctx.storage.sessions.delete(id)?;
        self.ctx.bus.emit(MaestroEvent::SessionDeleted { id: *id });
        Ok(())
    }

    pub async fn add_task_to_session(
        &self,
        session_id: &SessionId,
        task_id: &TaskId,
    ) -> Result<(), DomainError> {
        self.tasks.add_session_to_task(task_id, session_id).await
    }

    pub async fn remove_task_from_session(
        &self,
        session_id: &SessionId,
        task_id: &TaskId,
    ) -> Result<(), DomainError> {
        self.tasks.remove_session_from_task(task_id, session_id).await
    }

    /// Append a timeline event.
    ///
    /// A `needs_input` event also activates the needs-input flag, and
    /// `notify:needs_input` fires only on the inactive→active edge.
    pub async fn add_timeline_event(
        &self,
        session_id: &SessionId,
        event_type: TimelineEventType,
        message: Option<String>,
        task_id: Option<TaskId>,
        metadata: Option<serde_json::Value>,
    ) -> Result<Session, DomainError> {
        let _guard = self.ctx.locks.acquire(session_id.as_str()).await;
        let mut session = self.get_session(session_id)?;
        let was_needs_input = session.needs_input.active;
        let now = self.ctx.clock.epoch_ms();

        session.timeline.push(TimelineEvent {
            id: EventId::generate(&self.ctx.ids),
            event_type,
            at_ms: now,
            message: message.clone(),
            task_id,
            metadata,
        });
        if event_type == TimelineEventType::NeedsInput {
            session.needs_input = NeedsInput {
                active: true,
                message: message.clone(),
                since_ms: Some(now),
            };
        }
        session.updated_at_ms = now;
        self.ctx.storage.sessions.update(session.clone())?;

        // Re-read state is what subscribers observe.
        self.ctx.bus.emit(MaestroEvent::SessionUpdated { session: session.clone() });
        match event_type {
            TimelineEventType::Progress => {
                self.ctx
                    .bus
                    .emit(MaestroEvent::NotifyProgress { session_id: session.id, message });
            }
            TimelineEventType::NeedsInput if !was_needs_input => {
                self.ctx
                    .bus
                    .emit(MaestroEvent::NotifyNeedsInput { session_id: session.id, message });
            }
            _ => {}
        }
        Ok(session)
    }

    /// Attach a document produced by the session's agent.
    pub async fn add_doc(
        &self,
        session_id: &SessionId,
        title: String,
        content: String,
    ) -> Result<Session, DomainError> {
        let title_trimmed = title.trim().to_string();
        if title_trimmed.is_empty() {
            return Err(DomainError::validation("doc title must not be empty"));
        }
        let _guard = self.ctx.locks.acquire(session_id.as_str()).await;
        let mut session = self.get_session(session_id)?;
        let now = self.ctx.clock.epoch_ms();
        session.docs.push(DocEntry {
            id: DocId::generate(&self.ctx.ids),
            title: title_trimmed.clone(),
            content,
            created_at_ms: now,
        });
        session.timeline.push(TimelineEvent {
            id: EventId::generate(&self.ctx.ids),
            event_type: TimelineEventType::DocAdded,
            at_ms: now,
            message: Some(title_trimmed),
            task_id: None,
            metadata: None,
        });
        session.updated_at_ms = now;
        self.ctx.storage.sessions.update(session.clone())?;
        self.ctx.bus.emit(MaestroEvent::SessionUpdated { session: session.clone() });
        Ok(session)
    }

    /// Cross-session directive: record receipt on the target's timeline
    /// and relay through the bus for the UI to write into the terminal.
    pub async fn send_prompt(
        &self,
        session_id: &SessionId,
        content: String,
        mode: PromptMode,
        sender_session_id: Option<SessionId>,
    ) -> Result<(), DomainError> {
        if content.trim().is_empty() {
            return Err(DomainError::validation("prompt content must not be empty"));
        }
        let _guard = self.ctx.locks.acquire(session_id.as_str()).await;
        let mut session = self.get_session(session_id)?;
        let now = self.ctx.clock.epoch_ms();
        session.timeline.push(TimelineEvent {
            id: EventId::generate(&self.ctx.ids),
            event_type: TimelineEventType::PromptReceived,
            at_ms: now,
            message: Some(preview(&content)),
            task_id: None,
            metadata: sender_session_id
                .map(|sender| serde_json::json!({ "senderSessionId": sender })),
        });
        session.updated_at_ms = now;
        self.ctx.storage.sessions.update(session)?;

        self.ctx.bus.emit(MaestroEvent::SessionPromptSend {
            session_id: *session_id,
            content,
            mode,
            sender_session_id,
        });
        Ok(())
    }
}

/// Truncated preview recorded on the timeline for a received prompt.
fn preview(content: &str) -> String {
    const MAX: usize = 120;
    let trimmed = content.trim();
    if trimmed.chars().count() <= MAX {
        trimmed.to_string()
    } else {
        let cut: String = trimmed.chars().take(MAX).collect();
        format!("{cut}…")
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
