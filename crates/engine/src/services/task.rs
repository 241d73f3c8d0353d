// SPDX-License-Identifier: MIT

//! Task CRUD, hierarchical cascade delete, bidirectional session linking,
//! and the privileged-vs-agent update split.
//!
//! Notification decisions compare against values snapshotted before the
//! mutation, never against re-read state.

use super::ServiceCtx;
use maestro_core::{
    Clock, DomainError, MaestroEvent, SessionId, Task, TaskId, TaskPriority, TaskSessionStatus,
    TaskStatus, UpdateSource,
};
use maestro_storage::TaskFilter;
use std::collections::VecDeque;

/// Input for [`TaskService::create_task`].
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTask {
    pub project_id: maestro_core::ProjectId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parent_id: Option<TaskId>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default)]
    pub initial_prompt: Option<String>,
    #[serde(default)]
    pub skill_ids: Vec<String>,
    #[serde(default)]
    pub agent_ids: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<TaskId>,
}

/// Partial update for [`TaskService::update_task`].
///
/// `update_source` decides which fields are honored: `session` callers may
/// only move their own `session_status` entry; all other fields in the
/// payload are silently ignored for them.
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(default)]
    pub update_source: UpdateSource,
    #[serde(default)]
    pub session_id: Option<SessionId>,
    #[serde(default)]
    pub session_status: Option<TaskSessionStatus>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default)]
    pub initial_prompt: Option<String>,
    #[serde(default)]
    pub skill_ids: Option<Vec<String>>,
    #[serde(default)]
    pub agent_ids: Option<Vec<String>>,
    #[serde(default)]
    pub dependencies: Option<Vec<TaskId>>,
}

pub struct TaskService<C: Clock> {
    ctx: ServiceCtx<C>,
}

impl<C: Clock> Clone for TaskService<C> {
    fn clone(&self) -> Self {
        Self { ctx: self.ctx.clone() }
    }
}

impl<C: Clock> TaskService<C> {
    pub fn new(ctx: ServiceCtx<C>) -> Self {
        Self { ctx }
    }

    pub async fn create_task(&self, input: CreateTask) -> Result<Task, DomainError> {
        let title = input.title.trim().to_string();
        if title.is_empty() {
            return Err(DomainError::validation("task title must not be empty"));
        }
        if !self.ctx.storage.projects.exists(&input.project_id) {
            return Err(DomainError::not_found("project", input.project_id.as_str()));
        }
        if let Some(parent_id) = &input.parent_id {
            let parent = self
                .ctx
                .storage
                .tasks
                .find_by_id(parent_id)
                .ok_or_else(|| DomainError::not_found("task", parent_id.as_str()))?;
            if parent.project_id != input.project_id {
                return Err(DomainError::validation("parent task belongs to another project"));
            }
        }
        let now = self.ctx.clock.epoch_ms();
        let task = Task {
            id: TaskId::generate(&self.ctx.ids),
            project_id: input.project_id,
            title,
            description: input.description,
            parent_id: input.parent_id,
            status: TaskStatus::Pending,
            priority: input.priority.unwrap_or_default(),
            session_ids: Vec::new(),
            task_session_statuses: Default::default(),
            timeline: Vec::new(),
            initial_prompt: input.initial_prompt,
            skill_ids: input.skill_ids,
            agent_ids: input.agent_ids,
            dependencies: input.dependencies,
            created_at_ms: now,
            updated_at_ms: now,
        };
        self.ctx.storage.tasks.create(task.clone())?;
        self.ctx.bus.emit(MaestroEvent::TaskCreated { task: task.clone() });
        Ok(task)
    }

    pub fn get_task(&self, id: &TaskId) -> Result<Task, DomainError> {
        self.ctx
            .storage
            .tasks
            .find_by_id(id)
            .ok_or_else(|| DomainError::not_found("task", id.as_str()))
    }

    pub fn list_tasks(&self, filter: &TaskFilter) -> Vec<Task> {
        self.ctx.storage.tasks.find_all(filter)
    }

    pub fn children_of(&self, id: &TaskId) -> Result<Vec<Task>, DomainError> {
        if !self.ctx.storage.tasks.exists(id) {
            return Err(DomainError::not_found("task", id.as_str()));
        }
        Ok(self.ctx.storage.tasks.children_of(id))
    }

    pub async fn update_task(&self, id: &TaskId, patch: TaskPatch) -> Result<Task, DomainError> {
        let _guard = self.ctx.locks.acquire(id.as_str()).await;
        let mut task = self.get_task(id)?;

        // Snapshot before mutation; the comparisons below must not observe
        // the new values.
        let old_status = task.status;
        let old_session_statuses = task.task_session_statuses.clone();

        match patch.update_source {
            UpdateSource::Session => {
                let session_id = patch.session_id.ok_or_else(|| {
                    DomainError::validation("sessionId is required for session-sourced updates")
                })?;
                if let Some(status) = patch.session_status {
                    task.task_session_statuses.insert(session_id, status);
                }
                // All other fields are silently ignored for agents.
            }
            UpdateSource::User => {
                if let Some(title) = patch.title {
                    let title = title.trim().to_string();
                    if title.is_empty() {
                        return Err(DomainError::validation("task title must not be empty"));
                    }
                    task.title = title;
                }
                if let Some(description) = patch.description {
                    task.description = Some(description);
                }
                if let Some(status) = patch.status {
                    task.status = status;
                }
                if let Some(priority) = patch.priority {
                    task.priority = priority;
                }
                if let Some(initial_prompt) = patch.initial_prompt {
                    task.initial_prompt = Some(initial_prompt);
                }
                if let Some(skill_ids) = patch.skill_ids {
                    task.skill_ids = skill_ids;
                }
                if let Some(agent_ids) = patch.agent_ids {
                    task.agent_ids = agent_ids;
                }
                if let Some(dependencies) = patch.dependencies {
                    task.dependencies = dependencies;
                }
            }
        }

        task.updated_at_ms = self.ctx.clock.epoch_ms();
        self.ctx.storage.tasks.update(task.clone())?;
        self.ctx.bus.emit(MaestroEvent::TaskUpdated { task: task.clone() });
        self.emit_transitions(&task, old_status, &old_session_statuses);
        Ok(task)
    }

    /// Cascade delete: children are deleted before parents, leaves first.
    pub async fn delete_task(&self, id: &TaskId) -> Result<(), DomainError> {
        let _guard = self.ctx.locks.acquire(id.as_str()).await;
        if !self.ctx.storage.tasks.exists(id) {
            return Err(DomainError::not_found("task", id.as_str()));
        }

        // Breadth-first collection; deleting in reverse order guarantees
        // every child goes before its parent.
        let mut order: Vec<TaskId> = Vec::new();
        let mut frontier: VecDeque<TaskId> = VecDeque::from([*id]);
        while let Some(next) = frontier.pop_front() {
            order.push(next);
            for child in self.ctx.storage.tasks.children_of(&next) {
                frontier.push_back(child.id);
            }
        }

        for task_id in order.iter().rev() {
            let Some(task) = self.ctx.storage.tasks.find_by_id(task_id) else {
                continue;
            };
            for session_id in &task.session_ids {
                if let Some(mut session) = self.ctx.storage.sessions.find_by_id(session_id) {
                    session.unlink_task(task_id);
                    self.ctx.storage.sessions.update(session)?;
                }
            }
            self.ctx.storage.task_lists.remove_task_everywhere(task_id)?;
            self.ctx.storage.tasks.delete(task_id)?;
            self.ctx.bus.emit(MaestroEvent::TaskDeleted { id: *task_id });
        }
        Ok(())
    }

    /// Link a session and a task, maintaining both id sets.
    ///
    /// Lock order is session then task, the fixed order used everywhere.
    pub async fn add_session_to_task(
        &self,
        task_id: &TaskId,
        session_id: &SessionId,
    ) -> Result<(), DomainError> {
        let _session_guard = self.ctx.locks.acquire(session_id.as_str()).await;
        let _task_guard = self.ctx.locks.acquire(task_id.as_str()).await;
        let mut task = self.get_task(task_id)?;
        let mut session = self
            .ctx
            .storage
            .sessions
            .find_by_id(session_id)
            .ok_or_else(|| DomainError::not_found("session", session_id.as_str()))?;

        task.link_session(*session_id);
        task.task_session_statuses.entry(*session_id).or_insert(TaskSessionStatus::Working);
        task.updated_at_ms = self.ctx.clock.epoch_ms();
        session.link_task(*task_id);
        session.updated_at_ms = task.updated_at_ms;

        self.ctx.storage.sessions.update(session)?;
        self.ctx.storage.tasks.update(task)?;
        self.ctx.bus.emit(MaestroEvent::TaskSessionAdded {
            task_id: *task_id,
            session_id: *session_id,
        });
        self.ctx.bus.emit(MaestroEvent::SessionTaskAdded {
            session_id: *session_id,
            task_id: *task_id,
        });
        Ok(())
    }

    /// Undo [`Self::add_session_to_task`], restoring both link sets.
    pub async fn remove_session_from_task(
        &self,
        task_id: &TaskId,
        session_id: &SessionId,
    ) -> Result<(), DomainError> {
        let _session_guard = self.ctx.locks.acquire(session_id.as_str()).await;
        let _task_guard = self.ctx.locks.acquire(task_id.as_str()).await;
        let mut task = self.get_task(task_id)?;
        let mut session = self
            .ctx
            .storage
            .sessions
            .find_by_id(session_id)
            .ok_or_else(|| DomainError::not_found("session", session_id.as_str()))?;

        task.unlink_session(session_id);
        task.updated_at_ms = self.ctx.clock.epoch_ms();
        session.unlink_task(task_id);
        session.updated_at_ms = task.updated_at_ms;

        self.ctx.storage.sessions.update(session)?;
        self.ctx.storage.tasks.update(task)?;
        self.ctx.bus.emit(MaestroEvent::TaskSessionRemoved {
            task_id: *task_id,
            session_id: *session_id,
        });
        self.ctx.bus.emit(MaestroEvent::SessionTaskRemoved {
            session_id: *session_id,
            task_id: *task_id,
        });
        Ok(())
    }

    /// Move one session's per-session status, with the usual snapshot and
    /// notification pass. Used by the queue service and by session
    /// lifecycle propagation.
    ///
    /// When `only_if_not_terminal` is set, an existing terminal per-session
    /// status (completed/failed/skipped) is left untouched.
    pub(crate) async fn set_session_status(
        &self,
        task_id: &TaskId,
        session_id: &SessionId,
        status: TaskSessionStatus,
        only_if_not_terminal: bool,
    ) -> Result<(), DomainError> {
        let _guard = self.ctx.locks.acquire(task_id.as_str()).await;
        let mut task = self.get_task(task_id)?;
        let old_status = task.status;
        let old_session_statuses = task.task_session_statuses.clone();

        if only_if_not_terminal {
            if let Some(current) = old_session_statuses.get(session_id) {
                if current.is_terminal() {
                    return Ok(());
                }
            }
        }
        task.task_session_statuses.insert(*session_id, status);
        task.updated_at_ms = self.ctx.clock.epoch_ms();
        self.ctx.storage.tasks.update(task.clone())?;
        self.ctx.bus.emit(MaestroEvent::TaskUpdated { task: task.clone() });
        self.emit_transitions(&task, old_status, &old_session_statuses);
        Ok(())
    }

    /// Compare post-mutation state against the snapshot and emit the
    /// notification events for every observed transition.
    fn emit_transitions(
        &self,
        task: &Task,
        old_status: TaskStatus,
        old_session_statuses: &std::collections::HashMap<SessionId, TaskSessionStatus>,
    ) {
        if task.status != old_status {
            let notify = match task.status {
                TaskStatus::Completed => Some(MaestroEvent::NotifyTaskCompleted {
                    task_id: task.id,
                    project_id: task.project_id,
                    title: task.title.clone(),
                }),
                TaskStatus::Cancelled => Some(MaestroEvent::NotifyTaskFailed {
                    task_id: task.id,
                    project_id: task.project_id,
                    title: task.title.clone(),
                }),
                TaskStatus::Blocked => Some(MaestroEvent::NotifyTaskBlocked {
                    task_id: task.id,
                    project_id: task.project_id,
                    title: task.title.clone(),
                }),
                _ => None,
            };
            if let Some(event) = notify {
                self.ctx.bus.emit(event);
            }
        }

        for (session_id, status) in &task.task_session_statuses {
            if old_session_statuses.get(session_id) == Some(status) {
                continue;
            }
            match status {
                TaskSessionStatus::Completed => {
                    self.ctx.bus.emit(MaestroEvent::NotifyTaskSessionCompleted {
                        task_id: task.id,
                        session_id: *session_id,
                    });
                }
                TaskSessionStatus::Failed => {
                    self.ctx.bus.emit(MaestroEvent::NotifyTaskSessionFailed {
                        task_id: task.id,
                        session_id: *session_id,
                    });
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
