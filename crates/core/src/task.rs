// SPDX-License-Identifier: MIT

//! Task aggregate and its status machinery.
//!
//! Tasks form a hierarchy via `parent_id` (deletes cascade bottom-up) and
//! link bidirectionally to sessions: `task.session_ids` mirrors
//! `session.task_ids` at all times, with a per-session working status in
//! `task_session_statuses`.

use crate::id::{ProjectId, SessionId, TaskId};
use crate::timeline::TimelineEvent;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// User-visible task status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Blocked,
    Completed,
    Cancelled,
    Error,
}

crate::simple_display! {
    TaskStatus {
        Pending => "pending",
        InProgress => "in_progress",
        Blocked => "blocked",
        Completed => "completed",
        Cancelled => "cancelled",
        Error => "error",
    }
}

/// Per-session progress on a task, tracked separately from the
/// user-visible [`TaskStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskSessionStatus {
    Working,
    Queued,
    Blocked,
    Completed,
    Failed,
    Skipped,
}

impl TaskSessionStatus {
    /// Terminal per-session statuses are never overwritten by session
    /// lifecycle propagation.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Skipped)
    }
}

crate::simple_display! {
    TaskSessionStatus {
        Working => "working",
        Queued => "queued",
        Blocked => "blocked",
        Completed => "completed",
        Failed => "failed",
        Skipped => "skipped",
    }
}

/// Task priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

crate::simple_display! {
    TaskPriority {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
}

/// Who is issuing a task update.
///
/// Agents (`Session`) may only change their own entry in
/// `task_session_statuses`; everything else in their payload is silently
/// ignored. User updates may write all user-controlled fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateSource {
    #[default]
    User,
    Session,
}

/// A unit of work owned by a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub project_id: ProjectId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<TaskId>,
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: TaskPriority,
    /// Sessions this task is linked to. Mirrors `session.task_ids`.
    #[serde(default)]
    pub session_ids: Vec<SessionId>,
    /// Per-session progress, keyed by session id.
    #[serde(default)]
    pub task_session_statuses: HashMap<SessionId, TaskSessionStatus>,
    #[serde(default)]
    pub timeline: Vec<TimelineEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_prompt: Option<String>,
    #[serde(default)]
    pub skill_ids: Vec<String>,
    #[serde(default)]
    pub agent_ids: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<TaskId>,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl Task {
    /// True if the task is linked to the given session.
    pub fn is_linked_to(&self, session_id: &SessionId) -> bool {
        self.session_ids.contains(session_id)
    }

    /// Link a session, keeping `session_ids` duplicate-free.
    pub fn link_session(&mut self, session_id: SessionId) {
        if !self.is_linked_to(&session_id) {
            self.session_ids.push(session_id);
        }
    }

    /// Unlink a session and drop its per-session status.
    pub fn unlink_session(&mut self, session_id: &SessionId) {
        self.session_ids.retain(|s| s != session_id);
        self.task_session_statuses.remove(session_id);
    }
}

crate::builder! {
    pub struct TaskBuilder => Task {
        into {
            id: TaskId = "task_test",
            project_id: ProjectId = "proj_test",
            title: String = "test-task",
        }
        set {
            status: TaskStatus = TaskStatus::Pending,
            priority: TaskPriority = TaskPriority::Medium,
            session_ids: Vec<SessionId> = Vec::new(),
            task_session_statuses: HashMap<SessionId, TaskSessionStatus> = HashMap::new(),
            timeline: Vec<TimelineEvent> = Vec::new(),
            skill_ids: Vec<String> = Vec::new(),
            agent_ids: Vec<String> = Vec::new(),
            dependencies: Vec<TaskId> = Vec::new(),
            created_at_ms: u64 = 0,
            updated_at_ms: u64 = 0,
        }
        option {
            description: String,
            parent_id: TaskId,
            initial_prompt: String,
        }
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
