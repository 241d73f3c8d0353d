// SPDX-License-Identifier: MIT

//! Session aggregate: one live agent terminal tracked by the server.
//!
//! Sessions move through `spawning → idle/working/needs_input` and end in a
//! terminal state. `completed` is absorbing: once a session has completed,
//! later `stopped` or `failed` reports are dropped.

use crate::id::{ProjectId, SessionId, TaskId, TeamMemberId};
use crate::member::TeamMember;
use crate::timeline::TimelineEvent;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Session lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Spawning,
    Idle,
    Working,
    NeedsInput,
    Completed,
    Failed,
    Stopped,
}

impl SessionStatus {
    /// Terminal states normally cannot be left.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Stopped)
    }

    /// Active sessions are mail-addressable and digest-eligible.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Working | Self::Idle | Self::Spawning)
    }
}

crate::simple_display! {
    SessionStatus {
        Spawning => "spawning",
        Idle => "idle",
        Working => "working",
        NeedsInput => "needs_input",
        Completed => "completed",
        Failed => "failed",
        Stopped => "stopped",
    }
}

/// Role a session plays in a coordinated run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionRole {
    Worker,
    Orchestrator,
}

crate::simple_display! {
    SessionRole {
        Worker => "worker",
        Orchestrator => "orchestrator",
    }
}

/// Whether the agent is blocked waiting for human input, and since when.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NeedsInput {
    #[serde(default)]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since_ms: Option<u64>,
}

/// A document attached to a session by its agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocEntry {
    pub id: crate::id::DocId,
    pub title: String,
    pub content: String,
    pub created_at_ms: u64,
}

/// A live (or finished) agent session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: SessionId,
    pub project_id: ProjectId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Tasks this session is linked to. Mirrors `task.session_ids`.
    #[serde(default)]
    pub task_ids: Vec<TaskId>,
    pub status: SessionStatus,
    #[serde(default)]
    pub needs_input: NeedsInput,
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_member_id: Option<TeamMemberId>,
    /// Copy of the team member at spawn time, frozen for the session's life.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_member_snapshot: Option<TeamMember>,
    /// Set when this session was spawned by a coordinator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_session_id: Option<SessionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<SessionRole>,
    #[serde(default)]
    pub timeline: Vec<TimelineEvent>,
    #[serde(default)]
    pub docs: Vec<DocEntry>,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl Session {
    /// True if the task is linked to this session.
    pub fn is_linked_to(&self, task_id: &TaskId) -> bool {
        self.task_ids.contains(task_id)
    }

    /// Link a task, keeping `task_ids` duplicate-free.
    pub fn link_task(&mut self, task_id: TaskId) {
        if !self.is_linked_to(&task_id) {
            self.task_ids.push(task_id);
        }
    }

    /// Unlink a task.
    pub fn unlink_task(&mut self, task_id: &TaskId) {
        self.task_ids.retain(|t| t != task_id);
    }

    /// Whether a status update is allowed from the current status.
    ///
    /// Non-terminal statuses accept any transition. Terminal statuses are
    /// final: `completed` absorbs later `stopped` and `failed` reports, and
    /// `failed`/`stopped` likewise never regress. Rejected transitions are
    /// dropped silently, not errored.
    pub fn accepts_transition(&self, next: SessionStatus) -> bool {
        if self.status.is_terminal() {
            return next == self.status;
        }
        true
    }
}

crate::builder! {
    pub struct SessionBuilder => Session {
        into {
            id: SessionId = "sess_test",
            project_id: ProjectId = "proj_test",
        }
        set {
            task_ids: Vec<TaskId> = Vec::new(),
            status: SessionStatus = SessionStatus::Idle,
            needs_input: NeedsInput = NeedsInput::default(),
            env: HashMap<String, String> = HashMap::new(),
            timeline: Vec<TimelineEvent> = Vec::new(),
            docs: Vec<DocEntry> = Vec::new(),
            created_at_ms: u64 = 0,
            updated_at_ms: u64 = 0,
        }
        option {
            name: String,
            team_member_id: TeamMemberId,
            team_member_snapshot: TeamMember,
            parent_session_id: SessionId,
            role: SessionRole,
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
