// SPDX-License-Identifier: MIT

//! Typed events published on the in-process bus.
//!
//! An event serializes to its wire payload only; the topic travels
//! alongside via [`MaestroEvent::topic`], not inside the body (mail
//! payloads already use a `type` key of their own). Entity payloads
//! flatten the full entity into the event body, so the WebSocket bridge
//! can hand the payload straight to clients.

use crate::id::{MailId, ProjectId, SessionId, TaskId};
use crate::mail::Mail;
use crate::project::Project;
use crate::session::Session;
use crate::task::Task;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Delivery mode for a cross-session directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptMode {
    /// Write the content and submit it (newline after a brief delay).
    Send,
    /// Write the content without submitting.
    Paste,
}

crate::simple_display! {
    PromptMode {
        Send => "send",
        Paste => "paste",
    }
}

/// Extra payload carried by the consolidated spawn `session:created` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpawnPayload {
    pub command: String,
    pub cwd: PathBuf,
    pub env_vars: HashMap<String, String>,
    pub manifest: serde_json::Value,
    pub project_id: ProjectId,
    pub task_ids: Vec<TaskId>,
    /// Marker distinguishing spawn from regular creation.
    #[serde(rename = "_isSpawnCreated")]
    pub is_spawn_created: bool,
}

/// Events published by services and fanned out to subscribers.
///
/// Not deserializable: events exist only in process, between a service
/// emit and its subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged, rename_all_fields = "camelCase")]
pub enum MaestroEvent {
    // -- project --
    #[serde(rename = "project:created")]
    ProjectCreated {
        #[serde(flatten)]
        project: Project,
    },

    #[serde(rename = "project:updated")]
    ProjectUpdated {
        #[serde(flatten)]
        project: Project,
    },

    #[serde(rename = "project:deleted")]
    ProjectDeleted { id: ProjectId },

    // -- task --
    #[serde(rename = "task:created")]
    TaskCreated {
        #[serde(flatten)]
        task: Task,
    },

    #[serde(rename = "task:updated")]
    TaskUpdated {
        #[serde(flatten)]
        task: Task,
    },

    #[serde(rename = "task:deleted")]
    TaskDeleted { id: TaskId },

    #[serde(rename = "task:session_added")]
    TaskSessionAdded { task_id: TaskId, session_id: SessionId },

    #[serde(rename = "task:session_removed")]
    TaskSessionRemoved { task_id: TaskId, session_id: SessionId },

    // -- session --
    /// Emitted once per creation. For spawned sessions the payload also
    /// carries the spawn marker and launch material; no separate
    /// spawn-request topic exists.
    #[serde(rename = "session:created")]
    SessionCreated {
        #[serde(flatten)]
        session: Session,
        /// `None` serializes to nothing; spawned sessions carry the marker.
        #[serde(flatten)]
        spawn: Option<SpawnPayload>,
    },

    #[serde(rename = "session:updated")]
    SessionUpdated {
        #[serde(flatten)]
        session: Session,
    },

    #[serde(rename = "session:deleted")]
    SessionDeleted { id: SessionId },

    #[serde(rename = "session:task_added")]
    SessionTaskAdded { session_id: SessionId, task_id: TaskId },

    #[serde(rename = "session:task_removed")]
    SessionTaskRemoved { session_id: SessionId, task_id: TaskId },

    /// Cross-session directive relayed to the target's terminal by the UI.
    #[serde(rename = "session:prompt_send")]
    SessionPromptSend {
        session_id: SessionId,
        content: String,
        mode: PromptMode,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sender_session_id: Option<SessionId>,
    },

    // -- mail --
    #[serde(rename = "mail:received")]
    MailReceived {
        #[serde(flatten)]
        mail: Mail,
    },

    #[serde(rename = "mail:deleted")]
    MailDeleted { id: MailId },

    // -- team member --
    #[serde(rename = "team_member:created")]
    TeamMemberCreated {
        #[serde(flatten)]
        member: crate::member::TeamMember,
    },

    #[serde(rename = "team_member:updated")]
    TeamMemberUpdated {
        #[serde(flatten)]
        member: crate::member::TeamMember,
    },

    #[serde(rename = "team_member:deleted")]
    TeamMemberDeleted { id: crate::id::TeamMemberId },

    // -- notify --
    #[serde(rename = "notify:task_completed")]
    NotifyTaskCompleted { task_id: TaskId, project_id: ProjectId, title: String },

    #[serde(rename = "notify:task_failed")]
    NotifyTaskFailed { task_id: TaskId, project_id: ProjectId, title: String },

    #[serde(rename = "notify:task_blocked")]
    NotifyTaskBlocked { task_id: TaskId, project_id: ProjectId, title: String },

    #[serde(rename = "notify:task_session_completed")]
    NotifyTaskSessionCompleted { task_id: TaskId, session_id: SessionId },

    #[serde(rename = "notify:task_session_failed")]
    NotifyTaskSessionFailed { task_id: TaskId, session_id: SessionId },

    #[serde(rename = "notify:needs_input")]
    NotifyNeedsInput {
        session_id: SessionId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },

    #[serde(rename = "notify:progress")]
    NotifyProgress {
        session_id: SessionId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },

    #[serde(rename = "notify:session_completed")]
    NotifySessionCompleted { session_id: SessionId },

    #[serde(rename = "notify:session_failed")]
    NotifySessionFailed { session_id: SessionId },

    #[serde(rename = "notify:session_stopped")]
    NotifySessionStopped { session_id: SessionId },
}

/// Topic discriminant of [`MaestroEvent`], used for subscription routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    ProjectCreated,
    ProjectUpdated,
    ProjectDeleted,
    TaskCreated,
    TaskUpdated,
    TaskDeleted,
    TaskSessionAdded,
    TaskSessionRemoved,
    SessionCreated,
    SessionUpdated,
    SessionDeleted,
    SessionTaskAdded,
    SessionTaskRemoved,
    SessionPromptSend,
    MailReceived,
    MailDeleted,
    TeamMemberCreated,
    TeamMemberUpdated,
    TeamMemberDeleted,
    NotifyTaskCompleted,
    NotifyTaskFailed,
    NotifyTaskBlocked,
    NotifyTaskSessionCompleted,
    NotifyTaskSessionFailed,
    NotifyNeedsInput,
    NotifyProgress,
    NotifySessionCompleted,
    NotifySessionFailed,
    NotifySessionStopped,
}

impl Topic {
    /// Wire name of the topic, as broadcast to WebSocket clients.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProjectCreated => "project:created",
            Self::ProjectUpdated => "project:updated",
            Self::ProjectDeleted => "project:deleted",
            Self::TaskCreated => "task:created",
            Self::TaskUpdated => "task:updated",
            Self::TaskDeleted => "task:deleted",
            Self::TaskSessionAdded => "task:session_added",
            Self::TaskSessionRemoved => "task:session_removed",
            Self::SessionCreated => "session:created",
            Self::SessionUpdated => "session:updated",
            Self::SessionDeleted => "session:deleted",
            Self::SessionTaskAdded => "session:task_added",
            Self::SessionTaskRemoved => "session:task_removed",
            Self::SessionPromptSend => "session:prompt_send",
            Self::MailReceived => "mail:received",
            Self::MailDeleted => "mail:deleted",
            Self::TeamMemberCreated => "team_member:created",
            Self::TeamMemberUpdated => "team_member:updated",
            Self::TeamMemberDeleted => "team_member:deleted",
            Self::NotifyTaskCompleted => "notify:task_completed",
            Self::NotifyTaskFailed => "notify:task_failed",
            Self::NotifyTaskBlocked => "notify:task_blocked",
            Self::NotifyTaskSessionCompleted => "notify:task_session_completed",
            Self::NotifyTaskSessionFailed => "notify:task_session_failed",
            Self::NotifyNeedsInput => "notify:needs_input",
            Self::NotifyProgress => "notify:progress",
            Self::NotifySessionCompleted => "notify:session_completed",
            Self::NotifySessionFailed => "notify:session_failed",
            Self::NotifySessionStopped => "notify:session_stopped",
        }
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Topics the WebSocket bridge fans out to connected clients.
pub const BROADCAST_TOPICS: &[Topic] = &[
    Topic::ProjectCreated,
    Topic::ProjectUpdated,
    Topic::ProjectDeleted,
    Topic::TaskCreated,
    Topic::TaskUpdated,
    Topic::TaskDeleted,
    Topic::TaskSessionAdded,
    Topic::TaskSessionRemoved,
    Topic::SessionCreated,
    Topic::SessionUpdated,
    Topic::SessionDeleted,
    Topic::SessionTaskAdded,
    Topic::SessionTaskRemoved,
    Topic::SessionPromptSend,
    Topic::MailReceived,
    Topic::MailDeleted,
    Topic::TeamMemberCreated,
    Topic::TeamMemberUpdated,
    Topic::TeamMemberDeleted,
    Topic::NotifyTaskCompleted,
    Topic::NotifyTaskFailed,
    Topic::NotifyTaskBlocked,
    Topic::NotifyTaskSessionCompleted,
    Topic::NotifyTaskSessionFailed,
    Topic::NotifyNeedsInput,
    Topic::NotifyProgress,
    Topic::NotifySessionCompleted,
    Topic::NotifySessionFailed,
    Topic::NotifySessionStopped,
];

impl MaestroEvent {
    /// Topic this event publishes on.
    pub fn topic(&self) -> Topic {
        match self {
            Self::ProjectCreated { .. } => Topic::ProjectCreated,
            Self::ProjectUpdated { .. } => Topic::ProjectUpdated,
            Self::ProjectDeleted { .. } => Topic::ProjectDeleted,
            Self::TaskCreated { .. } => Topic::TaskCreated,
            Self::TaskUpdated { .. } => Topic::TaskUpdated,
            Self::TaskDeleted { .. } => Topic::TaskDeleted,
            Self::TaskSessionAdded { .. } => Topic::TaskSessionAdded,
            Self::TaskSessionRemoved { .. } => Topic::TaskSessionRemoved,
            Self::SessionCreated { .. } => Topic::SessionCreated,
            Self::SessionUpdated { .. } => Topic::SessionUpdated,
            Self::SessionDeleted { .. } => Topic::SessionDeleted,
            Self::SessionTaskAdded { .. } => Topic::SessionTaskAdded,
            Self::SessionTaskRemoved { .. } => Topic::SessionTaskRemoved,
            Self::SessionPromptSend { .. } => Topic::SessionPromptSend,
            Self::MailReceived { .. } => Topic::MailReceived,
            Self::MailDeleted { .. } => Topic::MailDeleted,
            Self::TeamMemberCreated { .. } => Topic::TeamMemberCreated,
            Self::TeamMemberUpdated { .. } => Topic::TeamMemberUpdated,
            Self::TeamMemberDeleted { .. } => Topic::TeamMemberDeleted,
            Self::NotifyTaskCompleted { .. } => Topic::NotifyTaskCompleted,
            Self::NotifyTaskFailed { .. } => Topic::NotifyTaskFailed,
            Self::NotifyTaskBlocked { .. } => Topic::NotifyTaskBlocked,
            Self::NotifyTaskSessionCompleted { .. } => Topic::NotifyTaskSessionCompleted,
            Self::NotifyTaskSessionFailed { .. } => Topic::NotifyTaskSessionFailed,
            Self::NotifyNeedsInput { .. } => Topic::NotifyNeedsInput,
            Self::NotifyProgress { .. } => Topic::NotifyProgress,
            Self::NotifySessionCompleted { .. } => Topic::NotifySessionCompleted,
            Self::NotifySessionFailed { .. } => Topic::NotifySessionFailed,
            Self::NotifySessionStopped { .. } => Topic::NotifySessionStopped,
        }
    }

    /// The event body as a JSON object — the `data` field of a WebSocket
    /// frame.
    pub fn payload_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
