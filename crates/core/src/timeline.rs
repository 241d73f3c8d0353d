// SPDX-License-Identifier: MIT

//! Timeline events recorded on tasks and sessions.

use crate::id::{EventId, TaskId};
use serde::{Deserialize, Serialize};

/// Kind of a timeline event.
///
/// `needs_input` and `progress` additionally drive notifications when
/// appended to a session; unknown inbound kinds are stored but inert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineEventType {
    TaskStarted,
    TaskCompleted,
    TaskSkipped,
    Progress,
    NeedsInput,
    SessionStopped,
    DocAdded,
    PromptReceived,
    #[serde(other)]
    Unknown,
}

crate::simple_display! {
    TimelineEventType {
        TaskStarted => "task_started",
        TaskCompleted => "task_completed",
        TaskSkipped => "task_skipped",
        Progress => "progress",
        NeedsInput => "needs_input",
        SessionStopped => "session_stopped",
        DocAdded => "doc_added",
        PromptReceived => "prompt_received",
        Unknown => "unknown",
    }
}

/// One ordered entry in a task or session timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
    pub id: EventId,
    #[serde(rename = "type")]
    pub event_type: TimelineEventType,
    pub at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<TaskId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}
