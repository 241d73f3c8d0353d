// SPDX-License-Identifier: MIT

//! Per-session FIFO task queue.
//!
//! Invariants: at most one item is `processing` at any instant, and
//! `current_index` points at it (or is −1 when nothing is processing).
//! Item statuses are monotone: once completed/failed/skipped they never
//! revert.

use crate::id::{SessionId, TaskId};
use serde::{Deserialize, Serialize};

/// Status of one queue item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueItemStatus {
    Queued,
    Processing,
    Completed,
    Failed,
    Skipped,
}

impl QueueItemStatus {
    /// Settled items never change status again.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Skipped)
    }
}

crate::simple_display! {
    QueueItemStatus {
        Queued => "queued",
        Processing => "processing",
        Completed => "completed",
        Failed => "failed",
        Skipped => "skipped",
    }
}

/// One entry in a session's work queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueItem {
    pub task_id: TaskId,
    pub status: QueueItemStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_reason: Option<String>,
}

impl QueueItem {
    pub fn queued(task_id: TaskId) -> Self {
        Self {
            task_id,
            status: QueueItemStatus::Queued,
            started_at_ms: None,
            completed_at_ms: None,
            fail_reason: None,
        }
    }
}

/// FIFO work queue owned by one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Queue {
    pub session_id: SessionId,
    pub items: Vec<QueueItem>,
    /// Index of the item currently `processing`, or −1 when idle.
    pub current_index: i64,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl Queue {
    pub fn new(session_id: SessionId, task_ids: Vec<TaskId>, at_ms: u64) -> Self {
        Self {
            session_id,
            items: task_ids.into_iter().map(QueueItem::queued).collect(),
            current_index: -1,
            created_at_ms: at_ms,
            updated_at_ms: at_ms,
        }
    }

    /// The item currently marked `processing`, if any.
    pub fn processing_item(&self) -> Option<(usize, &QueueItem)> {
        self.items
            .iter()
            .enumerate()
            .find(|(_, item)| item.status == QueueItemStatus::Processing)
    }

    /// Index of the first `queued` item.
    pub fn next_queued_index(&self) -> Option<usize> {
        self.items.iter().position(|item| item.status == QueueItemStatus::Queued)
    }

    /// True if a task already appears anywhere in the queue.
    pub fn contains_task(&self, task_id: &TaskId) -> bool {
        self.items.iter().any(|item| &item.task_id == task_id)
    }

    /// Counts by status.
    pub fn stats(&self) -> QueueStats {
        let mut stats = QueueStats::default();
        for item in &self.items {
            match item.status {
                QueueItemStatus::Queued => stats.queued += 1,
                QueueItemStatus::Processing => stats.processing += 1,
                QueueItemStatus::Completed => stats.completed += 1,
                QueueItemStatus::Failed => stats.failed += 1,
                QueueItemStatus::Skipped => stats.skipped += 1,
            }
        }
        stats.total = self.items.len();
        stats
    }
}

/// Item counts by status, plus the total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStats {
    pub total: usize,
    pub queued: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
    pub skipped: usize,
}
