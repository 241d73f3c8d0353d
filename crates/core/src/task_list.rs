// SPDX-License-Identifier: MIT

//! Named, ordered task sequences within one project.

use crate::id::{ProjectId, TaskId, TaskListId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// An ordered, duplicate-free sequence of tasks in one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskList {
    pub id: TaskListId,
    pub project_id: ProjectId,
    pub name: String,
    pub ordered_task_ids: Vec<TaskId>,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl TaskList {
    /// True when no task id appears twice.
    pub fn is_duplicate_free(&self) -> bool {
        let mut seen = HashSet::new();
        self.ordered_task_ids.iter().all(|id| seen.insert(*id))
    }
}

crate::builder! {
    pub struct TaskListBuilder => TaskList {
        into {
            id: TaskListId = "list_test",
            project_id: ProjectId = "proj_test",
            name: String = "test-list",
        }
        set {
            ordered_task_ids: Vec<TaskId> = Vec::new(),
            created_at_ms: u64 = 0,
            updated_at_ms: u64 = 0,
        }
    }
}
