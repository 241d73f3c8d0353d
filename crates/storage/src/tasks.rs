// SPDX-License-Identifier: MIT

//! Task repository.

use crate::collection::Collection;
use crate::error::StoreError;
use maestro_core::{ProjectId, Task, TaskId, TaskStatus};
use std::path::Path;

/// Filter for [`TaskStore::find_all`]. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub project_id: Option<ProjectId>,
    pub parent_id: Option<TaskId>,
    pub status: Option<TaskStatus>,
}

pub struct TaskStore {
    inner: Collection<Task>,
}

impl TaskStore {
    pub fn open(state_dir: &Path) -> Result<Self, StoreError> {
        Ok(Self { inner: Collection::open(state_dir, "tasks.json")? })
    }

    pub fn find_by_id(&self, id: &TaskId) -> Option<Task> {
        self.inner.get(id.as_str())
    }

    pub fn exists(&self, id: &TaskId) -> bool {
        self.inner.contains(id.as_str())
    }

    /// Filtered listing, oldest first.
    pub fn find_all(&self, filter: &TaskFilter) -> Vec<Task> {
        let mut tasks: Vec<Task> = self
            .inner
            .all()
            .into_iter()
            .filter(|t| filter.project_id.as_ref().is_none_or(|p| &t.project_id == p))
            .filter(|t| filter.parent_id.as_ref().is_none_or(|p| t.parent_id.as_ref() == Some(p)))
            .filter(|t| filter.status.is_none_or(|s| t.status == s))
            .collect();
        tasks.sort_by(|a, b| a.created_at_ms.cmp(&b.created_at_ms).then(a.id.cmp(&b.id)));
        tasks
    }

    /// Direct children of a task, oldest first.
    pub fn children_of(&self, parent_id: &TaskId) -> Vec<Task> {
        self.find_all(&TaskFilter { parent_id: Some(*parent_id), ..Default::default() })
    }

    /// Whether any task belongs to the project.
    pub fn any_in_project(&self, project_id: &ProjectId) -> bool {
        self.inner.all().iter().any(|t| &t.project_id == project_id)
    }

    pub fn create(&self, task: Task) -> Result<(), StoreError> {
        self.inner.put(task.id.clone().as_str(), task)
    }

    pub fn update(&self, task: Task) -> Result<bool, StoreError> {
        self.inner.replace(task.id.clone().as_str(), task)
    }

    pub fn delete(&self, id: &TaskId) -> Result<bool, StoreError> {
        self.inner.remove(id.as_str())
    }

    pub fn count(&self) -> usize {
        self.inner.count()
    }
}
