// SPDX-License-Identifier: MIT

//! Task list repository.

use crate::collection::Collection;
use crate::error::StoreError;
use maestro_core::{ProjectId, TaskId, TaskList, TaskListId};
use std::path::Path;

pub struct TaskListStore {
    inner: Collection<TaskList>,
}

impl TaskListStore {
    pub fn open(state_dir: &Path) -> Result<Self, StoreError> {
        Ok(Self { inner: Collection::open(state_dir, "task_lists.json")? })
    }

    pub fn find_by_id(&self, id: &TaskListId) -> Option<TaskList> {
        self.inner.get(id.as_str())
    }

    pub fn find_in_project(&self, project_id: &ProjectId) -> Vec<TaskList> {
        let mut lists: Vec<TaskList> = self
            .inner
            .all()
            .into_iter()
            .filter(|l| &l.project_id == project_id)
            .collect();
        lists.sort_by(|a, b| a.created_at_ms.cmp(&b.created_at_ms).then(a.id.cmp(&b.id)));
        lists
    }

    /// Strip a deleted task out of every list that references it.
    pub fn remove_task_everywhere(&self, task_id: &TaskId) -> Result<(), StoreError> {
        for mut list in self.inner.all() {
            if list.ordered_task_ids.contains(task_id) {
                let id = list.id;
                list.ordered_task_ids.retain(|t| t != task_id);
                self.inner.replace(id.as_str(), list)?;
            }
        }
        Ok(())
    }

    pub fn create(&self, list: TaskList) -> Result<(), StoreError> {
        self.inner.put(list.id.clone().as_str(), list)
    }

    pub fn update(&self, list: TaskList) -> Result<bool, StoreError> {
        self.inner.replace(list.id.clone().as_str(), list)
    }

    pub fn delete(&self, id: &TaskListId) -> Result<bool, StoreError> {
        self.inner.remove(id.as_str())
    }

    pub fn count(&self) -> usize {
        self.inner.count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maestro_core::task_list::TaskListBuilder;

    #[test]
    fn removing_a_task_leaves_the_list_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let store = TaskListStore::open(dir.path()).unwrap();
        store
            .create(
                TaskListBuilder::default()
                    .id("list_1")
                    .ordered_task_ids(vec!["task_only".into()])
                    .build(),
            )
            .unwrap();

        store.remove_task_everywhere(&"task_only".into()).unwrap();

        let list = store.find_by_id(&"list_1".into()).unwrap();
        assert!(list.ordered_task_ids.is_empty());
    }
}
