// SPDX-License-Identifier: MIT

//! Named ordered task sequences.

use super::ServiceCtx;
use maestro_core::{Clock, DomainError, ProjectId, TaskId, TaskList, TaskListId};

pub struct TaskListService<C: Clock> {
    ctx: ServiceCtx<C>,
}

impl<C: Clock> Clone for TaskListService<C> {
    fn clone(&self) -> Self {
        Self { ctx: self.ctx.clone() }
    }
}

impl<C: Clock> TaskListService<C> {
    pub fn new(ctx: ServiceCtx<C>) -> Self {
        Self { ctx }
    }

    fn check_tasks(
        &self,
        project_id: &ProjectId,
        ordered_task_ids: &[TaskId],
    ) -> Result<(), DomainError> {
        let mut seen = std::collections::HashSet::new();
        for task_id in ordered_task_ids {
            if !seen.insert(*task_id) {
                return Err(DomainError::validation("task list contains duplicates"));
            }
            let task = self
                .ctx
                .storage
                .tasks
                .find_by_id(task_id)
                .ok_or_else(|| DomainError::not_found("task", task_id.as_str()))?;
            if &task.project_id != project_id {
                return Err(DomainError::validation("task belongs to another project"));
            }
        }
        Ok(())
    }

    pub async fn create_list(
        &self,
        project_id: ProjectId,
        name: String,
        ordered_task_ids: Vec<TaskId>,
    ) -> Result<TaskList, DomainError> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("task list name must not be empty"));
        }
        if !self.ctx.storage.projects.exists(&project_id) {
            return Err(DomainError::not_found("project", project_id.as_str()));
        }
        self.check_tasks(&project_id, &ordered_task_ids)?;
        let now = self.ctx.clock.epoch_ms();
        let list = TaskList {
            id: TaskListId::generate(&self.ctx.ids),
            project_id,
            name,
            ordered_task_ids,
            created_at_ms: now,
            updated_at_ms: now,
        };
        self.ctx.storage.task_lists.create(list.clone())?;
        Ok(list)
    }

    pub fn get_list(&self, id: &TaskListId) -> Result<TaskList, DomainError> {
        self.ctx
            .storage
            .task_lists
            .find_by_id(id)
            .ok_or_else(|| DomainError::not_found("task list", id.as_str()))
    }

    pub fn list_lists(&self, project_id: &ProjectId) -> Vec<TaskList> {
        self.ctx.storage.task_lists.find_in_project(project_id)
    }

    /// Replace the name and/or ordered members, re-validating membership.
    pub async fn update_list(
        &self,
        id: &TaskListId,
        name: Option<String>,
        ordered_task_ids: Option<Vec<TaskId>>,
    ) -> Result<TaskList, DomainError> {
        let _guard = self.ctx.locks.acquire(id.as_str()).await;
        let mut list = self.get_list(id)?;
        if let Some(name) = name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(DomainError::validation("task list name must not be empty"));
            }
            list.name = name;
        }
        if let Some(ordered_task_ids) = ordered_task_ids {
            self.check_tasks(&list.project_id, &ordered_task_ids)?;
            // An emptied list stays; deletion is always explicit.
            list.ordered_task_ids = ordered_task_ids;
        }
        list.updated_at_ms = self.ctx.clock.epoch_ms();
        self.ctx.storage.task_lists.update(list.clone())?;
        Ok(list)
    }

    pub async fn delete_list(&self, id: &TaskListId) -> Result<(), DomainError> {
        if !self.ctx.storage.task_lists.delete(id)? {
            return Err(DomainError::not_found("task list", id.as_str()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{CreateProject, CreateTask};
    use crate::test_support::Harness;

    async fn fixture() -> (Harness, ProjectId, Vec<TaskId>) {
        let h = Harness::new();
        let pid = h
            .services
            .projects
            .create_project(CreateProject {
                name: "p".into(),
                working_dir: "/tmp/w".into(),
                description: None,
                is_master: false,
            })
            .await
            .unwrap()
            .id;
        let mut tasks = Vec::new();
        for i in 0..3 {
            tasks.push(
                h.services
                    .tasks
                    .create_task(CreateTask {
                        project_id: pid,
                        title: format!("t{i}"),
                        ..Default::default()
                    })
                    .await
                    .unwrap()
                    .id,
            );
        }
        (h, pid, tasks)
    }

    #[tokio::test]
    async fn create_validates_membership_and_duplicates() {
        let (h, pid, tasks) = fixture().await;

        let list = h
            .services
            .task_lists
            .create_list(pid, "plan".into(), tasks.clone())
            .await
            .unwrap();
        assert_eq!(list.ordered_task_ids, tasks);

        let err = h
            .services
            .task_lists
            .create_list(pid, "dup".into(), vec![tasks[0], tasks[0]])
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let err = h
            .services
            .task_lists
            .create_list(pid, "ghost".into(), vec!["task_ghost".into()])
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn emptying_a_list_keeps_it() {
        let (h, pid, tasks) = fixture().await;
        let list = h
            .services
            .task_lists
            .create_list(pid, "plan".into(), vec![tasks[0]])
            .await
            .unwrap();

        let updated = h
            .services
            .task_lists
            .update_list(&list.id, None, Some(Vec::new()))
            .await
            .unwrap();
        assert!(updated.ordered_task_ids.is_empty());
        assert!(h.services.task_lists.get_list(&list.id).is_ok());
    }
}
