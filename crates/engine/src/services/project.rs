// SPDX-License-Identifier: MIT

//! Project CRUD with referential integrity.

use super::ServiceCtx;
use maestro_core::{Clock, DomainError, MaestroEvent, Project, ProjectId};
use std::path::PathBuf;

/// Input for [`ProjectService::create_project`].
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProject {
    pub name: String,
    pub working_dir: PathBuf,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_master: bool,
}

/// Partial update for [`ProjectService::update_project`].
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
    #[serde(default)]
    pub description: Option<String>,
}

pub struct ProjectService<C: Clock> {
    ctx: ServiceCtx<C>,
}

impl<C: Clock> Clone for ProjectService<C> {
    fn clone(&self) -> Self {
        Self { ctx: self.ctx.clone() }
    }
}

impl<C: Clock> ProjectService<C> {
    pub fn new(ctx: ServiceCtx<C>) -> Self {
        Self { ctx }
    }

    pub async fn create_project(&self, input: CreateProject) -> Result<Project, DomainError> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("project name must not be empty"));
        }
        let now = self.ctx.clock.epoch_ms();
        let project = Project {
            id: ProjectId::generate(&self.ctx.ids),
            name,
            working_dir: input.working_dir,
            description: input.description,
            is_master: input.is_master,
            created_at_ms: now,
            updated_at_ms: now,
        };
        if project.is_master {
            self.demote_other_masters(&project.id)?;
        }
        self.ctx.storage.projects.create(project.clone())?;
        self.ctx.bus.emit(MaestroEvent::ProjectCreated { project: project.clone() });
        Ok(project)
    }

    pub fn list_projects(&self) -> Vec<Project> {
        self.ctx.storage.projects.find_all()
    }

    pub fn get_project(&self, id: &ProjectId) -> Result<Project, DomainError> {
        self.ctx
            .storage
            .projects
            .find_by_id(id)
            .ok_or_else(|| DomainError::not_found("project", id.as_str()))
    }

    pub async fn update_project(
        &self,
        id: &ProjectId,
        patch: ProjectPatch,
    ) -> Result<Project, DomainError> {
        let _guard = self.ctx.locks.acquire(id.as_str()).await;
        let mut project = self.get_project(id)?;
        if let Some(name) = patch.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(DomainError::validation("project name must not be empty"));
            }
            project.name = name;
        }
        if let Some(working_dir) = patch.working_dir {
            project.working_dir = working_dir;
        }
        if let Some(description) = patch.description {
            project.description = Some(description);
        }
        project.updated_at_ms = self.ctx.clock.epoch_ms();
        self.ctx.storage.projects.update(project.clone())?;
        self.ctx.bus.emit(MaestroEvent::ProjectUpdated { project: project.clone() });
        Ok(project)
    }

    /// Delete fails while any task or session still references the project.
    pub async fn delete_project(&self, id: &ProjectId) -> Result<(), DomainError> {
        let _guard = self.ctx.locks.acquire(id.as_str()).await;
        if !self.ctx.storage.projects.exists(id) {
            return Err(DomainError::not_found("project", id.as_str()));
        }
        if self.ctx.storage.tasks.any_in_project(id) {
            return Err(DomainError::business_rule("project still has tasks"));
        }
        if self.ctx.storage.sessions.any_in_project(id) {
            return Err(DomainError::business_rule("project still has sessions"));
        }
        self.ctx.storage.projects.delete(id)?;
        self.ctx.storage.orderings.delete_for_project(id)?;
        self.ctx.bus.emit(MaestroEvent::ProjectDeleted { id: *id });
        Ok(())
    }

    /// Toggle the master flag; at most one project is master at a time.
    pub async fn set_master_status(
        &self,
        id: &ProjectId,
        is_master: bool,
    ) -> Result<Project, DomainError> {
        let _guard = self.ctx.locks.acquire(id.as_str()).await;
        let mut project = self.get_project(id)?;
        if is_master {
            self.demote_other_masters(id)?;
        }
        project.is_master = is_master;
        project.updated_at_ms = self.ctx.clock.epoch_ms();
        self.ctx.storage.projects.update(project.clone())?;
        self.ctx.bus.emit(MaestroEvent::ProjectUpdated { project: project.clone() });
        Ok(project)
    }

    fn demote_other_masters(&self, keep: &ProjectId) -> Result<(), DomainError> {
        if let Some(mut master) = self.ctx.storage.projects.find_master() {
            if &master.id != keep {
                master.is_master = false;
                master.updated_at_ms = self.ctx.clock.epoch_ms();
                self.ctx.storage.projects.update(master.clone())?;
                self.ctx.bus.emit(MaestroEvent::ProjectUpdated { project: master });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "project_tests.rs"]
mod tests;
