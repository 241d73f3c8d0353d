// SPDX-License-Identifier: MIT

//! Project repository.

use crate::collection::Collection;
use crate::error::StoreError;
use maestro_core::{Project, ProjectId};
use std::path::Path;

pub struct ProjectStore {
    inner: Collection<Project>,
}

impl ProjectStore {
    pub fn open(state_dir: &Path) -> Result<Self, StoreError> {
        Ok(Self { inner: Collection::open(state_dir, "projects.json")? })
    }

    pub fn find_by_id(&self, id: &ProjectId) -> Option<Project> {
        self.inner.get(id.as_str())
    }

    pub fn exists(&self, id: &ProjectId) -> bool {
        self.inner.contains(id.as_str())
    }

    /// All projects, newest first.
    pub fn find_all(&self) -> Vec<Project> {
        let mut projects = self.inner.all();
        projects.sort_by(|a, b| b.created_at_ms.cmp(&a.created_at_ms));
        projects
    }

    /// The master project, if one is flagged.
    pub fn find_master(&self) -> Option<Project> {
        self.inner.all().into_iter().find(|p| p.is_master)
    }

    pub fn create(&self, project: Project) -> Result<(), StoreError> {
        self.inner.put(project.id.clone().as_str(), project)
    }

    pub fn update(&self, project: Project) -> Result<bool, StoreError> {
        self.inner.replace(project.id.clone().as_str(), project)
    }

    pub fn delete(&self, id: &ProjectId) -> Result<bool, StoreError> {
        self.inner.remove(id.as_str())
    }

    pub fn count(&self) -> usize {
        self.inner.count()
    }
}
