// SPDX-License-Identifier: MIT

//! Team repository.

use crate::collection::Collection;
use crate::error::StoreError;
use maestro_core::{ProjectId, Team, TeamId};
use std::path::Path;

pub struct TeamStore {
    inner: Collection<Team>,
}

impl TeamStore {
    pub fn open(state_dir: &Path) -> Result<Self, StoreError> {
        Ok(Self { inner: Collection::open(state_dir, "teams.json")? })
    }

    pub fn find_by_id(&self, id: &TeamId) -> Option<Team> {
        self.inner.get(id.as_str())
    }

    pub fn exists(&self, id: &TeamId) -> bool {
        self.inner.contains(id.as_str())
    }

    pub fn find_in_project(&self, project_id: &ProjectId) -> Vec<Team> {
        let mut teams: Vec<Team> = self
            .inner
            .all()
            .into_iter()
            .filter(|t| &t.project_id == project_id)
            .collect();
        teams.sort_by(|a, b| a.created_at_ms.cmp(&b.created_at_ms).then(a.id.cmp(&b.id)));
        teams
    }

    pub fn create(&self, team: Team) -> Result<(), StoreError> {
        self.inner.put(team.id.clone().as_str(), team)
    }

    pub fn update(&self, team: Team) -> Result<bool, StoreError> {
        self.inner.replace(team.id.clone().as_str(), team)
    }

    pub fn delete(&self, id: &TeamId) -> Result<bool, StoreError> {
        self.inner.remove(id.as_str())
    }

    pub fn count(&self) -> usize {
        self.inner.count()
    }
}
