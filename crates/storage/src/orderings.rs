// SPDX-License-Identifier: MIT

//! Ordering repository, keyed by (project, entity type).

use crate::collection::Collection;
use crate::error::StoreError;
use maestro_core::{Ordering, ProjectId};
use std::path::Path;

pub struct OrderingStore {
    inner: Collection<Ordering>,
}

fn key(project_id: &ProjectId, entity_type: &str) -> String {
    format!("{}:{}", project_id.as_str(), entity_type)
}

impl OrderingStore {
    pub fn open(state_dir: &Path) -> Result<Self, StoreError> {
        Ok(Self { inner: Collection::open(state_dir, "orderings.json")? })
    }

    pub fn find(&self, project_id: &ProjectId, entity_type: &str) -> Option<Ordering> {
        self.inner.get(&key(project_id, entity_type))
    }

    pub fn upsert(&self, ordering: Ordering) -> Result<(), StoreError> {
        let k = key(&ordering.project_id, &ordering.entity_type);
        self.inner.put(&k, ordering)
    }

    /// Drop every ordering belonging to a deleted project.
    pub fn delete_for_project(&self, project_id: &ProjectId) -> Result<usize, StoreError> {
        self.inner.remove_where(|o| &o.project_id == project_id)
    }

    pub fn count(&self) -> usize {
        self.inner.count()
    }
}
