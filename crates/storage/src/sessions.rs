// SPDX-License-Identifier: MIT

//! Session repository.

use crate::collection::Collection;
use crate::error::StoreError;
use maestro_core::{ProjectId, Session, SessionId, TaskId};
use std::path::Path;

/// Filter for [`SessionStore::find_all`]. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct SessionFilter {
    pub project_id: Option<ProjectId>,
    pub task_id: Option<TaskId>,
    /// `Some(true)` keeps non-terminal sessions only; `Some(false)` keeps
    /// terminal ones.
    pub active: Option<bool>,
    pub parent_session_id: Option<SessionId>,
}

pub struct SessionStore {
    inner: Collection<Session>,
}

impl SessionStore {
    pub fn open(state_dir: &Path) -> Result<Self, StoreError> {
        Ok(Self { inner: Collection::open(state_dir, "sessions.json")? })
    }

    pub fn find_by_id(&self, id: &SessionId) -> Option<Session> {
        self.inner.get(id.as_str())
    }

    pub fn exists(&self, id: &SessionId) -> bool {
        self.inner.contains(id.as_str())
    }

    /// Filtered listing, oldest first.
    pub fn find_all(&self, filter: &SessionFilter) -> Vec<Session> {
        let mut sessions: Vec<Session> = self
            .inner
            .all()
            .into_iter()
            .filter(|s| filter.project_id.as_ref().is_none_or(|p| &s.project_id == p))
            .filter(|s| filter.task_id.as_ref().is_none_or(|t| s.task_ids.contains(t)))
            .filter(|s| filter.active.is_none_or(|a| !s.status.is_terminal() == a))
            .filter(|s| {
                filter
                    .parent_session_id
                    .as_ref()
                    .is_none_or(|p| s.parent_session_id.as_ref() == Some(p))
            })
            .collect();
        sessions.sort_by(|a, b| a.created_at_ms.cmp(&b.created_at_ms).then(a.id.cmp(&b.id)));
        sessions
    }

    /// Workers spawned by a coordinator, oldest first.
    pub fn find_by_parent(&self, parent: &SessionId) -> Vec<Session> {
        self.find_all(&SessionFilter {
            parent_session_id: Some(*parent),
            ..Default::default()
        })
    }

    /// Whether any session belongs to the project.
    pub fn any_in_project(&self, project_id: &ProjectId) -> bool {
        self.inner.all().iter().any(|s| &s.project_id == project_id)
    }

    pub fn create(&self, session: Session) -> Result<(), StoreError> {
        self.inner.put(session.id.clone().as_str(), session)
    }

    pub fn update(&self, session: Session) -> Result<bool, StoreError> {
        self.inner.replace(session.id.clone().as_str(), session)
    }

    pub fn delete(&self, id: &SessionId) -> Result<bool, StoreError> {
        self.inner.remove(id.as_str())
    }

    pub fn count(&self) -> usize {
        self.inner.count()
    }
}
