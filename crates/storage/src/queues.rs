// SPDX-License-Identifier: MIT

//! Queue repository, keyed by owning session.

use crate::collection::Collection;
use crate::error::StoreError;
use maestro_core::{Queue, SessionId};
use std::path::Path;

pub struct QueueStore {
    inner: Collection<Queue>,
}

impl QueueStore {
    pub fn open(state_dir: &Path) -> Result<Self, StoreError> {
        Ok(Self { inner: Collection::open(state_dir, "queues.json")? })
    }

    pub fn find_by_session(&self, session_id: &SessionId) -> Option<Queue> {
        self.inner.get(session_id.as_str())
    }

    pub fn exists(&self, session_id: &SessionId) -> bool {
        self.inner.contains(session_id.as_str())
    }

    pub fn create(&self, queue: Queue) -> Result<(), StoreError> {
        self.inner.put(queue.session_id.clone().as_str(), queue)
    }

    pub fn update(&self, queue: Queue) -> Result<bool, StoreError> {
        self.inner.replace(queue.session_id.clone().as_str(), queue)
    }

    pub fn delete(&self, session_id: &SessionId) -> Result<bool, StoreError> {
        self.inner.remove(session_id.as_str())
    }

    pub fn count(&self) -> usize {
        self.inner.count()
    }
}
