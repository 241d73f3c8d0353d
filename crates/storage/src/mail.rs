// SPDX-License-Identifier: MIT

//! Mail repository. Mail is immutable: create, read, delete only.

use crate::collection::Collection;
use crate::error::StoreError;
use maestro_core::{Mail, MailId, ProjectId, SessionId};
use std::path::Path;

pub struct MailStore {
    inner: Collection<Mail>,
}

impl MailStore {
    pub fn open(state_dir: &Path) -> Result<Self, StoreError> {
        Ok(Self { inner: Collection::open(state_dir, "mail.json")? })
    }

    pub fn find_by_id(&self, id: &MailId) -> Option<Mail> {
        self.inner.get(id.as_str())
    }

    /// Unsorted inbox candidates: project mail addressed to the session or
    /// broadcast. The service applies priority ordering.
    pub fn inbox(&self, project_id: &ProjectId, session_id: &SessionId) -> Vec<Mail> {
        self.inner
            .all()
            .into_iter()
            .filter(|m| &m.project_id == project_id && m.addressed_to(session_id))
            .collect()
    }

    /// All mail in a thread, oldest first.
    pub fn thread(&self, thread_id: &MailId) -> Vec<Mail> {
        let mut mails: Vec<Mail> = self
            .inner
            .all()
            .into_iter()
            .filter(|m| &m.thread_id == thread_id)
            .collect();
        mails.sort_by(|a, b| a.created_at_ms.cmp(&b.created_at_ms).then(a.id.cmp(&b.id)));
        mails
    }

    pub fn create(&self, mail: Mail) -> Result<(), StoreError> {
        self.inner.put(mail.id.clone().as_str(), mail)
    }

    pub fn delete(&self, id: &MailId) -> Result<bool, StoreError> {
        self.inner.remove(id.as_str())
    }

    pub fn count(&self) -> usize {
        self.inner.count()
    }
}
