// SPDX-License-Identifier: MIT

//! Template repository, keyed by role.
//!
//! Only user edits are stored; a missing entry means the code default
//! applies, and `delete` is how a template resets.

use crate::collection::Collection;
use crate::error::StoreError;
use maestro_core::Template;
use std::path::Path;

pub struct TemplateStore {
    inner: Collection<Template>,
}

impl TemplateStore {
    pub fn open(state_dir: &Path) -> Result<Self, StoreError> {
        Ok(Self { inner: Collection::open(state_dir, "templates.json")? })
    }

    pub fn find_by_role(&self, role: &str) -> Option<Template> {
        self.inner.get(role)
    }

    pub fn upsert(&self, template: Template) -> Result<(), StoreError> {
        let role = template.role.clone();
        self.inner.put(&role, template)
    }

    pub fn delete(&self, role: &str) -> Result<bool, StoreError> {
        self.inner.remove(role)
    }
}
