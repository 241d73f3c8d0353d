// SPDX-License-Identifier: MIT

//! Team member repository.
//!
//! Custom members live in one collection. Edits to code-provided default
//! members are stored as full-record overlays in a second collection;
//! clearing the overlay restores the code default.

use crate::collection::Collection;
use crate::error::StoreError;
use maestro_core::{ProjectId, TeamMember, TeamMemberId};
use std::path::Path;

pub struct TeamMemberStore {
    customs: Collection<TeamMember>,
    overlays: Collection<TeamMember>,
}

impl TeamMemberStore {
    pub fn open(state_dir: &Path) -> Result<Self, StoreError> {
        Ok(Self {
            customs: Collection::open(state_dir, "team_members.json")?,
            overlays: Collection::open(state_dir, "member_overlays.json")?,
        })
    }

    /// A stored custom member (never a default).
    pub fn find_custom(&self, id: &TeamMemberId) -> Option<TeamMember> {
        self.customs.get(id.as_str())
    }

    /// Custom members in one project.
    pub fn customs_in_project(&self, project_id: &ProjectId) -> Vec<TeamMember> {
        let mut members: Vec<TeamMember> = self
            .customs
            .all()
            .into_iter()
            .filter(|m| &m.project_id == project_id)
            .collect();
        members.sort_by(|a, b| a.created_at_ms.cmp(&b.created_at_ms).then(a.id.cmp(&b.id)));
        members
    }

    pub fn create_custom(&self, member: TeamMember) -> Result<(), StoreError> {
        self.customs.put(member.id.clone().as_str(), member)
    }

    pub fn update_custom(&self, member: TeamMember) -> Result<bool, StoreError> {
        self.customs.replace(member.id.clone().as_str(), member)
    }

    pub fn delete_custom(&self, id: &TeamMemberId) -> Result<bool, StoreError> {
        self.customs.remove(id.as_str())
    }

    /// The stored overlay record for a default member, if edited.
    pub fn overlay_for(&self, id: &TeamMemberId) -> Option<TeamMember> {
        self.overlays.get(id.as_str())
    }

    pub fn set_overlay(&self, member: TeamMember) -> Result<(), StoreError> {
        self.overlays.put(member.id.clone().as_str(), member)
    }

    /// Drop the overlay, restoring the code-provided record. Returns false
    /// when no overlay existed.
    pub fn clear_overlay(&self, id: &TeamMemberId) -> Result<bool, StoreError> {
        self.overlays.remove(id.as_str())
    }

    pub fn count_customs(&self) -> usize {
        self.customs.count()
    }
}
