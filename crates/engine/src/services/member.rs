// SPDX-License-Identifier: MIT

//! Team member service.
//!
//! Default members are code-provided personas stamped onto every project;
//! edits to them land in an overlay and `reset_default` restores the
//! pristine record. Custom members are ordinary stored aggregates.

use super::ServiceCtx;
use maestro_core::{
    Clock, DomainError, MaestroEvent, MemberStatus, ProjectId, TeamMember, TeamMemberId,
    TeamMemberPatch,
};

/// Input for [`TeamMemberService::create_member`].
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeamMember {
    pub project_id: ProjectId,
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub agent_tool: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub command_permissions: Vec<String>,
}

pub struct TeamMemberService<C: Clock> {
    ctx: ServiceCtx<C>,
}

impl<C: Clock> Clone for TeamMemberService<C> {
    fn clone(&self) -> Self {
        Self { ctx: self.ctx.clone() }
    }
}

/// Ids of the code-provided default personas.
const DEFAULT_MEMBER_IDS: &[&str] = &["tm_default_lead", "tm_default_builder", "tm_default_reviewer"];

fn default_member(project_id: ProjectId, id: &str) -> Option<TeamMember> {
    let (name, role, mode) = match id {
        "tm_default_lead" => ("Lead", "orchestrator", "coordinate"),
        "tm_default_builder" => ("Builder", "engineer", "implement"),
        "tm_default_reviewer" => ("Reviewer", "reviewer", "review"),
        _ => return None,
    };
    Some(TeamMember {
        id: TeamMemberId::from_string(id),
        project_id,
        name: name.into(),
        role: role.into(),
        avatar: None,
        model: None,
        agent_tool: None,
        mode: Some(mode.into()),
        skills: Vec::new(),
        capabilities: Vec::new(),
        command_permissions: Vec::new(),
        is_default: true,
        status: MemberStatus::Active,
        created_at_ms: 0,
        updated_at_ms: 0,
    })
}

impl<C: Clock> TeamMemberService<C> {
    pub fn new(ctx: ServiceCtx<C>) -> Self {
        Self { ctx }
    }

    fn is_default_id(id: &TeamMemberId) -> bool {
        DEFAULT_MEMBER_IDS.contains(&id.as_str())
    }

    /// Resolve a member: overlay-aware default or stored custom.
    pub fn get_member(
        &self,
        project_id: &ProjectId,
        id: &TeamMemberId,
    ) -> Result<TeamMember, DomainError> {
        if Self::is_default_id(id) {
            if let Some(mut overlay) = self.ctx.storage.members.overlay_for(id) {
                overlay.project_id = *project_id;
                return Ok(overlay);
            }
            return default_member(*project_id, id.as_str())
                .ok_or_else(|| DomainError::not_found("team member", id.as_str()));
        }
        let member = self
            .ctx
            .storage
            .members
            .find_custom(id)
            .ok_or_else(|| DomainError::not_found("team member", id.as_str()))?;
        if &member.project_id != project_id {
            return Err(DomainError::not_found("team member", id.as_str()));
        }
        Ok(member)
    }

    /// Defaults (with overlays applied) followed by the project's customs.
    pub fn list_members(&self, project_id: &ProjectId) -> Vec<TeamMember> {
        let mut members: Vec<TeamMember> = DEFAULT_MEMBER_IDS
            .iter()
            .filter_map(|id| self.get_member(project_id, &TeamMemberId::from_string(id)).ok())
            .collect();
        members.extend(self.ctx.storage.members.customs_in_project(project_id));
        members
    }

    pub async fn create_member(&self, input: CreateTeamMember) -> Result<TeamMember, DomainError> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("member name must not be empty"));
        }
        if !self.ctx.storage.projects.exists(&input.project_id) {
            return Err(DomainError::not_found("project", input.project_id.as_str()));
        }
        let now = self.ctx.clock.epoch_ms();
        let member = TeamMember {
            id: TeamMemberId::generate(&self.ctx.ids),
            project_id: input.project_id,
            name,
            role: input.role,
            avatar: input.avatar,
            model: input.model,
            agent_tool: input.agent_tool,
            mode: input.mode,
            skills: input.skills,
            capabilities: input.capabilities,
            command_permissions: input.command_permissions,
            is_default: false,
            status: MemberStatus::Active,
            created_at_ms: now,
            updated_at_ms: now,
        };
        self.ctx.storage.members.create_custom(member.clone())?;
        self.ctx.bus.emit(MaestroEvent::TeamMemberCreated { member: member.clone() });
        Ok(member)
    }

    /// Update a member. Defaults are written as overlays; customs in place.
    pub async fn update_member(
        &self,
        project_id: &ProjectId,
        id: &TeamMemberId,
        patch: TeamMemberPatch,
    ) -> Result<TeamMember, DomainError> {
        let _guard = self.ctx.locks.acquire(id.as_str()).await;
        let current = self.get_member(project_id, id)?;
        let mut merged = patch.apply_to(&current);
        merged.updated_at_ms = self.ctx.clock.epoch_ms();
        if current.is_default {
            self.ctx.storage.members.set_overlay(merged.clone())?;
        } else {
            self.ctx.storage.members.update_custom(merged.clone())?;
        }
        self.ctx.bus.emit(MaestroEvent::TeamMemberUpdated { member: merged.clone() });
        Ok(merged)
    }

    /// Archive a member. Idempotent: archiving an archived member changes
    /// nothing and emits no event.
    pub async fn archive_member(
        &self,
        project_id: &ProjectId,
        id: &TeamMemberId,
    ) -> Result<TeamMember, DomainError> {
        let _guard = self.ctx.locks.acquire(id.as_str()).await;
        let mut member = self.get_member(project_id, id)?;
        if member.status == MemberStatus::Archived {
            return Ok(member);
        }
        member.status = MemberStatus::Archived;
        member.updated_at_ms = self.ctx.clock.epoch_ms();
        if member.is_default {
            self.ctx.storage.members.set_overlay(member.clone())?;
        } else {
            self.ctx.storage.members.update_custom(member.clone())?;
        }
        self.ctx.bus.emit(MaestroEvent::TeamMemberUpdated { member: member.clone() });
        Ok(member)
    }

    /// Drop the overlay on a default member, restoring code values.
    pub async fn reset_default(
        &self,
        project_id: &ProjectId,
        id: &TeamMemberId,
    ) -> Result<TeamMember, DomainError> {
        if !Self::is_default_id(id) {
            return Err(DomainError::validation("only default members can be reset"));
        }
        let _guard = self.ctx.locks.acquire(id.as_str()).await;
        self.ctx.storage.members.clear_overlay(id)?;
        let restored = self.get_member(project_id, id)?;
        self.ctx.bus.emit(MaestroEvent::TeamMemberUpdated { member: restored.clone() });
        Ok(restored)
    }

    /// Delete a custom member. Requires archived status; defaults are never
    /// deletable.
    pub async fn delete_member(
        &self,
        project_id: &ProjectId,
        id: &TeamMemberId,
    ) -> Result<(), DomainError> {
        let _guard = self.ctx.locks.acquire(id.as_str()).await;
        let member = self.get_member(project_id, id)?;
        if member.is_default {
            return Err(DomainError::forbidden("default team members cannot be deleted"));
        }
        if member.status != MemberStatus::Archived {
            return Err(DomainError::business_rule("only archived members can be deleted"));
        }
        self.ctx.storage.members.delete_custom(id)?;
        self.ctx.bus.emit(MaestroEvent::TeamMemberDeleted { id: *id });
        Ok(())
    }
}

#[cfg(test)]
#[path = "member_tests.rs"]
mod tests;
